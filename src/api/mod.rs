pub mod ingredients;
pub mod recipes;
pub mod responses;
pub mod tags;
pub mod users;

use crate::models::{
    AuthResponse, IngredientResponse, LoginRequest, RecipeIngredientInput,
    RecipeIngredientResponse, RecipeRequest, RecipeResponse, RecipeShortResponse, SignupRequest,
    SubscriptionResponse, TagResponse, UserResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // User endpoints
        users::signup,
        users::login,
        users::me,
        users::list_users,
        users::get_user,
        users::subscriptions,
        users::subscribe,
        users::unsubscribe,
        // Tag endpoints
        tags::list_tags,
        tags::get_tag,
        // Ingredient endpoints
        ingredients::list_ingredients,
        ingredients::get_ingredient,
        // Recipe endpoints
        recipes::create_recipe,
        recipes::list_recipes,
        recipes::get_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::favorite_recipe,
        recipes::unfavorite_recipe,
        recipes::cart_add,
        recipes::cart_remove,
        recipes::download_shopping_cart,
    ),
    components(schemas(
        // User schemas
        SignupRequest,
        LoginRequest,
        AuthResponse,
        UserResponse,
        SubscriptionResponse,
        // Tag schemas
        TagResponse,
        // Ingredient schemas
        IngredientResponse,
        // Recipe schemas
        RecipeRequest,
        RecipeIngredientInput,
        RecipeIngredientResponse,
        RecipeResponse,
        RecipeShortResponse,
        // Query schemas
        users::UserListQuery,
        users::SubscriptionsQuery,
        ingredients::IngredientQuery,
        recipes::RecipeListQuery,
    )),
    tags(
        (name = "users", description = "User and subscription endpoints"),
        (name = "tags", description = "Tag reference data endpoints"),
        (name = "ingredients", description = "Ingredient reference data endpoints"),
        (name = "recipes", description = "Recipe, favorite, and shopping cart endpoints"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

use utoipa::Modify;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
