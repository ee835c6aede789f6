use crate::models::tag::TagResponse;
use crate::models::user::UserResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipeIngredientInput {
    /// Ingredient id.
    pub id: i64,
    #[schema(example = 200, minimum = 1)]
    pub amount: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipeRequest {
    pub ingredients: Vec<RecipeIngredientInput>,
    /// Tag ids.
    pub tags: Vec<i64>,
    /// Base64 data URI on create; on update either a new data URI or the
    /// previously stored path to keep the current image.
    pub image: String,
    pub name: String,
    pub text: String,
    #[schema(example = 30, minimum = 1)]
    pub cooking_time: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full representation used by list/retrieve.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Short representation returned by favorite/cart adds and embedded in
/// subscription payloads.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeShortResponse {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}
