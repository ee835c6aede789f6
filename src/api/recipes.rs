use crate::api::responses::{recipe_response, recipe_short_response};
use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::{favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart,
    tag};
use crate::error::{conflict_on_duplicate, ApiError};
use crate::images::save_base64_image;
use crate::models::{RecipeRequest, RecipeResponse, RecipeShortResponse};
use crate::shopping_list;
use crate::shopping_list::pdf;
use actix_web::{web, HttpResponse};
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RecipeListQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 6)]
    pub limit: Option<u64>,
    /// Filter by author id.
    pub author: Option<i64>,
    /// Comma-separated tag slugs; a recipe matches if it carries any of them.
    pub tags: Option<String>,
    /// Nonzero restricts to the caller's favorites.
    pub is_favorited: Option<u8>,
    /// Nonzero restricts to the caller's shopping cart.
    pub is_in_shopping_cart: Option<u8>,
}

/// Structural validation of a recipe payload; runs before anything is
/// persisted so a rejected payload leaves no rows behind.
fn validate_recipe_payload(req: &RecipeRequest) -> Result<(), ApiError> {
    if req.cooking_time < 1 {
        return Err(ApiError::validation("cooking_time must be at least 1"));
    }
    if req.ingredients.is_empty() {
        return Err(ApiError::validation(
            "Recipe must contain at least one ingredient",
        ));
    }
    if req.tags.is_empty() {
        return Err(ApiError::validation("Recipe must contain at least one tag"));
    }

    let mut seen_ingredients = HashSet::new();
    for item in &req.ingredients {
        if item.amount < 1 {
            return Err(ApiError::validation(
                "Ingredient amount must be at least 1",
            ));
        }
        if !seen_ingredients.insert(item.id) {
            return Err(ApiError::validation(
                "You cannot use the same ingredient twice in one recipe",
            ));
        }
    }

    let mut seen_tags = HashSet::new();
    for tag_id in &req.tags {
        if !seen_tags.insert(*tag_id) {
            return Err(ApiError::validation(
                "You cannot use the same tag twice in one recipe",
            ));
        }
    }

    Ok(())
}

/// Every referenced tag and ingredient id must resolve; a dangling id is a
/// payload error, not a missing resource.
async fn check_references(pool: &DbPool, req: &RecipeRequest) -> Result<(), ApiError> {
    let tag_count = tag::Entity::find()
        .filter(tag::Column::Id.is_in(req.tags.clone()))
        .all(pool)
        .await?
        .len();
    if tag_count != req.tags.len() {
        return Err(ApiError::validation("Unknown tag id in recipe"));
    }

    let ingredient_ids: Vec<i64> = req.ingredients.iter().map(|i| i.id).collect();
    let ingredient_count = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ingredient_ids))
        .all(pool)
        .await?
        .len();
    if ingredient_count != req.ingredients.len() {
        return Err(ApiError::validation("Unknown ingredient id in recipe"));
    }

    Ok(())
}

fn tag_rows(recipe_id: i64, req: &RecipeRequest) -> Vec<recipe_tag::ActiveModel> {
    req.tags
        .iter()
        .map(|tag_id| recipe_tag::ActiveModel {
            recipe_id: sea_orm::Set(recipe_id),
            tag_id: sea_orm::Set(*tag_id),
            ..Default::default()
        })
        .collect()
}

fn ingredient_rows(recipe_id: i64, req: &RecipeRequest) -> Vec<recipe_ingredient::ActiveModel> {
    req.ingredients
        .iter()
        .map(|item| recipe_ingredient::ActiveModel {
            recipe_id: sea_orm::Set(recipe_id),
            ingredient_id: sea_orm::Set(item.id),
            amount: sea_orm::Set(item.amount),
            ..Default::default()
        })
        .collect()
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = RecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "recipes"
)]
pub async fn create_recipe(
    req: web::Json<RecipeRequest>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    validate_recipe_payload(&req)?;
    check_references(pool.get_ref(), &req).await?;

    let image = save_base64_image(&req.image, &config.media.root)?;

    // The recipe and its association rows land in one transaction; any
    // failure rolls the whole unit back.
    let txn = pool.get_ref().begin().await?;
    let new_recipe = recipe::ActiveModel {
        author_id: sea_orm::Set(user.user_id),
        name: sea_orm::Set(req.name.clone()),
        image: sea_orm::Set(image),
        text: sea_orm::Set(req.text.clone()),
        cooking_time: sea_orm::Set(req.cooking_time),
        ..Default::default()
    };
    let created = recipe::Entity::insert(new_recipe)
        .exec_with_returning(&txn)
        .await?;
    recipe_tag::Entity::insert_many(tag_rows(created.id, &req))
        .exec(&txn)
        .await?;
    recipe_ingredient::Entity::insert_many(ingredient_rows(created.id, &req))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    let response = recipe_response(pool.get_ref(), created, Some(user.user_id)).await?;
    Ok(HttpResponse::Created().json(response))
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
        ("author" = Option<i64>, Query, description = "Filter by author id"),
        ("tags" = Option<String>, Query, description = "Comma-separated tag slugs"),
        ("is_favorited" = Option<u8>, Query, description = "Nonzero: caller's favorites only"),
        ("is_in_shopping_cart" = Option<u8>, Query, description = "Nonzero: caller's cart only")
    ),
    responses(
        (status = 200, description = "List of recipes", body = Vec<RecipeResponse>)
    ),
    tag = "recipes"
)]
pub async fn list_recipes(
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<RecipeListQuery>,
) -> Result<HttpResponse, ApiError> {
    let viewer_id = viewer.map(|u| u.user_id);
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(config.pagination.page_size);
    let offset = (page - 1) * limit;

    let mut find = recipe::Entity::find().order_by_desc(recipe::Column::PubDate);

    if let Some(author_id) = query.author {
        find = find.filter(recipe::Column::AuthorId.eq(author_id));
    }

    if let Some(slugs) = query.tags.as_deref() {
        let slugs: Vec<&str> = slugs.split(',').filter(|s| !s.is_empty()).collect();
        if !slugs.is_empty() {
            let tag_ids: Vec<i64> = tag::Entity::find()
                .filter(tag::Column::Slug.is_in(slugs))
                .all(pool.get_ref())
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect();
            if tag_ids.is_empty() {
                return Ok(HttpResponse::Ok().json(Vec::<RecipeResponse>::new()));
            }
            let recipe_ids: Vec<i64> = recipe_tag::Entity::find()
                .filter(recipe_tag::Column::TagId.is_in(tag_ids))
                .all(pool.get_ref())
                .await?
                .into_iter()
                .map(|row| row.recipe_id)
                .collect();
            if recipe_ids.is_empty() {
                return Ok(HttpResponse::Ok().json(Vec::<RecipeResponse>::new()));
            }
            find = find.filter(recipe::Column::Id.is_in(recipe_ids));
        }
    }

    if query.is_favorited.unwrap_or(0) != 0 {
        match viewer_id {
            Some(user_id) => {
                let recipe_ids: Vec<i64> = favorite::Entity::find()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .all(pool.get_ref())
                    .await?
                    .into_iter()
                    .map(|row| row.recipe_id)
                    .collect();
                if recipe_ids.is_empty() {
                    return Ok(HttpResponse::Ok().json(Vec::<RecipeResponse>::new()));
                }
                find = find.filter(recipe::Column::Id.is_in(recipe_ids));
            }
            None => return Ok(HttpResponse::Ok().json(Vec::<RecipeResponse>::new())),
        }
    }

    if query.is_in_shopping_cart.unwrap_or(0) != 0 {
        match viewer_id {
            Some(user_id) => {
                let recipe_ids: Vec<i64> = shopping_cart::Entity::find()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .all(pool.get_ref())
                    .await?
                    .into_iter()
                    .map(|row| row.recipe_id)
                    .collect();
                if recipe_ids.is_empty() {
                    return Ok(HttpResponse::Ok().json(Vec::<RecipeResponse>::new()));
                }
                find = find.filter(recipe::Column::Id.is_in(recipe_ids));
            }
            None => return Ok(HttpResponse::Ok().json(Vec::<RecipeResponse>::new())),
        }
    }

    let recipes = find.limit(limit).offset(offset).all(pool.get_ref()).await?;

    let mut responses = Vec::with_capacity(recipes.len());
    for model in recipes {
        responses.push(recipe_response(pool.get_ref(), model, viewer_id).await?);
    }
    Ok(HttpResponse::Ok().json(responses))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe", body = RecipeResponse),
        (status = 404, description = "Recipe not found")
    ),
    tag = "recipes"
)]
pub async fn get_recipe(
    path: web::Path<i64>,
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let model = recipe::Entity::find_by_id(path.into_inner())
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    let response = recipe_response(pool.get_ref(), model, viewer.map(|u| u.user_id)).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe ID")),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "recipes"
)]
pub async fn update_recipe(
    path: web::Path<i64>,
    req: web::Json<RecipeRequest>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let recipe_id = path.into_inner();
    let model = recipe::Entity::find_by_id(recipe_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    if model.author_id != user.user_id {
        return Err(ApiError::permission_denied(
            "Only the author can modify this recipe",
        ));
    }

    validate_recipe_payload(&req)?;
    check_references(pool.get_ref(), &req).await?;

    // A new data URI replaces the stored image; anything else keeps it.
    let image = if req.image.starts_with("data:image") {
        save_base64_image(&req.image, &config.media.root)?
    } else {
        model.image.clone()
    };

    // Associations are fully replaced: delete the existing set, insert the
    // new one, all inside the same transaction as the field update.
    let txn = pool.get_ref().begin().await?;
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    recipe_tag::Entity::insert_many(tag_rows(recipe_id, &req))
        .exec(&txn)
        .await?;
    recipe_ingredient::Entity::insert_many(ingredient_rows(recipe_id, &req))
        .exec(&txn)
        .await?;

    let mut active: recipe::ActiveModel = model.into();
    active.name = sea_orm::Set(req.name.clone());
    active.image = sea_orm::Set(image);
    active.text = sea_orm::Set(req.text.clone());
    active.cooking_time = sea_orm::Set(req.cooking_time);
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    let response = recipe_response(pool.get_ref(), updated, Some(user.user_id)).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = [])),
    tag = "recipes"
)]
pub async fn delete_recipe(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let recipe_id = path.into_inner();
    let model = recipe::Entity::find_by_id(recipe_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    if model.author_id != user.user_id {
        return Err(ApiError::permission_denied(
            "Only the author can delete this recipe",
        ));
    }

    recipe::Entity::delete_by_id(recipe_id)
        .exec(pool.get_ref())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Recipe favorited", body = RecipeShortResponse),
        (status = 404, description = "Recipe not found"),
        (status = 409, description = "Already favorited")
    ),
    security(("bearer_auth" = [])),
    tag = "recipes"
)]
pub async fn favorite_recipe(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let recipe_id = path.into_inner();
    let model = recipe::Entity::find_by_id(recipe_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;

    let existing = favorite::Entity::find()
        .filter(
            Condition::all()
                .add(favorite::Column::UserId.eq(user.user_id))
                .add(favorite::Column::RecipeId.eq(recipe_id)),
        )
        .one(pool.get_ref())
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("This recipe is already in favorites"));
    }

    let new_favorite = favorite::ActiveModel {
        user_id: sea_orm::Set(user.user_id),
        recipe_id: sea_orm::Set(recipe_id),
        ..Default::default()
    };
    favorite::Entity::insert(new_favorite)
        .exec(pool.get_ref())
        .await
        .map_err(|e| conflict_on_duplicate(e, "This recipe is already in favorites"))?;

    Ok(HttpResponse::Created().json(recipe_short_response(&model)))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 404, description = "Recipe not found or not favorited")
    ),
    security(("bearer_auth" = [])),
    tag = "recipes"
)]
pub async fn unfavorite_recipe(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let recipe_id = path.into_inner();
    recipe::Entity::find_by_id(recipe_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;

    let result = favorite::Entity::delete_many()
        .filter(
            Condition::all()
                .add(favorite::Column::UserId.eq(user.user_id))
                .add(favorite::Column::RecipeId.eq(recipe_id)),
        )
        .exec(pool.get_ref())
        .await?;
    if result.rows_affected == 0 {
        return Err(ApiError::not_found("This recipe is not in favorites"));
    }
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Recipe added to cart", body = RecipeShortResponse),
        (status = 404, description = "Recipe not found"),
        (status = 409, description = "Already in cart")
    ),
    security(("bearer_auth" = [])),
    tag = "recipes"
)]
pub async fn cart_add(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let recipe_id = path.into_inner();
    let model = recipe::Entity::find_by_id(recipe_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;

    let existing = shopping_cart::Entity::find()
        .filter(
            Condition::all()
                .add(shopping_cart::Column::UserId.eq(user.user_id))
                .add(shopping_cart::Column::RecipeId.eq(recipe_id)),
        )
        .one(pool.get_ref())
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict(
            "This recipe is already in the shopping cart",
        ));
    }

    let new_entry = shopping_cart::ActiveModel {
        user_id: sea_orm::Set(user.user_id),
        recipe_id: sea_orm::Set(recipe_id),
        ..Default::default()
    };
    shopping_cart::Entity::insert(new_entry)
        .exec(pool.get_ref())
        .await
        .map_err(|e| conflict_on_duplicate(e, "This recipe is already in the shopping cart"))?;

    Ok(HttpResponse::Created().json(recipe_short_response(&model)))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    params(("id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from cart"),
        (status = 404, description = "Recipe not found or not in cart")
    ),
    security(("bearer_auth" = [])),
    tag = "recipes"
)]
pub async fn cart_remove(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let recipe_id = path.into_inner();
    recipe::Entity::find_by_id(recipe_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;

    let result = shopping_cart::Entity::delete_many()
        .filter(
            Condition::all()
                .add(shopping_cart::Column::UserId.eq(user.user_id))
                .add(shopping_cart::Column::RecipeId.eq(recipe_id)),
        )
        .exec(pool.get_ref())
        .await?;
    if result.rows_affected == 0 {
        return Err(ApiError::not_found(
            "This recipe is not in the shopping cart",
        ));
    }
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    responses(
        (status = 200, description = "Aggregated shopping list as PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Renderer assets unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "recipes"
)]
pub async fn download_shopping_cart(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let items = shopping_list::aggregate_for_user(pool.get_ref(), user.user_id).await?;
    let bytes = pdf::render(&items, Path::new(&config.media.font_path))?;

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .append_header((
            "Content-Disposition",
            "attachment; filename=\"ingredients.pdf\"",
        ))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecipeIngredientInput;

    fn request(ingredients: Vec<(i64, i32)>, tags: Vec<i64>, cooking_time: i32) -> RecipeRequest {
        RecipeRequest {
            ingredients: ingredients
                .into_iter()
                .map(|(id, amount)| RecipeIngredientInput { id, amount })
                .collect(),
            tags,
            image: "data:image/png;base64,AAAA".to_string(),
            name: "Pancakes".to_string(),
            text: "Mix and fry.".to_string(),
            cooking_time,
        }
    }

    #[test]
    fn accepts_well_formed_payload() {
        let req = request(vec![(1, 200), (2, 2)], vec![1, 2], 30);
        assert!(validate_recipe_payload(&req).is_ok());
    }

    #[test]
    fn rejects_duplicate_ingredient() {
        let req = request(vec![(1, 200), (1, 100)], vec![1], 30);
        assert!(matches!(
            validate_recipe_payload(&req),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn rejects_duplicate_tag() {
        let req = request(vec![(1, 200)], vec![7, 7], 30);
        assert!(matches!(
            validate_recipe_payload(&req),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn rejects_zero_cooking_time_and_amount() {
        assert!(validate_recipe_payload(&request(vec![(1, 200)], vec![1], 0)).is_err());
        assert!(validate_recipe_payload(&request(vec![(1, 0)], vec![1], 30)).is_err());
    }

    #[test]
    fn rejects_empty_lists() {
        assert!(validate_recipe_payload(&request(vec![], vec![1], 30)).is_err());
        assert!(validate_recipe_payload(&request(vec![(1, 1)], vec![], 30)).is_err());
    }
}
