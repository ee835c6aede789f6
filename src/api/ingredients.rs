use crate::db::DbPool;
use crate::entities::ingredient;
use crate::error::ApiError;
use crate::models::IngredientResponse;
use actix_web::{web, HttpResponse};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct IngredientQuery {
    /// Name prefix to search for.
    pub name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(
        ("name" = Option<String>, Query, description = "Name prefix filter")
    ),
    responses(
        (status = 200, description = "List of ingredients", body = Vec<IngredientResponse>)
    ),
    tag = "ingredients"
)]
pub async fn list_ingredients(
    pool: web::Data<DbPool>,
    query: web::Query<IngredientQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut find = ingredient::Entity::find().order_by_asc(ingredient::Column::Name);
    if let Some(prefix) = query.name.as_deref() {
        if !prefix.is_empty() {
            find = find.filter(ingredient::Column::Name.starts_with(prefix));
        }
    }
    let ingredients: Vec<IngredientResponse> = find
        .all(pool.get_ref())
        .await?
        .into_iter()
        .map(IngredientResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(ingredients))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    params(("id" = i64, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient", body = IngredientResponse),
        (status = 404, description = "Ingredient not found")
    ),
    tag = "ingredients"
)]
pub async fn get_ingredient(
    path: web::Path<i64>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let ingredient = ingredient::Entity::find_by_id(path.into_inner())
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient not found"))?;
    Ok(HttpResponse::Ok().json(IngredientResponse::from(ingredient)))
}
