use crate::db::DbPool;
use crate::entities::tag;
use crate::error::ApiError;
use crate::models::TagResponse;
use actix_web::{web, HttpResponse};
use sea_orm::{EntityTrait, QueryOrder};

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "List of tags", body = Vec<TagResponse>)
    ),
    tag = "tags"
)]
pub async fn list_tags(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let tags: Vec<TagResponse> = tag::Entity::find()
        .order_by_asc(tag::Column::Id)
        .all(pool.get_ref())
        .await?
        .into_iter()
        .map(TagResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(tags))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    params(("id" = i64, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag", body = TagResponse),
        (status = 404, description = "Tag not found")
    ),
    tag = "tags"
)]
pub async fn get_tag(
    path: web::Path<i64>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let tag = tag::Entity::find_by_id(path.into_inner())
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Tag not found"))?;
    Ok(HttpResponse::Ok().json(TagResponse::from(tag)))
}
