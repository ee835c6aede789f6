use crate::entities::tag;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<tag::Model> for TagResponse {
    fn from(model: tag::Model) -> Self {
        TagResponse {
            id: model.id,
            name: model.name,
            color: model.color,
            slug: model.slug,
        }
    }
}
