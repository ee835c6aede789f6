use crate::db::DbPool;
use crate::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, subscription, tag, user};
use crate::entities::{favorite, shopping_cart};
use crate::error::ApiError;
use crate::models::{
    RecipeIngredientResponse, RecipeResponse, RecipeShortResponse, SubscriptionResponse,
    TagResponse, UserResponse,
};
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect};

/// Builds the user representation; `is_subscribed` is relative to the
/// (optional) authenticated viewer and always false for the viewer
/// themselves.
pub async fn user_response(
    pool: &DbPool,
    model: &user::Model,
    viewer: Option<i64>,
) -> Result<UserResponse, ApiError> {
    let is_subscribed = match viewer {
        Some(viewer_id) if viewer_id != model.id => subscription::Entity::find()
            .filter(
                Condition::all()
                    .add(subscription::Column::UserId.eq(viewer_id))
                    .add(subscription::Column::AuthorId.eq(model.id)),
            )
            .one(pool)
            .await?
            .is_some(),
        _ => false,
    };

    Ok(UserResponse {
        id: model.id,
        email: model.email.clone(),
        username: model.username.clone(),
        first_name: model.first_name.clone(),
        last_name: model.last_name.clone(),
        is_subscribed,
    })
}

pub fn recipe_short_response(model: &recipe::Model) -> RecipeShortResponse {
    RecipeShortResponse {
        id: model.id,
        name: model.name.clone(),
        image: model.image.clone(),
        cooking_time: model.cooking_time,
    }
}

/// Builds the full recipe representation used by list/retrieve: tags,
/// author, per-recipe ingredient amounts and the viewer-relative
/// favorite/cart flags.
pub async fn recipe_response(
    pool: &DbPool,
    model: recipe::Model,
    viewer: Option<i64>,
) -> Result<RecipeResponse, ApiError> {
    let author = user::Entity::find_by_id(model.author_id)
        .one(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe author not found"))?;
    let author = user_response(pool, &author, viewer).await?;

    let tag_ids: Vec<i64> = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.eq(model.id))
        .all(pool)
        .await?
        .into_iter()
        .map(|row| row.tag_id)
        .collect();
    let tags: Vec<TagResponse> = if tag_ids.is_empty() {
        Vec::new()
    } else {
        tag::Entity::find()
            .filter(tag::Column::Id.is_in(tag_ids))
            .all(pool)
            .await?
            .into_iter()
            .map(TagResponse::from)
            .collect()
    };

    let mut ingredients = Vec::new();
    let rows = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.eq(model.id))
        .all(pool)
        .await?;
    for row in rows {
        let ingredient = ingredient::Entity::find_by_id(row.ingredient_id)
            .one(pool)
            .await?
            .ok_or_else(|| ApiError::not_found("Recipe ingredient not found"))?;
        ingredients.push(RecipeIngredientResponse {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
            amount: row.amount,
        });
    }

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer_id) => {
            let favorited = favorite::Entity::find()
                .filter(
                    Condition::all()
                        .add(favorite::Column::UserId.eq(viewer_id))
                        .add(favorite::Column::RecipeId.eq(model.id)),
                )
                .one(pool)
                .await?
                .is_some();
            let in_cart = shopping_cart::Entity::find()
                .filter(
                    Condition::all()
                        .add(shopping_cart::Column::UserId.eq(viewer_id))
                        .add(shopping_cart::Column::RecipeId.eq(model.id)),
                )
                .one(pool)
                .await?
                .is_some();
            (favorited, in_cart)
        }
        None => (false, false),
    };

    Ok(RecipeResponse {
        id: model.id,
        tags,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: model.name,
        image: model.image,
        text: model.text,
        cooking_time: model.cooking_time,
    })
}

/// Author representation for the subscriptions surface: the user plus a
/// (optionally capped) short recipe list and the total recipe count.
pub async fn subscription_response(
    pool: &DbPool,
    author: &user::Model,
    viewer: Option<i64>,
    recipes_limit: Option<u64>,
) -> Result<SubscriptionResponse, ApiError> {
    let user = user_response(pool, author, viewer).await?;

    let mut query = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author.id))
        .order_by_desc(recipe::Column::PubDate);
    if let Some(limit) = recipes_limit {
        query = query.limit(limit);
    }
    let recipes: Vec<RecipeShortResponse> = query
        .all(pool)
        .await?
        .iter()
        .map(recipe_short_response)
        .collect();

    let recipes_count = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author.id))
        .count(pool)
        .await?;

    Ok(SubscriptionResponse {
        id: user.id,
        email: user.email,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        is_subscribed: user.is_subscribed,
        recipes,
        recipes_count,
    })
}
