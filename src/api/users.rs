use crate::api::responses::{subscription_response, user_response};
use crate::auth::{hash_password, issue_token, verify_password, AuthenticatedUser};
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::{subscription, user};
use crate::error::{conflict_on_duplicate, ApiError};
use crate::models::{AuthResponse, LoginRequest, SignupRequest, SubscriptionResponse, UserResponse};
use actix_web::{web, HttpResponse};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Deserialize;
use serde_json::json;

const RESERVED_USERNAME: &str = "me";

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UserListQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 6)]
    pub limit: Option<u64>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubscriptionsQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 6)]
    pub limit: Option<u64>,
    /// Caps the short recipe list embedded per author.
    pub recipes_limit: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Reserved username"),
        (status = 409, description = "User already exists")
    ),
    tag = "users"
)]
pub async fn signup(
    req: web::Json<SignupRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    if req.username.to_lowercase() == RESERVED_USERNAME {
        return Err(ApiError::validation("Username 'me' is reserved"));
    }

    let existing = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(&req.email))
                .add(user::Column::Username.eq(&req.username)),
        )
        .one(pool.get_ref())
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict(
            "User with this email or username already exists",
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let new_user = user::ActiveModel {
        email: sea_orm::Set(req.email.clone()),
        username: sea_orm::Set(req.username.clone()),
        first_name: sea_orm::Set(req.first_name.clone()),
        last_name: sea_orm::Set(req.last_name.clone()),
        password_hash: sea_orm::Set(password_hash),
        ..Default::default()
    };
    let user = user::Entity::insert(new_user)
        .exec_with_returning(pool.get_ref())
        .await
        .map_err(|e| conflict_on_duplicate(e, "User with this email or username already exists"))?;

    let token = issue_token(user.id, &user.username, &config.jwt)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: UserResponse {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed: false,
        },
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn login(
    req: web::Json<LoginRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&req.email))
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Ok(HttpResponse::Unauthorized().json(json!({
            "error": "Invalid credentials"
        })));
    }

    let token = issue_token(user.id, &user.username, &config.jwt)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserResponse {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed: false,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Authenticated user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn me(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let model = user::Entity::find_by_id(user.user_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let response = user_response(pool.get_ref(), &model, Some(user.user_id)).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>)
    ),
    tag = "users"
)]
pub async fn list_users(
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, ApiError> {
    let viewer_id = viewer.map(|u| u.user_id);
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(config.pagination.page_size);
    let offset = (page - 1) * limit;

    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .limit(limit)
        .offset(offset)
        .all(pool.get_ref())
        .await?;

    let mut responses = Vec::with_capacity(users.len());
    for model in &users {
        responses.push(user_response(pool.get_ref(), model, viewer_id).await?);
    }
    Ok(HttpResponse::Ok().json(responses))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    path: web::Path<i64>,
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let model = user::Entity::find_by_id(user_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let response = user_response(pool.get_ref(), &model, viewer.map(|u| u.user_id)).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
        ("recipes_limit" = Option<u64>, Query, description = "Max recipes embedded per author")
    ),
    responses(
        (status = 200, description = "Authors the caller follows", body = Vec<SubscriptionResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn subscriptions(
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<SubscriptionsQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(config.pagination.page_size);
    let offset = (page - 1) * limit;

    let rows = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(user.user_id))
        .order_by_asc(subscription::Column::Id)
        .limit(limit)
        .offset(offset)
        .all(pool.get_ref())
        .await?;

    let mut responses = Vec::with_capacity(rows.len());
    for row in rows {
        let author = user::Entity::find_by_id(row.author_id)
            .one(pool.get_ref())
            .await?
            .ok_or_else(|| ApiError::not_found("Subscribed author not found"))?;
        responses.push(
            subscription_response(
                pool.get_ref(),
                &author,
                Some(user.user_id),
                query.recipes_limit,
            )
            .await?,
        );
    }
    Ok(HttpResponse::Ok().json(responses))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    params(("id" = i64, Path, description = "Author ID")),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Self-subscription"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Already subscribed")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn subscribe(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
    query: web::Query<SubscriptionsQuery>,
) -> Result<HttpResponse, ApiError> {
    let author_id = path.into_inner();
    let author = user::Entity::find_by_id(author_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    // Rejected before any row-state check: self-subscription is invalid
    // regardless of whether a row exists.
    if author.id == user.user_id {
        return Err(ApiError::validation("You cannot subscribe to yourself"));
    }

    let existing = subscription::Entity::find()
        .filter(
            Condition::all()
                .add(subscription::Column::UserId.eq(user.user_id))
                .add(subscription::Column::AuthorId.eq(author.id)),
        )
        .one(pool.get_ref())
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict(
            "You are already subscribed to this user",
        ));
    }

    let new_subscription = subscription::ActiveModel {
        user_id: sea_orm::Set(user.user_id),
        author_id: sea_orm::Set(author.id),
        ..Default::default()
    };
    subscription::Entity::insert(new_subscription)
        .exec(pool.get_ref())
        .await
        .map_err(|e| conflict_on_duplicate(e, "You are already subscribed to this user"))?;

    let response = subscription_response(
        pool.get_ref(),
        &author,
        Some(user.user_id),
        query.recipes_limit,
    )
    .await?;
    Ok(HttpResponse::Created().json(response))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    params(("id" = i64, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 404, description = "User not found or not subscribed")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn unsubscribe(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let author_id = path.into_inner();
    user::Entity::find_by_id(author_id)
        .one(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let result = subscription::Entity::delete_many()
        .filter(
            Condition::all()
                .add(subscription::Column::UserId.eq(user.user_id))
                .add(subscription::Column::AuthorId.eq(author_id)),
        )
        .exec(pool.get_ref())
        .await?;
    if result.rows_affected == 0 {
        return Err(ApiError::not_found("You are not subscribed to this user"));
    }
    Ok(HttpResponse::NoContent().finish())
}
