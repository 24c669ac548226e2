// src/handlers/social.rs

use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::FEED_LIMIT,
    error::AppError,
    handlers::auth::current_user,
    models::{
        achievement::{FeedEntry, FeedRow},
        user::User,
    },
    utils::{
        extract::{AppPath, AppQuery},
        jwt::Claims,
    },
};

#[derive(Debug, Deserialize)]
pub struct FollowParams {
    pub user_id: i64,
}

/// Follows another learner.
///
/// There is no follow graph yet; the target is validated and acknowledged.
pub async fn follow_user(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    AppQuery(params): AppQuery<FollowParams>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    if params.user_id == user.id {
        return Err(AppError::BadRequest("You cannot follow yourself".to_string()));
    }

    let target = User::find_by_id(&pool, params.user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "message": format!("You are now following {}", target.username),
        "following": true,
    })))
}

/// The most recent achievement awards across all learners.
pub async fn get_feed(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    current_user(&pool, &claims).await?;

    let rows = sqlx::query_as::<_, FeedRow>(
        r#"
        SELECT
            u.id AS user_id, u.username, u.level AS user_level, u.total_score AS user_total_score,
            ua.earned_at,
            a.id, a.name, a.description, a.icon, a.points, a.category
        FROM user_achievements ua
        JOIN users u ON u.id = ua.user_id
        JOIN achievements a ON a.id = ua.achievement_id
        ORDER BY ua.earned_at DESC, ua.id DESC
        LIMIT ?
        "#,
    )
    .bind(FEED_LIMIT)
    .fetch_all(&pool)
    .await?;

    let feed: Vec<FeedEntry> = rows.into_iter().map(Into::into).collect();
    Ok(Json(feed))
}

/// Notifications are not stored yet, so the inbox is always empty.
pub async fn list_notifications(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    current_user(&pool, &claims).await?;
    Ok(Json(Vec::<serde_json::Value>::new()))
}

pub async fn mark_notification_read(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    AppPath(_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    current_user(&pool, &claims).await?;
    Ok(Json(json!({ "message": "Notification marked as read" })))
}
