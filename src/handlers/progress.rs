// src/handlers/progress.rs

use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::{DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT},
    error::AppError,
    handlers::auth::current_user,
    models::progress::{LeaderboardEntry, LeaderboardParams, LearningProgress},
    utils::{extract::AppQuery, jwt::Claims},
};

/// Percentage of `part` in `whole`, 0 when `whole` is 0.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// Mean of `sum` over `count` items, 0 when there are none.
pub fn average(sum: i64, count: i64) -> f64 {
    if count > 0 { sum as f64 / count as f64 } else { 0.0 }
}

/// Per-category learning progress of the current user.
pub async fn get_progress(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    let progress = sqlx::query_as::<_, LearningProgress>(
        r#"
        SELECT id, user_id, category, level, experience, tasks_completed, last_activity
        FROM learning_progress
        WHERE user_id = ?
        ORDER BY category
        "#,
    )
    .bind(user.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(progress))
}

/// Users ranked by total score, highest first.
pub async fn get_leaderboard(
    State(pool): State<SqlitePool>,
    AppQuery(params): AppQuery<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT);

    let leaderboard = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT id, username, level, experience, total_score
        FROM users
        WHERE is_active = 1
        ORDER BY total_score DESC, id ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(leaderboard))
}

/// Task and achievement completion figures for the current user.
pub async fn get_stats(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    let (total_tasks, completed_tasks, total_achievements, earned_achievements): (
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM test_tasks),
            (SELECT COUNT(*) FROM test_results WHERE user_id = ?1 AND passed = 1),
            (SELECT COUNT(*) FROM achievements),
            (SELECT COUNT(*) FROM user_achievements WHERE user_id = ?1)
        "#,
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "user": user,
        "tasks": {
            "total": total_tasks,
            "completed": completed_tasks,
            "completion_rate": percentage(completed_tasks, total_tasks),
        },
        "achievements": {
            "total": total_achievements,
            "earned": earned_achievements,
            "earned_rate": percentage(earned_achievements, total_achievements),
        }
    })))
}
