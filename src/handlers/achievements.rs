// src/handlers/achievements.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{
    achievements::evaluate_achievements,
    error::AppError,
    handlers::auth::current_user,
    models::achievement::{
        Achievement, CheckAchievementsResponse, EarnedAchievement, EarnedAchievementRow,
    },
    utils::jwt::Claims,
};

/// Lists achievements the current user has earned, oldest first.
pub async fn list_earned(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    let rows = sqlx::query_as::<_, EarnedAchievementRow>(
        r#"
        SELECT
            ua.id AS award_id, ua.earned_at,
            a.id, a.name, a.description, a.icon, a.points, a.category
        FROM user_achievements ua
        JOIN achievements a ON a.id = ua.achievement_id
        WHERE ua.user_id = ?
        ORDER BY ua.earned_at, ua.id
        "#,
    )
    .bind(user.id)
    .fetch_all(&pool)
    .await?;

    let earned: Vec<EarnedAchievement> = rows.into_iter().map(Into::into).collect();
    Ok(Json(earned))
}

/// Lists catalog achievements the current user has not earned yet.
pub async fn list_available(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    let available = sqlx::query_as::<_, Achievement>(
        r#"
        SELECT id, name, description, icon, points, category
        FROM achievements
        WHERE id NOT IN (SELECT achievement_id FROM user_achievements WHERE user_id = ?)
        ORDER BY id
        "#,
    )
    .bind(user.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(available))
}

/// Re-evaluates every achievement rule for the current user.
///
/// Awards and the experience they grant commit as one transaction, and an
/// achievement already held is never awarded again.
pub async fn check(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    let mut tx = pool.begin().await?;
    let new_achievements = evaluate_achievements(&mut tx, user.id).await.map_err(|e| {
        tracing::error!("Achievement evaluation failed for user {}: {:?}", user.id, e);
        AppError::from(e)
    })?;
    tx.commit().await?;

    Ok(Json(CheckAchievementsResponse {
        total_achievements: new_achievements.len(),
        new_achievements,
    }))
}
