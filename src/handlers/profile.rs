// src/handlers/profile.rs

use std::collections::BTreeMap;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Serialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::{Config, SEARCH_RESULT_LIMIT, TASK_CATEGORIES},
    error::{AppError, is_unique_violation},
    handlers::{auth::current_user, progress::average},
    models::{
        test_result::ActivityEntry,
        user::{UpdateProfileRequest, User},
    },
    utils::{
        extract::AppJson,
        jwt::{Claims, sign_jwt},
    },
};

#[derive(Debug, Serialize)]
pub struct CategoryStat {
    pub completed: i64,
    pub total_score: i64,
    pub average_score: f64,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub category_stats: BTreeMap<String, CategoryStat>,
    pub total_tasks_completed: i64,
    pub total_time_spent: i64,
    pub average_attempts: f64,
}

/// The current user's ten most recent attempts.
pub async fn get_activity(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    let entries = sqlx::query_as::<_, ActivityEntry>(
        r#"
        SELECT r.id, r.task_id, t.title, r.score, r.max_score, r.passed, r.completed_at, r.time_spent
        FROM test_results r
        LEFT JOIN test_tasks t ON t.id = r.task_id
        WHERE r.user_id = ?
        ORDER BY r.completed_at DESC, r.id DESC
        LIMIT ?
        "#,
    )
    .bind(user.id)
    .bind(SEARCH_RESULT_LIMIT)
    .fetch_all(&pool)
    .await?;

    let activity: Vec<ActivityEntry> = entries.into_iter().map(ActivityEntry::with_title).collect();
    Ok(Json(activity))
}

/// Extended profile: per-category results and attempt totals.
pub async fn get_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    let mut category_stats = BTreeMap::new();
    for category in TASK_CATEGORIES {
        let (completed, total_score): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(r.score), 0)
            FROM test_results r
            JOIN test_tasks t ON t.id = r.task_id
            WHERE r.user_id = ? AND t.category = ? AND r.passed = 1
            "#,
        )
        .bind(user.id)
        .bind(category)
        .fetch_one(&pool)
        .await?;

        category_stats.insert(
            category.to_string(),
            CategoryStat {
                completed,
                total_score,
                average_score: average(total_score, completed),
            },
        );
    }

    let (total_tasks_completed, total_time_spent, total_attempts, result_count): (
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN passed = 1 THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(time_spent), 0),
            COALESCE(SUM(attempts), 0),
            COUNT(*)
        FROM test_results
        WHERE user_id = ?
        "#,
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(ProfileResponse {
        user,
        category_stats,
        total_tasks_completed,
        total_time_spent,
        average_attempts: average(total_attempts, result_count.max(1)),
    }))
}

/// Changes the current user's username and/or email.
///
/// The username is the token subject, so a fresh token is returned with the
/// updated profile.
pub async fn update_profile(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user = current_user(&pool, &claims).await?;

    let new_username = payload.username.filter(|u| u != &user.username);
    let new_email = payload.email.filter(|e| e != &user.email);

    if let Some(username) = &new_username {
        if User::find_by_username(&pool, username).await?.is_some() {
            return Err(AppError::BadRequest("Username is already taken".to_string()));
        }
    }
    if let Some(email) = &new_email {
        if User::find_by_email(&pool, email).await?.is_some() {
            return Err(AppError::BadRequest("Email is already in use".to_string()));
        }
    }

    sqlx::query(
        r#"
        UPDATE users
        SET username = COALESCE(?, username),
            email = COALESCE(?, email)
        WHERE id = ?
        "#,
    )
    .bind(new_username.as_deref())
    .bind(new_email.as_deref())
    .bind(user.id)
    .execute(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::BadRequest("Username or email already in use".to_string())
        } else {
            AppError::from(e)
        }
    })?;

    let updated = User::find_by_id(&pool, user.id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    let token = sign_jwt(
        updated.id,
        &updated.username,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(serde_json::json!({
        "message": "Profile updated successfully",
        "access_token": token,
        "token_type": "bearer",
        "user": updated,
    })))
}
