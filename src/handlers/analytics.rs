// src/handlers/analytics.rs

use std::collections::BTreeMap;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::{TASK_CATEGORIES, TASK_DIFFICULTIES},
    error::AppError,
    handlers::{
        auth::current_user,
        progress::{average, percentage},
    },
    utils::jwt::Claims,
};

#[derive(Debug, Serialize)]
pub struct DifficultyStat {
    pub total: i64,
    pub passed: i64,
    pub avg_score: f64,
    pub avg_time: f64,
}

#[derive(Debug, Serialize)]
pub struct PerformanceResponse {
    pub avg_time_spent: f64,
    pub success_rate: f64,
    pub avg_score: f64,
    /// Only difficulties the user has attempted appear here.
    pub difficulty_stats: BTreeMap<String, DifficultyStat>,
    pub total_attempts: i64,
    pub successful_attempts: i64,
}

/// Attempt aggregates: (count, passed, score sum, time sum).
type Totals = (i64, i64, i64, i64);

const TOTALS_SELECT: &str = "SELECT COUNT(*), \
     COALESCE(SUM(CASE WHEN r.passed = 1 THEN 1 ELSE 0 END), 0), \
     COALESCE(SUM(r.score), 0), \
     COALESCE(SUM(r.time_spent), 0) \
     FROM test_results r";

/// Overall and per-category completion figures plus 30-day activity.
pub async fn get_overview(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    let (total_tasks, completed_tasks): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM test_tasks),
            (SELECT COUNT(*) FROM test_results WHERE user_id = ? AND passed = 1)
        "#,
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await?;

    let mut category_stats = serde_json::Map::new();
    for category in TASK_CATEGORIES {
        let (total, completed): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM test_tasks WHERE category = ?1),
                (SELECT COUNT(*) FROM test_results r
                    JOIN test_tasks t ON t.id = r.task_id
                    WHERE r.user_id = ?2 AND t.category = ?1 AND r.passed = 1)
            "#,
        )
        .bind(category)
        .bind(user.id)
        .fetch_one(&pool)
        .await?;

        category_stats.insert(
            category.to_string(),
            json!({
                "total": total,
                "completed": completed,
                "completion_rate": percentage(completed, total),
            }),
        );
    }

    let recent_activity: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM test_results
        WHERE user_id = ? AND completed_at >= datetime('now', '-30 days')
        "#,
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "user_stats": {
            "total_tasks": total_tasks,
            "completed_tasks": completed_tasks,
            "total_score": user.total_score,
            "level": user.level,
            "experience": user.experience,
        },
        "category_stats": category_stats,
        "recent_activity": recent_activity,
        "last_30_days": recent_activity,
    })))
}

/// Success rate, averages and a per-difficulty breakdown of all attempts.
pub async fn get_performance(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    let (total_attempts, successful_attempts, score_sum, time_sum): Totals =
        sqlx::query_as(&format!("{TOTALS_SELECT} WHERE r.user_id = ?"))
            .bind(user.id)
            .fetch_one(&pool)
            .await?;

    let mut difficulty_stats = BTreeMap::new();
    for difficulty in TASK_DIFFICULTIES {
        let (total, passed, scores, times): Totals = sqlx::query_as(&format!(
            "{TOTALS_SELECT} JOIN test_tasks t ON t.id = r.task_id \
             WHERE r.user_id = ? AND t.difficulty = ?"
        ))
        .bind(user.id)
        .bind(difficulty)
        .fetch_one(&pool)
        .await?;

        if total > 0 {
            difficulty_stats.insert(
                difficulty.to_string(),
                DifficultyStat {
                    total,
                    passed,
                    avg_score: average(scores, total),
                    avg_time: average(times, total),
                },
            );
        }
    }

    Ok(Json(PerformanceResponse {
        avg_time_spent: average(time_sum, total_attempts),
        success_rate: percentage(successful_attempts, total_attempts),
        avg_score: average(score_sum, total_attempts),
        difficulty_stats,
        total_attempts,
        successful_attempts,
    }))
}
