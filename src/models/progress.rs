// src/models/progress.rs

use serde::Serialize;
use sqlx::FromRow;

/// Represents the 'learning_progress' table: a per-category rollup of passed tasks.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LearningProgress {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub category: String,
    pub level: i64,
    pub experience: i64,
    pub tasks_completed: i64,
    pub last_activity: chrono::DateTime<chrono::Utc>,
}

/// Aggregated struct for displaying the leaderboard.
#[derive(Debug, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub username: String,
    pub level: i64,
    pub experience: i64,
    pub total_score: i64,
}

/// Query parameters for the leaderboard.
#[derive(Debug, serde::Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<i64>,
}
