// src/models/achievement.rs

use serde::Serialize;
use sqlx::FromRow;

use crate::models::user::UserSummary;

/// Represents the 'achievements' catalog table.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct Achievement {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// Experience and score granted when earned.
    pub points: i64,
    pub category: Option<String>,
}

pub const ACHIEVEMENT_COLUMNS: &str = "id, name, description, icon, points, category";

/// Row of `user_achievements` joined with its catalog entry.
#[derive(Debug, FromRow)]
pub struct EarnedAchievementRow {
    pub award_id: i64,
    pub earned_at: chrono::DateTime<chrono::Utc>,
    #[sqlx(flatten)]
    pub achievement: Achievement,
}

/// An achievement held by the current user.
#[derive(Debug, Serialize)]
pub struct EarnedAchievement {
    pub id: i64,
    pub achievement: Achievement,
    pub earned_at: chrono::DateTime<chrono::Utc>,
}

impl From<EarnedAchievementRow> for EarnedAchievement {
    fn from(row: EarnedAchievementRow) -> Self {
        EarnedAchievement {
            id: row.award_id,
            achievement: row.achievement,
            earned_at: row.earned_at,
        }
    }
}

/// Result of an explicit achievement check.
#[derive(Debug, Serialize)]
pub struct CheckAchievementsResponse {
    pub total_achievements: usize,
    pub new_achievements: Vec<Achievement>,
}

/// Social feed row: who earned what, and when.
#[derive(Debug, FromRow)]
pub struct FeedRow {
    pub user_id: i64,
    pub username: String,
    pub user_level: i64,
    pub user_total_score: i64,
    pub earned_at: chrono::DateTime<chrono::Utc>,
    #[sqlx(flatten)]
    pub achievement: Achievement,
}

#[derive(Debug, Serialize)]
pub struct FeedEntry {
    #[serde(rename = "type")]
    pub entry_type: &'static str,
    pub user: UserSummary,
    pub achievement: Achievement,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<FeedRow> for FeedEntry {
    fn from(row: FeedRow) -> Self {
        FeedEntry {
            entry_type: "achievement",
            user: UserSummary {
                id: row.user_id,
                username: row.username,
                level: row.user_level,
                total_score: row.user_total_score,
            },
            achievement: row.achievement,
            timestamp: row.earned_at,
        }
    }
}
