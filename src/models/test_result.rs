// src/models/test_result.rs

use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

use crate::models::achievement::Achievement;

/// Represents the 'test_results' table: one attempt by one user on one task.
#[derive(Debug, Clone, FromRow)]
pub struct TestResult {
    pub id: i64,
    pub user_id: i64,
    pub task_id: i64,
    pub score: i64,
    pub max_score: i64,
    pub passed: bool,

    /// 1-based attempt number for this (user, task) pair.
    pub attempts: i64,

    /// Seconds spent on the attempt.
    pub time_spent: Option<i64>,

    /// Submitted answer as JSON text.
    pub user_answer: Option<String>,
    pub feedback: Option<String>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

pub const RESULT_COLUMNS: &str = "id, user_id, task_id, score, max_score, passed, attempts, \
     time_spent, user_answer, feedback, completed_at";

#[derive(Debug, Serialize)]
pub struct TestResultResponse {
    pub id: i64,
    pub task_id: i64,
    pub score: i64,
    pub max_score: i64,
    pub passed: bool,
    pub attempts: i64,
    pub time_spent: Option<i64>,
    pub user_answer: Option<Value>,
    pub feedback: Option<String>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl From<TestResult> for TestResultResponse {
    fn from(r: TestResult) -> Self {
        TestResultResponse {
            user_answer: r
                .user_answer
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok()),
            id: r.id,
            task_id: r.task_id,
            score: r.score,
            max_score: r.max_score,
            passed: r.passed,
            attempts: r.attempts,
            time_spent: r.time_spent,
            feedback: r.feedback,
            completed_at: r.completed_at,
        }
    }
}

/// Recent attempt joined with its task title.
#[derive(Debug, Serialize, FromRow)]
pub struct ActivityEntry {
    pub id: i64,
    pub task_id: i64,
    /// NULL when the task row has been removed.
    #[serde(skip)]
    pub title: Option<String>,
    #[sqlx(skip)]
    pub task_title: String,
    pub score: i64,
    pub max_score: i64,
    pub passed: bool,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    pub time_spent: Option<i64>,
}

impl ActivityEntry {
    /// Fills `task_title`, falling back to `Task #<id>` for orphaned results.
    pub fn with_title(mut self) -> Self {
        self.task_title = self
            .title
            .clone()
            .unwrap_or_else(|| format!("Task #{}", self.task_id));
        self
    }
}

/// Result of scoring a submission.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub score: i64,
    pub max_score: i64,
    pub passed: bool,
    pub feedback: String,
    pub attempts: i64,
    pub experience_gained: i64,
    pub level: i64,
    pub level_up: bool,
    pub new_achievements: Vec<Achievement>,
}
