// src/models/task.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Represents the 'test_tasks' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct TestTask {
    pub id: i64,
    pub title: String,
    pub description: String,

    /// One of `functional`, `ui`, `api`, `security`.
    pub category: String,

    /// One of `easy`, `medium`, `hard`.
    pub difficulty: String,

    /// Maximum score a submission can earn.
    pub points: i64,

    /// JSON documents kept as raw text.
    pub test_data: Option<String>,
    pub expected_result: Option<String>,
    pub hints: Option<String>,

    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub const TASK_COLUMNS: &str = "id, title, description, category, difficulty, points, \
     test_data, expected_result, hints, is_active, created_at";

/// DTO for sending a task to the client.
/// JSON columns are decoded and the expected result is never included.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub points: i64,
    pub test_data: Option<Value>,
    pub hints: Option<Value>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<TestTask> for TaskResponse {
    fn from(task: TestTask) -> Self {
        TaskResponse {
            test_data: parse_json_column(task.id, task.test_data.as_deref()),
            hints: parse_json_column(task.id, task.hints.as_deref()),
            id: task.id,
            title: task.title,
            description: task.description,
            category: task.category,
            difficulty: task.difficulty,
            points: task.points,
            is_active: task.is_active,
            created_at: task.created_at,
        }
    }
}

/// Decodes a JSON text column. Blank or malformed content becomes `None`.
pub fn parse_json_column(task_id: i64, raw: Option<&str>) -> Option<Value> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Task {} holds malformed JSON: {}", task_id, e);
            None
        }
    }
}

/// Query parameters for listing tasks.
#[derive(Debug, Deserialize)]
pub struct TaskListParams {
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

/// DTO for submitting an answer to a task.
#[derive(Debug, Deserialize)]
pub struct SubmitTaskRequest {
    /// Arbitrary JSON compared against the stored expected result.
    #[serde(default = "empty_object")]
    pub answer: Value,

    /// Seconds the learner spent on the attempt.
    #[serde(default)]
    pub time_spent: i64,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}
