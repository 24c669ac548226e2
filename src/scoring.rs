// src/scoring.rs

use serde_json::Value;

use crate::config::{EXPERIENCE_PER_LEVEL, MAX_LEVEL, PASSING_SCORE_PERCENTAGE};

/// Outcome of checking one submitted answer against a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub score: i64,
    pub feedback: String,
}

/// Scores a submitted answer against the task's stored expected result.
///
/// * Structurally equal JSON earns the full `points`.
/// * Any other answer earns `points / 2` (floor).
/// * Stored data that is not valid JSON earns nothing.
///
/// A missing or blank expected result is treated as an empty object.
pub fn evaluate_answer(expected_result: Option<&str>, points: i64, answer: &Value) -> Evaluation {
    let expected = match expected_result.map(str::trim).filter(|s| !s.is_empty()) {
        None => Value::Object(Default::default()),
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Task has malformed expected_result: {}", e);
                return Evaluation {
                    score: 0,
                    feedback: format!("Evaluation error: {}", e),
                };
            }
        },
    };

    if answer == &expected {
        Evaluation {
            score: points,
            feedback: "Excellent! The task is completed correctly.".to_string(),
        }
    } else {
        Evaluation {
            score: points / 2,
            feedback: "The task is partially completed. Check the details.".to_string(),
        }
    }
}

/// True when `score` reaches the passing share of `max_score`.
pub fn is_passing(score: i64, max_score: i64) -> bool {
    score * 100 >= max_score * PASSING_SCORE_PERCENTAGE
}

/// Maps cumulative experience to a level in `1..=MAX_LEVEL`.
pub fn calculate_level(experience: i64) -> i64 {
    (experience.max(0) / EXPERIENCE_PER_LEVEL + 1).min(MAX_LEVEL)
}
