// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteExecutor};
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username; also the subject claim of issued tokens.
    pub username: String,

    /// Unique contact email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    #[serde(skip)]
    pub is_active: bool,

    pub level: i64,
    pub experience: i64,
    pub total_score: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_active, level, experience, total_score, created_at";

impl User {
    pub async fn find_by_id<'e>(
        executor: impl SqliteExecutor<'e>,
        id: i64,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_username<'e>(
        executor: impl SqliteExecutor<'e>,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_email<'e>(
        executor: impl SqliteExecutor<'e>,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(executor)
            .await
    }
}

/// Minimal public view of another learner (search results, feed entries).
#[derive(Debug, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub level: i64,
    pub total_score: i64,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(
        min = 3,
        max = 80,
        message = "Username length must be between 3 and 80 characters."
    ))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "A valid email is required."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 80, message = "Username is required."))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "Password is required."))]
    pub password: String,
}

/// DTO for editing one's own profile. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(
        min = 3,
        max = 80,
        message = "Username length must be between 3 and 80 characters."
    ))]
    pub username: Option<String>,
    #[validate(email(message = "A valid email is required."))]
    pub email: Option<String>,
}

/// Token payload returned by register, login and username changes.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub access_token: String,
    pub token_type: &'static str,
    pub user: User,
}
