// src/config.rs

use std::env;
use dotenvy::dotenv;

/// A submission passes when it earns at least this share of the task's points.
pub const PASSING_SCORE_PERCENTAGE: i64 = 70;

/// Experience needed to advance one level.
pub const EXPERIENCE_PER_LEVEL: i64 = 100;

pub const MAX_LEVEL: i64 = 100;

/// Task categories tracked by profile and analytics endpoints.
pub const TASK_CATEGORIES: [&str; 4] = ["functional", "ui", "api", "security"];

pub const TASK_DIFFICULTIES: [&str; 3] = ["easy", "medium", "hard"];

pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;
pub const MAX_LEADERBOARD_LIMIT: i64 = 100;

/// Row cap for each section of a search response and for the activity list.
pub const SEARCH_RESULT_LIMIT: i64 = 10;

pub const FEED_LIMIT: i64 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://testing_academy.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24 * 60 * 60);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| vec!["http://localhost:3000".to_string()]);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            cors_origins,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
