// src/handlers/search.rs

use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    config::SEARCH_RESULT_LIMIT,
    error::AppError,
    handlers::auth::current_user,
    models::{
        achievement::Achievement,
        task::{TASK_COLUMNS, TaskResponse, TestTask},
        user::UserSummary,
    },
    utils::{extract::AppQuery, jwt::Claims},
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    /// Restricts task matches to one category.
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub tasks: Vec<TaskResponse>,
    pub users: Vec<UserSummary>,
    pub achievements: Vec<Achievement>,
}

/// Substring search over tasks, users and achievements, ignoring ASCII case.
pub async fn search(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    AppQuery(params): AppQuery<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    current_user(&pool, &claims).await?;

    // Term and columns are both folded by SQLite lower(), which only folds ASCII
    let term = params.q.trim().to_string();
    if term.is_empty() {
        return Err(AppError::BadRequest("Search query is required".to_string()));
    }

    let mut task_query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {TASK_COLUMNS} FROM test_tasks WHERE (instr(lower(title), lower("
    ));
    task_query
        .push_bind(term.clone())
        .push(")) > 0 OR instr(lower(description), lower(")
        .push_bind(term.clone())
        .push(")) > 0)");
    if let Some(category) = params.category.filter(|c| !c.is_empty()) {
        task_query.push(" AND category = ").push_bind(category);
    }
    task_query.push(" ORDER BY id LIMIT ").push_bind(SEARCH_RESULT_LIMIT);

    let tasks: Vec<TestTask> = task_query.build_query_as().fetch_all(&pool).await?;

    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT id, username, level, total_score
        FROM users
        WHERE instr(lower(username), lower(?)) > 0
        ORDER BY id
        LIMIT ?
        "#,
    )
    .bind(&term)
    .bind(SEARCH_RESULT_LIMIT)
    .fetch_all(&pool)
    .await?;

    let achievements = sqlx::query_as::<_, Achievement>(
        r#"
        SELECT id, name, description, icon, points, category
        FROM achievements
        WHERE instr(lower(name), lower(?1)) > 0
           OR instr(lower(COALESCE(description, '')), lower(?1)) > 0
        ORDER BY id
        LIMIT ?2
        "#,
    )
    .bind(&term)
    .bind(SEARCH_RESULT_LIMIT)
    .fetch_all(&pool)
    .await?;

    Ok(Json(SearchResponse {
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
        users,
        achievements,
    }))
}
