// src/handlers/tasks.rs

use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    achievements::{add_experience, evaluate_achievements},
    error::AppError,
    handlers::auth::current_user,
    models::{
        task::{SubmitTaskRequest, TASK_COLUMNS, TaskListParams, TaskResponse, TestTask},
        test_result::{RESULT_COLUMNS, SubmissionResponse, TestResult, TestResultResponse},
    },
    scoring::{calculate_level, evaluate_answer, is_passing},
    utils::{
        extract::{AppJson, AppPath, AppQuery},
        jwt::Claims,
    },
};

async fn find_task(pool: &SqlitePool, id: i64) -> Result<TestTask, AppError> {
    sqlx::query_as::<_, TestTask>(&format!("SELECT {TASK_COLUMNS} FROM test_tasks WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Task not found".to_string()))
}

/// Lists active tasks, optionally filtered by category and difficulty.
pub async fn list_tasks(
    State(pool): State<SqlitePool>,
    AppQuery(params): AppQuery<TaskListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut query_builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {TASK_COLUMNS} FROM test_tasks WHERE is_active = 1"
    ));

    if let Some(category) = params.category.filter(|c| !c.is_empty()) {
        query_builder.push(" AND category = ").push_bind(category);
    }
    if let Some(difficulty) = params.difficulty.filter(|d| !d.is_empty()) {
        query_builder.push(" AND difficulty = ").push_bind(difficulty);
    }
    query_builder.push(" ORDER BY id");

    let tasks: Vec<TestTask> = query_builder
        .build_query_as()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list tasks: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    let tasks: Vec<TaskResponse> = tasks.into_iter().map(TaskResponse::from).collect();
    Ok(Json(tasks))
}

/// Retrieves a single task by ID.
pub async fn get_task(
    State(pool): State<SqlitePool>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let task = find_task(&pool, id).await?;
    Ok(Json(TaskResponse::from(task)))
}

/// Scores a submitted answer and records the attempt.
///
/// * Recording the result, granting experience, updating the category
///   rollup and awarding achievements happen in one transaction.
/// * Experience is only granted for passing submissions.
pub async fn submit_task(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<SubmitTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.time_spent < 0 {
        return Err(AppError::BadRequest("time_spent must not be negative".to_string()));
    }

    let user = current_user(&pool, &claims).await?;
    let task = find_task(&pool, id).await?;
    if !task.is_active {
        return Err(AppError::NotFound("Task not found".to_string()));
    }

    let evaluation = evaluate_answer(task.expected_result.as_deref(), task.points, &req.answer);
    let passed = is_passing(evaluation.score, task.points);

    let mut tx = pool.begin().await?;

    // Attempt number is derived inside the INSERT so two concurrent
    // submissions cannot both claim the same attempt.
    let attempts: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO test_results
            (user_id, task_id, score, max_score, passed, attempts, time_spent, user_answer, feedback)
        VALUES (
            ?1, ?2, ?3, ?4, ?5,
            (SELECT COUNT(*) + 1 FROM test_results WHERE user_id = ?1 AND task_id = ?2),
            ?6, ?7, ?8
        )
        RETURNING attempts
        "#,
    )
    .bind(user.id)
    .bind(task.id)
    .bind(evaluation.score)
    .bind(task.points)
    .bind(passed)
    .bind(req.time_spent)
    .bind(req.answer.to_string())
    .bind(&evaluation.feedback)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to record test result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // Read after the INSERT, which already holds the write lock
    let starting_level: i64 = sqlx::query_scalar("SELECT level FROM users WHERE id = ?")
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;

    let mut level = starting_level;
    if passed {
        level = add_experience(&mut tx, user.id, evaluation.score).await?.current;
        record_category_progress(&mut tx, user.id, &task.category, evaluation.score).await?;
    }

    let new_achievements = evaluate_achievements(&mut tx, user.id).await?;
    if !new_achievements.is_empty() {
        level = sqlx::query_scalar("SELECT level FROM users WHERE id = ?")
            .bind(user.id)
            .fetch_one(&mut *tx)
            .await?;
    }
    let level_up = level > starting_level;

    tx.commit().await?;

    tracing::info!(
        "User '{}' scored {}/{} on task {} (attempt {}, passed: {})",
        user.username,
        evaluation.score,
        task.points,
        task.id,
        attempts,
        passed
    );

    Ok(Json(SubmissionResponse {
        score: evaluation.score,
        max_score: task.points,
        passed,
        feedback: evaluation.feedback,
        attempts,
        experience_gained: if passed { evaluation.score } else { 0 },
        level,
        level_up,
        new_achievements,
    }))
}

/// Adds a passed task to the user's per-category rollup.
async fn record_category_progress(
    conn: &mut sqlx::SqliteConnection,
    user_id: i64,
    category: &str,
    score: i64,
) -> Result<(), sqlx::Error> {
    let experience: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO learning_progress (user_id, category, experience, tasks_completed)
        VALUES (?, ?, ?, 1)
        ON CONFLICT(user_id, category) DO UPDATE SET
            experience = experience + excluded.experience,
            tasks_completed = tasks_completed + 1,
            last_activity = CURRENT_TIMESTAMP
        RETURNING experience
        "#,
    )
    .bind(user_id)
    .bind(category)
    .bind(score)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query("UPDATE learning_progress SET level = ? WHERE user_id = ? AND category = ?")
        .bind(calculate_level(experience))
        .bind(user_id)
        .bind(category)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Lists the caller's attempts on one task, newest first.
pub async fn list_task_results(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;
    let task = find_task(&pool, id).await?;

    let results = sqlx::query_as::<_, TestResult>(&format!(
        "SELECT {RESULT_COLUMNS} FROM test_results \
         WHERE user_id = ? AND task_id = ? \
         ORDER BY completed_at DESC, id DESC"
    ))
    .bind(user.id)
    .bind(task.id)
    .fetch_all(&pool)
    .await?;

    let results: Vec<TestResultResponse> = results.into_iter().map(Into::into).collect();
    Ok(Json(results))
}
