// tests/api_tests.rs

use serde_json::{Value, json};
use sqlx::SqlitePool;
use testing_academy::{config::Config, db, routes, state::AppState};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345") and the pool so
/// tests can seed or inspect rows directly.
async fn spawn_app() -> (String, SqlitePool) {
    // 1. Every test gets its own in-memory database
    let pool = db::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    // 2. Run migrations and seed the catalog
    db::prepare(&pool).await.expect("Failed to prepare database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        cors_origins: vec!["*".to_string()],
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

fn unique_name() -> String {
    format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8])
}

/// Registers a fresh user and returns (username, token).
async fn register_user(client: &reqwest::Client, address: &str) -> (String, String) {
    let username = unique_name();
    let body: Value = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed")
        .json()
        .await
        .expect("Failed to parse register json");

    let token = body["access_token"]
        .as_str()
        .expect("Token not found")
        .to_string();
    (username, token)
}

/// The seeded expected result for task 1.
fn task_one_answer() -> Value {
    json!({
        "test_cases": [
            "Empty fields",
            "Invalid email",
            "Short password",
            "Mismatched passwords",
            "Long username"
        ]
    })
}

async fn submit(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    task_id: i64,
    answer: Value,
    time_spent: i64,
) -> Value {
    let response = client
        .post(format!("{}/api/tasks/{}/submit", address, task_id))
        .bearer_auth(token)
        .json(&json!({ "answer": answer, "time_spent": time_spent }))
        .send()
        .await
        .expect("Submit failed");

    assert_eq!(response.status().as_u16(), 200);
    response.json().await.expect("Failed to parse submit json")
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn root_and_health_respond() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let root: Value = client
        .get(format!("{}/", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(root["status"], "working");
    assert!(root["version"].is_string());

    let health: Value = client
        .get(format!("{}/api/health", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert!(health["timestamp"].is_string());
}

#[tokio::test]
async fn register_works() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_name();

    // Act
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].is_string());
    assert_eq!(body["user"]["username"], username.as_str());
    assert_eq!(body["user"]["level"], 1);
    assert_eq!(body["user"]["experience"], 0);
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_rejects_duplicates() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_name();
    let email = format!("{}@example.com", username);

    let first = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "username": username, "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    // Same username, different email
    let same_name = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "username": username,
            "email": "other@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(same_name.status().as_u16(), 400);

    // Different username, same email
    let same_email = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "username": unique_name(),
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(same_email.status().as_u16(), 400);
    let body: Value = same_email.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn register_fails_validation() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: Send a username that is too short
    let short_name = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "username": "yo",
            "email": "yo@example.com",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Missing email entirely
    let missing_email = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "username": unique_name(), "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(short_name.status().as_u16(), 400);
    assert_eq!(missing_email.status().as_u16(), 400);
}

#[tokio::test]
async fn login_and_me_flow() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (username, _) = register_user(&client, &address).await;

    let wrong_password = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": username, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_password.status().as_u16(), 401);

    let unknown_user = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": "nobody_here", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_user.status().as_u16(), 401);

    let login: Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["access_token"].as_str().expect("Token not found");

    let me = client
        .get(format!("{}/api/auth/me", address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status().as_u16(), 200);
    let me: Value = me.json().await.unwrap();
    assert_eq!(me["username"], username.as_str());

    let no_token = client
        .get(format!("{}/api/auth/me", address))
        .send()
        .await
        .unwrap();
    assert_eq!(no_token.status().as_u16(), 401);
}

#[tokio::test]
async fn disabled_account_cannot_use_token() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (username, token) = register_user(&client, &address).await;

    sqlx::query("UPDATE users SET is_active = 0 WHERE username = ?")
        .bind(&username)
        .execute(&pool)
        .await
        .unwrap();

    let me = client
        .get(format!("{}/api/auth/me", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status().as_u16(), 401);

    let login = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status().as_u16(), 401);
}

#[tokio::test]
async fn tasks_listing_and_filters() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, token) = register_user(&client, &address).await;

    let unauthorized = client
        .get(format!("{}/api/tasks", address))
        .send()
        .await
        .unwrap();
    assert_eq!(unauthorized.status().as_u16(), 401);

    let tasks: Vec<Value> = client
        .get(format!("{}/api/tasks", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tasks.len(), 3);
    // The answer key is never exposed
    assert!(tasks.iter().all(|t| t.get("expected_result").is_none()));

    let security: Vec<Value> = client
        .get(format!("{}/api/tasks?category=security", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(security.len(), 1);
    assert_eq!(security[0]["difficulty"], "hard");

    let task = client
        .get(format!("{}/api/tasks/1", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(task.status().as_u16(), 200);
    let task: Value = task.json().await.unwrap();
    assert_eq!(task["points"], 20);
    assert_eq!(task["category"], "functional");

    let missing = client
        .get(format!("{}/api/tasks/9999", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn submit_scores_correct_and_wrong_answers() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, token) = register_user(&client, &address).await;

    // Wrong answer: half points, not passing, no experience
    let wrong = submit(&client, &address, &token, 1, json!({ "test_cases": [] }), 120).await;
    assert_eq!(wrong["score"], 10);
    assert_eq!(wrong["max_score"], 20);
    assert_eq!(wrong["passed"], false);
    assert_eq!(wrong["attempts"], 1);
    assert_eq!(wrong["experience_gained"], 0);
    assert!(wrong["feedback"].as_str().unwrap().contains("partially"));
    assert!(wrong["new_achievements"].as_array().unwrap().is_empty());

    // Correct answer on the second attempt
    let right = submit(&client, &address, &token, 1, task_one_answer(), 120).await;
    assert_eq!(right["score"], 20);
    assert_eq!(right["passed"], true);
    assert_eq!(right["attempts"], 2);
    assert_eq!(right["experience_gained"], 20);

    let results: Vec<Value> = client
        .get(format!("{}/api/tasks/1/results", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    // Newest first
    assert_eq!(results[0]["attempts"], 2);
    assert_eq!(results[0]["user_answer"], task_one_answer());
}

#[tokio::test]
async fn submit_rejects_bad_requests() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, token) = register_user(&client, &address).await;

    let missing_task = client
        .post(format!("{}/api/tasks/9999/submit", address))
        .bearer_auth(&token)
        .json(&json!({ "answer": {}, "time_spent": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing_task.status().as_u16(), 404);

    let negative_time = client
        .post(format!("{}/api/tasks/1/submit", address))
        .bearer_auth(&token)
        .json(&json!({ "answer": {}, "time_spent": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(negative_time.status().as_u16(), 400);
}

#[tokio::test]
async fn malformed_answer_key_scores_zero() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, token) = register_user(&client, &address).await;

    let task_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO test_tasks (title, description, category, difficulty, points, expected_result)
        VALUES ('Broken task', 'Has an invalid answer key', 'ui', 'easy', 10, '{not json')
        RETURNING id
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let result = submit(&client, &address, &token, task_id, json!({ "anything": 1 }), 5).await;
    assert_eq!(result["score"], 0);
    assert_eq!(result["passed"], false);
    assert!(
        result["feedback"]
            .as_str()
            .unwrap()
            .starts_with("Evaluation error")
    );
}

#[tokio::test]
async fn achievement_progression_flow() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (username, token) = register_user(&client, &address).await;

    // 1. First fast, perfect pass: First Step + Speedster + Perfectionist
    let first = submit(&client, &address, &token, 1, task_one_answer(), 10).await;
    let names: Vec<&str> = first["new_achievements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["First Step", "Speedster", "Perfectionist"]);
    assert_eq!(first["level"], 1);

    let me: Value = client
        .get(format!("{}/api/auth/me", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["experience"], 20 + 10 + 25 + 30);

    // 2. Second pass earns nothing new but crosses 100 experience
    let second = submit(&client, &address, &token, 1, task_one_answer(), 100).await;
    assert!(second["new_achievements"].as_array().unwrap().is_empty());
    assert_eq!(second["level"], 2);
    assert_eq!(second["level_up"], true);

    // 3. Passing on the third attempt earns Persistent
    let third = submit(&client, &address, &token, 1, task_one_answer(), 100).await;
    assert_eq!(third["attempts"], 3);
    assert_eq!(third["new_achievements"][0]["name"], "Persistent");
    assert_eq!(third["level"], 2);
    assert_eq!(third["level_up"], false);

    // 4. Five functional passes earn Functional Tester
    submit(&client, &address, &token, 1, task_one_answer(), 100).await;
    let fifth = submit(&client, &address, &token, 1, task_one_answer(), 100).await;
    assert_eq!(fifth["new_achievements"][0]["name"], "Functional Tester");

    // Assert totals: 5 * 20 task points + 10 + 25 + 30 + 20 + 50
    let (experience, level, total_score): (i64, i64, i64) =
        sqlx::query_as("SELECT experience, level, total_score FROM users WHERE username = ?")
            .bind(&username)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(experience, 235);
    assert_eq!(level, 3);
    assert_eq!(total_score, 235);

    let earned: Vec<Value> = client
        .get(format!("{}/api/achievements", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(earned.len(), 5);

    let available: Vec<Value> = client
        .get(format!("{}/api/achievements/available", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let remaining: Vec<&str> = available
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(remaining, vec!["UI Master", "API Expert", "Security Specialist"]);

    let progress: Vec<Value> = client
        .get(format!("{}/api/progress", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0]["category"], "functional");
    assert_eq!(progress[0]["tasks_completed"], 5);
    assert_eq!(progress[0]["experience"], 100);
    assert_eq!(progress[0]["level"], 2);
}

#[tokio::test]
async fn achievement_check_never_duplicates() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (username, token) = register_user(&client, &address).await;

    submit(&client, &address, &token, 1, task_one_answer(), 10).await;

    for _ in 0..2 {
        let check = client
            .post(format!("{}/api/achievements/check", address))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(check.status().as_u16(), 200);
        let body: Value = check.json().await.unwrap();
        assert!(body["new_achievements"].as_array().unwrap().is_empty());
        assert_eq!(body["total_achievements"], 0);
    }

    let (rows, distinct): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COUNT(DISTINCT ua.achievement_id)
        FROM user_achievements ua
        JOIN users u ON u.id = ua.user_id
        WHERE u.username = ?
        "#,
    )
    .bind(&username)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(rows, 3);
    assert_eq!(distinct, 3);
}

#[tokio::test]
async fn stats_reflect_submissions() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, token) = register_user(&client, &address).await;

    submit(&client, &address, &token, 1, task_one_answer(), 10).await;

    let stats: Value = client
        .get(format!("{}/api/stats", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(stats["tasks"]["total"], 3);
    assert_eq!(stats["tasks"]["completed"], 1);
    assert_eq!(stats["achievements"]["total"], 8);
    assert_eq!(stats["achievements"]["earned"], 3);
    assert!(stats["user"]["username"].is_string());
}

fn achievement_names(submission: &Value) -> Vec<String> {
    submission["new_achievements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn failing_attempts_earn_nothing() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (username, token) = register_user(&client, &address).await;

    // Three quick failures: no Speedster, and no Persistent on attempt 3
    for attempt in 1..=3 {
        let result = submit(&client, &address, &token, 1, json!({ "test_cases": [] }), 5).await;
        assert_eq!(result["attempts"], attempt);
        assert_eq!(result["passed"], false);
        assert!(achievement_names(&result).is_empty());
    }

    // Passing on attempt 4 does not count as the 3rd-attempt pass
    let fourth = submit(&client, &address, &token, 1, task_one_answer(), 100).await;
    assert_eq!(fourth["attempts"], 4);
    assert_eq!(achievement_names(&fourth), vec!["First Step", "Perfectionist"]);

    let experience: i64 = sqlx::query_scalar("SELECT experience FROM users WHERE username = ?")
        .bind(&username)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(experience, 20 + 10 + 30);
}

#[tokio::test]
async fn speedster_includes_thirty_seconds() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (_, at_limit) = register_user(&client, &address).await;
    let result = submit(&client, &address, &at_limit, 1, task_one_answer(), 30).await;
    assert!(achievement_names(&result).contains(&"Speedster".to_string()));

    let (_, over_limit) = register_user(&client, &address).await;
    let result = submit(&client, &address, &over_limit, 1, task_one_answer(), 31).await;
    assert!(!achievement_names(&result).contains(&"Speedster".to_string()));
}

#[tokio::test]
async fn malformed_bodies_are_json_bad_requests() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, token) = register_user(&client, &address).await;

    // Wrong field type
    let wrong_type = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "username": 12345, "email": "x@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_type.status().as_u16(), 400);
    let body: Value = wrong_type.json().await.unwrap();
    assert!(body["error"].is_string());

    // Broken JSON
    let broken = client
        .post(format!("{}/api/tasks/1/submit", address))
        .bearer_auth(&token)
        .header("Content-Type", "application/json")
        .body("{\"answer\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(broken.status().as_u16(), 400);
    let body: Value = broken.json().await.unwrap();
    assert!(body["error"].is_string());

    // Non-numeric path id
    let bad_id = client
        .get(format!("{}/api/tasks/abc", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(bad_id.status().as_u16(), 400);
    let body: Value = bad_id.json().await.unwrap();
    assert!(body["error"].is_string());

    // Non-numeric query parameter
    let bad_query = client
        .post(format!("{}/api/social/follow?user_id=abc", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(bad_query.status().as_u16(), 400);
    let body: Value = bad_query.json().await.unwrap();
    assert!(body["error"].is_string());
}
