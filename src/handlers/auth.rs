// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{AuthResponse, LoginRequest, RegisterRequest, User},
    utils::{
        extract::AppJson,
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

/// Resolves the token to a stored, active user.
///
/// The token's user id and username must both still match, so a token whose
/// user was renamed, removed or deactivated is rejected with 401, even when
/// another account has since taken the old username.
pub async fn current_user(pool: &SqlitePool, claims: &Claims) -> Result<User, AppError> {
    let user = User::find_by_id(pool, claims.uid)
        .await?
        .filter(|user| user.username == claims.sub)
        .ok_or_else(|| AppError::AuthError("Could not validate credentials".to_string()))?;

    if !user.is_active {
        return Err(AppError::AuthError("Account is disabled".to_string()));
    }

    Ok(user)
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with an access token and the user (excluding password).
pub async fn register(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if User::find_by_username(&pool, &payload.username).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "Username '{}' already exists",
            payload.username
        )));
    }

    if User::find_by_email(&pool, &payload.email).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "Email '{}' is already registered",
            payload.email
        )));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&hashed_password)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Lost a race with a concurrent registration
        if is_unique_violation(&e) {
            AppError::BadRequest("Username or email already exists".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    let user = User::find_by_id(&pool, user_id)
        .await?
        .ok_or_else(|| AppError::InternalServerError("Registered user vanished".to_string()))?;

    let token = sign_jwt(user.id, &user.username, &config.jwt_secret, config.jwt_expiration)?;
    tracing::info!("Registered user '{}' (id {})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            access_token: token,
            token_type: "bearer",
            user,
        }),
    ))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown usernames and wrong passwords produce the same 401.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let invalid = || AppError::AuthError("Invalid credentials".to_string());

    let user = User::find_by_username(&pool, &payload.username)
        .await
        .map_err(|e| {
            tracing::error!("Login DB error: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::AuthError("Account is disabled".to_string()));
    }

    let token = sign_jwt(user.id, &user.username, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(AuthResponse {
        message: "Logged in successfully".to_string(),
        access_token: token,
        token_type: "bearer",
        user,
    }))
}

/// Returns the authenticated user.
pub async fn me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;
    Ok(Json(user))
}
