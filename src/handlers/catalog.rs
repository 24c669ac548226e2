// src/handlers/catalog.rs

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        contact::ContactRequest,
        product::{Product, ProductListParams},
    },
    utils::{
        extract::{AppJson, AppPath, AppQuery},
        html::clean_html,
    },
};

/// Lists demo products, optionally filtered by category and name substring.
pub async fn list_products(
    State(pool): State<SqlitePool>,
    AppQuery(params): AppQuery<ProductListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut query_builder = QueryBuilder::<Sqlite>::new(
        "SELECT id, name, description, price, category, in_stock, stock_quantity \
         FROM products WHERE 1 = 1",
    );

    if let Some(category) = params.category.filter(|c| !c.is_empty() && c != "all") {
        query_builder.push(" AND category = ").push_bind(category);
    }
    if let Some(search) = params.search.filter(|s| !s.is_empty()) {
        // instr() is a plain substring test, so `%` and `_` in the term match literally
        query_builder
            .push(" AND instr(lower(name), lower(")
            .push_bind(search)
            .push(")) > 0");
    }
    query_builder.push(" ORDER BY id");

    let products: Vec<Product> = query_builder.build_query_as().fetch_all(&pool).await?;
    Ok(Json(products))
}

/// Retrieves a single product by ID.
pub async fn get_product(
    State(pool): State<SqlitePool>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, description, price, category, in_stock, stock_quantity
        FROM products
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

/// Stores a message from the public contact form.
pub async fn submit_contact(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<ContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO contact_messages (name, email, subject, message)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(clean_html(&payload.name))
    .bind(&payload.email)
    .bind(clean_html(&payload.subject))
    .bind(clean_html(&payload.message))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store contact message: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!("Stored contact message {}", id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Message sent successfully" })),
    ))
}
