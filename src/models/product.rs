// src/models/product.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'products' table: demo storefront data learners test against.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub in_stock: bool,
    pub stock_quantity: i64,
}

/// Query parameters for listing products.
#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    /// Category filter; `all` (the default) disables it.
    pub category: Option<String>,
    /// Substring matched against the product name.
    pub search: Option<String>,
}
