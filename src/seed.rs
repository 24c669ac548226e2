// src/seed.rs

use serde_json::json;
use sqlx::SqlitePool;

use crate::achievements::ACHIEVEMENT_RULES;

/// Inserts the achievement catalog, starter tasks and demo products.
///
/// Achievements are upserted by id so the catalog always matches the rule
/// table; tasks and products are only inserted into empty tables.
pub async fn seed_catalog(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for rule in ACHIEVEMENT_RULES.iter() {
        sqlx::query(
            r#"
            INSERT INTO achievements (id, name, description, icon, points, category)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                icon = excluded.icon,
                points = excluded.points,
                category = excluded.category
            "#,
        )
        .bind(rule.id)
        .bind(rule.name)
        .bind(rule.description)
        .bind(rule.icon)
        .bind(rule.points)
        .bind(rule.category)
        .execute(&mut *tx)
        .await?;
    }

    let task_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test_tasks")
        .fetch_one(&mut *tx)
        .await?;
    if task_count == 0 {
        tracing::info!("Seeding starter tasks");
        for task in starter_tasks() {
            sqlx::query(
                r#"
                INSERT INTO test_tasks
                    (title, description, category, difficulty, points, test_data, expected_result, hints)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(task.title)
            .bind(task.description)
            .bind(task.category)
            .bind(task.difficulty)
            .bind(task.points)
            .bind(task.test_data.to_string())
            .bind(task.expected_result.to_string())
            .bind(task.hints.to_string())
            .execute(&mut *tx)
            .await?;
        }
    }

    let product_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&mut *tx)
        .await?;
    if product_count == 0 {
        tracing::info!("Seeding demo products");
        for (name, description, price, category, stock) in DEMO_PRODUCTS {
            sqlx::query(
                r#"
                INSERT INTO products (name, description, price, category, in_stock, stock_quantity)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(name)
            .bind(description)
            .bind(price)
            .bind(category)
            .bind(stock > 0)
            .bind(stock)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

struct SeedTask {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    difficulty: &'static str,
    points: i64,
    test_data: serde_json::Value,
    expected_result: serde_json::Value,
    hints: serde_json::Value,
}

fn starter_tasks() -> Vec<SeedTask> {
    vec![
        SeedTask {
            title: "Registration form testing",
            description: "Test the registration form on the site. Find every possible validation error.",
            category: "functional",
            difficulty: "easy",
            points: 20,
            test_data: json!({
                "form_fields": ["username", "email", "password", "confirm_password"],
                "validation_rules": {
                    "username": {"min_length": 3, "max_length": 20, "required": true},
                    "email": {"format": "email", "required": true},
                    "password": {"min_length": 6, "required": true},
                    "confirm_password": {"match": "password", "required": true}
                }
            }),
            expected_result: json!({
                "test_cases": [
                    "Empty fields",
                    "Invalid email",
                    "Short password",
                    "Mismatched passwords",
                    "Long username"
                ]
            }),
            hints: json!([
                "Try submitting the form with empty fields",
                "Check the email format validation",
                "Try a password shorter than 6 characters"
            ]),
        },
        SeedTask {
            title: "API endpoint testing",
            description: "Test the /api/products endpoint. Check different request scenarios.",
            category: "api",
            difficulty: "medium",
            points: 30,
            test_data: json!({
                "endpoint": "/api/products",
                "methods": ["GET"],
                "parameters": ["category", "search"]
            }),
            expected_result: json!({
                "test_cases": [
                    "GET without parameters",
                    "GET with category parameter",
                    "GET with search parameter",
                    "GET with invalid parameters"
                ]
            }),
            hints: json!([
                "Use Postman or curl for testing",
                "Check different values of the category parameter",
                "Search for a product that does not exist"
            ]),
        },
        SeedTask {
            title: "Security testing",
            description: "Check the site for vulnerabilities. Try SQL injection and XSS attacks.",
            category: "security",
            difficulty: "hard",
            points: 50,
            test_data: json!({
                "target_fields": ["search", "username", "email"],
                "attack_vectors": ["SQL injection", "XSS", "CSRF"]
            }),
            expected_result: json!({
                "expected_behavior": [
                    "SQL injection protection",
                    "XSS escaping",
                    "CSRF tokens"
                ]
            }),
            hints: json!([
                "Try entering ' OR 1=1 -- in the search field",
                "Try <script>alert('XSS')</script> in text fields",
                "Check forms for CSRF tokens"
            ]),
        },
    ]
}

const DEMO_PRODUCTS: [(&str, &str, f64, &str, i64); 5] = [
    ("Smartphone", "Modern smartphone", 25000.0, "electronics", 10),
    ("Laptop", "Gaming laptop", 75000.0, "electronics", 5),
    ("Python Book", "Python programming textbook", 1500.0, "books", 20),
    ("T-shirt", "Cotton t-shirt", 800.0, "clothing", 50),
    ("Flower Pot", "Ceramic flower pot", 300.0, "home", 15),
];
