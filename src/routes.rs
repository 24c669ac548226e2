// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{
        achievements, analytics, auth, catalog, profile, progress, search, social, system, tasks,
    },
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Builds the CORS layer from the configured origins. `*` allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}

/// Assembles the main application router.
///
/// * Nests one sub-router per API area under `/api`.
/// * Public routes: health, register/login, leaderboard, demo products and
///   the contact form. Everything else requires a bearer token.
/// * Applies global middleware (Trace, CORS) and injects the shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/me", get(auth::me))
        .route_layer(require_auth.clone())
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let task_routes = Router::new()
        .route("/", get(tasks::list_tasks))
        .route("/{id}", get(tasks::get_task))
        .route("/{id}/submit", post(tasks::submit_task))
        .route("/{id}/results", get(tasks::list_task_results))
        .route_layer(require_auth.clone());

    let achievement_routes = Router::new()
        .route("/", get(achievements::list_earned))
        .route("/available", get(achievements::list_available))
        .route("/check", post(achievements::check))
        .route_layer(require_auth.clone());

    let user_routes = Router::new()
        .route("/activity", get(profile::get_activity))
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route_layer(require_auth.clone());

    let analytics_routes = Router::new()
        .route("/overview", get(analytics::get_overview))
        .route("/performance", get(analytics::get_performance))
        .route_layer(require_auth.clone());

    let social_routes = Router::new()
        .route("/follow", post(social::follow_user))
        .route("/feed", get(social::get_feed))
        .route_layer(require_auth.clone());

    let notification_routes = Router::new()
        .route("/", get(social::list_notifications))
        .route("/{id}/read", put(social::mark_notification_read))
        .route_layer(require_auth.clone());

    let product_routes = Router::new()
        .route("/", get(catalog::list_products))
        .route("/{id}", get(catalog::get_product));

    // Single-path endpoints directly under /api
    let api_routes = Router::new()
        .route("/progress", get(progress::get_progress))
        .route("/stats", get(progress::get_stats))
        .route("/search", get(search::search))
        .route_layer(require_auth)
        .route("/health", get(system::health))
        .route("/leaderboard", get(progress::get_leaderboard))
        .route("/contact", post(catalog::submit_contact));

    Router::new()
        .route("/", get(system::root))
        .nest("/api/auth", auth_routes)
        .nest("/api/tasks", task_routes)
        .nest("/api/achievements", achievement_routes)
        .nest("/api/user", user_routes)
        .nest("/api/analytics", analytics_routes)
        .nest("/api/social", social_routes)
        .nest("/api/notifications", notification_routes)
        .nest("/api/products", product_routes)
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
