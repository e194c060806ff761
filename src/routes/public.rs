use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that require no credential: liveness, registration and login.
/// Everything else in the application sits behind the Identity layer.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register
        // Creates a new non-admin account. Duplicate username/email => 409.
        .route("/auth/register", post(handlers::register_user))
        // POST /auth/login
        // Verifies credentials and issues a bearer token.
        .route("/auth/login", post(handlers::login))
}
