use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core decision logic: policy, guard and the mutation orchestrator.
pub mod guard;
pub mod orchestrator;
pub mod policy;

// Application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod seed;
pub mod store;

// Routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::Identity; // The resolved caller identity of one request.
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the binary entry point.
pub use config::AppConfig;
pub use orchestrator::Orchestrator;
pub use store::{SqliteStore, StoreState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) by aggregating all
/// paths and schemas decorated with `#[utoipa::path]` and
/// `#[derive(utoipa::ToSchema)]`. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login,
        handlers::create_article, handlers::get_articles, handlers::get_article_details,
        handlers::update_article, handlers::replace_article, handlers::delete_article,
        handlers::create_todo, handlers::get_todos, handlers::get_todo_details,
        handlers::update_todo, handlers::replace_todo, handlers::delete_todo,
        handlers::update_todo_status,
        handlers::get_users, handlers::get_user_details, handlers::update_user_role,
        handlers::delete_user
    ),
    components(
        schemas(
            models::Article, models::Todo, models::UserResponse,
            models::CreateArticleRequest, models::UpdateArticleRequest,
            models::ReplaceArticleRequest,
            models::CreateTodoRequest, models::UpdateTodoRequest,
            models::ReplaceTodoRequest, models::AdminUpdateTodoRequest,
            models::RegisterUserRequest, models::LoginRequest,
            models::TokenResponse, models::AdminUpdateUserRequest,
            error::ErrorBody,
        )
    ),
    tags(
        (name = "workboard", description = "Todo & Article Tracking API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all application
/// services and configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// The mutation orchestrator: policy + guard + store sequencing.
    pub core: Arc<Orchestrator>,
    /// Store handle, needed directly by the Identity extractor for the
    /// per-request user lookup.
    pub store: StoreState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Allow extractors to selectively pull components from the shared AppState.

impl FromRef<AppState> for StoreState {
    fn from_ref(app_state: &AppState) -> StoreState {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the protected routers. It attempts to extract
/// `Identity` from the request; since `Identity` implements
/// `FromRequestParts`, a failed resolution (bad/expired token, deleted user)
/// rejects the request with 401 before any handler runs.
async fn auth_middleware(_identity: Identity, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware applied.
        .merge(public::public_routes())
        // Authenticated routes: protected by the Identity layer.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Admin override routes, nested under '/admin'. Same Identity layer;
        // the admin check itself is the policy engine's job.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation: a unique id per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request tracing: wraps the request/response lifecycle
                // in a span carrying the generated request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS layer (applied last)
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the tracing span so that every log line for a single request
/// is correlated by its x-request-id alongside method and URI.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
