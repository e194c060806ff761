use crate::{AppState, handlers};
use axum::{Router, routing::patch};

/// Admin Router Module
///
/// Override endpoints nested under /admin. These implement the adminUpdate
/// action: status-only writes that bypass ownership entirely. The router is
/// wrapped in the same Identity layer as the authenticated routes; the
/// policy engine then rejects any non-admin identity with 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // PATCH /admin/todos/{id}/status
        // Force-close or force-open any todo. This is the only way a closed
        // todo gets reopened — owners cannot do it themselves.
        .route("/todos/{id}/status", patch(handlers::update_todo_status))
        // PATCH /admin/users/{id}/role
        // Grant or revoke the admin flag.
        .route("/users/{id}/role", patch(handlers::update_user_role))
}
