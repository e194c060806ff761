use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Every route here requires a resolved Identity (the extractor middleware
/// on the layer above rejects everything else). The handlers themselves
/// carry no authorization logic: each one maps its verb onto a core action
/// and the policy engine decides. That is why the delete routes live here
/// rather than under /admin — a non-admin caller is turned away with 403 by
/// the policy, uniformly for todos, articles and users.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Articles ---
        // POST   /articles          create (any authenticated identity)
        // GET    /articles          readAll (scope narrowed by policy)
        .route(
            "/articles",
            post(handlers::create_article).get(handlers::get_articles),
        )
        // GET    /articles/{id}     readOne
        // PATCH  /articles/{id}     update (merge semantics)
        // PUT    /articles/{id}     replace (id + version checked)
        // DELETE /articles/{id}     remove (admin only, via policy)
        .route(
            "/articles/{id}",
            get(handlers::get_article_details)
                .patch(handlers::update_article)
                .put(handlers::replace_article)
                .delete(handlers::delete_article),
        )
        // --- Todos ---
        .route(
            "/todos",
            post(handlers::create_todo).get(handlers::get_todos),
        )
        .route(
            "/todos/{id}",
            get(handlers::get_todo_details)
                .patch(handlers::update_todo)
                .put(handlers::replace_todo)
                .delete(handlers::delete_todo),
        )
        // --- Users ---
        // GET /users, GET /users/{id}: any authenticated identity.
        // DELETE /users/{id}: admin only, via policy.
        .route("/users", get(handlers::get_users))
        .route(
            "/users/{id}",
            get(handlers::get_user_details).delete(handlers::delete_user),
        )
}
