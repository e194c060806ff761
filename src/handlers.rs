use crate::{
    AppState, auth,
    auth::Identity,
    error::ApiError,
    models::{
        AdminUpdateTodoRequest, AdminUpdateUserRequest, Article, CreateArticleRequest,
        CreateTodoRequest, LoginRequest, RegisterUserRequest, ReplaceArticleRequest,
        ReplaceTodoRequest, Todo, TokenResponse, UpdateArticleRequest, UpdateTodoRequest,
        UserResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

// Handlers are the transport adapter: they map HTTP verbs onto the core's
// action vocabulary and hand everything to the orchestrator. No authorization
// logic lives here — the policy engine decides, uniformly.

// --- Auth ---

/// register_user
///
/// [Public Route] Creates a new (non-admin) account. The password is hashed
/// before it touches the store; duplicates yield 409.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = UserResponse),
        (status = 409, description = "Username or email taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.core.register_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// login
///
/// [Public Route] Verifies the credentials and issues a bearer token.
/// Unknown username and wrong password are deliberately indistinguishable.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .core
        .verify_credentials(&payload.username, &payload.password)
        .await?;
    let access_token = auth::issue_token(&state.config, &user)?;
    Ok(Json(TokenResponse { access_token }))
}

// --- Articles ---

/// create_article
///
/// [Authenticated Route] Ownership is fixed to the creator.
#[utoipa::path(
    post,
    path = "/articles",
    request_body = CreateArticleRequest,
    responses((status = 201, description = "Created", body = Article))
)]
pub async fn create_article(
    identity: Identity,
    State(state): State<AppState>,
    Json(payload): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let article = state.core.create_article(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

/// get_articles
///
/// [Authenticated Route] Admins see all articles; everyone else sees their
/// own.
#[utoipa::path(
    get,
    path = "/articles",
    responses((status = 200, description = "Articles in scope", body = [Article]))
)]
pub async fn get_articles(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<Article>>, ApiError> {
    Ok(Json(state.core.list_articles(&identity).await?))
}

/// get_article_details
#[utoipa::path(
    get,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = Article),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_article_details(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.core.get_article(&identity, id).await?))
}

/// update_article
///
/// [Authenticated Route] Partial update with merge semantics. Stating
/// `expected_version` additionally arms the concurrency guard.
#[utoipa::path(
    patch,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Updated", body = Article),
        (status = 409, description = "Stale version")
    )
)]
pub async fn update_article(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateArticleRequest>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.core.update_article(&identity, id, payload).await?))
}

/// replace_article
///
/// [Authenticated Route] Full replace. The payload must restate the id and
/// the version last read; either mismatch yields 409.
#[utoipa::path(
    put,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = ReplaceArticleRequest,
    responses(
        (status = 200, description = "Replaced", body = Article),
        (status = 409, description = "Version or id mismatch")
    )
)]
pub async fn replace_article(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ReplaceArticleRequest>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(
        state.core.replace_article(&identity, id, payload).await?,
    ))
}

/// delete_article
///
/// [Authenticated Route] Removal is admin-only; owners get 403.
#[utoipa::path(
    delete,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_article(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.core.remove_article(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Todos ---

/// create_todo
///
/// [Authenticated Route] New todos start open.
#[utoipa::path(
    post,
    path = "/todos",
    request_body = CreateTodoRequest,
    responses((status = 201, description = "Created", body = Todo))
)]
pub async fn create_todo(
    identity: Identity,
    State(state): State<AppState>,
    Json(payload): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = state.core.create_todo(&identity, payload).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// get_todos
///
/// [Authenticated Route] Admins see everything; non-admins see their own
/// todos, with closed ones included only if the listing policy says so.
#[utoipa::path(
    get,
    path = "/todos",
    responses((status = 200, description = "Todos in scope", body = [Todo]))
)]
pub async fn get_todos(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.core.list_todos(&identity).await?))
}

/// get_todo_details
///
/// [Authenticated Route] A closed todo is a 404 for its non-admin owner,
/// indistinguishable from an absent one.
#[utoipa::path(
    get,
    path = "/todos/{id}",
    params(("id" = i64, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Found", body = Todo),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Not found or closed")
    )
)]
pub async fn get_todo_details(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.core.get_todo(&identity, id).await?))
}

/// update_todo
///
/// [Authenticated Route] Partial update. A payload with `is_closed: false`
/// against a closed todo is a reopen attempt and is rejected for non-admins.
#[utoipa::path(
    patch,
    path = "/todos/{id}",
    params(("id" = i64, Path, description = "Todo ID")),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Updated", body = Todo),
        (status = 403, description = "Not owner or reopen attempt"),
        (status = 409, description = "Stale version")
    )
)]
pub async fn update_todo(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTodoRequest>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.core.update_todo(&identity, id, payload).await?))
}

/// replace_todo
#[utoipa::path(
    put,
    path = "/todos/{id}",
    params(("id" = i64, Path, description = "Todo ID")),
    request_body = ReplaceTodoRequest,
    responses(
        (status = 200, description = "Replaced", body = Todo),
        (status = 409, description = "Version or id mismatch")
    )
)]
pub async fn replace_todo(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ReplaceTodoRequest>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.core.replace_todo(&identity, id, payload).await?))
}

/// delete_todo
///
/// [Authenticated Route] Admin-only, even against the owner.
#[utoipa::path(
    delete,
    path = "/todos/{id}",
    params(("id" = i64, Path, description = "Todo ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_todo(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.core.remove_todo(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// update_todo_status
///
/// [Admin Route] Force-closes or force-opens any todo, bypassing ownership.
#[utoipa::path(
    patch,
    path = "/admin/todos/{id}/status",
    params(("id" = i64, Path, description = "Todo ID")),
    request_body = AdminUpdateTodoRequest,
    responses(
        (status = 200, description = "Updated", body = Todo),
        (status = 403, description = "Not admin")
    )
)]
pub async fn update_todo_status(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateTodoRequest>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(
        state.core.admin_update_todo(&identity, id, payload).await?,
    ))
}

// --- Users ---

/// get_users
///
/// [Authenticated Route] Lists all accounts (without password material).
#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "Users", body = [UserResponse]))
)]
pub async fn get_users(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    Ok(Json(state.core.list_users(&identity).await?))
}

/// get_user_details
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user_details(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(state.core.get_user(&identity, id).await?))
}

/// update_user_role
///
/// [Admin Route] Grants or revokes the admin flag.
#[utoipa::path(
    patch,
    path = "/admin/users/{id}/role",
    params(("id" = i64, Path, description = "User ID")),
    request_body = AdminUpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 403, description = "Not admin")
    )
)]
pub async fn update_user_role(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(
        state.core.admin_update_user(&identity, id, payload).await?,
    ))
}

/// delete_user
///
/// [Authenticated Route] Admin-only removal.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.core.remove_user(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
