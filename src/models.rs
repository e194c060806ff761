use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical identity record from the `users` table. The password hash never
/// leaves the process: API responses use `UserResponse` instead.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    // Unique login name, stored lowercase.
    pub username: String,
    pub email: String,
    // Argon2id PHC string. Internal only.
    pub password_hash: String,
    // The RBAC flag consumed by the access policy.
    pub is_admin: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Article
///
/// A priced catalogue entry from the `articles` table. Carries the owner
/// fields and the optimistic-locking version counter shared by all resource
/// kinds.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Article {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    // Incremented by exactly 1 on every successful write; never reused.
    pub version: i64,
    // Immutable after creation.
    pub created_by_id: i64,
    // Overwritten on every successful write with the acting user's id.
    pub updated_by_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Todo
///
/// A task record from the `todos` table. `is_closed` transitions false→true
/// freely; the reverse transition is reserved for admins.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_closed: bool,
    pub version: i64,
    pub created_by_id: i64,
    pub updated_by_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input for the public registration endpoint (POST /auth/register). The
/// password is hashed immediately and never persisted or logged in plain form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// LoginRequest
///
/// Input for the public login endpoint (POST /auth/login).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// TokenResponse
///
/// Output of a successful login: a signed bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
}

/// AdminUpdateUserRequest
///
/// Admin-only role override (PATCH /admin/users/{id}/role).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminUpdateUserRequest {
    pub is_admin: bool,
}

/// CreateArticleRequest
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateArticleRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
}

/// UpdateArticleRequest
///
/// Partial update payload. `Option<T>` fields implement merge semantics:
/// only provided fields are applied. `expected_version`, when supplied,
/// subjects the update to the concurrency guard as well.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateArticleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<i64>,
}

/// ReplaceArticleRequest
///
/// Full-replace payload (PUT). Must state the target id and the version the
/// caller last read; both are checked before anything is written.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct ReplaceArticleRequest {
    pub id: i64,
    pub version: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
}

/// CreateTodoRequest
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// UpdateTodoRequest
///
/// Partial update payload for todos. Setting `is_closed: false` on a closed
/// todo is the reopen attempt the policy rejects for non-admins.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateTodoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_closed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<i64>,
}

/// AdminUpdateTodoRequest
///
/// Status-only override (PATCH /admin/todos/{id}/status). Bypasses ownership
/// entirely; the policy admits admins only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminUpdateTodoRequest {
    pub is_closed: bool,
}

/// ReplaceTodoRequest
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct ReplaceTodoRequest {
    pub id: i64,
    pub version: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_closed: bool,
}

// --- Response Schemas ---

/// UserResponse
///
/// The outward-facing user shape. Mirrors `User` minus the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            version: user.version,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
