use crate::models::{Article, Todo, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqlitePool, query_builder::QueryBuilder};
use std::sync::Arc;

/// Store Trait
///
/// The abstract contract for all persistence operations, keyed by integer id
/// per resource kind. The orchestrator interacts with the data layer through
/// this trait only, so the concrete backend (SQLite here, a mock in tests)
/// stays swappable.
///
/// Contract: every `save_*` method persists the given row AND atomically
/// increments its `version` by exactly 1 and refreshes `updated_at`, in a
/// single statement conditioned on the version of the snapshot being saved.
/// The value a caller read is a snapshot that may be stale by the time it
/// writes; a save whose snapshot version no longer matches the stored row
/// writes nothing and returns `None`.
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn Store>`)
/// safely shareable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Store: Send + Sync {
    // --- Articles ---
    async fn get_article(&self, id: i64) -> Result<Option<Article>, sqlx::Error>;
    /// Inserts a new row with version 1 and both owner fields set to `owner`.
    async fn insert_article(&self, article: &Article) -> Result<Article, sqlx::Error>;
    /// Persists mutable fields; bumps version and updated_at atomically.
    /// `None` when the stored version moved since the snapshot was read.
    async fn save_article(&self, article: &Article) -> Result<Option<Article>, sqlx::Error>;
    async fn remove_article(&self, id: i64) -> Result<(), sqlx::Error>;
    async fn find_articles(&self, created_by: Option<i64>) -> Result<Vec<Article>, sqlx::Error>;

    // --- Todos ---
    async fn get_todo(&self, id: i64) -> Result<Option<Todo>, sqlx::Error>;
    async fn insert_todo(&self, todo: &Todo) -> Result<Todo, sqlx::Error>;
    async fn save_todo(&self, todo: &Todo) -> Result<Option<Todo>, sqlx::Error>;
    async fn remove_todo(&self, id: i64) -> Result<(), sqlx::Error>;
    async fn find_todos(&self, filter: TodoFilter) -> Result<Vec<Todo>, sqlx::Error>;

    // --- Users ---
    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;
    /// Fails with a unique violation when the username or email is taken.
    async fn insert_user(&self, user: &User) -> Result<User, sqlx::Error>;
    async fn save_user(&self, user: &User) -> Result<Option<User>, sqlx::Error>;
    async fn remove_user(&self, id: i64) -> Result<(), sqlx::Error>;
    async fn find_users(&self) -> Result<Vec<User>, sqlx::Error>;
    async fn count_users(&self) -> Result<i64, sqlx::Error>;
}

/// TodoFilter
///
/// Listing window for todos, derived from the policy's ListScope.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodoFilter {
    pub created_by: Option<i64>,
    pub open_only: bool,
}

/// StoreState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type StoreState = Arc<dyn Store>;

/// SqliteStore
///
/// The concrete implementation of the `Store` trait, backed by SQLite.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Creates a new store instance using the initialized connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// init_schema
///
/// Bootstraps the three tables. Idempotent, safe to run at every startup.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            version INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            price REAL NOT NULL,
            version INTEGER NOT NULL DEFAULT 1,
            created_by_id INTEGER NOT NULL,
            updated_by_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            is_closed INTEGER NOT NULL DEFAULT 0,
            version INTEGER NOT NULL DEFAULT 1,
            created_by_id INTEGER NOT NULL,
            updated_by_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

const ARTICLE_COLUMNS: &str =
    "id, name, description, price, version, created_by_id, updated_by_id, created_at, updated_at";

const TODO_COLUMNS: &str = "id, title, description, is_closed, version, created_by_id, updated_by_id, created_at, updated_at";

const USER_COLUMNS: &str =
    "id, username, email, password_hash, is_admin, version, created_at, updated_at";

#[async_trait]
impl Store for SqliteStore {
    // --- ARTICLES ---

    async fn get_article(&self, id: i64) -> Result<Option<Article>, sqlx::Error> {
        sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_article(&self, article: &Article) -> Result<Article, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Article>(&format!(
            r#"
            INSERT INTO articles
                (name, description, price, version, created_by_id, updated_by_id, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?, ?, ?)
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(&article.name)
        .bind(&article.description)
        .bind(article.price)
        .bind(article.created_by_id)
        .bind(article.updated_by_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    /// Single-statement write conditioned on the snapshot version: the first
    /// writer wins and bumps the version, so a concurrent writer holding the
    /// same snapshot matches zero rows and gets `None` instead of silently
    /// overwriting.
    async fn save_article(&self, article: &Article) -> Result<Option<Article>, sqlx::Error> {
        sqlx::query_as::<_, Article>(&format!(
            r#"
            UPDATE articles
            SET name = ?, description = ?, price = ?, updated_by_id = ?,
                version = version + 1, updated_at = ?
            WHERE id = ? AND version = ?
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(&article.name)
        .bind(&article.description)
        .bind(article.price)
        .bind(article.updated_by_id)
        .bind(Utc::now())
        .bind(article.id)
        .bind(article.version)
        .fetch_optional(&self.pool)
        .await
    }

    async fn remove_article(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_articles(&self, created_by: Option<i64>) -> Result<Vec<Article>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE 1 = 1"
        ));
        if let Some(user_id) = created_by {
            builder.push(" AND created_by_id = ");
            builder.push_bind(user_id);
        }
        builder.push(" ORDER BY id ASC");
        builder.build_query_as::<Article>().fetch_all(&self.pool).await
    }

    // --- TODOS ---

    async fn get_todo(&self, id: i64) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert_todo(&self, todo: &Todo) -> Result<Todo, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Todo>(&format!(
            r#"
            INSERT INTO todos
                (title, description, is_closed, version, created_by_id, updated_by_id, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?, ?, ?)
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.is_closed)
        .bind(todo.created_by_id)
        .bind(todo.updated_by_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    async fn save_todo(&self, todo: &Todo) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET title = ?, description = ?, is_closed = ?, updated_by_id = ?,
                version = version + 1, updated_at = ?
            WHERE id = ? AND version = ?
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.is_closed)
        .bind(todo.updated_by_id)
        .bind(Utc::now())
        .bind(todo.id)
        .bind(todo.version)
        .fetch_optional(&self.pool)
        .await
    }

    async fn remove_todo(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// find_todos
    ///
    /// Flexible listing with safe parameterization via QueryBuilder. The
    /// filter is derived from the policy's scope, never from raw caller
    /// input.
    async fn find_todos(&self, filter: TodoFilter) -> Result<Vec<Todo>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {TODO_COLUMNS} FROM todos WHERE 1 = 1"));
        if let Some(user_id) = filter.created_by {
            builder.push(" AND created_by_id = ");
            builder.push_bind(user_id);
        }
        if filter.open_only {
            builder.push(" AND is_closed = 0");
        }
        builder.push(" ORDER BY id ASC");
        builder.build_query_as::<Todo>().fetch_all(&self.pool).await
    }

    // --- USERS ---

    async fn get_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_user(&self, user: &User) -> Result<User, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (username, email, password_hash, is_admin, version, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    async fn save_user(&self, user: &User) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = ?, email = ?, password_hash = ?, is_admin = ?,
                version = version + 1, updated_at = ?
            WHERE id = ? AND version = ?
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(Utc::now())
        .bind(user.id)
        .bind(user.version)
        .fetch_optional(&self.pool)
        .await
    }

    async fn remove_user(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn count_users(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
    }
}
