use crate::{
    auth::Identity,
    error::ApiError,
    guard,
    models::{
        AdminUpdateTodoRequest, AdminUpdateUserRequest, Article, CreateArticleRequest,
        CreateTodoRequest, ReplaceArticleRequest, ReplaceTodoRequest, Todo, UpdateArticleRequest,
        UpdateTodoRequest, User, UserResponse,
    },
    password,
    policy::{self, Action, Decision, DenyReason, ListScope, ListingPolicy, Owned},
    store::{StoreState, TodoFilter},
};

/// Orchestrator
///
/// Sequences every mutation uniformly across resource kinds:
/// fetch → policy → concurrency guard → apply → persist → return.
///
/// Everything before the persist step is side-effect free, so a failure at
/// any point leaves the store unchanged. The store handle and the listing
/// policy are injected explicitly at construction time; there is no ambient
/// state.
pub struct Orchestrator {
    store: StoreState,
    listing: ListingPolicy,
}

fn not_found(kind: &str, id: i64) -> ApiError {
    // One message format for both "absent" and "deliberately hidden", so the
    // two cases stay indistinguishable to the caller.
    ApiError::NotFound(format!("{kind} {id} not found"))
}

fn lost_race(kind: &str, id: i64) -> ApiError {
    // A concurrent writer bumped the version between our fetch and our save.
    // The store's conditioned UPDATE wrote nothing; the caller must re-fetch.
    ApiError::Conflict(format!("{kind} {id} was modified concurrently"))
}

impl Orchestrator {
    pub fn new(store: StoreState, listing: ListingPolicy) -> Self {
        Self { store, listing }
    }

    /// Maps a policy decision onto the error taxonomy. `kind`/`id` feed the
    /// NotFound message when the policy hides a resource.
    fn authorize(
        &self,
        actor: &Identity,
        resource: Option<&dyn Owned>,
        action: Action,
        kind: &str,
        id: i64,
    ) -> Result<(), ApiError> {
        match policy::decide(actor, resource, action) {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::Forbidden) => Err(ApiError::Forbidden),
            Decision::Deny(DenyReason::NotFound) => Err(not_found(kind, id)),
        }
    }

    // --- ARTICLES ---

    pub async fn create_article(
        &self,
        actor: &Identity,
        req: CreateArticleRequest,
    ) -> Result<Article, ApiError> {
        tracing::debug!(user_id = actor.user_id, "create article");
        self.authorize(actor, None, Action::Create, "article", 0)?;
        let article = Article {
            name: req.name,
            description: req.description,
            price: req.price,
            created_by_id: actor.user_id,
            updated_by_id: actor.user_id,
            ..Article::default()
        };
        Ok(self.store.insert_article(&article).await?)
    }

    pub async fn list_articles(&self, actor: &Identity) -> Result<Vec<Article>, ApiError> {
        let created_by = match policy::list_scope(actor, self.listing) {
            ListScope::All => None,
            ListScope::MineOnly { user_id, .. } => Some(user_id),
        };
        Ok(self.store.find_articles(created_by).await?)
    }

    pub async fn get_article(&self, actor: &Identity, id: i64) -> Result<Article, ApiError> {
        let article = self
            .store
            .get_article(id)
            .await?
            .ok_or_else(|| not_found("article", id))?;
        self.authorize(actor, Some(&article), Action::ReadOne, "article", id)?;
        Ok(article)
    }

    pub async fn update_article(
        &self,
        actor: &Identity,
        id: i64,
        req: UpdateArticleRequest,
    ) -> Result<Article, ApiError> {
        tracing::debug!(user_id = actor.user_id, id, "update article");
        let mut article = self
            .store
            .get_article(id)
            .await?
            .ok_or_else(|| not_found("article", id))?;
        self.authorize(
            actor,
            Some(&article),
            Action::Update { reopens: false },
            "article",
            id,
        )?;
        // Version check only when the caller opted in by stating one.
        if let Some(expected) = req.expected_version {
            guard::check_version(article.version, expected)?;
        }
        if let Some(name) = req.name {
            article.name = name;
        }
        if let Some(description) = req.description {
            article.description = description;
        }
        if let Some(price) = req.price {
            article.price = price;
        }
        article.updated_by_id = actor.user_id;
        self.store
            .save_article(&article)
            .await?
            .ok_or_else(|| lost_race("article", id))
    }

    pub async fn replace_article(
        &self,
        actor: &Identity,
        id: i64,
        req: ReplaceArticleRequest,
    ) -> Result<Article, ApiError> {
        tracing::debug!(user_id = actor.user_id, id, "replace article");
        let mut article = self
            .store
            .get_article(id)
            .await?
            .ok_or_else(|| not_found("article", id))?;
        self.authorize(actor, Some(&article), Action::Replace, "article", id)?;
        guard::check_version(article.version, req.version)?;
        guard::check_id(article.id, req.id)?;
        // Full overwrite except immutable fields (id, created_by_id,
        // created_at).
        article.name = req.name;
        article.description = req.description;
        article.price = req.price;
        article.updated_by_id = actor.user_id;
        self.store
            .save_article(&article)
            .await?
            .ok_or_else(|| lost_race("article", id))
    }

    pub async fn remove_article(&self, actor: &Identity, id: i64) -> Result<Article, ApiError> {
        tracing::debug!(user_id = actor.user_id, id, "remove article");
        let article = self
            .store
            .get_article(id)
            .await?
            .ok_or_else(|| not_found("article", id))?;
        self.authorize(actor, Some(&article), Action::Remove, "article", id)?;
        self.store.remove_article(id).await?;
        Ok(article)
    }

    // --- TODOS ---

    pub async fn create_todo(
        &self,
        actor: &Identity,
        req: CreateTodoRequest,
    ) -> Result<Todo, ApiError> {
        tracing::debug!(user_id = actor.user_id, "create todo");
        self.authorize(actor, None, Action::Create, "todo", 0)?;
        let todo = Todo {
            title: req.title,
            description: req.description,
            is_closed: false,
            created_by_id: actor.user_id,
            updated_by_id: actor.user_id,
            ..Todo::default()
        };
        Ok(self.store.insert_todo(&todo).await?)
    }

    pub async fn list_todos(&self, actor: &Identity) -> Result<Vec<Todo>, ApiError> {
        let filter = match policy::list_scope(actor, self.listing) {
            ListScope::All => TodoFilter::default(),
            ListScope::MineOnly { user_id, open_only } => TodoFilter {
                created_by: Some(user_id),
                open_only,
            },
        };
        Ok(self.store.find_todos(filter).await?)
    }

    pub async fn get_todo(&self, actor: &Identity, id: i64) -> Result<Todo, ApiError> {
        let todo = self
            .store
            .get_todo(id)
            .await?
            .ok_or_else(|| not_found("todo", id))?;
        self.authorize(actor, Some(&todo), Action::ReadOne, "todo", id)?;
        Ok(todo)
    }

    pub async fn update_todo(
        &self,
        actor: &Identity,
        id: i64,
        req: UpdateTodoRequest,
    ) -> Result<Todo, ApiError> {
        tracing::debug!(user_id = actor.user_id, id, "update todo");
        let mut todo = self
            .store
            .get_todo(id)
            .await?
            .ok_or_else(|| not_found("todo", id))?;
        let reopens = req.is_closed == Some(false);
        self.authorize(actor, Some(&todo), Action::Update { reopens }, "todo", id)?;
        if let Some(expected) = req.expected_version {
            guard::check_version(todo.version, expected)?;
        }
        if let Some(title) = req.title {
            todo.title = title;
        }
        if let Some(description) = req.description {
            todo.description = Some(description);
        }
        if let Some(is_closed) = req.is_closed {
            todo.is_closed = is_closed;
        }
        todo.updated_by_id = actor.user_id;
        self.store
            .save_todo(&todo)
            .await?
            .ok_or_else(|| lost_race("todo", id))
    }

    /// Status-only override: force-closes or force-opens a todo regardless of
    /// who owns it. The policy admits admins only.
    pub async fn admin_update_todo(
        &self,
        actor: &Identity,
        id: i64,
        req: AdminUpdateTodoRequest,
    ) -> Result<Todo, ApiError> {
        tracing::debug!(user_id = actor.user_id, id, "admin update todo");
        let mut todo = self
            .store
            .get_todo(id)
            .await?
            .ok_or_else(|| not_found("todo", id))?;
        self.authorize(actor, Some(&todo), Action::AdminUpdate, "todo", id)?;
        todo.is_closed = req.is_closed;
        todo.updated_by_id = actor.user_id;
        self.store
            .save_todo(&todo)
            .await?
            .ok_or_else(|| lost_race("todo", id))
    }

    pub async fn replace_todo(
        &self,
        actor: &Identity,
        id: i64,
        req: ReplaceTodoRequest,
    ) -> Result<Todo, ApiError> {
        tracing::debug!(user_id = actor.user_id, id, "replace todo");
        let mut todo = self
            .store
            .get_todo(id)
            .await?
            .ok_or_else(|| not_found("todo", id))?;
        self.authorize(actor, Some(&todo), Action::Replace, "todo", id)?;
        guard::check_version(todo.version, req.version)?;
        guard::check_id(todo.id, req.id)?;
        todo.title = req.title;
        todo.description = req.description;
        todo.is_closed = req.is_closed;
        todo.updated_by_id = actor.user_id;
        self.store
            .save_todo(&todo)
            .await?
            .ok_or_else(|| lost_race("todo", id))
    }

    pub async fn remove_todo(&self, actor: &Identity, id: i64) -> Result<Todo, ApiError> {
        tracing::debug!(user_id = actor.user_id, id, "remove todo");
        let todo = self
            .store
            .get_todo(id)
            .await?
            .ok_or_else(|| not_found("todo", id))?;
        self.authorize(actor, Some(&todo), Action::Remove, "todo", id)?;
        self.store.remove_todo(id).await?;
        Ok(todo)
    }

    // --- USERS ---

    /// Public registration. New accounts are never admins; promotion goes
    /// through the admin role endpoint.
    pub async fn register_user(
        &self,
        req: crate::models::RegisterUserRequest,
    ) -> Result<UserResponse, ApiError> {
        if req.username.trim().is_empty() || req.password.is_empty() {
            return Err(ApiError::Validation(
                "username and password must not be empty".to_string(),
            ));
        }
        let user = User {
            username: req.username.to_lowercase(),
            email: req.email,
            password_hash: password::hash_password(&req.password)?,
            is_admin: false,
            ..User::default()
        };
        match self.store.insert_user(&user).await {
            Ok(created) => {
                tracing::info!(user_id = created.id, "user registered");
                Ok(created.into())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(ApiError::Conflict(
                "username or email already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Credential verification for login. Failures are uniform: an unknown
    /// username and a wrong password are indistinguishable to the caller.
    pub async fn verify_credentials(
        &self,
        username: &str,
        plain_password: &str,
    ) -> Result<User, ApiError> {
        let user = self
            .store
            .get_user_by_username(&username.to_lowercase())
            .await?
            .ok_or(ApiError::Unauthenticated)?;
        if !password::verify_password(&user.password_hash, plain_password) {
            return Err(ApiError::Unauthenticated);
        }
        Ok(user)
    }

    pub async fn list_users(&self, _actor: &Identity) -> Result<Vec<UserResponse>, ApiError> {
        let users = self.store.find_users().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get_user(&self, _actor: &Identity, id: i64) -> Result<UserResponse, ApiError> {
        let user = self
            .store
            .get_user(id)
            .await?
            .ok_or_else(|| not_found("user", id))?;
        Ok(user.into())
    }

    /// Role override: grants or revokes the admin flag. Admin only.
    pub async fn admin_update_user(
        &self,
        actor: &Identity,
        id: i64,
        req: AdminUpdateUserRequest,
    ) -> Result<UserResponse, ApiError> {
        tracing::debug!(user_id = actor.user_id, id, "admin update user");
        let mut user = self
            .store
            .get_user(id)
            .await?
            .ok_or_else(|| not_found("user", id))?;
        self.authorize(actor, None, Action::AdminUpdate, "user", id)?;
        user.is_admin = req.is_admin;
        self.store
            .save_user(&user)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| lost_race("user", id))
    }

    pub async fn remove_user(&self, actor: &Identity, id: i64) -> Result<UserResponse, ApiError> {
        tracing::debug!(user_id = actor.user_id, id, "remove user");
        let user = self
            .store
            .get_user(id)
            .await?
            .ok_or_else(|| not_found("user", id))?;
        self.authorize(actor, None, Action::Remove, "user", id)?;
        self.store.remove_user(id).await?;
        Ok(user.into())
    }
}
