use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup
/// and immutable from then on, so every service (store, orchestrator, auth)
/// sees the same values. Pulled into handlers and extractors via FromRef.
#[derive(Clone)]
pub struct AppConfig {
    // Database connection string (SQLite).
    pub db_url: String,
    // Secret key used to sign and validate JWTs.
    pub jwt_secret: String,
    // Runtime environment marker. Controls the dev auth bypass and log format.
    pub env: Env,
    // Listing-policy parameter: whether non-admin todo listings include
    // closed items. Deployments want this both ways, so it is explicit
    // configuration rather than a hardcoded rule.
    pub list_closed_todos: bool,
}

/// Env
///
/// Runtime context. Local enables development conveniences (the x-user-id
/// auth bypass, pretty logs); Production demands explicit secrets.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking config for test setup. No environment variables
    /// required.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            env: Env::Local,
            list_closed_todos: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Canonical startup initialization from environment variables, fail-fast.
    ///
    /// # Panics
    /// Panics if a variable required for the current environment is missing.
    /// Production refuses to start without an explicit `JWT_SECRET` and
    /// `DATABASE_URL`; local falls back to a file-backed SQLite database and
    /// a fixed development secret.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let list_closed_todos = env::var("LIST_CLOSED_TODOS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        match env {
            Env::Local => Self {
                env: Env::Local,
                db_url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://workboard.db?mode=rwc".to_string()),
                jwt_secret: env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "super-secure-test-secret-value-local".to_string()),
                list_closed_todos,
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                jwt_secret: env::var("JWT_SECRET").expect("FATAL: JWT_SECRET required in prod"),
                list_closed_todos,
            },
        }
    }
}
