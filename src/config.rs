use std::env;

const LOCAL_JWT_SECRET: &str = "car-bazaar-local-development-secret";
const DEFAULT_PORT: u16 = 5000;

/// AppConfig
///
/// Loaded once at startup and shared read-only through `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Runtime environment marker.
    pub env: Env,
    /// Postgres connection string. `None` (local only) selects the in-memory repository.
    pub db_url: Option<String>,
    /// HMAC secret for signing and verifying access tokens.
    pub jwt_secret: String,
    pub port: u16,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking configuration for test state scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads configuration from the environment.
    ///
    /// # Panics
    /// In production, panics when `DATABASE_URL` or `JWT_SECRET` is missing, or
    /// when `PORT` is set but not a port number. The server must not start with
    /// an incomplete configuration.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .unwrap_or_else(|_| panic!("FATAL: PORT must be a port number, got '{}'", raw)),
            Err(_) => DEFAULT_PORT,
        };

        match env {
            Env::Local => Self {
                env: Env::Local,
                db_url: env::var("DATABASE_URL").ok(),
                jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                port,
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: Some(
                    env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                ),
                jwt_secret: env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
                port,
            },
        }
    }
}
