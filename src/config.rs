use std::env;

/// AppConfig
///
/// Holds the service's entire configuration. Loaded once at startup, immutable afterwards,
/// and pulled into handlers and extractors via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls which variables are mandatory.
    pub env: Env,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Base URL of the upstream resource/search API.
    pub upstream_url: String,
    // Name of the cookie carrying the session token.
    pub session_cookie: String,
    // Shared HS256 secret. When present, session tokens are signature-checked.
    pub jwt_secret: Option<String>,
    // Where an already-authenticated visitor is sent from the entry pages.
    pub landing_route: String,
    // Optional request timeout for the upstream client, in seconds.
    pub upstream_timeout_secs: Option<u64>,
}

/// Env
///
/// Runtime context: `Local` tolerates missing secrets, `Production` does not.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_SESSION_COOKIE: &str = "authorization_key";
pub const DEFAULT_LANDING_ROUTE: &str = "/home";

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:3000".to_string(),
            upstream_url: "http://localhost:8000".to_string(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            jwt_secret: None,
            landing_route: DEFAULT_LANDING_ROUTE.to_string(),
            upstream_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics if a variable required in `Production` (`UPSTREAM_URL`, `JWT_SECRET`) is
    /// missing, so the service never starts reading unverified tokens in an isolated deployment.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let (upstream_url, jwt_secret) = match env {
            Env::Production => (
                env::var("UPSTREAM_URL").expect("FATAL: UPSTREAM_URL required in prod"),
                Some(env::var("JWT_SECRET").expect("FATAL: JWT_SECRET required in prod")),
            ),
            Env::Local => (
                env::var("UPSTREAM_URL").unwrap_or_else(|_| "http://localhost:8000".to_string()),
                env::var("JWT_SECRET").ok().filter(|secret| !secret.is_empty()),
            ),
        };

        let upstream_timeout_secs = env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok());

        Self {
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            upstream_url,
            session_cookie: env::var("SESSION_COOKIE")
                .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.to_string()),
            jwt_secret,
            landing_route: env::var("LANDING_ROUTE")
                .unwrap_or_else(|_| DEFAULT_LANDING_ROUTE.to_string()),
            upstream_timeout_secs,
        }
    }
}
