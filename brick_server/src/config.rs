//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use brick_auth::db::DatabaseConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Upper bound on the session lifetime (one year)
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Session and cookie configuration
    pub session: SessionConfig,
    /// CORS and static file configuration
    pub http: HttpConfig,
    /// Prometheus exporter address; metrics are not exported when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    /// Password hashing pepper (optional, empty disables it)
    pub password_pepper: String,
}

/// Session lifetime and cookie attributes
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session lifetime in hours
    pub ttl_hours: i64,
    /// Name of the cookie carrying the session id
    pub cookie_name: String,
    /// Set the `Secure` attribute (enable behind TLS)
    pub cookie_secure: bool,
    /// Seconds between expired-session sweeps
    pub gc_interval_secs: u64,
}

impl SessionConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            cookie_name: "session_id".to_string(),
            cookie_secure: false,
            gc_interval_secs: 600,
        }
    }
}

/// HTTP surface configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Origins allowed to make credentialed cross-origin requests
    pub cors_allowed_origins: Vec<String>,
    /// Directory served for non-API paths
    pub static_dir: Option<PathBuf>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: vec![
                "http://localhost:8080".to_string(),
                "http://localhost:5173".to_string(),
            ],
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `static_dir_override` - Optional static directory override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        static_dir_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_strict("SERVER_BIND")?.unwrap_or_else(|| {
                SocketAddr::from(([127, 0, 0, 1], 3000))
            }),
        };

        let database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| "sqlite://brick.db".to_string());

        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", 1),
            connection_timeout_secs: parse_env_or("DB_CONNECTION_TIMEOUT_SECS", 10),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", 600),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", 1800),
            query_timeout_secs: parse_env_or("DB_QUERY_TIMEOUT_SECS", 5),
        };

        let security = SecurityConfig {
            password_pepper: std::env::var("PASSWORD_PEPPER").unwrap_or_default(),
        };

        let defaults = SessionConfig::default();
        let session = SessionConfig {
            ttl_hours: parse_env_or("SESSION_TTL_HOURS", defaults.ttl_hours),
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name),
            cookie_secure: parse_env_or("SESSION_COOKIE_SECURE", defaults.cookie_secure),
            gc_interval_secs: parse_env_or("SESSION_GC_INTERVAL_SECS", defaults.gc_interval_secs),
        };

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| HttpConfig::default().cors_allowed_origins);

        let static_dir = static_dir_override
            .or_else(|| std::env::var("STATIC_DIR").ok().map(PathBuf::from))
            .or_else(|| Some(PathBuf::from("./web/ui/public")))
            .filter(|dir| dir.is_dir());

        let http = HttpConfig {
            cors_allowed_origins,
            static_dir,
        };

        let metrics_bind = parse_env_strict("METRICS_BIND")?;

        Ok(ServerConfig {
            bind,
            database,
            security,
            session,
            http,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.ttl_hours <= 0 || self.session.ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError::Invalid {
                var: "SESSION_TTL_HOURS".to_string(),
                reason: format!("Must be between 1 and {MAX_SESSION_TTL_HOURS}"),
            });
        }

        if self.session.gc_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_GC_INTERVAL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.session.cookie_name.is_empty()
            || !self
                .session
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::Invalid {
                var: "SESSION_COOKIE_NAME".to_string(),
                reason: "Must be non-empty and use only letters, digits, '_' or '-'".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.database.query_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_QUERY_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse an optional variable, rejecting values that are set but malformed.
fn parse_env_strict<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.parse::<T>().map(Some).map_err(|e| ConfigError::Invalid {
            var: key.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
