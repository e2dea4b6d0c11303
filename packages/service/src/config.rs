//! Service configuration, populated from environment variables.

use std::net::SocketAddr;

use friendgraph::DEFAULT_LIMIT;

/// Runtime configuration for the friends service.
///
/// All fields are populated from environment variables with sensible
/// defaults, so the service can be started with zero configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `FRIENDS_BIND` | `0.0.0.0:5000` | TCP socket address to listen on |
/// | `FRIENDS_DB` | (absent = in-memory) | Path to the SQLite database file |
/// | `FRIENDS_DEFAULT_LIMIT` | `10` | Largest page size a list request gets |
/// | `FRIENDS_NOTIFY_URL` | (absent = log only) | Webhook that receives friend events |
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Socket address the server binds to.
    pub bind_addr: SocketAddr,

    /// Path to the SQLite database file.
    /// `None` means use an in-memory store (data is lost on restart).
    pub db_path: Option<String>,

    /// Pagination ceiling; also the page size when `limit` is absent.
    pub default_limit: usize,

    /// Where friend events are POSTed. `None` logs them instead.
    pub notify_url: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("FRIENDS_BIND must be a socket address (e.g. 0.0.0.0:5000), got {0:?}")]
    InvalidBind(String),

    #[error("FRIENDS_DEFAULT_LIMIT must be a positive integer, got {0:?}")]
    InvalidLimit(String),
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            db_path: None,
            default_limit: DEFAULT_LIMIT,
            notify_url: None,
        }
    }
}

impl ServiceConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match var("FRIENDS_BIND") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|_| ConfigError::InvalidBind(raw))?,
            None => defaults.bind_addr,
        };

        let default_limit = match var("FRIENDS_DEFAULT_LIMIT") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidLimit(raw)),
            },
            None => defaults.default_limit,
        };

        Ok(Self {
            bind_addr,
            db_path: var("FRIENDS_DB").filter(|p| !p.is_empty()),
            default_limit,
            notify_url: var("FRIENDS_NOTIFY_URL").filter(|u| !u.is_empty()),
        })
    }
}
