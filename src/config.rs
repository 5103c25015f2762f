use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::PlanTier;

/// Application-level constants
pub const APP_NAME: &str = "Carebook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default listen address for the HTTP service.
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Get the application data directory
/// ~/Carebook/ on all platforms, falling back to the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite database location.
pub fn database_path() -> PathBuf {
    app_data_dir().join("database").join("carebook.db")
}

/// Default object storage root for uploaded exam files and vaccine proofs.
pub fn storage_dir() -> PathBuf {
    app_data_dir().join("medical-files")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "carebook_lib=info,carebook=info,tower_http=warn"
}

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Origin used to build public file URLs and patient access links.
    pub public_origin: String,
    pub db_path: PathBuf,
    pub storage_dir: PathBuf,
    /// Plan applied to every professional's roster cap.
    pub plan: PlanTier,
}

impl ServerConfig {
    /// Read settings from `CAREBOOK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (environment in production,
    /// a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup("CAREBOOK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBind(bind_raw.clone()))?;

        let public_origin = lookup("CAREBOOK_PUBLIC_ORIGIN")
            .unwrap_or_else(|| format!("http://{bind}"))
            .trim_end_matches('/')
            .to_string();

        let db_path = lookup("CAREBOOK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(database_path);
        let storage_dir = lookup("CAREBOOK_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(storage_dir);

        let plan = match lookup("CAREBOOK_PLAN") {
            Some(raw) => PlanTier::from_str(raw.trim()).map_err(|_| ConfigError::InvalidPlan(raw))?,
            None => PlanTier::Free,
        };

        Ok(Self {
            bind,
            public_origin,
            db_path,
            storage_dir,
            plan,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid bind address: {0}")]
    InvalidBind(String),
    #[error("Unknown plan: {0}")]
    InvalidPlan(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn storage_dir_under_app_data() {
        let storage = storage_dir();
        assert!(storage.starts_with(app_data_dir()));
        assert!(storage.ends_with("medical-files"));
    }

    #[test]
    fn app_name_is_carebook() {
        assert_eq!(APP_NAME, "Carebook");
    }

    #[test]
    fn defaults_when_environment_empty() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.public_origin, format!("http://{DEFAULT_BIND}"));
        assert_eq!(config.db_path, database_path());
        assert_eq!(config.plan, PlanTier::Free);
    }

    #[test]
    fn plan_read_from_environment() {
        let config = ServerConfig::from_lookup(lookup_from(&[("CAREBOOK_PLAN", "pro")])).unwrap();
        assert_eq!(config.plan, PlanTier::Pro);

        let result = ServerConfig::from_lookup(lookup_from(&[("CAREBOOK_PLAN", "gold")]));
        assert!(matches!(result, Err(ConfigError::InvalidPlan(_))));
    }

    #[test]
    fn public_origin_trailing_slash_trimmed() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("CAREBOOK_PUBLIC_ORIGIN", "https://records.example.org/"),
        ]))
        .unwrap();
        assert_eq!(config.public_origin, "https://records.example.org");
    }

    #[test]
    fn invalid_bind_rejected() {
        let result = ServerConfig::from_lookup(lookup_from(&[("CAREBOOK_BIND", "not-an-addr")]));
        assert!(matches!(result, Err(ConfigError::InvalidBind(_))));
    }
}
