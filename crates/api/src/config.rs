//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use assetdesk_auth::{Account, Role};
use assetdesk_infra::db::DatabaseConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
pub const DEFAULT_STORAGE_PATH: &str = "/data/diagrams";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Diagram file storage settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramStorageConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub git_backup: bool,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    /// `None` selects the in-memory backend.
    pub database: Option<DatabaseConfig>,
    pub accounts: Vec<Account>,
    pub storage: DiagramStorageConfig,
}

impl ApiConfig {
    /// Session token lifetime.
    pub const TOKEN_TTL_HOURS: i64 = 8;

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = parse("BIND_ADDR", get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()))?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let database = match get("DATABASE_URL") {
            Some(url) => {
                let mut db = DatabaseConfig::new(url);
                if let Some(v) = get("DATABASE_MAX_CONNECTIONS") {
                    db.max_connections = parse("DATABASE_MAX_CONNECTIONS", v)?;
                }
                if let Some(v) = get("DATABASE_ACQUIRE_TIMEOUT_SECS") {
                    db.acquire_timeout = Duration::from_secs(parse("DATABASE_ACQUIRE_TIMEOUT_SECS", v)?);
                }
                Some(db)
            }
            None => None,
        };

        let mut accounts = Vec::new();
        for (user_key, pass_key, role) in [
            ("ADMIN_USER", "ADMIN_PASS", Role::admin()),
            ("USER_USER", "USER_PASS", Role::user()),
        ] {
            if let (Some(username), Some(password)) = (get(user_key), get(pass_key)) {
                accounts.push(Account::new(username, password, role));
            }
        }

        let storage = DiagramStorageConfig {
            enabled: flag(get("ENABLE_SERVER_STORAGE")),
            path: get("STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH)),
            git_backup: flag(get("ENABLE_GIT_BACKUP")),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl: chrono::Duration::hours(Self::TOKEN_TTL_HOURS),
            database,
            accounts,
            storage,
        })
    }
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

/// Only the literal `true` enables a flag.
fn flag(value: Option<String>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ApiConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_select_in_memory_backend() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert!(cfg.database.is_none());
        assert!(cfg.accounts.is_empty());
        assert!(!cfg.storage.enabled);
        assert_eq!(cfg.storage.path, PathBuf::from(DEFAULT_STORAGE_PATH));
        assert_eq!(cfg.token_ttl, chrono::Duration::hours(8));
    }

    #[test]
    fn reads_database_and_accounts() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://db/assetdesk"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("ADMIN_USER", "root"),
            ("ADMIN_PASS", "pw"),
            ("USER_USER", "viewer"),
            ("ENABLE_SERVER_STORAGE", "TRUE"),
        ])
        .unwrap();

        let db = cfg.database.unwrap();
        assert_eq!(db.max_connections, 4);
        assert_eq!(db.acquire_timeout, Duration::from_secs(5));
        // USER_PASS missing: that account is not configured.
        assert_eq!(cfg.accounts.len(), 1);
        assert!(cfg.accounts[0].role.is_admin());
        assert!(cfg.storage.enabled);
    }

    #[test]
    fn rejects_malformed_numbers() {
        let err = config(&[("DATABASE_URL", "postgres://db"), ("DATABASE_MAX_CONNECTIONS", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DATABASE_MAX_CONNECTIONS", .. }));
        assert!(config(&[("BIND_ADDR", "not-an-addr")]).is_err());
    }
}
