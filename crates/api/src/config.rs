//! Process configuration read from the environment.

use thiserror::Error;

use workstream_auth::{PermissionName, TokenConfig, DEFAULT_CATALOG};
use workstream_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";
const DEFAULT_ISSUER: &str = "workstream";
const DEFAULT_AUDIENCE: &str = "workstream-api";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set when APP_ENV={0}")]
    MissingSecret(String),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Storage backend selected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    InMemory,
    Postgres { url: String, max_connections: u32 },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token: TokenConfig,
    pub backend: Backend,
    pub bind_addr: String,
    pub log_format: LogFormat,
    /// Permission names seeded into the catalog at startup.
    pub permission_catalog: Vec<PermissionName>,
    /// bcrypt cost; `None` uses the library default.
    pub password_cost: Option<u32>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let app_env = var("APP_ENV").unwrap_or_else(|| "dev".to_string());
        let secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if app_env == "dev" || app_env == "test" => DEV_JWT_SECRET.to_string(),
            None => return Err(ConfigError::MissingSecret(app_env)),
        };
        let token = TokenConfig::new(
            secret,
            var("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            var("JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
        );
        let token = match parse_u32(var("JWT_LEEWAY_SECS"), "JWT_LEEWAY_SECS")? {
            Some(secs) => token.with_leeway_secs(i64::from(secs)),
            None => token,
        };

        let backend = match var("DATABASE_URL") {
            Some(url) => Backend::Postgres {
                url,
                max_connections: parse_u32(var("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            },
            None => Backend::InMemory,
        };

        let log_format = match var("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|reason| ConfigError::Invalid {
                name: "LOG_FORMAT",
                reason,
            })?,
            None => LogFormat::default(),
        };

        let permission_catalog = match var("PERMISSION_CATALOG") {
            Some(raw) => parse_catalog(&raw)?,
            None => DEFAULT_CATALOG.to_vec(),
        };

        Ok(Self {
            token,
            backend,
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            log_format,
            permission_catalog,
            password_cost: parse_u32(var("BCRYPT_COST"), "BCRYPT_COST")?,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.token.secret == DEV_JWT_SECRET.as_bytes()
    }

    /// In-memory configuration with the given secret; used by tests and demos.
    pub fn in_memory(secret: impl Into<String>) -> Self {
        Self {
            token: TokenConfig::new(secret.into(), DEFAULT_ISSUER, DEFAULT_AUDIENCE),
            backend: Backend::InMemory,
            bind_addr: "127.0.0.1:0".to_string(),
            log_format: LogFormat::default(),
            permission_catalog: DEFAULT_CATALOG.to_vec(),
            password_cost: None,
        }
    }
}

fn parse_u32(raw: Option<String>, name: &'static str) -> Result<Option<u32>, ConfigError> {
    raw.map(|v| {
        v.parse::<u32>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
    })
    .transpose()
}

fn parse_catalog(raw: &str) -> Result<Vec<PermissionName>, ConfigError> {
    let names: Vec<PermissionName> = raw
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| PermissionName::new(n.to_string()))
        .collect();
    if names.is_empty() {
        return Err(ConfigError::Invalid {
            name: "PERMISSION_CATALOG",
            reason: "no permission names given".to_string(),
        });
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_select_in_memory_backend() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.backend, Backend::InMemory);
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(cfg.token.issuer, "workstream");
        assert_eq!(cfg.token.audience, "workstream-api");
        assert!(cfg.uses_dev_secret());
        assert_eq!(cfg.permission_catalog, DEFAULT_CATALOG.to_vec());
    }

    #[test]
    fn secret_is_required_outside_dev() {
        assert_eq!(
            config(&[("APP_ENV", "production")]).unwrap_err(),
            ConfigError::MissingSecret("production".into())
        );
        let cfg = config(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.token.secret, b"s3cret");
    }

    #[test]
    fn database_url_selects_postgres() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/ws")]).unwrap();
        assert_eq!(
            cfg.backend,
            Backend::Postgres {
                url: "postgres://localhost/ws".into(),
                max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            }
        );
    }

    #[test]
    fn catalog_is_comma_separated() {
        let cfg = config(&[("PERMISSION_CATALOG", " A, B ,,C ")]).unwrap();
        let names: Vec<&str> = cfg.permission_catalog.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);

        assert!(config(&[("PERMISSION_CATALOG", "   ")]).is_ok(), "blank counts as unset");
        assert!(config(&[("PERMISSION_CATALOG", " , ")]).is_err());
    }

    #[test]
    fn leeway_is_read_from_env() {
        assert_eq!(config(&[]).unwrap().token.leeway_secs, 0);
        let cfg = config(&[("JWT_LEEWAY_SECS", "30")]).unwrap();
        assert_eq!(cfg.token.leeway_secs, 30);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(matches!(
            config(&[("BCRYPT_COST", "high")]),
            Err(ConfigError::Invalid { name: "BCRYPT_COST", .. })
        ));
        assert!(matches!(
            config(&[("JWT_LEEWAY_SECS", "-5")]),
            Err(ConfigError::Invalid { name: "JWT_LEEWAY_SECS", .. })
        ));
    }
}
