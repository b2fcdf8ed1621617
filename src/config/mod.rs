//! Runtime Configuration
//!
//! Every knob of the service comes from the process environment. Blank values
//! are treated as unset so that `PORT=` in a deployment manifest falls back to
//! the default instead of failing to parse.
//!
//! | Variable          | Default       |
//! |-------------------|---------------|
//! | `PORT`            | `8000`        |
//! | `ADMIN_USER`      | `admin`       |
//! | `ADMIN_PASSWORD`  | `pakistanmc`  |
//! | `ALLOWED_ORIGINS` | mirror origin |
//! | `NODE_ENV`        | `development` |
//! | `BODY_LIMIT`      | `10mb`        |
//! | `DATA_FILE`       | `data.json`   |
//! | `STATIC_DIR`      | `public`      |
//! | `BACKUP_DIR`      | beside `DATA_FILE` |

use crate::persistence::DataStore;

use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ADMIN_USER: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "pakistanmc";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;
pub const DEFAULT_DATA_FILE: &str = "data.json";
pub const DEFAULT_STATIC_DIR: &str = "public";

/// Which origins the CORS layer lets through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// Reflect whatever `Origin` the browser sent (credentials stay allowed).
    Mirror,
    /// `*` - any origin, no credentials.
    Any,
    /// Explicit allow-list.
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub admin_user: String,
    pub admin_password: String,
    pub cors_origins: CorsOrigins,
    pub environment: String,
    pub body_limit: usize,
    pub data_file: PathBuf,
    pub static_dir: PathBuf,
    /// Where corrupt-file backups go; `None` keeps them next to the data file.
    pub backup_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            admin_user: DEFAULT_ADMIN_USER.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            cors_origins: CorsOrigins::Mirror,
            environment: DEFAULT_ENVIRONMENT.to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            backup_dir: None,
        }
    }
}

impl AppConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// `from_env` is a thin wrapper over this; tests feed a map instead of
    /// mutating the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name).and_then(|v| {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        };

        let mut config = Self::default();

        if let Some(port) = get("PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got '{}'", port))?;
        }
        if let Some(user) = get("ADMIN_USER") {
            config.admin_user = user;
        }
        if let Some(password) = get("ADMIN_PASSWORD") {
            config.admin_password = password;
        }
        if let Some(origins) = get("ALLOWED_ORIGINS") {
            config.cors_origins = parse_cors_origins(&origins);
        }
        if let Some(environment) = get("NODE_ENV") {
            config.environment = environment;
        }
        if let Some(limit) = get("BODY_LIMIT") {
            config.body_limit = parse_byte_size(&limit)
                .with_context(|| format!("BODY_LIMIT must look like '10mb' or '1048576', got '{}'", limit))?;
        }
        if let Some(path) = get("DATA_FILE") {
            config.data_file = PathBuf::from(path);
        }
        if let Some(dir) = get("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        config.backup_dir = get("BACKUP_DIR").map(PathBuf::from);

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// The data store described by this configuration, not yet loaded.
    pub fn data_store(&self) -> DataStore {
        let store = DataStore::new(self.data_file.clone());
        match &self.backup_dir {
            Some(dir) => store.with_backup_dir(dir.clone()),
            None => store,
        }
    }

    pub fn uses_default_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }
}

fn parse_cors_origins(value: &str) -> CorsOrigins {
    if value == "*" {
        return CorsOrigins::Any;
    }

    let origins: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        CorsOrigins::Mirror
    } else {
        CorsOrigins::List(origins)
    }
}

/// Parses sizes such as `10mb`, `512kb`, `1gb` or a bare byte count.
/// Units are binary (1kb = 1024 bytes).
pub fn parse_byte_size(value: &str) -> Result<usize> {
    let lower = value.trim().to_ascii_lowercase();
    let split = lower
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(lower.len());
    let (digits, unit) = lower.split_at(split);

    let amount: usize = digits
        .parse()
        .with_context(|| format!("missing numeric amount in '{}'", value))?;

    let multiplier: usize = match unit.trim() {
        "" | "b" => 1,
        "kb" | "k" => 1024,
        "mb" | "m" => 1024 * 1024,
        "gb" | "g" => 1024 * 1024 * 1024,
        other => anyhow::bail!("unknown size unit '{}'", other),
    };

    amount
        .checked_mul(multiplier)
        .with_context(|| format!("size '{}' overflows", value))
}
