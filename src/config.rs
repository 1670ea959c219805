use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DEFAULT_BRANCH;

/// Application settings.
///
/// Layered: built-in defaults, then an optional `rotacion.toml`, then
/// `ROTACION__*` environment variables (e.g. `ROTACION__MYSQL__URL`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub mysql: MySqlConfig,
    pub sqlserver: SqlServerConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MySqlConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SqlServerConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Accept self-signed server certificates.
    pub trust_cert: bool,
}

// keeps the password out of the startup log
impl std::fmt::Debug for SqlServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("trust_cert", &self.trust_cert)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub default_branch: i32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            mysql: MySqlConfig {
                url: "mysql://root@localhost:3306/inventario".to_string(),
                max_connections: 20,
            },
            sqlserver: SqlServerConfig {
                host: "localhost".to_string(),
                port: 1433,
                user: "sa".to_string(),
                password: String::new(),
                database: "ventas".to_string(),
                trust_cert: true,
            },
            report: ReportConfig {
                default_branch: DEFAULT_BRANCH,
            },
        }
    }
}

impl AppConfig {
    /// Loads `.env`, then the layered sources.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("no .env file loaded: {}", e);
        }
        Self::load_from("rotacion")
    }

    /// Layered load with an explicit settings file stem.
    pub fn load_from(file_stem: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(
                config::Environment::with_prefix("ROTACION")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
