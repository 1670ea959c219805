use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{ConnectOptions, MySqlPool};
use std::str::FromStr;
use std::time::Duration;
use tiberius::{AuthMethod, Config};

use crate::config::SqlServerConfig;

/// Pool for the MySQL inventory database.
pub async fn create_mysql_pool(database_url: &str, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
    let connect_options = MySqlConnectOptions::from_str(database_url)?
        .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(5));

    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await
}

/// tiberius connection settings for the SQL Server sales database.
pub fn sqlserver_config(settings: &SqlServerConfig) -> Config {
    let mut config = Config::new();
    config.host(&settings.host);
    config.port(settings.port);
    config.database(&settings.database);
    config.authentication(AuthMethod::sql_server(&settings.user, &settings.password));
    if settings.trust_cert {
        config.trust_cert();
    }
    config
}
