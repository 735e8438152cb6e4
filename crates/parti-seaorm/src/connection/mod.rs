use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr};
use tracing::info;

mod cfg;
pub use cfg::*;

impl From<Config> for ConnectOptions {
    fn from(cfg: Config) -> Self {
        let mut opt = ConnectOptions::new(cfg.database_url);
        opt.max_connections(cfg.max_connections)
            .min_connections(cfg.min_connections)
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_seconds))
            .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(cfg.idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(cfg.max_lifetime_seconds))
            .sqlx_logging(cfg.sqlx_logging)
            .sqlx_logging_level(cfg.sqlx_log_level)
            .sqlx_slow_statements_logging_settings(
                cfg.slow_statements_log_level,
                Duration::from_millis(cfg.slow_statements_threshold_millis),
            );

        if let Some(schema) = cfg.database_schema {
            opt.set_schema_search_path(schema);
        }
        opt
    }
}

/// 创建数据库连接
pub async fn connect(cfg: Config) -> Result<DatabaseConnection, DbErr> {
    let conn = Database::connect(ConnectOptions::from(cfg)).await?;
    info!(backend = backend_id(conn.get_database_backend()), "database connected");
    Ok(conn)
}

/// 分区策略注册表使用的后端标识
pub fn backend_id(backend: DatabaseBackend) -> &'static str {
    match backend {
        DatabaseBackend::MySql => "mysql",
        DatabaseBackend::Postgres => "postgresql",
        DatabaseBackend::Sqlite => "sqlite",
    }
}
