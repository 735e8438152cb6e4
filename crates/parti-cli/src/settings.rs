use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use parti_core::EntitySchema;
use parti_log::LogConfig;
use serde::Deserialize;

/// 命令行工具的配置: `log`, `db`, `tables` 三个部分
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: LogConfig,
    pub db: parti_seaorm::Config,
    pub tables: Vec<EntitySchema>,
}

impl Settings {
    /// 依次加载配置文件与 `PARTI__*` 环境变量, `db.url` 为空时使用 `DATABASE_URL`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            let path = fs::canonicalize(path).with_context(|| format!("canonicalize config path failed: {path:?}"))?;
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix("PARTI").separator("__"));

        let mut settings = Self::from_builder(builder)?;
        if settings.db.database_url.is_empty()
            && let Ok(url) = std::env::var("DATABASE_URL")
        {
            settings.db.database_url = url;
        }
        Ok(settings)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = builder.build().context("config load failed")?;
        config.try_deserialize().context("config deserialize failed")
    }

    /// 按实体名或表名查找, 未指定时返回全部实体
    pub fn select(&self, names: &[String]) -> Result<Vec<&EntitySchema>> {
        if names.is_empty() {
            return Ok(self.tables.iter().collect());
        }
        names.iter().map(|name| self.find(name)).collect()
    }

    pub fn find(&self, name: &str) -> Result<&EntitySchema> {
        match self.tables.iter().find(|t| t.name == name || t.table == name) {
            Some(schema) => Ok(schema),
            None => {
                let available = self.tables.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
                bail!("unknown partitioned model \"{name}\", configured models are: {}", available.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;
    use parti_log::{Level, LogFormat};

    use super::*;

    const SAMPLE: &str = r#"
        [log]
        level = "debug"
        format = "json"

        [db]
        url = "mysql://root@localhost/app"
        max_connections = 2

        [[tables]]
        name = "Event"
        table = "events"
        columns = ["id", "created_at"]

        [tables.options]
        partition_type = "range"
        partition_range = "month"
        partition_column = "created_at"

        [[tables]]
        name = "AuditLog"
        table = "audit_logs"
        primary_key = ["id", "tenant_id"]
        columns = ["id", "tenant_id", "logged_at"]

        [tables.options]
        partition_type = "range"
        partition_range = "day"
        partition_subtype = "date"
        partition_column = "logged_at"
    "#;

    fn sample() -> Settings {
        Settings::from_builder(Config::builder().add_source(File::from_str(SAMPLE, FileFormat::Toml))).unwrap()
    }

    #[test]
    fn loads_all_sections() {
        let settings = sample();
        assert_eq!(settings.log.level, Level::DEBUG);
        assert_eq!(settings.log.format, LogFormat::Json);
        assert_eq!(settings.db.database_url, "mysql://root@localhost/app");
        assert_eq!(settings.db.max_connections, 2);
        assert_eq!(settings.tables.len(), 2);
        assert_eq!(settings.tables[0].primary_key, ["id"]);
        assert_eq!(settings.tables[0].options.partition_subtype, "date");
    }

    #[test]
    fn select_by_model_or_table_name() {
        let settings = sample();
        assert_eq!(settings.select(&[]).unwrap().len(), 2);

        let selected = settings.select(&["audit_logs".to_string()]).unwrap();
        assert_eq!(selected[0].name, "AuditLog");

        let err = settings.select(&["Missing".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Event, AuditLog"));
    }

    #[test]
    fn empty_config_has_no_tables() {
        let settings = Settings::from_builder(Config::builder()).unwrap();
        assert!(settings.tables.is_empty());
        assert_eq!(settings.log, LogConfig::default());
    }
}
