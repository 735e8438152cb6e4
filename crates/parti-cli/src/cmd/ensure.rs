use std::io::Write;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::Args;
use parti_core::{EntitySchema, PartitionedEntity, Provisioner, StatementExecutor};

use crate::settings::Settings;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// 解析 `--at`, 只有日期时取当天零点
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .map_err(|_| format!("invalid timestamp \"{value}\", expected YYYY-MM-DD[ HH:MM:SS]"))
}

#[derive(Args, Debug, Clone)]
pub struct EnsureCommand {
    #[arg(long, value_name = "NAME", help = "实体名或表名")]
    pub table: String,

    #[arg(long, value_parser = parse_timestamp, help = "分区时间, 默认当前时间")]
    pub at: Option<NaiveDateTime>,
}

struct Target<'a> {
    schema: &'a EntitySchema,
    at: Option<NaiveDateTime>,
}

impl PartitionedEntity for Target<'_> {
    fn schema(&self) -> &EntitySchema {
        self.schema
    }

    fn partition_value(&self) -> Option<NaiveDateTime> {
        self.at
    }
}

impl EnsureCommand {
    pub async fn run(
        &self,
        provisioner: &Provisioner,
        exec: &dyn StatementExecutor,
        settings: &Settings,
        out: &mut dyn Write,
    ) -> Result<()> {
        let schema = settings.find(&self.table)?;
        let provisioned = provisioner
            .ensure_partition(exec, &Target { schema, at: self.at })
            .await
            .with_context(|| format!("ensure partition for \"{}\" failed", schema.name))?;

        let descriptor = &provisioned.descriptor;
        let state = if provisioned.created { "created" } else { "already exists" };
        writeln!(out, "Partition {} {} {state}", descriptor.partition_name(), descriptor.period)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_timestamp_layouts() {
        assert_eq!(parse_timestamp("2024-03-15").unwrap().to_string(), "2024-03-15 00:00:00");
        assert_eq!(parse_timestamp("2024-03-15T08:30:00").unwrap().to_string(), "2024-03-15 08:30:00");
        assert_eq!(parse_timestamp("2024-03-15 08:30").unwrap().to_string(), "2024-03-15 08:30:00");
        assert_eq!(parse_timestamp("2024-03-15 08:30:00.25").unwrap().to_string(), "2024-03-15 08:30:00.250");
        assert!(parse_timestamp("15/03/2024").is_err());
    }
}
