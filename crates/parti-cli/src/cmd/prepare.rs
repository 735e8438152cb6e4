use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use parti_core::{Provisioner, StatementExecutor};
use tracing::info;

use crate::settings::Settings;

#[derive(Args, Debug, Clone)]
pub struct PrepareCommand {
    #[arg(long = "table", value_name = "NAME", help = "只处理指定的实体, 可重复")]
    pub tables: Vec<String>,
}

impl PrepareCommand {
    pub async fn run(
        &self,
        provisioner: &Provisioner,
        exec: &dyn StatementExecutor,
        settings: &Settings,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<()> {
        let schemas = settings.select(&self.tables)?;
        if schemas.is_empty() {
            writeln!(err, "Unable to find any partitionable models in the configuration")?;
            return Ok(());
        }

        let mut names = Vec::with_capacity(schemas.len());
        for schema in schemas {
            let descriptor = provisioner
                .prepare(exec, schema)
                .await
                .with_context(|| format!("prepare partitioning for \"{}\" failed", schema.name))?;
            info!(model = schema.name, partition = descriptor.partition_name(), "model prepared");
            names.push(schema.name.as_str());
        }

        writeln!(out, "Successfully (re)configured the database for the following models: {}", names.join(", "))?;
        Ok(())
    }
}
