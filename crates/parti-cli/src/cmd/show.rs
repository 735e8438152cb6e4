use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use parti_core::{PartitionShow, Provisioner, StatementExecutor};

use crate::settings::Settings;

#[derive(Args, Debug, Clone)]
pub struct ShowCommand {
    #[arg(long, value_name = "NAME", help = "实体名或表名")]
    pub table: String,

    #[arg(long, default_value = "all", value_parser = PartitionShow::parse, help = "all, current 或 previous")]
    pub show: PartitionShow,
}

impl ShowCommand {
    pub async fn run(
        &self,
        provisioner: &Provisioner,
        exec: &dyn StatementExecutor,
        settings: &Settings,
        out: &mut dyn Write,
    ) -> Result<()> {
        let schema = settings.find(&self.table)?;
        let entity = provisioner
            .resolve(exec, schema)
            .await
            .with_context(|| format!("resolve partitioning for \"{}\" failed", schema.name))?;

        match entity.show_filter(self.show).predicate(provisioner.now())? {
            Some(predicate) => writeln!(out, "{predicate}")?,
            None => writeln!(out, "-- {}: all partitions", schema.table)?,
        }
        Ok(())
    }
}
