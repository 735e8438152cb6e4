use anyhow::{Context, Result};
use clap::Parser;
use parti_core::Provisioner;
use parti_seaorm::SeaOrmExecutor;
use tracing::debug;

use crate::command::{Cli, Command};
use crate::settings::Settings;

mod cmd;
mod command;
mod settings;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    let log = settings.log.clone().with_level(cli.effective_level(settings.log.level));
    parti_log::init(&log)?;
    debug!(tables = settings.tables.len(), "settings loaded");

    let conn = parti_seaorm::connect(settings.db.clone()).await.context("connect database failed")?;
    let exec = SeaOrmExecutor::new(&conn);
    let provisioner = Provisioner::new(exec.backend());

    let mut out = std::io::stdout();
    match &cli.command {
        Command::Prepare(cmd) => cmd.run(&provisioner, &exec, &settings, &mut out, &mut std::io::stderr()).await,
        Command::Ensure(cmd) => cmd.run(&provisioner, &exec, &settings, &mut out).await,
        Command::Show(cmd) => cmd.run(&provisioner, &exec, &settings, &mut out).await,
    }
}
