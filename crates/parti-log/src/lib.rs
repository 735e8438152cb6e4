use std::sync::OnceLock;

use snafu::Snafu;
pub use tracing;
use tracing_appender::non_blocking::WorkerGuard;

pub use self::config::*;
pub use self::format::*;
use crate::timer::LocalTimer;

mod config;
mod format;
mod timer;

static TRACING_APPENDER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Snafu)]
pub enum InitError {
    #[snafu(display("Failed to install tracing subscriber: {message}"))]
    Subscriber { message: String },

    #[snafu(display("Tracing subscriber already initialized"))]
    AlreadyInitialized,
}

/// 安装全局 tracing subscriber, 进程内只能调用一次
pub fn init(conf: &LogConfig) -> Result<(), InitError> {
    let (non_blocking, guard) = match conf.target {
        LogTarget::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogTarget::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    let sub_builder = tracing_subscriber::fmt()
        .with_max_level(conf.level)
        .with_file(conf.with_filename)
        .with_line_number(conf.with_line_number)
        .with_target(conf.with_target)
        .with_ansi(conf.ansi)
        .with_timer(LocalTimer)
        .with_writer(non_blocking);

    let installed = match conf.format {
        LogFormat::Compact => sub_builder.compact().try_init(),
        LogFormat::Pretty => sub_builder.pretty().try_init(),
        LogFormat::Json => sub_builder.json().try_init(),
    };
    installed.map_err(|err| InitError::Subscriber { message: err.to_string() })?;

    TRACING_APPENDER_GUARD.set(guard).map_err(|_| InitError::AlreadyInitialized)
}
