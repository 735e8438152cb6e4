pub use parti_core::*;
pub use tracing;

#[cfg(feature = "log")]
pub mod log {
    pub use parti_log::{InitError, Level, LogConfig, LogFormat, LogTarget, init};
}

#[cfg(feature = "seaorm")]
pub mod db {
    pub use parti_seaorm::connection::{Config, backend_id, connect};
    pub use parti_seaorm::{SeaOrmExecutor, period_condition, sea_orm};
}
