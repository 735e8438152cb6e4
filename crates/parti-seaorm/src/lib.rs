pub use sea_orm;

pub mod condition;
pub mod connection;
pub mod executor;

pub use condition::period_condition;
pub use connection::{Config, backend_id, connect};
pub use executor::SeaOrmExecutor;
