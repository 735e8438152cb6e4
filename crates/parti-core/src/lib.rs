//! 基于时间的数据表分区引擎
//!
//! 按分区列的值计算目标分区, 在写入前按需创建分区. 不同数据库后端的分区方式由
//! [`StrategyRegistry`] 显式映射到 [`PartitionStrategy`] 实现.

pub mod descriptor;
pub mod error;
pub mod executor;
pub mod filter;
pub mod granularity;
pub mod options;
pub mod period;
pub mod provisioner;
pub mod registry;
pub mod strategy;

pub use descriptor::PartitionDescriptor;
pub use error::{Error, Result};
pub use executor::{ExecuteError, SqlStatement, StatementExecutor};
pub use filter::{PartitionShow, PeriodPredicate, ShowFilter};
pub use granularity::PartitionGranularity;
pub use options::{BackendConfig, EntitySchema, PartitionOptions, PartitionType, RangeSubtype};
pub use period::{PartitionKey, PartitionPeriod, PeriodCalculator, Resolution};
pub use provisioner::{PartitionedEntity, Provisioned, Provisioner, ResolvedEntity};
pub use registry::{ResolvedStrategy, StrategyFamily, StrategyRegistry};
pub use strategy::{InheritanceTriggerStrategy, PartitionStrategy, RangeListStrategy};
