use std::fmt;
use std::sync::Arc;

use strum::IntoEnumIterator;
use tracing::debug;

use crate::error::{
    Result, UnsupportedBackendSnafu, UnsupportedPartitionTypeSnafu, UnsupportedRangeGranularitySnafu,
    UnsupportedRangeSubtypeSnafu,
};
use crate::granularity::PartitionGranularity;
use crate::options::{BackendConfig, PartitionOptions, PartitionType, RangeSubtype};
use crate::strategy::{InheritanceTriggerStrategy, PartitionStrategy, RangeListStrategy};

/// 一个数据库后端支持的全部分区组合
pub struct StrategyFamily {
    backend: &'static str,
    ranges: Vec<PartitionGranularity>,
    strategies: Vec<(PartitionType, RangeSubtype, Arc<dyn PartitionStrategy>)>,
}

impl StrategyFamily {
    pub fn new(backend: &'static str, ranges: impl IntoIterator<Item = PartitionGranularity>) -> Self {
        Self { backend, ranges: ranges.into_iter().collect(), strategies: Vec::new() }
    }

    pub fn with_strategy(
        mut self,
        partition_type: PartitionType,
        subtype: RangeSubtype,
        strategy: Arc<dyn PartitionStrategy>,
    ) -> Self {
        self.strategies.push((partition_type, subtype, strategy));
        self
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    fn partition_types(&self) -> Vec<PartitionType> {
        let mut types = Vec::new();
        for (partition_type, _, _) in &self.strategies {
            if !types.contains(partition_type) {
                types.push(*partition_type);
            }
        }
        types
    }

    fn subtypes(&self, partition_type: PartitionType) -> Vec<RangeSubtype> {
        self.strategies.iter().filter(|(t, _, _)| *t == partition_type).map(|(_, s, _)| *s).collect()
    }
}

/// 解析结果: 校验后的配置与对应策略
#[derive(Clone)]
pub struct ResolvedStrategy {
    pub config: BackendConfig,
    pub strategy: Arc<dyn PartitionStrategy>,
}

impl fmt::Debug for ResolvedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedStrategy")
            .field("config", &self.config)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

/// 后端 -> 分区类型/子类型 -> 策略 的显式映射, 查找失败时不会回退到默认策略
pub struct StrategyRegistry {
    families: Vec<StrategyFamily>,
}

impl StrategyRegistry {
    /// 空注册表
    pub fn empty() -> Self {
        Self { families: Vec::new() }
    }

    pub fn register(mut self, family: StrategyFamily) -> Self {
        self.families.retain(|f| f.backend != family.backend);
        self.families.push(family);
        self
    }

    /// 已注册的后端
    pub fn backends(&self) -> Vec<String> {
        self.families.iter().map(|f| f.backend.to_string()).collect()
    }

    pub fn resolve(
        &self,
        backend: &str,
        partition_type: &str,
        partition_range: &str,
        partition_subtype: &str,
    ) -> Result<ResolvedStrategy> {
        let Some(family) = self.families.iter().find(|f| f.backend == backend) else {
            return UnsupportedBackendSnafu { value: backend, allowed: self.backends() }.fail();
        };

        let types = family.partition_types();
        let Some(partition_type) = find_named(&types, partition_type) else {
            return UnsupportedPartitionTypeSnafu {
                backend,
                value: partition_type,
                allowed: to_names(&types),
            }
            .fail();
        };

        let Some(granularity) = find_named(&family.ranges, partition_range) else {
            return UnsupportedRangeGranularitySnafu {
                backend,
                value: partition_range,
                allowed: to_names(&family.ranges),
            }
            .fail();
        };

        let subtypes = family.subtypes(partition_type);
        let Some(subtype) = find_named(&subtypes, partition_subtype) else {
            return UnsupportedRangeSubtypeSnafu { backend, value: partition_subtype, allowed: to_names(&subtypes) }
                .fail();
        };

        let strategy = family
            .strategies
            .iter()
            .find(|(t, s, _)| *t == partition_type && *s == subtype)
            .map(|(_, _, strategy)| strategy.clone());
        let Some(strategy) = strategy else {
            return UnsupportedRangeSubtypeSnafu { backend, value: partition_subtype, allowed: to_names(&subtypes) }
                .fail();
        };

        let config = BackendConfig { backend: family.backend, partition_type, granularity, subtype };
        debug!(?config, strategy = strategy.name(), "partition strategy resolved");
        Ok(ResolvedStrategy { config, strategy })
    }

    pub fn resolve_options(&self, backend: &str, options: &PartitionOptions) -> Result<ResolvedStrategy> {
        self.resolve(backend, &options.partition_type, &options.partition_range, &options.partition_subtype)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mysql = StrategyFamily::new("mysql", PartitionGranularity::iter()).with_strategy(
            PartitionType::Range,
            RangeSubtype::Date,
            Arc::new(RangeListStrategy::new()),
        );
        let postgresql = StrategyFamily::new("postgresql", PartitionGranularity::iter()).with_strategy(
            PartitionType::Range,
            RangeSubtype::Date,
            Arc::new(InheritanceTriggerStrategy::new()),
        );
        Self::empty().register(mysql).register(postgresql)
    }
}

fn find_named<T: fmt::Display + Copy>(values: &[T], name: &str) -> Option<T> {
    values.iter().find(|v| v.to_string() == name).copied()
}

fn to_names<T: fmt::Display>(values: &[T]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn resolves_each_backend_to_its_strategy() {
        let registry = StrategyRegistry::default();

        let mysql = registry.resolve("mysql", "range", "month", "date").unwrap();
        assert_eq!(mysql.strategy.name(), "range_list");
        assert_eq!(mysql.config.granularity, PartitionGranularity::Month);

        let pg = registry.resolve("postgresql", "range", "week", "date").unwrap();
        assert_eq!(pg.strategy.name(), "inheritance_trigger");
        assert_eq!(pg.config.backend, "postgresql");
    }

    #[test]
    fn unknown_granularity_lists_exactly_the_supported_ranges() {
        let err = StrategyRegistry::default().resolve("mysql", "range", "fortnight", "date").unwrap_err();
        match &err {
            Error::UnsupportedRangeGranularity { backend, value, allowed, .. } => {
                assert_eq!(backend, "mysql");
                assert_eq!(value, "fortnight");
                assert_eq!(allowed, &vec!["day", "week", "month", "year"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("\"fortnight\""));
    }

    #[test]
    fn unknown_backend_lists_registered_backends() {
        let err = StrategyRegistry::default().resolve("sqlite", "range", "month", "date").unwrap_err();
        assert!(matches!(&err, Error::UnsupportedBackend { value, .. } if value == "sqlite"));
        assert_eq!(err.allowed_values().unwrap(), ["mysql", "postgresql"]);
    }

    #[test]
    fn unknown_type_and_subtype_are_reported_per_backend() {
        let registry = StrategyRegistry::default();

        let err = registry.resolve("postgresql", "hash", "month", "date").unwrap_err();
        assert!(matches!(&err, Error::UnsupportedPartitionType { backend, .. } if backend == "postgresql"));
        assert_eq!(err.allowed_values().unwrap(), ["range"]);

        let err = registry.resolve("mysql", "range", "month", "integer").unwrap_err();
        assert!(matches!(&err, Error::UnsupportedRangeSubtype { .. }));
        assert_eq!(err.allowed_values().unwrap(), ["date"]);
    }

    #[test]
    fn allowed_values_follow_the_active_backend() {
        let registry = StrategyRegistry::default().register(
            StrategyFamily::new("mysql", [PartitionGranularity::Month, PartitionGranularity::Year]).with_strategy(
                PartitionType::Range,
                RangeSubtype::Date,
                Arc::new(RangeListStrategy::new()),
            ),
        );

        let err = registry.resolve("mysql", "range", "day", "date").unwrap_err();
        assert_eq!(err.allowed_values().unwrap(), ["month", "year"]);
        assert!(registry.resolve("postgresql", "range", "day", "date").is_ok());
    }

    #[test]
    fn validation_order_reports_first_offending_field() {
        let err = StrategyRegistry::default().resolve("mysql", "list", "fortnight", "x").unwrap_err();
        assert_eq!(err.field(), Some("partition_type"));
    }
}
