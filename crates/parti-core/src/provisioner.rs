use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::descriptor::PartitionDescriptor;
use crate::error::{InvalidPartitionColumnSnafu, Result};
use crate::executor::StatementExecutor;
use crate::filter::{PartitionShow, ShowFilter};
use crate::granularity::PartitionGranularity;
use crate::options::EntitySchema;
use crate::period::PeriodCalculator;
use crate::registry::{ResolvedStrategy, StrategyRegistry};

/// 可分区的实体
pub trait PartitionedEntity: Send + Sync {
    fn schema(&self) -> &EntitySchema;

    /// 分区列的值, 为空时使用当前时间
    fn partition_value(&self) -> Option<NaiveDateTime>;
}

/// 实体解析结果, 按实体名称缓存, 表结构声明变化时重新解析
#[derive(Debug)]
pub struct ResolvedEntity {
    pub schema: EntitySchema,
    pub resolved: ResolvedStrategy,
    pub column_type: String,
    pub calculator: PeriodCalculator,
}

impl ResolvedEntity {
    pub fn granularity(&self) -> PartitionGranularity {
        self.resolved.config.granularity
    }

    pub fn descriptor(&self, value: NaiveDateTime) -> Result<PartitionDescriptor> {
        let granularity = self.granularity();
        Ok(PartitionDescriptor {
            table: self.schema.table.clone(),
            column: self.schema.options.partition_column.clone(),
            primary_key: self.schema.primary_key.clone(),
            column_type: self.column_type.clone(),
            granularity,
            key: self.calculator.key_for(value, granularity)?,
            period: self.calculator.period_for(value, granularity)?,
        })
    }

    pub fn show_filter(&self, show: PartitionShow) -> ShowFilter {
        ShowFilter::new(self.calculator, self.granularity(), show, self.schema.options.partition_column.clone())
    }
}

/// `ensure_partition` 的结果
#[derive(Clone, Debug)]
pub struct Provisioned {
    pub descriptor: PartitionDescriptor,
    /// 本次调用是否执行了建分区语句
    pub created: bool,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// 写入前确保目标分区存在.
///
/// 配置校验与列类型查询只在实体第一次使用时执行, 结果缓存.
/// 分区是否存在则每次都查询数据库, 不做缓存.
pub struct Provisioner {
    backend: String,
    registry: StrategyRegistry,
    cache: RwLock<HashMap<String, Arc<ResolvedEntity>>>,
    clock: fn() -> NaiveDateTime,
}

impl Provisioner {
    pub fn new(backend: impl Into<String>) -> Self {
        Self::with_registry(backend, StrategyRegistry::default())
    }

    pub fn with_registry(backend: impl Into<String>, registry: StrategyRegistry) -> Self {
        Self { backend: backend.into(), registry, cache: RwLock::new(HashMap::new()), clock: local_now }
    }

    /// 替换分区值为空时使用的时钟
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    /// 校验配置并解析策略, 所有配置类错误都在这里产生
    pub async fn resolve(&self, exec: &dyn StatementExecutor, schema: &EntitySchema) -> Result<Arc<ResolvedEntity>> {
        let cached = self.cache.read().await.get(&schema.name).cloned();
        if let Some(entity) = cached
            && entity.schema == *schema
        {
            return Ok(entity);
        }

        schema.validate()?;
        let resolved = self.registry.resolve_options(&self.backend, &schema.options)?;

        let column = &schema.options.partition_column;
        let Some(column_type) = resolved.strategy.column_type(exec, &schema.table, column).await? else {
            return InvalidPartitionColumnSnafu { model: &schema.name, value: column, allowed: schema.columns.clone() }
                .fail();
        };
        let resolution = resolved.strategy.resolution_for(&column_type)?;

        let entity = Arc::new(ResolvedEntity {
            schema: schema.clone(),
            resolved,
            column_type,
            calculator: PeriodCalculator::new(resolution),
        });
        debug!(
            model = schema.name,
            table = schema.table,
            column_type = entity.column_type,
            strategy = entity.resolved.strategy.name(),
            "partitioned entity resolved"
        );

        let mut cache = self.cache.write().await;
        match cache.get(&schema.name) {
            Some(current) if current.schema == *schema => Ok(current.clone()),
            _ => {
                cache.insert(schema.name.clone(), entity.clone());
                Ok(entity)
            }
        }
    }

    /// 指定时间(默认当前时间)所属分区的描述
    pub async fn descriptor(
        &self,
        exec: &dyn StatementExecutor,
        schema: &EntitySchema,
        value: Option<NaiveDateTime>,
    ) -> Result<PartitionDescriptor> {
        let entity = self.resolve(exec, schema).await?;
        entity.descriptor(value.unwrap_or_else(self.clock))
    }

    /// 一次性调整父表结构, 可重复执行
    pub async fn prepare(&self, exec: &dyn StatementExecutor, schema: &EntitySchema) -> Result<PartitionDescriptor> {
        let entity = self.resolve(exec, schema).await?;
        let descriptor = entity.descriptor(self.now())?;
        entity.resolved.strategy.prepare(exec, &descriptor).await?;
        info!(model = schema.name, table = schema.table, backend = self.backend, "partitioned table prepared");
        Ok(descriptor)
    }

    /// 确保实体所属分区存在
    pub async fn ensure_partition<T>(&self, exec: &dyn StatementExecutor, entity: &T) -> Result<Provisioned>
    where
        T: PartitionedEntity + ?Sized,
    {
        let resolved = self.resolve(exec, entity.schema()).await?;
        let value = entity.partition_value().unwrap_or_else(self.clock);
        let descriptor = resolved.descriptor(value)?;
        let strategy = &resolved.resolved.strategy;

        if strategy.exists(exec, &descriptor).await? {
            return Ok(Provisioned { descriptor, created: false });
        }

        strategy.create(exec, &descriptor).await?;
        info!(
            table = descriptor.table,
            partition = descriptor.partition_name(),
            period = %descriptor.period,
            "partition created"
        );
        Ok(Provisioned { descriptor, created: true })
    }

    /// 先确保分区存在再执行写入, 分区创建失败时不会执行写入
    pub async fn ensure_partition_then_write<T, F, Fut, R, E>(
        &self,
        exec: &dyn StatementExecutor,
        entity: &T,
        write_fn: F,
    ) -> Result<R, E>
    where
        T: PartitionedEntity + ?Sized,
        F: FnOnce(Provisioned) -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: From<crate::error::Error>,
    {
        let provisioned = self.ensure_partition(exec, entity).await?;
        write_fn(provisioned).await
    }

    /// 清除实体的解析缓存, 表结构变更后使用
    pub async fn invalidate(&self, name: &str) -> bool {
        self.cache.write().await.remove(name).is_some()
    }
}
