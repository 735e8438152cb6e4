//! 分区生命周期: prepare / exists / create
//!
//! 两种实现的结构完全不同:
//! - [`RangeListStrategy`]: MySQL 原生 `PARTITION BY RANGE`, 每个分区只声明上界
//! - [`InheritanceTriggerStrategy`]: PostgreSQL 继承子表 + 插入触发器, 子表同时约束上下界

use async_trait::async_trait;
use snafu::ResultExt;
use tracing::debug;

use crate::descriptor::PartitionDescriptor;
use crate::error::{ProvisioningFailedSnafu, Result};
use crate::executor::{SqlStatement, StatementExecutor};
use crate::period::Resolution;

mod inheritance;
mod range_list;

pub use inheritance::*;
pub use range_list::*;

#[async_trait]
pub trait PartitionStrategy: Send + Sync {
    /// 策略名称
    fn name(&self) -> &'static str;

    /// 查询分区列实际类型的语句
    fn column_type_statement(&self, table: &str, column: &str) -> SqlStatement;

    /// 分区列类型对应的时间精度, 没有对应分区函数时报错
    fn resolution_for(&self, column_type: &str) -> Result<Resolution>;

    fn exists_statement(&self, descriptor: &PartitionDescriptor) -> SqlStatement;

    fn create_statements(&self, descriptor: &PartitionDescriptor) -> Result<Vec<SqlStatement>>;

    /// 一次性的父表结构调整, 可重复执行
    async fn prepare(&self, exec: &dyn StatementExecutor, descriptor: &PartitionDescriptor) -> Result<()>;

    /// 从数据库目录中查询分区列的实际类型
    async fn column_type(&self, exec: &dyn StatementExecutor, table: &str, column: &str) -> Result<Option<String>> {
        let statement = self.column_type_statement(table, column);
        let column_type = exec
            .query_text(&statement)
            .await
            .context(ProvisioningFailedSnafu { table, operation: "introspect" })?;
        Ok(column_type.map(|t| t.trim().to_ascii_lowercase()))
    }

    /// 分区是否已存在, 每次都查询数据库目录
    async fn exists(&self, exec: &dyn StatementExecutor, descriptor: &PartitionDescriptor) -> Result<bool> {
        let statement = self.exists_statement(descriptor);
        let count = exec
            .query_count(&statement)
            .await
            .context(ProvisioningFailedSnafu { table: &descriptor.table, operation: "check" })?;
        debug!(table = descriptor.table, partition = descriptor.partition_name(), exists = count > 0, "partition looked up");
        Ok(count > 0)
    }

    /// 创建分区, 分区已存在时不报错
    async fn create(&self, exec: &dyn StatementExecutor, descriptor: &PartitionDescriptor) -> Result<()> {
        for statement in self.create_statements(descriptor)? {
            execute_idempotent(exec, &descriptor.table, "create", &statement).await?;
        }
        Ok(())
    }
}

/// 执行 DDL, 并把"对象已存在"视为成功. 返回值表示语句是否真正生效
pub(crate) async fn execute_idempotent(
    exec: &dyn StatementExecutor,
    table: &str,
    operation: &'static str,
    statement: &SqlStatement,
) -> Result<bool> {
    match exec.execute(statement).await {
        Ok(()) => Ok(true),
        Err(err) if err.is_duplicate_object() => {
            debug!(table, operation, error = %err, "object already exists, ignored");
            Ok(false)
        }
        Err(err) => Err(err).context(ProvisioningFailedSnafu { table, operation }),
    }
}

pub(crate) async fn execute(
    exec: &dyn StatementExecutor,
    table: &str,
    operation: &'static str,
    statement: &SqlStatement,
) -> Result<()> {
    exec.execute(statement).await.context(ProvisioningFailedSnafu { table, operation })
}

pub(crate) fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
