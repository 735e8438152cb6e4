use async_trait::async_trait;
use snafu::ResultExt;
use tracing::info;

use super::{PartitionStrategy, execute, execute_idempotent, names};
use crate::descriptor::PartitionDescriptor;
use crate::error::{PartitionFunctionUnavailableSnafu, ProvisioningFailedSnafu, Result};
use crate::executor::{SqlStatement, StatementExecutor, StatementSnafu};
use crate::period::Resolution;

const BACKEND: &str = "mysql";
const COLUMN_TYPES: [&str; 3] = ["date", "datetime", "timestamp"];

/// 分区函数, 把分区列的值映射为整数
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PartitionFunction {
    /// 日期序号, 用于 date/datetime 列
    ToDays,
    /// 秒级时间戳, 用于 timestamp 列
    UnixTimestamp,
}

impl PartitionFunction {
    pub fn for_column_type(column_type: &str) -> Result<Self> {
        match column_type {
            "date" | "datetime" => Ok(PartitionFunction::ToDays),
            "timestamp" => Ok(PartitionFunction::UnixTimestamp),
            other => {
                PartitionFunctionUnavailableSnafu { backend: BACKEND, value: other, allowed: names(&COLUMN_TYPES) }
                    .fail()
            }
        }
    }

    pub fn sql_name(&self) -> &'static str {
        match self {
            PartitionFunction::ToDays => "TO_DAYS",
            PartitionFunction::UnixTimestamp => "UNIX_TIMESTAMP",
        }
    }
}

/// MySQL 范围分区.
///
/// 分区定义在父表上, 每个分区只有上界 `VALUES LESS THAN`. MySQL 客户端不支持复合语句,
/// 所以每条语句单独执行.
///
/// `ADD PARTITION` 只能追加比现有分区更大的上界. 补写历史数据时, 如果已经存在更晚的分区,
/// 就把紧随其后的分区拆成两个 (`REORGANIZE PARTITION`).
#[derive(Clone, Debug, Default)]
pub struct RangeListStrategy;

impl RangeListStrategy {
    pub fn new() -> Self {
        Self
    }

    /// 主键中是否已包含分区列
    pub fn primary_key_statement(&self, descriptor: &PartitionDescriptor) -> SqlStatement {
        SqlStatement::with_values(
            r#"SELECT COUNT(*) FROM information_schema.key_column_usage
            WHERE table_schema = DATABASE() AND table_name = ? AND constraint_name = 'PRIMARY' AND column_name = ?"#,
            [descriptor.table.as_str(), descriptor.column.as_str()],
        )
    }

    /// 父表是否已经分区
    pub fn partitioned_statement(&self, descriptor: &PartitionDescriptor) -> SqlStatement {
        SqlStatement::with_values(
            r#"SELECT COUNT(*) FROM information_schema.partitions
            WHERE table_schema = DATABASE() AND table_name = ? AND partition_name IS NOT NULL"#,
            [descriptor.table.as_str()],
        )
    }

    /// 重建主键, 分区列必须是主键的一部分
    pub fn rebuild_primary_key_statement(&self, descriptor: &PartitionDescriptor) -> SqlStatement {
        let columns = descriptor
            .primary_key
            .iter()
            .filter(|pk| *pk != &descriptor.column)
            .chain(std::iter::once(&descriptor.column))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        SqlStatement::new(format!(
            "ALTER TABLE {table} DROP PRIMARY KEY, ADD PRIMARY KEY ({columns})",
            table = descriptor.table,
        ))
    }

    /// 初始化分区, 第一个分区是上界小于 0 的零分区
    pub fn partition_by_statement(&self, descriptor: &PartitionDescriptor) -> Result<SqlStatement> {
        let function = PartitionFunction::for_column_type(&descriptor.column_type)?;
        Ok(SqlStatement::new(format!(
            "ALTER TABLE {table} PARTITION BY RANGE ({function}({column})) (PARTITION {zero} VALUES LESS THAN (0))",
            table = descriptor.table,
            function = function.sql_name(),
            column = descriptor.column,
            zero = descriptor.zero_partition_name(),
        )))
    }

    /// 目标分区的上界表达式, 即区间最后一天/最后一秒 + 1
    pub fn upper_bound(&self, descriptor: &PartitionDescriptor) -> Result<String> {
        let function = PartitionFunction::for_column_type(&descriptor.column_type)?;
        let period_end = match descriptor.period.resolution {
            Resolution::Date => descriptor.period.end_string(),
            Resolution::Timestamp => descriptor.period.end.format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        Ok(format!("{}('{period_end}') + 1", function.sql_name()))
    }

    /// 紧随目标分区之后的现有分区.
    ///
    /// 同一粒度的分区名按字典序即时间顺序, 零分区最小.
    pub fn next_partition_statement(&self, descriptor: &PartitionDescriptor) -> SqlStatement {
        SqlStatement::with_values(
            r#"SELECT partition_name FROM information_schema.partitions
            WHERE table_schema = DATABASE() AND table_name = ? AND partition_name > ?
            ORDER BY partition_ordinal_position LIMIT 1"#,
            [descriptor.table.clone(), descriptor.partition_name()],
        )
    }

    /// 现有分区的上界, 即 `VALUES LESS THAN` 的计算结果
    pub fn partition_bound_statement(&self, descriptor: &PartitionDescriptor, partition: &str) -> SqlStatement {
        SqlStatement::with_values(
            r#"SELECT partition_description FROM information_schema.partitions
            WHERE table_schema = DATABASE() AND table_name = ? AND partition_name = ?"#,
            [descriptor.table.as_str(), partition],
        )
    }

    pub fn add_partition_statement(&self, descriptor: &PartitionDescriptor) -> Result<SqlStatement> {
        Ok(SqlStatement::new(format!(
            "ALTER TABLE {table} ADD PARTITION (PARTITION {partition} VALUES LESS THAN ({bound}))",
            table = descriptor.table,
            partition = descriptor.partition_name(),
            bound = self.upper_bound(descriptor)?,
        )))
    }

    /// 把 `next` 拆成目标分区和 `next` 本身, `next` 保留原上界
    pub fn reorganize_statement(
        &self,
        descriptor: &PartitionDescriptor,
        next: &str,
        next_bound: &str,
    ) -> Result<SqlStatement> {
        Ok(SqlStatement::new(format!(
            "ALTER TABLE {table} REORGANIZE PARTITION {next} INTO (PARTITION {partition} VALUES LESS THAN ({bound}), PARTITION {next} VALUES LESS THAN ({next_bound}))",
            table = descriptor.table,
            partition = descriptor.partition_name(),
            bound = self.upper_bound(descriptor)?,
        )))
    }

    async fn query_partition(
        &self,
        exec: &dyn StatementExecutor,
        descriptor: &PartitionDescriptor,
        statement: &SqlStatement,
    ) -> Result<Option<String>> {
        exec.query_text(statement)
            .await
            .context(ProvisioningFailedSnafu { table: &descriptor.table, operation: "create" })
    }
}

/// 分区上界只会是整数或 MAXVALUE, 其他内容不允许拼进 DDL
fn is_partition_bound(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    value == "MAXVALUE" || (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

#[async_trait]
impl PartitionStrategy for RangeListStrategy {
    fn name(&self) -> &'static str {
        "range_list"
    }

    fn column_type_statement(&self, table: &str, column: &str) -> SqlStatement {
        SqlStatement::with_values(
            r#"SELECT CAST(data_type AS CHAR) FROM information_schema.columns
            WHERE table_schema = DATABASE() AND table_name = ? AND column_name = ?"#,
            [table, column],
        )
    }

    fn resolution_for(&self, column_type: &str) -> Result<Resolution> {
        PartitionFunction::for_column_type(column_type)?;
        // datetime 列同样按整天分区, 但列本身保留时间部分
        Ok(if column_type == "date" { Resolution::Date } else { Resolution::Timestamp })
    }

    fn exists_statement(&self, descriptor: &PartitionDescriptor) -> SqlStatement {
        SqlStatement::with_values(
            r#"SELECT COUNT(*) FROM information_schema.partitions
            WHERE table_schema = DATABASE() AND table_name = ? AND partition_name = ?"#,
            [descriptor.table.clone(), descriptor.partition_name()],
        )
    }

    fn create_statements(&self, descriptor: &PartitionDescriptor) -> Result<Vec<SqlStatement>> {
        Ok(vec![self.add_partition_statement(descriptor)?])
    }

    async fn create(&self, exec: &dyn StatementExecutor, descriptor: &PartitionDescriptor) -> Result<()> {
        let table = descriptor.table.as_str();
        let next = self.query_partition(exec, descriptor, &self.next_partition_statement(descriptor)).await?;
        let Some(next) = next else {
            execute_idempotent(exec, table, "create", &self.add_partition_statement(descriptor)?).await?;
            return Ok(());
        };

        let bound = self.query_partition(exec, descriptor, &self.partition_bound_statement(descriptor, &next)).await?;
        let bound = match bound.map(|b| b.trim().to_string()) {
            Some(bound) if is_partition_bound(&bound) => bound,
            other => {
                return StatementSnafu { message: format!("unexpected bound {other:?} for partition {next}") }
                    .fail()
                    .context(ProvisioningFailedSnafu { table, operation: "create" });
            }
        };
        execute_idempotent(exec, table, "create", &self.reorganize_statement(descriptor, &next, &bound)?).await?;
        info!(table, partition = descriptor.partition_name(), next = %next, "partition split from a later one");
        Ok(())
    }

    async fn prepare(&self, exec: &dyn StatementExecutor, descriptor: &PartitionDescriptor) -> Result<()> {
        let table = descriptor.table.as_str();

        let in_primary_key = exec
            .query_count(&self.primary_key_statement(descriptor))
            .await
            .context(ProvisioningFailedSnafu { table, operation: "prepare" })?;
        if in_primary_key == 0 {
            execute(exec, table, "prepare", &self.rebuild_primary_key_statement(descriptor)).await?;
            info!(table, column = descriptor.column, "primary key rebuilt");
        }

        let partitions = exec
            .query_count(&self.partitioned_statement(descriptor))
            .await
            .context(ProvisioningFailedSnafu { table, operation: "prepare" })?;
        if partitions == 0 {
            execute(exec, table, "prepare", &self.partition_by_statement(descriptor)?).await?;
            info!(table, zero = descriptor.zero_partition_name(), "zero partition created");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::granularity::PartitionGranularity;
    use crate::period::PeriodCalculator;

    fn descriptor(column_type: &str, resolution: Resolution) -> PartitionDescriptor {
        let calc = PeriodCalculator::new(resolution);
        let t = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(9, 0, 0).unwrap();
        PartitionDescriptor {
            table: "events".to_string(),
            column: "created_at".to_string(),
            primary_key: vec!["id".to_string()],
            column_type: column_type.to_string(),
            granularity: PartitionGranularity::Month,
            key: calc.key_for(t, PartitionGranularity::Month).unwrap(),
            period: calc.period_for(t, PartitionGranularity::Month).unwrap(),
        }
    }

    #[test]
    fn partition_function_depends_on_storage_type() {
        assert_eq!(PartitionFunction::for_column_type("date").unwrap(), PartitionFunction::ToDays);
        assert_eq!(PartitionFunction::for_column_type("datetime").unwrap(), PartitionFunction::ToDays);
        assert_eq!(PartitionFunction::for_column_type("timestamp").unwrap(), PartitionFunction::UnixTimestamp);

        let err = PartitionFunction::for_column_type("varchar").unwrap_err();
        assert_eq!(err.allowed_values().unwrap(), ["date", "datetime", "timestamp"]);
    }

    #[test]
    fn create_declares_upper_bound_only() {
        let strategy = RangeListStrategy::new();
        let statements = strategy.create_statements(&descriptor("datetime", Resolution::Timestamp)).unwrap();

        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].sql,
            "ALTER TABLE events ADD PARTITION (PARTITION events_y2024m03 VALUES LESS THAN (TO_DAYS('2024-03-31 23:59:59') + 1))"
        );
        assert!(!statements[0].sql.contains(">="));
    }

    #[test]
    fn date_columns_use_date_bounds() {
        let strategy = RangeListStrategy::new();
        let statements = strategy.create_statements(&descriptor("date", Resolution::Date)).unwrap();
        assert!(statements[0].sql.contains("TO_DAYS('2024-03-31') + 1"));

        let statements = strategy.create_statements(&descriptor("timestamp", Resolution::Timestamp)).unwrap();
        assert!(statements[0].sql.contains("UNIX_TIMESTAMP('2024-03-31 23:59:59') + 1"));
    }

    #[test]
    fn prepare_statements_rebuild_key_and_seed_zero_partition() {
        let strategy = RangeListStrategy::new();
        let descriptor = descriptor("datetime", Resolution::Timestamp);

        assert_eq!(
            strategy.rebuild_primary_key_statement(&descriptor).sql,
            "ALTER TABLE events DROP PRIMARY KEY, ADD PRIMARY KEY (id, created_at)"
        );
        assert_eq!(
            strategy.partition_by_statement(&descriptor).unwrap().sql,
            "ALTER TABLE events PARTITION BY RANGE (TO_DAYS(created_at)) (PARTITION events_y0000m00 VALUES LESS THAN (0))"
        );
    }

    #[test]
    fn backfill_splits_the_following_partition() {
        let strategy = RangeListStrategy::new();
        let descriptor = descriptor("datetime", Resolution::Timestamp);

        let next = strategy.next_partition_statement(&descriptor);
        assert!(next.sql.contains("partition_name > ?"));
        assert_eq!(next.values, vec!["events", "events_y2024m03"]);

        assert_eq!(
            strategy.reorganize_statement(&descriptor, "events_y2024m04", "739373").unwrap().sql,
            "ALTER TABLE events REORGANIZE PARTITION events_y2024m04 INTO (\
             PARTITION events_y2024m03 VALUES LESS THAN (TO_DAYS('2024-03-31 23:59:59') + 1), \
             PARTITION events_y2024m04 VALUES LESS THAN (739373))"
        );
    }

    #[test]
    fn only_numeric_bounds_are_interpolated() {
        assert!(is_partition_bound("739373"));
        assert!(is_partition_bound("0"));
        assert!(is_partition_bound("MAXVALUE"));
        assert!(!is_partition_bound(""));
        assert!(!is_partition_bound("1); DROP TABLE events; --"));
    }

    #[test]
    fn exists_checks_catalog_by_table_and_partition_name() {
        let statement = RangeListStrategy::new().exists_statement(&descriptor("date", Resolution::Date));
        assert!(statement.sql.contains("information_schema.partitions"));
        assert_eq!(statement.values, vec!["events", "events_y2024m03"]);
    }
}
