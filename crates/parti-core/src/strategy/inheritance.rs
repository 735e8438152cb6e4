use async_trait::async_trait;
use tracing::info;

use super::{PartitionStrategy, execute_idempotent, names};
use crate::descriptor::PartitionDescriptor;
use crate::error::{PartitionFunctionUnavailableSnafu, Result};
use crate::executor::{SqlStatement, StatementExecutor};
use crate::granularity::PartitionGranularity;
use crate::period::Resolution;

const BACKEND: &str = "postgresql";
const COLUMN_TYPES: [&str; 3] = ["date", "timestamp without time zone", "timestamp with time zone"];

/// 与 [`PeriodCalculator::key_for`](crate::period::PeriodCalculator::key_for) 一致的 `to_char` 格式
pub fn to_char_pattern(granularity: PartitionGranularity) -> &'static str {
    match granularity {
        PartitionGranularity::Day => r#""y"YYYY"d"DDD"#,
        PartitionGranularity::Week => r#""y"IYYY"w"IW"#,
        PartitionGranularity::Month => r#""y"YYYY"m"MM"#,
        PartitionGranularity::Year => r#""y"YYYY"#,
    }
}

fn literal_type(column_type: &str) -> Result<&'static str> {
    match column_type {
        "date" => Ok("DATE"),
        "timestamp" | "timestamp without time zone" => Ok("TIMESTAMP"),
        "timestamp with time zone" => Ok("TIMESTAMPTZ"),
        other => {
            PartitionFunctionUnavailableSnafu { backend: BACKEND, value: other, allowed: names(&COLUMN_TYPES) }.fail()
        }
    }
}

/// PostgreSQL 继承分区.
///
/// 每个分区是一张继承父表的子表, 通过 CHECK 约束限定上下界. 写入由 `prepare` 安装的触发器
/// 路由到子表, 触发器本身不建表, 所以子表必须在写入前创建.
#[derive(Clone, Debug, Default)]
pub struct InheritanceTriggerStrategy;

impl InheritanceTriggerStrategy {
    pub fn new() -> Self {
        Self
    }

    pub fn prepare_statements(&self, descriptor: &PartitionDescriptor) -> Vec<SqlStatement> {
        let table = &descriptor.table;
        let matches_primary_key = descriptor
            .primary_key
            .iter()
            .map(|pk| format!("{pk} = NEW.{pk}"))
            .collect::<Vec<_>>()
            .join(" AND ");

        let insert_child = format!(
            r#"
            CREATE OR REPLACE FUNCTION {table}_insert_child()
            RETURNS TRIGGER AS $$
                DECLARE tablename TEXT;
                BEGIN
                    tablename := '{table}_' || to_char(NEW.{column}, '{pattern}');
                    EXECUTE 'INSERT INTO ' || tablename || ' VALUES (($1).*);' USING NEW;
                    RETURN NEW;
                END;
            $$ LANGUAGE plpgsql;
            "#,
            column = descriptor.column,
            pattern = to_char_pattern(descriptor.granularity),
        );

        let before_insert = trigger_statement(table, "before_insert", "BEFORE", "insert_child");

        let delete_master = format!(
            r#"
            CREATE OR REPLACE FUNCTION {table}_delete_master()
            RETURNS TRIGGER AS $$
                BEGIN
                    DELETE FROM ONLY {table} WHERE {matches_primary_key};
                    RETURN NEW;
                END;
            $$ LANGUAGE plpgsql;
            "#,
        );

        let after_insert = trigger_statement(table, "after_insert", "AFTER", "delete_master");

        vec![SqlStatement::new(insert_child), before_insert, SqlStatement::new(delete_master), after_insert]
    }
}

fn trigger_statement(table: &str, name: &str, timing: &str, function: &str) -> SqlStatement {
    SqlStatement::new(format!(
        r#"
        DO $$
        BEGIN
        IF NOT EXISTS(
            SELECT 1
            FROM information_schema.triggers
            WHERE event_object_schema = current_schema()
            AND event_object_table = '{table}'
            AND trigger_name = '{name}_{table}_trigger'
        ) THEN
            CREATE TRIGGER {name}_{table}_trigger
                {timing} INSERT ON {table}
                FOR EACH ROW EXECUTE PROCEDURE {table}_{function}();
        END IF;
        END $$;
        "#
    ))
}

#[async_trait]
impl PartitionStrategy for InheritanceTriggerStrategy {
    fn name(&self) -> &'static str {
        "inheritance_trigger"
    }

    fn column_type_statement(&self, table: &str, column: &str) -> SqlStatement {
        SqlStatement::with_values(
            r#"SELECT data_type::text FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2"#,
            [table, column],
        )
    }

    fn resolution_for(&self, column_type: &str) -> Result<Resolution> {
        Ok(match literal_type(column_type)? {
            "DATE" => Resolution::Date,
            _ => Resolution::Timestamp,
        })
    }

    fn exists_statement(&self, descriptor: &PartitionDescriptor) -> SqlStatement {
        SqlStatement::with_values(
            r#"SELECT COUNT(*)
            FROM pg_inherits
            JOIN pg_class parent ON pg_inherits.inhparent = parent.oid
            JOIN pg_class child ON pg_inherits.inhrelid = child.oid
            JOIN pg_namespace ns ON parent.relnamespace = ns.oid
            WHERE ns.nspname = current_schema() AND child.relnamespace = parent.relnamespace
            AND parent.relname = $1 AND child.relname = $2"#,
            [descriptor.table.clone(), descriptor.partition_name()],
        )
    }

    fn create_statements(&self, descriptor: &PartitionDescriptor) -> Result<Vec<SqlStatement>> {
        let datatype = literal_type(&descriptor.column_type)?;
        let child = descriptor.partition_name();
        let column = &descriptor.column;

        let table = format!(
            "CREATE TABLE IF NOT EXISTS {child} (CHECK ({column} >= {datatype} '{start}' AND {column} <= {datatype} '{end}')) INHERITS ({parent})",
            start = descriptor.period.start_string(),
            end = descriptor.period.end_string(),
            parent = descriptor.table,
        );
        let index = format!("CREATE INDEX IF NOT EXISTS {child}_{column} ON {child} ({column})");

        Ok(vec![SqlStatement::new(table), SqlStatement::new(index)])
    }

    async fn prepare(&self, exec: &dyn StatementExecutor, descriptor: &PartitionDescriptor) -> Result<()> {
        for statement in self.prepare_statements(descriptor) {
            execute_idempotent(exec, &descriptor.table, "prepare", &statement).await?;
        }
        info!(table = descriptor.table, "insert triggers installed");
        Ok(())
    }
}
