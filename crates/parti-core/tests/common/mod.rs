#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parti_core::executor::{DuplicateObjectSnafu, StatementSnafu};
use parti_core::{EntitySchema, ExecuteError, PartitionOptions, PartitionedEntity, SqlStatement, StatementExecutor};

/// 内存中的数据库目录, 只识别分区相关的语句
#[derive(Debug, Default)]
pub struct Catalog {
    pub executed: Vec<SqlStatement>,
    pub partitions: BTreeSet<String>,
    pub in_primary_key: bool,
    pub partitioned: bool,
    /// 包含该片段的语句执行失败
    pub fail_on: Option<String>,
    /// 存在性查询始终返回 0, 模拟并发写入者看到的过期结果
    pub stale_exists: bool,
}

pub struct CatalogExecutor {
    column_type: Option<String>,
    pub catalog: Mutex<Catalog>,
}

impl CatalogExecutor {
    pub fn new(column_type: Option<&str>) -> Self {
        Self { column_type: column_type.map(str::to_string), catalog: Mutex::new(Catalog::default()) }
    }

    pub fn failing_on(self, fragment: &str) -> Self {
        self.catalog.lock().unwrap().fail_on = Some(fragment.to_string());
        self
    }

    pub fn with_stale_exists(self) -> Self {
        self.catalog.lock().unwrap().stale_exists = true;
        self
    }

    /// 直接登记一个已有分区
    pub fn with_partition(self, name: &str) -> Self {
        self.catalog.lock().unwrap().partitions.insert(name.to_string());
        self
    }

    pub fn partitions(&self) -> Vec<String> {
        self.catalog.lock().unwrap().partitions.iter().cloned().collect()
    }

    pub fn executed(&self) -> Vec<String> {
        self.catalog.lock().unwrap().executed.iter().map(|s| s.to_string()).collect()
    }

    pub fn clear_executed(&self) {
        self.catalog.lock().unwrap().executed.clear();
    }
}

/// 同一张表里名字更大的分区, 分区名按字典序即上界顺序
fn later_partitions<'a>(partitions: &'a BTreeSet<String>, table: &str, name: &str) -> impl Iterator<Item = &'a String> {
    let prefix = format!("{table}_");
    partitions.iter().filter(move |p| p.starts_with(&prefix) && p.as_str() > name)
}

/// 分区上界, 用分区键里的数字代替函数值
fn partition_bound(name: &str) -> String {
    let digits: String = name.rsplit('_').next().unwrap_or(name).chars().filter(char::is_ascii_digit).collect();
    if digits.trim_start_matches('0').is_empty() { "0".to_string() } else { digits }
}

fn identifier_after<'a>(sql: &'a str, marker: &str) -> Option<&'a str> {
    let rest = &sql[sql.find(marker)? + marker.len()..];
    let end = rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(rest.len());
    Some(&rest[..end])
}

#[async_trait]
impl StatementExecutor for CatalogExecutor {
    async fn execute(&self, statement: &SqlStatement) -> Result<(), ExecuteError> {
        let mut catalog = self.catalog.lock().unwrap();
        catalog.executed.push(statement.clone());
        let sql = statement.sql.as_str();

        if let Some(fragment) = &catalog.fail_on
            && sql.contains(fragment.as_str())
        {
            return StatementSnafu { message: format!("permission denied: {fragment}") }.fail();
        }

        if sql.contains("ADD PRIMARY KEY") {
            catalog.in_primary_key = true;
        } else if sql.contains("PARTITION BY RANGE") {
            catalog.partitioned = true;
            if let Some(zero) = identifier_after(sql, ") (PARTITION ") {
                catalog.partitions.insert(zero.to_string());
            }
        } else if let Some(name) = identifier_after(sql, "INTO (PARTITION ") {
            if !catalog.partitions.insert(name.to_string()) {
                return DuplicateObjectSnafu { message: format!("Duplicate partition name {name}") }.fail();
            }
        } else if let Some(name) = identifier_after(sql, "ADD PARTITION (PARTITION ") {
            let table = identifier_after(sql, "ALTER TABLE ").unwrap_or_default();
            if catalog.partitions.contains(name) {
                return DuplicateObjectSnafu { message: format!("Duplicate partition name {name}") }.fail();
            }
            if later_partitions(&catalog.partitions, table, name).next().is_some() {
                return StatementSnafu {
                    message: "1493: VALUES LESS THAN value must be strictly increasing for each partition".to_string(),
                }
                .fail();
            }
            catalog.partitions.insert(name.to_string());
        } else if let Some(name) = identifier_after(sql, "CREATE TABLE IF NOT EXISTS ") {
            catalog.partitions.insert(name.to_string());
        }
        Ok(())
    }

    async fn query_count(&self, statement: &SqlStatement) -> Result<i64, ExecuteError> {
        let catalog = self.catalog.lock().unwrap();
        let sql = statement.sql.as_str();

        let found = if sql.contains("key_column_usage") {
            catalog.in_primary_key
        } else if sql.contains("partition_name IS NOT NULL") {
            catalog.partitioned
        } else if sql.contains("information_schema.partitions") || sql.contains("pg_inherits") {
            !catalog.stale_exists && statement.values.get(1).is_some_and(|name| catalog.partitions.contains(name))
        } else {
            return StatementSnafu { message: format!("unexpected query: {statement}") }.fail();
        };
        Ok(i64::from(found))
    }

    async fn query_text(&self, statement: &SqlStatement) -> Result<Option<String>, ExecuteError> {
        let catalog = self.catalog.lock().unwrap();
        let sql = statement.sql.as_str();
        let (table, name) = match statement.values.as_slice() {
            [table, name, ..] => (table.as_str(), name.as_str()),
            _ => ("", ""),
        };

        Ok(if sql.contains("partition_name > ?") {
            later_partitions(&catalog.partitions, table, name).next().cloned()
        } else if sql.contains("partition_description") {
            catalog.partitions.contains(name).then(|| partition_bound(name))
        } else {
            self.column_type.clone()
        })
    }
}

pub struct Event {
    pub schema: EntitySchema,
    pub created_at: Option<NaiveDateTime>,
}

impl Event {
    pub fn at(schema: &EntitySchema, created_at: NaiveDateTime) -> Self {
        Self { schema: schema.clone(), created_at: Some(created_at) }
    }
}

impl PartitionedEntity for Event {
    fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn partition_value(&self) -> Option<NaiveDateTime> {
        self.created_at
    }
}

pub fn event_schema(range: &str) -> EntitySchema {
    EntitySchema {
        name: "Event".to_string(),
        table: "events".to_string(),
        primary_key: vec!["id".to_string()],
        columns: vec!["id".to_string(), "name".to_string(), "created_at".to_string()],
        options: PartitionOptions {
            partition_type: "range".to_string(),
            partition_range: range.to_string(),
            partition_subtype: "date".to_string(),
            partition_column: "created_at".to_string(),
        },
    }
}

pub fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(10, 15, 0).unwrap()
}
