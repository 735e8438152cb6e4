use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumIter, EnumString};

use crate::error::{InvalidIdentifierSnafu, InvalidPartitionColumnSnafu, Result};
use crate::granularity::PartitionGranularity;

/// 分区类型
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Display, EnumString, EnumIter, SerializeDisplay, DeserializeFromStr)]
pub enum PartitionType {
    #[strum(serialize = "range")]
    Range,
}

/// 范围分区的子类型
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Display, EnumString, EnumIter, SerializeDisplay, DeserializeFromStr)]
pub enum RangeSubtype {
    #[strum(serialize = "date")]
    Date,
}

/// 分区实体声明的配置项
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PartitionOptions {
    /// 分区类型
    pub partition_type: String,
    /// 分区粒度
    pub partition_range: String,
    /// 范围分区子类型
    #[serde(default = "default_subtype")]
    pub partition_subtype: String,
    /// 分区列
    pub partition_column: String,
}

fn default_subtype() -> String {
    RangeSubtype::Date.to_string()
}

fn default_primary_key() -> Vec<String> {
    vec!["id".to_string()]
}

/// 分区实体的表结构描述
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EntitySchema {
    /// 实体名称
    pub name: String,
    /// 表名
    pub table: String,
    /// 主键列
    #[serde(default = "default_primary_key")]
    pub primary_key: Vec<String>,
    /// 实体的全部列
    pub columns: Vec<String>,
    pub options: PartitionOptions,
}

impl EntitySchema {
    /// 校验表名/列名等会拼接进 DDL 的标识符, 以及分区列是否存在
    pub fn validate(&self) -> Result<()> {
        validate_identifier("table", &self.table)?;
        if self.primary_key.is_empty() {
            return InvalidIdentifierSnafu { field: "primary_key", value: "" }.fail();
        }
        for pk in &self.primary_key {
            validate_identifier("primary_key", pk)?;
        }
        validate_identifier("partition_column", &self.options.partition_column)?;

        if !self.columns.iter().any(|c| c == &self.options.partition_column) {
            return InvalidPartitionColumnSnafu {
                model: &self.name,
                value: &self.options.partition_column,
                allowed: self.columns.clone(),
            }
            .fail();
        }
        Ok(())
    }
}

/// 解析并校验后的后端配置
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct BackendConfig {
    pub backend: &'static str,
    pub partition_type: PartitionType,
    pub granularity: PartitionGranularity,
    pub subtype: RangeSubtype,
}

/// 未加引号的标识符, PostgreSQL 会将其折叠为小写, 所以只接受 `[a-z_][a-z0-9_]*`
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

pub fn validate_identifier(field: &'static str, value: &str) -> Result<()> {
    if is_identifier(value) { Ok(()) } else { InvalidIdentifierSnafu { field, value }.fail() }
}
