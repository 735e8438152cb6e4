use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::{Result, UnsupportedGranularitySnafu};

/// 分区粒度
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, Display, EnumString, EnumIter, SerializeDisplay, DeserializeFromStr,
)]
pub enum PartitionGranularity {
    #[strum(serialize = "day")]
    Day,
    #[strum(serialize = "week")]
    Week,
    #[strum(serialize = "month")]
    Month,
    #[strum(serialize = "year")]
    Year,
}

impl PartitionGranularity {
    /// 解析配置值, 不支持的取值会列出全部可选粒度
    pub fn parse(value: &str) -> Result<Self> {
        Self::from_str(value).map_err(|_| UnsupportedGranularitySnafu { value, allowed: Self::names() }.build())
    }

    pub fn names() -> Vec<String> {
        Self::iter().map(|g| g.to_string()).collect()
    }
}
