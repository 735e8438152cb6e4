use serde::Serialize;

use crate::granularity::PartitionGranularity;
use crate::period::{PartitionKey, PartitionPeriod, PeriodCalculator};

/// 单次写入的目标分区描述, 按需构建, 不做持久化
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PartitionDescriptor {
    /// 父表
    pub table: String,
    /// 分区列
    pub column: String,
    /// 主键列
    pub primary_key: Vec<String>,
    /// 数据库中分区列的实际类型
    pub column_type: String,
    pub granularity: PartitionGranularity,
    pub key: PartitionKey,
    pub period: PartitionPeriod,
}

impl PartitionDescriptor {
    /// 分区(子表)名称
    pub fn partition_name(&self) -> String {
        format!("{}_{}", self.table, self.key)
    }

    /// 零分区名称
    pub fn zero_partition_name(&self) -> String {
        format!("{}_{}", self.table, PeriodCalculator::zero_key(self.granularity))
    }
}
