use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::{Result, UnsupportedShowSnafu};
use crate::granularity::PartitionGranularity;
use crate::period::{PartitionPeriod, PeriodCalculator};

/// 查询时展示哪些分区的数据
#[derive(
    Copy, Clone, Default, Debug, Eq, PartialEq, Hash, Display, EnumString, EnumIter, SerializeDisplay, DeserializeFromStr,
)]
pub enum PartitionShow {
    #[default]
    #[strum(serialize = "all")]
    All,
    #[strum(serialize = "current")]
    Current,
    #[strum(serialize = "previous")]
    Previous,
}

impl PartitionShow {
    pub fn parse(value: &str) -> Result<Self> {
        Self::from_str(value).map_err(|_| {
            UnsupportedShowSnafu { value, allowed: Self::iter().map(|s| s.to_string()).collect::<Vec<_>>() }.build()
        })
    }
}

/// 分区列上的闭区间条件
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeriodPredicate {
    pub column: String,
    pub period: PartitionPeriod,
}

impl PeriodPredicate {
    pub fn contains(&self, value: NaiveDateTime) -> bool {
        self.period.contains(value)
    }

    pub fn to_sql(&self) -> String {
        format!(
            "{column} >= '{start}' AND {column} <= '{end}'",
            column = self.column,
            start = self.period.start_string(),
            end = self.period.end_string(),
        )
    }
}

impl fmt::Display for PeriodPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

pub struct ShowFilter {
    calculator: PeriodCalculator,
    granularity: PartitionGranularity,
    show: PartitionShow,
    column: String,
}

impl ShowFilter {
    pub fn new(
        calculator: PeriodCalculator,
        granularity: PartitionGranularity,
        show: PartitionShow,
        column: impl Into<String>,
    ) -> Self {
        Self { calculator, granularity, show, column: column.into() }
    }

    pub fn show(&self) -> PartitionShow {
        self.show
    }

    /// `all` 不加条件; `current` 为 now 所在区间; `previous` 为其前一个完整区间
    pub fn predicate(&self, now: NaiveDateTime) -> Result<Option<PeriodPredicate>> {
        let period = match self.show {
            PartitionShow::All => return Ok(None),
            PartitionShow::Current => self.calculator.period_for(now, self.granularity)?,
            PartitionShow::Previous => self.calculator.previous_period(now, self.granularity)?,
        };
        Ok(Some(PeriodPredicate { column: self.column.clone(), period }))
    }

    pub fn predicate_now(&self) -> Result<Option<PeriodPredicate>> {
        self.predicate(Local::now().naive_local())
    }
}
