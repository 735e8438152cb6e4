use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday};
use serde::Serialize;

use crate::error::{Result, TimestampOutOfRangeSnafu};
use crate::granularity::PartitionGranularity;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// 分区列的时间精度
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize)]
pub enum Resolution {
    /// 仅日期
    Date,
    /// 日期时间, 精确到微秒
    #[default]
    Timestamp,
}

impl Resolution {
    /// 相邻两个时间点之间的最小间隔
    pub fn step(&self) -> TimeDelta {
        match self {
            Resolution::Date => TimeDelta::days(1),
            Resolution::Timestamp => TimeDelta::microseconds(1),
        }
    }

    /// 将时间截断到当前精度
    pub fn truncate(&self, value: NaiveDateTime) -> NaiveDateTime {
        match self {
            Resolution::Date => value.date().and_time(NaiveTime::MIN),
            Resolution::Timestamp => {
                let micros = value.nanosecond() / 1_000 * 1_000;
                value.with_nanosecond(micros).unwrap_or(value)
            }
        }
    }

    pub fn format(&self, value: NaiveDateTime) -> String {
        match self {
            Resolution::Date => value.format(DATE_FORMAT).to_string(),
            Resolution::Timestamp => value.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// 分区标识, 只包含 [a-z0-9_]
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 是否为零分区标识
    pub fn is_zero(&self) -> bool {
        self.0.strip_prefix("y0000").is_some_and(|rest| rest.chars().all(|c| c == '0' || c.is_ascii_lowercase()))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PartitionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 分区的有效区间, 起止均为闭区间
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct PartitionPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub resolution: Resolution,
}

impl PartitionPeriod {
    pub fn contains(&self, value: NaiveDateTime) -> bool {
        let value = self.resolution.truncate(value);
        self.start <= value && value <= self.end
    }

    /// 下一个区间的起点
    pub fn next_start(&self) -> Option<NaiveDateTime> {
        self.end.checked_add_signed(self.resolution.step())
    }

    pub fn start_string(&self) -> String {
        self.resolution.format(self.start)
    }

    pub fn end_string(&self) -> String {
        self.resolution.format(self.end)
    }
}

impl fmt::Display for PartitionPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start_string(), self.end_string())
    }
}

/// 根据时间和分区粒度计算分区标识与区间, 无副作用
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PeriodCalculator {
    resolution: Resolution,
}

impl PeriodCalculator {
    pub const fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn key_for(&self, timestamp: NaiveDateTime, granularity: PartitionGranularity) -> Result<PartitionKey> {
        let date = checked_date(timestamp)?;
        let key = match granularity {
            PartitionGranularity::Day => format!("y{:04}d{:03}", date.year(), date.ordinal()),
            PartitionGranularity::Week => {
                // ISO 周所属年份可能与自然年不同
                let week = date.iso_week();
                format!("y{:04}w{:02}", week.year(), week.week())
            }
            PartitionGranularity::Month => format!("y{:04}m{:02}", date.year(), date.month()),
            PartitionGranularity::Year => format!("y{:04}", date.year()),
        };
        Ok(PartitionKey(key))
    }

    /// 零分区标识, 字典序小于任何真实分区
    pub fn zero_key(granularity: PartitionGranularity) -> PartitionKey {
        let key = match granularity {
            PartitionGranularity::Day => "y0000d000",
            PartitionGranularity::Week => "y0000w00",
            PartitionGranularity::Month => "y0000m00",
            PartitionGranularity::Year => "y0000",
        };
        PartitionKey(key.to_string())
    }

    pub fn period_for(&self, timestamp: NaiveDateTime, granularity: PartitionGranularity) -> Result<PartitionPeriod> {
        let date = checked_date(timestamp)?;
        let (first, next_first) = bounds(date, granularity).ok_or_else(|| out_of_range(timestamp))?;

        let start = first.and_time(NaiveTime::MIN);
        let end = next_first
            .and_time(NaiveTime::MIN)
            .checked_sub_signed(self.resolution.step())
            .ok_or_else(|| out_of_range(timestamp))?;

        Ok(PartitionPeriod { start, end, resolution: self.resolution })
    }

    /// 紧邻当前区间之前的完整区间
    pub fn previous_period(
        &self,
        timestamp: NaiveDateTime,
        granularity: PartitionGranularity,
    ) -> Result<PartitionPeriod> {
        let current = self.period_for(timestamp, granularity)?;
        let before = current.start.checked_sub_signed(self.resolution.step()).ok_or_else(|| out_of_range(timestamp))?;
        self.period_for(before, granularity)
    }
}

fn checked_date(timestamp: NaiveDateTime) -> Result<NaiveDate> {
    let date = timestamp.date();
    if !(1..=9999).contains(&date.year()) {
        return Err(out_of_range(timestamp));
    }
    Ok(date)
}

fn out_of_range(timestamp: NaiveDateTime) -> crate::error::Error {
    TimestampOutOfRangeSnafu { value: timestamp.to_string() }.build()
}

/// 区间首日与下一区间首日
fn bounds(date: NaiveDate, granularity: PartitionGranularity) -> Option<(NaiveDate, NaiveDate)> {
    match granularity {
        PartitionGranularity::Day => Some((date, date.succ_opt()?)),
        PartitionGranularity::Week => {
            let week = date.iso_week();
            let monday = NaiveDate::from_isoywd_opt(week.year(), week.week(), Weekday::Mon)?;
            Some((monday, monday.checked_add_signed(TimeDelta::days(7))?))
        }
        PartitionGranularity::Month => {
            let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?;
            let next = match date.month() {
                12 => NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)?,
                month => NaiveDate::from_ymd_opt(date.year(), month + 1, 1)?,
            };
            Some((first, next))
        }
        PartitionGranularity::Year => {
            Some((NaiveDate::from_ymd_opt(date.year(), 1, 1)?, NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)?))
        }
    }
}
