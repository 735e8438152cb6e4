use chrono::NaiveDateTime;
use parti_core::{PeriodPredicate, Resolution};
use sea_orm::sea_query::{Alias, Condition, Expr, SimpleExpr};

fn bound(resolution: Resolution, value: NaiveDateTime) -> SimpleExpr {
    match resolution {
        Resolution::Date => value.date().into(),
        Resolution::Timestamp => value.into(),
    }
}

/// 把分区区间转换为 sea-query 条件, 用于 `filter`/`cond_where`
pub fn period_condition(predicate: &PeriodPredicate) -> Condition {
    let period = &predicate.period;
    Condition::all()
        .add(Expr::col(Alias::new(predicate.column.as_str())).gte(bound(period.resolution, period.start)))
        .add(Expr::col(Alias::new(predicate.column.as_str())).lte(bound(period.resolution, period.end)))
}
