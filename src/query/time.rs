//! Time Range Resolution
//!
//! Turns the `from`/`to` bounds of a dashboard query into the integer epoch
//! milliseconds the controller expects.
//!
//! # Supported Bounds
//!
//! ```text
//! 1700000000000            epoch milliseconds (number or string, fractions are rounded up)
//! 2024-03-01T12:00:00Z     RFC 3339
//! now                      current time
//! now-6h / now+1d          relative, units s m h d w M y
//! ```

use chrono::{DateTime, Duration, Months, Utc};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res, opt, value},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::query::error::{QueryError, QueryResult};

/// A single range bound as the host sends it
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RangeBound {
    Millis(f64),
    Expr(String),
}

impl From<i64> for RangeBound {
    fn from(ms: i64) -> Self {
        RangeBound::Millis(ms as f64)
    }
}

impl From<&str> for RangeBound {
    fn from(expr: &str) -> Self {
        RangeBound::Expr(expr.to_string())
    }
}

/// Resolved query window in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeRange {
    /// Create a range from millisecond bounds, rejecting inverted ranges
    pub fn new(start_ms: i64, end_ms: i64) -> QueryResult<Self> {
        if start_ms > end_ms {
            return Err(QueryError::InvalidTimeRange(format!(
                "start {} is after end {}",
                start_ms, end_ms
            )));
        }
        Ok(Self { start_ms, end_ms })
    }

    /// Resolve host bounds relative to `now`
    pub fn resolve(from: &RangeBound, to: &RangeBound, now: DateTime<Utc>) -> QueryResult<Self> {
        Self::new(resolve_bound(from, now)?, resolve_bound(to, now)?)
    }

    /// The last `hours` hours up to now
    pub fn last_hours(hours: i64) -> Self {
        let end = Utc::now();
        let start = end - Duration::hours(hours);
        Self {
            start_ms: start.timestamp_millis(),
            end_ms: end.timestamp_millis(),
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

/// Resolve one bound to epoch milliseconds, rounding fractions up
pub fn resolve_bound(bound: &RangeBound, now: DateTime<Utc>) -> QueryResult<i64> {
    match bound {
        RangeBound::Millis(ms) => ceil_millis(*ms),
        RangeBound::Expr(expr) => {
            let expr = expr.trim();

            if let Ok(ms) = expr.parse::<f64>() {
                return ceil_millis(ms);
            }

            if let Ok(dt) = DateTime::parse_from_rfc3339(expr) {
                return Ok(ceil_datetime_millis(&dt));
            }

            match relative_expression(expr) {
                Ok((_, offset)) => apply_offset(now, offset)
                    .map(|dt| dt.timestamp_millis())
                    .ok_or_else(|| {
                        QueryError::InvalidTimeRange(format!("'{}' is out of range", expr))
                    }),
                Err(_) => Err(QueryError::InvalidTimeRange(format!(
                    "cannot parse time '{}'",
                    expr
                ))),
            }
        }
    }
}

fn ceil_datetime_millis<Tz: chrono::TimeZone>(dt: &DateTime<Tz>) -> i64 {
    let partial = dt.timestamp_subsec_nanos() % 1_000_000 != 0;
    dt.timestamp_millis() + i64::from(partial)
}

fn ceil_millis(ms: f64) -> QueryResult<i64> {
    if !ms.is_finite() {
        return Err(QueryError::InvalidTimeRange(format!("{} is not a time", ms)));
    }
    Ok(ms.ceil() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Offset {
    sign: i64,
    amount: u32,
    unit: Unit,
}

fn apply_offset(now: DateTime<Utc>, offset: Option<Offset>) -> Option<DateTime<Utc>> {
    let Some(offset) = offset else {
        return Some(now);
    };

    let amount = i64::from(offset.amount);
    let fixed = match offset.unit {
        Unit::Second => Duration::try_seconds(amount),
        Unit::Minute => Duration::try_minutes(amount),
        Unit::Hour => Duration::try_hours(amount),
        Unit::Day => Duration::try_days(amount),
        Unit::Week => Duration::try_weeks(amount),
        Unit::Month | Unit::Year => None,
    };

    if let Some(delta) = fixed {
        return if offset.sign < 0 {
            now.checked_sub_signed(delta)
        } else {
            now.checked_add_signed(delta)
        };
    }

    let months = match offset.unit {
        Unit::Month => Months::new(offset.amount),
        Unit::Year => Months::new(offset.amount.checked_mul(12)?),
        _ => return None,
    };

    if offset.sign < 0 {
        now.checked_sub_months(months)
    } else {
        now.checked_add_months(months)
    }
}

/// Parse `now`, optionally followed by `+N<unit>` or `-N<unit>`
fn relative_expression(input: &str) -> IResult<&str, Option<Offset>> {
    all_consuming(now_with_offset)(input)
}

fn now_with_offset(input: &str) -> IResult<&str, Option<Offset>> {
    let (input, _) = tag("now")(input)?;
    opt(parse_offset)(input)
}

fn parse_offset(input: &str) -> IResult<&str, Offset> {
    let (input, sign) = alt((value(-1i64, char('-')), value(1i64, char('+'))))(input)?;
    let (input, amount) = map_res(digit1, |s: &str| s.parse::<u32>())(input)?;
    let (input, unit) = parse_unit(input)?;

    Ok((input, Offset { sign, amount, unit }))
}

/// Units are case-sensitive: `m` is minutes, `M` is months
fn parse_unit(input: &str) -> IResult<&str, Unit> {
    alt((
        value(Unit::Second, char('s')),
        value(Unit::Minute, char('m')),
        value(Unit::Hour, char('h')),
        value(Unit::Day, char('d')),
        value(Unit::Week, char('w')),
        value(Unit::Month, char('M')),
        value(Unit::Year, char('y')),
    ))(input)
}
