//! # Temporal Selection
//!
//! Calendar handling for the engine:
//!
//! - decoding CF time coordinates (`"days since 1981-01-01"`) into calendar dates,
//! - selecting the dataset units whose coverage intersects the requested date range,
//! - temporal buckets (daily, N-day, dekad, monthly, yearly) used by the regridder,
//! - the cadence check that rejects targets finer than the source.

use crate::error::{ProcessError, ProcessResult};
use crate::extract::DatasetUnit;
use crate::selection::DateRange;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Decodes CF time values into calendar dates, dropping the time of day.
pub fn decode_cf_time(units: &str, values: &[f64]) -> Result<Vec<NaiveDate>, String> {
    let parts: Vec<&str> = units.splitn(2, " since ").collect();
    if parts.len() != 2 {
        return Err(format!("time units '{units}' are not of the form '<unit> since <epoch>'"));
    }

    let seconds_per_unit: f64 = match parts[0].trim().to_lowercase().as_str() {
        "days" | "day" | "d" => 86_400.0,
        "hours" | "hour" | "h" | "hr" => 3_600.0,
        "minutes" | "minute" | "min" => 60.0,
        "seconds" | "second" | "s" | "sec" => 1.0,
        "milliseconds" | "millisecond" | "ms" => 0.001,
        other => return Err(format!("unsupported time unit '{other}'")),
    };
    let epoch = parse_epoch(parts[1].trim())
        .ok_or_else(|| format!("cannot parse time epoch '{}'", parts[1].trim()))?;

    values
        .iter()
        .map(|value| {
            if !value.is_finite() {
                return Err(format!("time value {value} is not finite"));
            }
            // saturates for huge values, which the checked steps below reject
            let millis = (value * seconds_per_unit * 1000.0).round() as i64;
            Duration::try_milliseconds(millis)
                .and_then(|offset| epoch.checked_add_signed(offset))
                .map(|dt| dt.date())
                .ok_or_else(|| format!("time value {value} is out of range"))
        })
        .collect()
}

fn parse_epoch(s: &str) -> Option<NaiveDateTime> {
    // trailing "UTC"/"Z" markers carry no information for a naive calendar
    let s = s.trim_end_matches(" UTC").trim_end_matches('Z').trim();
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Returns the units whose coverage intersects `dates`, ascending by coverage start.
///
/// Units starting on the same day keep their discovery order.
pub fn select_units<'a>(units: &'a [DatasetUnit], dates: &DateRange) -> Vec<&'a DatasetUnit> {
    let mut selected: Vec<&DatasetUnit> = units
        .iter()
        .filter(|unit| {
            let (first, last) = unit.coverage();
            dates.intersects(first, last)
        })
        .collect();
    selected.sort_by_key(|unit| unit.coverage().0);
    selected
}

/// Index range of the ascending `steps` that fall inside `dates`.
pub fn step_window(steps: &[NaiveDate], dates: &DateRange) -> Option<Range<usize>> {
    let start = steps.iter().position(|d| dates.contains(*d))?;
    let end = steps.iter().rposition(|d| dates.contains(*d))? + 1;
    Some(start..end)
}

/// Target temporal resolution of a regridding run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum TemporalResolution {
    Daily,
    /// N-day periods aligned with 1 January, the last one truncated at 31 December
    NDay(u32),
    /// 1-10, 11-20 and 21-end of each month
    Dekad,
    Monthly,
    Yearly,
}

impl FromStr for TemporalResolution {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        let resolution = match value.as_str() {
            "daily" | "day" => TemporalResolution::Daily,
            "pentad" => TemporalResolution::NDay(5),
            "dekad" | "10-day" => TemporalResolution::Dekad,
            "monthly" | "month" => TemporalResolution::Monthly,
            "yearly" | "year" | "annual" | "annually" => TemporalResolution::Yearly,
            other => {
                let digits = ["-days", "-day", "days", "day", "d"]
                    .iter()
                    .find_map(|suffix| other.strip_suffix(suffix))
                    .unwrap_or(other)
                    .trim();
                match digits.parse::<u32>() {
                    Ok(1) => TemporalResolution::Daily,
                    Ok(n) if n > 1 => TemporalResolution::NDay(n),
                    _ => {
                        return Err(ProcessError::invalid_parameter(
                            "temporal-resolution",
                            format!(
                                "'{s}' is not one of daily, pentad, dekad, monthly, yearly or a positive number of days"
                            ),
                        ));
                    }
                }
            }
        };
        Ok(resolution)
    }
}

impl fmt::Display for TemporalResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalResolution::Daily => write!(f, "daily"),
            TemporalResolution::NDay(n) => write!(f, "{n}-day"),
            TemporalResolution::Dekad => write!(f, "dekad"),
            TemporalResolution::Monthly => write!(f, "monthly"),
            TemporalResolution::Yearly => write!(f, "yearly"),
        }
    }
}

impl From<TemporalResolution> for String {
    fn from(resolution: TemporalResolution) -> Self {
        resolution.to_string()
    }
}

impl TemporalResolution {
    /// Length in days of the shortest bucket this resolution can produce.
    pub fn min_length_days(&self) -> i64 {
        match self {
            TemporalResolution::Daily => 1,
            TemporalResolution::NDay(n) => *n as i64,
            TemporalResolution::Dekad => 8,
            TemporalResolution::Monthly => 28,
            TemporalResolution::Yearly => 365,
        }
    }

    /// The bucket containing `date`.
    pub fn bucket_of(&self, date: NaiveDate) -> TemporalBucket {
        match self {
            TemporalResolution::Daily => TemporalBucket::new(date, date),
            TemporalResolution::NDay(n) => {
                let n = *n as i64;
                let year_start = first_of_year(date.year());
                let offset = (date - year_start).num_days() / n * n;
                let start = year_start + Duration::days(offset);
                let end = (start + Duration::days(n - 1)).min(last_of_year(date.year()));
                TemporalBucket::new(start, end)
            }
            TemporalResolution::Dekad => {
                let (year, month) = (date.year(), date.month());
                let (first_day, last_day) = match date.day() {
                    1..=10 => (1, 10),
                    11..=20 => (11, 20),
                    _ => (21, last_of_month(year, month).day()),
                };
                TemporalBucket::new(ymd(year, month, first_day), ymd(year, month, last_day))
            }
            TemporalResolution::Monthly => TemporalBucket::new(
                ymd(date.year(), date.month(), 1),
                last_of_month(date.year(), date.month()),
            ),
            TemporalResolution::Yearly => {
                TemporalBucket::new(first_of_year(date.year()), last_of_year(date.year()))
            }
        }
    }

    /// Every bucket intersecting `dates`, in order.
    pub fn buckets_in(&self, dates: &DateRange) -> Vec<TemporalBucket> {
        let mut buckets = Vec::new();
        let mut cursor = dates.start;
        loop {
            let bucket = self.bucket_of(cursor);
            let next = bucket.end.succ_opt();
            buckets.push(bucket);
            match next {
                Some(next) if next <= dates.end => cursor = next,
                _ => break,
            }
        }
        buckets
    }
}

/// One aggregation period, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TemporalBucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TemporalBucket {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        TemporalBucket { start, end }
    }

    /// Middle day of the bucket, rounded down; dates the rows of a time series.
    pub fn mid(&self) -> NaiveDate {
        self.start + Duration::days((self.end - self.start).num_days() / 2)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Smallest positive gap in days between consecutive distinct dates.
///
/// `None` when fewer than two distinct dates are available.
pub fn source_cadence<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Option<i64> {
    let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
    dates.sort();
    dates.dedup();
    dates.windows(2).map(|w| (w[1] - w[0]).num_days()).min()
}

/// Rejects a target resolution finer than the source cadence.
pub fn check_cadence(resolution: &TemporalResolution, cadence: Option<i64>) -> ProcessResult<()> {
    match cadence {
        Some(days) if resolution.min_length_days() < days => {
            Err(ProcessError::UnsupportedResampling(format!(
                "target resolution '{resolution}' is finer than the source cadence of {days} days"
            )))
        }
        _ => Ok(()),
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn first_of_year(year: i32) -> NaiveDate {
    ymd(year, 1, 1)
}

fn last_of_year(year: i32) -> NaiveDate {
    ymd(year, 12, 31)
}

fn last_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    ymd(next_year, next_month, 1).pred_opt().unwrap_or(NaiveDate::MIN)
}
