use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::Serialize;

use crate::calendar::{self, LocalClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    /// ISO week, Monday to Sunday.
    Week,
    Month,
    Year,
}

impl Period {
    /// First local date of the period containing `date`.
    pub fn start_of(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => date - Days::new(date.weekday().num_days_from_monday() as u64),
            Self::Month => date.with_day(1).unwrap_or(date),
            Self::Year => date.with_day(1).and_then(|d| d.with_month(1)).unwrap_or(date),
        }
    }

    /// Start of the period following the one that starts at `start`.
    pub fn next_start(self, start: NaiveDate) -> NaiveDate {
        let next = match self {
            Self::Day => start.checked_add_days(Days::new(1)),
            Self::Week => start.checked_add_days(Days::new(7)),
            Self::Month => start.checked_add_months(Months::new(1)),
            Self::Year => start.checked_add_months(Months::new(12)),
        };
        next.unwrap_or(NaiveDate::MAX)
    }

    /// Start of the period preceding the one that starts at `start`.
    pub fn prev_start(self, start: NaiveDate) -> NaiveDate {
        let prev = match self {
            Self::Day => start.checked_sub_days(Days::new(1)),
            Self::Week => start.checked_sub_days(Days::new(7)),
            Self::Month => start.checked_sub_months(Months::new(1)),
            Self::Year => start.checked_sub_months(Months::new(12)),
        };
        prev.unwrap_or(NaiveDate::MIN)
    }
}

/// One calendar period in local time, with its half-open UTC bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub period: Period,
    /// First local date in the bucket.
    pub first_day: NaiveDate,
    /// Inclusive.
    pub start: DateTime<Utc>,
    /// Exclusive; equal to the next bucket's `start`.
    pub end: DateTime<Utc>,
}

impl Bucket {
    pub fn new(period: Period, first_day: NaiveDate, clock: &LocalClock) -> Self {
        let first_day = period.start_of(first_day);
        Self {
            period,
            first_day,
            start: clock.start_of_day(first_day),
            end: clock.start_of_day(period.next_start(first_day)),
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    /// Human label: "18 Oct", "Week of 12 Oct", "October", "2026".
    pub fn label(&self) -> String {
        let d = self.first_day;
        match self.period {
            Period::Day => format!("{} {}", d.day(), calendar::month_short(d.month())),
            Period::Week => format!("Week of {} {}", d.day(), calendar::month_short(d.month())),
            Period::Month => calendar::month_name(d.month()).to_string(),
            Period::Year => d.year().to_string(),
        }
    }
}

/// `count` consecutive buckets walking backward from the period containing
/// `today`. Index 0 is the most recent. With `skip_current` the walk starts
/// at the period before `today`'s.
pub fn buckets(
    today: NaiveDate,
    period: Period,
    count: usize,
    skip_current: bool,
    clock: &LocalClock,
) -> Vec<Bucket> {
    let mut start = period.start_of(today);
    if skip_current {
        start = period.prev_start(start);
    }

    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(Bucket::new(period, start, clock));
        start = period.prev_start(start);
    }
    out
}

/// Distribute `items` over `buckets` by timestamp. Items outside every bucket
/// are dropped; each remaining item lands in exactly one bucket.
pub fn assign<T, F>(buckets: &[Bucket], items: impl IntoIterator<Item = T>, ts: F) -> Vec<Vec<T>>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    let mut out: Vec<Vec<T>> = buckets.iter().map(|_| Vec::new()).collect();
    for item in items {
        let at = ts(&item);
        if let Some(i) = buckets.iter().position(|b| b.contains(at)) {
            out[i].push(item);
        }
    }
    out
}
