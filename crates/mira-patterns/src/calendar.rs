use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc, Weekday};

/// Converts stored UTC instants to the user's local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalClock {
    offset: FixedOffset,
}

impl LocalClock {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// `None` if the offset is outside ±24h.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    pub fn local(&self, ts: DateTime<Utc>) -> DateTime<FixedOffset> {
        ts.with_timezone(&self.offset)
    }

    pub fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        self.local(ts).date_naive()
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_date(now)
    }

    /// The UTC instant at which local `date` begins.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight = date.and_time(NaiveTime::MIN);
        (local_midnight - Duration::seconds(self.offset.local_minus_utc() as i64)).and_utc()
    }

    /// Half-open UTC range covering local `date`.
    pub fn day_range(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let next = date.succ_opt().unwrap_or(NaiveDate::MAX);
        (self.start_of_day(date), self.start_of_day(next))
    }

    pub fn weekday(&self, ts: DateTime<Utc>) -> Weekday {
        self.local(ts).weekday()
    }
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::utc()
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn weekday_short(day: Weekday) -> &'static str {
    &weekday_name(day)[..3]
}

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Long month name for a 1-based month number.
pub fn month_name(month: u32) -> &'static str {
    MONTHS
        .get(month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

pub fn month_short(month: u32) -> &'static str {
    let name = month_name(month);
    &name[..name.len().min(3)]
}

/// The same calendar date `years` years before `today`.
///
/// Returns `None` when that date does not exist (29 February in a non-leap year).
pub fn years_before(today: NaiveDate, years: i32) -> Option<NaiveDate> {
    today.with_year(today.year() - years)
}

/// Short age label for list entries: "Just now", "5m ago", "3h ago",
/// "Yesterday", "4 days ago", then "12 Oct".
pub fn relative_label(now: DateTime<Utc>, ts: DateTime<Utc>, clock: &LocalClock) -> String {
    let elapsed = now - ts;
    let mins = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if mins < 1 {
        "Just now".to_string()
    } else if mins < 60 {
        format!("{mins}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days == 1 {
        "Yesterday".to_string()
    } else if days < 7 {
        format!("{days} days ago")
    } else {
        let date = clock.local_date(ts);
        format!("{} {}", date.day(), month_short(date.month()))
    }
}
