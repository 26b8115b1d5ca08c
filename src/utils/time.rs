use crate::error::{config_error, BotResult};
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// Parse a clock literal in `HH:MM` or `HH-MM` form
pub fn parse_clock(time_str: &str) -> Option<NaiveTime> {
    let parts: Vec<&str> = time_str.trim().split([':', '-']).collect();
    if parts.len() != 2 {
        return None;
    }
    let (hour, minute) = (parts[0].trim(), parts[1].trim());
    if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
        return None;
    }
    let hour = hour.parse::<u32>().ok()?;
    let minute = minute.parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// First date on or after `from` that falls on `weekday`
pub fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let days_until = (7 + weekday.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from + Duration::days(days_until as i64)
}

/// Attach a timezone to a wall-clock time.
///
/// Folded times (DST fall-back) take the earlier instant; times that fall
/// into a DST gap do not exist and yield `None`.
pub fn localize(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    }
}

/// Parse an IANA timezone name such as `Europe/Kyiv`
pub fn parse_timezone(name: &str) -> BotResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| config_error(&format!("Invalid timezone: {}", name)))
}

/// Current instant expressed in the given timezone
pub fn now_in(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}
