//! Time resolver: turns date/time fragments into instants in the configured timezone.
//!
//! Resolution happens in two steps. [`scan`] finds date and clock-time mentions
//! in a piece of text without looking at the clock, and
//! [`TimeResolver::resolve_parts`] pins them to the reference "now", rolling
//! weekday names forward and rejecting anything that lands in the past.

use crate::config::{ExtractionConfig, Locale};
use crate::error::ExtractionError;
use crate::extraction::models::{DateHint, MeetingField};
use crate::utils::time::{localize, next_weekday, parse_clock};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref ISO_DATE_TIME: Regex = Regex::new(
        r"\b(\d{4})-(\d{2})-(\d{2})[Tt ](\d{1,2}):(\d{2})(?::(\d{2})(?:\.\d+)?)?\s*([Zz]|[+-]\d{2}:?\d{2})?"
    ).unwrap();
    static ref ISO_DATE: Regex = Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap();
    static ref NUMERIC_DATE: Regex =
        Regex::new(r"\b(\d{1,2})[./](\d{1,2})(?:[./](\d{4}|\d{2}))?\b").unwrap();
    static ref DURATION_TAIL: Regex =
        Regex::new(r"(?i)^\s*(?:час|ч\b|h\b|hour|мин|min)").unwrap();
    static ref TIME_RANGE: Regex = Regex::new(
        r"(?i)(?:\b(?:с|from)\s+)?\b(\d{1,2}:\d{2})\s*(?:до|по|-|–|—|to|until|till)\s*(\d{1,2}:\d{2})\b"
    ).unwrap();
    static ref CLOCK_12H: Regex =
        Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?\s?m\b\.?").unwrap();
    // Dashed clocks are rewritten to colons by the normalization pre-pass
    static ref CLOCK_24H: Regex = Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap();
    static ref RUSSIAN: Vocabulary = Vocabulary::russian();
    static ref ENGLISH: Vocabulary = Vocabulary::english();
}

/// Locale-specific keywords for relative days, weekdays and month names
struct Vocabulary {
    relative_days: Vec<(Regex, i64)>,
    weekdays: Vec<(Regex, Weekday)>,
    day_month: Regex,
    month_day: Option<Regex>,
    months: Vec<(&'static str, u32)>,
    noon: Regex,
    midnight: Regex,
}

impl Vocabulary {
    fn russian() -> Self {
        let months = vec![
            ("январ", 1),
            ("феврал", 2),
            ("март", 3),
            ("апрел", 4),
            ("ма", 5),
            ("июн", 6),
            ("июл", 7),
            ("август", 8),
            ("сентябр", 9),
            ("октябр", 10),
            ("ноябр", 11),
            ("декабр", 12),
        ];
        let weekday = |stem: &str, weekday: Weekday| {
            let pattern = format!(r"(?i)\b(?:(следующ\w*)\s+)?(?:{})\b", stem);
            (Regex::new(&pattern).unwrap(), weekday)
        };

        Self {
            relative_days: vec![
                (Regex::new(r"(?i)\bсегодня\b").unwrap(), 0),
                (Regex::new(r"(?i)\bзавтра\b").unwrap(), 1),
                (Regex::new(r"(?i)\bпослезавтра\b").unwrap(), 2),
            ],
            weekdays: vec![
                weekday(r"понедельник\w*", Weekday::Mon),
                weekday(r"вторник\w*", Weekday::Tue),
                weekday(r"сред[ауы]", Weekday::Wed),
                weekday(r"четверг\w*", Weekday::Thu),
                weekday(r"пятниц\w*", Weekday::Fri),
                weekday(r"суббот\w*", Weekday::Sat),
                weekday(r"воскресень\w*", Weekday::Sun),
            ],
            day_month: Regex::new(
                r"(?i)\b(\d{1,2})\s+(января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря)\b(?:\s+(\d{4}))?",
            )
            .unwrap(),
            month_day: None,
            months,
            noon: Regex::new(r"(?i)\bполдень\b").unwrap(),
            midnight: Regex::new(r"(?i)\bполночь\b").unwrap(),
        }
    }

    fn english() -> Self {
        const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";
        let months = vec![
            ("jan", 1),
            ("feb", 2),
            ("mar", 3),
            ("apr", 4),
            ("may", 5),
            ("jun", 6),
            ("jul", 7),
            ("aug", 8),
            ("sep", 9),
            ("oct", 10),
            ("nov", 11),
            ("dec", 12),
        ];
        let weekday = |name: &str, weekday: Weekday| {
            let pattern = format!(r"(?i)\b(?:(next)\s+)?{}\b", name);
            (Regex::new(&pattern).unwrap(), weekday)
        };

        Self {
            relative_days: vec![
                (Regex::new(r"(?i)\b(?:today|tonight)\b").unwrap(), 0),
                (Regex::new(r"(?i)\btomorrow\b").unwrap(), 1),
                (Regex::new(r"(?i)\bday\s+after\s+tomorrow\b").unwrap(), 2),
            ],
            weekdays: vec![
                weekday("monday", Weekday::Mon),
                weekday("tuesday", Weekday::Tue),
                weekday("wednesday", Weekday::Wed),
                weekday("thursday", Weekday::Thu),
                weekday("friday", Weekday::Fri),
                weekday("saturday", Weekday::Sat),
                weekday("sunday", Weekday::Sun),
            ],
            day_month: Regex::new(&format!(
                r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({})\b\.?(?:,?\s+(\d{{4}}))?",
                MONTHS
            ))
            .unwrap(),
            month_day: Some(
                Regex::new(&format!(
                    r"(?i)\b({})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}}))?",
                    MONTHS
                ))
                .unwrap(),
            ),
            months,
            noon: Regex::new(r"(?i)\bnoon\b").unwrap(),
            midnight: Regex::new(r"(?i)\bmidnight\b").unwrap(),
        }
    }

    fn month_number(&self, name: &str) -> Option<u32> {
        let name = name.to_lowercase();
        self.months
            .iter()
            .filter(|(stem, _)| name.starts_with(stem))
            .max_by_key(|(stem, _)| stem.len())
            .map(|(_, number)| *number)
    }
}

fn vocabularies(locale: Locale) -> Vec<&'static Vocabulary> {
    match locale {
        Locale::Ru => vec![&*RUSSIAN, &*ENGLISH],
        Locale::En => vec![&*ENGLISH],
    }
}

/// Date and time mentions found in a piece of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scan {
    pub date: Option<DateHint>,
    pub time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

/// Outcome of resolving an expression against the reference time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved {
    /// Date and time are both known
    At {
        start: DateTime<Tz>,
        end: Option<DateTime<Tz>>,
    },
    /// A date was found but no time of day; the caller must not invent one
    DateOnly(NaiveDate),
}

struct Spanned<T> {
    start: usize,
    end: usize,
    value: T,
}

/// Drop matches nested inside a longer match ("tomorrow" in "day after tomorrow")
fn outermost<T: Copy>(items: &[Spanned<T>]) -> Vec<T> {
    items
        .iter()
        .filter(|a| {
            !items.iter().any(|b| {
                b.start <= a.start && a.end <= b.end && (b.end - b.start) > (a.end - a.start)
            })
        })
        .map(|s| s.value)
        .collect()
}

fn invalid_date() -> ExtractionError {
    ExtractionError::ValidationFailed {
        fields: vec![MeetingField::Date],
    }
}

fn full_year(raw: &str) -> Option<i32> {
    let year = raw.parse::<i32>().ok()?;
    Some(if raw.len() == 2 { 2000 + year } else { year })
}

/// Parse a standalone date value such as `13.02.26`, `2026-02-13`, `завтра`
/// or `13 февраля`. Out-of-range days and months yield `None`.
pub fn parse_date_value(value: &str, locale: Locale) -> Option<DateHint> {
    let value = value.trim();
    if let Some(caps) = NUMERIC_DATE.captures(value) {
        if caps[0].len() == value.len() {
            let day = caps[1].parse::<u32>().ok()?;
            let month = caps[2].parse::<u32>().ok()?;
            return match caps.get(3) {
                Some(year) => {
                    NaiveDate::from_ymd_opt(full_year(year.as_str())?, month, day).map(DateHint::Calendar)
                }
                None if (1..=12).contains(&month) && (1..=31).contains(&day) => {
                    Some(DateHint::DayMonth { day, month })
                }
                None => None,
            };
        }
    }
    if let Some(caps) = ISO_DATE.captures(value) {
        if caps[0].len() == value.len() {
            let year = caps[1].parse::<i32>().ok()?;
            let month = caps[2].parse::<u32>().ok()?;
            let day = caps[3].parse::<u32>().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day).map(DateHint::Calendar);
        }
    }
    match scan_dates(value, locale) {
        Ok(Some(hint)) => Some(hint),
        _ => None,
    }
}

fn scan_dates(text: &str, locale: Locale) -> Result<Option<DateHint>, ExtractionError> {
    let mut found: Vec<Spanned<DateHint>> = Vec::new();

    for caps in ISO_DATE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let year = caps[1].parse::<i32>().map_err(|_| invalid_date())?;
        let month = caps[2].parse::<u32>().map_err(|_| invalid_date())?;
        let day = caps[3].parse::<u32>().map_err(|_| invalid_date())?;
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid_date)?;
        found.push(Spanned { start: whole.start(), end: whole.end(), value: DateHint::Calendar(date) });
    }

    for caps in NUMERIC_DATE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if DURATION_TAIL.is_match(&text[whole.end()..]) {
            continue;
        }
        let day = caps[1].parse::<u32>().map_err(|_| invalid_date())?;
        let month = caps[2].parse::<u32>().map_err(|_| invalid_date())?;
        let value = match caps.get(3) {
            Some(year) => {
                let year = full_year(year.as_str()).ok_or_else(invalid_date)?;
                DateHint::Calendar(NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid_date)?)
            }
            // Without a year this could be a decimal; only accept plausible day.month pairs
            None if (1..=12).contains(&month) && (1..=31).contains(&day) => {
                DateHint::DayMonth { day, month }
            }
            None => continue,
        };
        found.push(Spanned { start: whole.start(), end: whole.end(), value });
    }

    for vocabulary in vocabularies(locale) {
        for (pattern, offset) in &vocabulary.relative_days {
            for m in pattern.find_iter(text) {
                found.push(Spanned { start: m.start(), end: m.end(), value: DateHint::OffsetDays(*offset) });
            }
        }

        for (pattern, weekday) in &vocabulary.weekdays {
            for caps in pattern.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                found.push(Spanned {
                    start: whole.start(),
                    end: whole.end(),
                    value: DateHint::Weekday { weekday: *weekday, skip_week: caps.get(1).is_some() },
                });
            }
        }

        for caps in vocabulary.day_month.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let day = caps[1].parse::<u32>().map_err(|_| invalid_date())?;
            let month = vocabulary.month_number(&caps[2]).ok_or_else(invalid_date)?;
            found.push(Spanned { start: whole.start(), end: whole.end(), value: month_date(day, month, caps.get(3).map(|y| y.as_str()))? });
        }

        if let Some(month_day) = &vocabulary.month_day {
            for caps in month_day.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let month = vocabulary.month_number(&caps[1]).ok_or_else(invalid_date)?;
                let day = caps[2].parse::<u32>().map_err(|_| invalid_date())?;
                found.push(Spanned { start: whole.start(), end: whole.end(), value: month_date(day, month, caps.get(3).map(|y| y.as_str()))? });
            }
        }
    }

    let mut distinct: Vec<DateHint> = Vec::new();
    for hint in outermost(&found) {
        if !distinct.contains(&hint) {
            distinct.push(hint);
        }
    }

    match distinct.as_slice() {
        [] => Ok(None),
        [hint] => Ok(Some(*hint)),
        _ => Err(ExtractionError::AmbiguousExpression(text.to_string())),
    }
}

fn month_date(day: u32, month: u32, year: Option<&str>) -> Result<DateHint, ExtractionError> {
    match year {
        Some(year) => {
            let year = full_year(year).ok_or_else(invalid_date)?;
            NaiveDate::from_ymd_opt(year, month, day)
                .map(DateHint::Calendar)
                .ok_or_else(invalid_date)
        }
        None if (1..=31).contains(&day) => Ok(DateHint::DayMonth { day, month }),
        None => Err(invalid_date()),
    }
}

/// Parse a standalone clock value: `12:00`, `12-00`, `3pm`, `3:30 p.m.`
pub fn parse_time_value(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    if let Some(time) = parse_clock(value) {
        return Some(time);
    }
    let caps = CLOCK_12H.captures(value)?;
    if caps[0].trim_end_matches('.').len() < value.trim_end_matches('.').len() {
        return None;
    }
    twelve_hour(&caps)
}

fn twelve_hour(caps: &regex::Captures) -> Option<NaiveTime> {
    let hour = caps[1].parse::<u32>().ok()?;
    let minute = caps.get(2).map_or(Some(0), |m| m.as_str().parse::<u32>().ok())?;
    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }
    let pm = caps[3].eq_ignore_ascii_case("p");
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn scan_times(text: &str, locale: Locale) -> Result<(Option<NaiveTime>, Option<NaiveTime>), ExtractionError> {
    let mut found: Vec<Spanned<(NaiveTime, Option<NaiveTime>)>> = Vec::new();

    for caps in TIME_RANGE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if let (Some(start), Some(end)) = (parse_clock(&caps[1]), parse_clock(&caps[2])) {
            found.push(Spanned { start: whole.start(), end: whole.end(), value: (start, Some(end)) });
        }
    }
    for caps in CLOCK_12H.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(time) = twelve_hour(&caps) {
            found.push(Spanned { start: whole.start(), end: whole.end(), value: (time, None) });
        }
    }
    for caps in CLOCK_24H.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if let Some(time) = parse_clock(whole.as_str()) {
            found.push(Spanned { start: whole.start(), end: whole.end(), value: (time, None) });
        }
    }
    for vocabulary in vocabularies(locale) {
        for (pattern, hour) in [(&vocabulary.noon, 12), (&vocabulary.midnight, 0)] {
            for m in pattern.find_iter(text) {
                if let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) {
                    found.push(Spanned { start: m.start(), end: m.end(), value: (time, None) });
                }
            }
        }
    }

    let candidates = outermost(&found);
    let Some(first) = candidates.first() else {
        return Ok((None, None));
    };
    if candidates.iter().any(|(start, _)| *start != first.0) {
        return Err(ExtractionError::AmbiguousExpression(text.to_string()));
    }
    let end = candidates.iter().find_map(|(_, end)| *end);
    Ok((Some(first.0), end))
}

fn scan_iso(text: &str, timezone: &Tz) -> Result<Option<Scan>, ExtractionError> {
    let mut moments: Vec<(NaiveDate, NaiveTime)> = Vec::new();

    for caps in ISO_DATE_TIME.captures_iter(text) {
        let seconds = caps.get(6).map_or("00", |m| m.as_str());
        let hour = caps[4].parse::<u32>().map_err(|_| invalid_date())?;
        let wall = format!("{}-{}-{}T{:02}:{}:{}", &caps[1], &caps[2], &caps[3], hour, &caps[5], seconds);

        let moment = match caps.get(7).map(|m| m.as_str()) {
            Some(offset) => {
                let offset = match offset {
                    "z" | "Z" => "+00:00".to_string(),
                    o if o.len() == 5 => format!("{}:{}", &o[..3], &o[3..]),
                    o => o.to_string(),
                };
                let instant = DateTime::parse_from_rfc3339(&format!("{}{}", wall, offset))
                    .map_err(|_| invalid_date())?
                    .with_timezone(timezone);
                (instant.date_naive(), instant.time())
            }
            None => {
                let naive = chrono::NaiveDateTime::parse_from_str(&wall, "%Y-%m-%dT%H:%M:%S")
                    .map_err(|_| invalid_date())?;
                (naive.date(), naive.time())
            }
        };
        if !moments.contains(&moment) {
            moments.push(moment);
        }
    }

    match moments.as_slice() {
        [] => Ok(None),
        [(date, time)] => Ok(Some(Scan { date: Some(DateHint::Calendar(*date)), time: Some(*time), end_time: None })),
        [(date, time), (end_date, end_time)] if date == end_date && end_time > time => Ok(Some(Scan {
            date: Some(DateHint::Calendar(*date)),
            time: Some(*time),
            end_time: Some(*end_time),
        })),
        _ => Err(ExtractionError::AmbiguousExpression(text.to_string())),
    }
}

/// Find the date and time mentioned in `text`.
///
/// Two different dates, or two different clock times that do not form a range,
/// make the text ambiguous.
pub fn scan(text: &str, locale: Locale, timezone: &Tz) -> Result<Scan, ExtractionError> {
    let text = super::text::normalize_message(text);
    if let Some(scan) = scan_iso(&text, timezone)? {
        return Ok(scan);
    }

    let date = scan_dates(&text, locale)?;
    let (time, end_time) = scan_times(&text, locale)?;
    Ok(Scan { date, time, end_time })
}

/// Resolves date/time expressions against a fixed reference instant
#[derive(Debug, Clone)]
pub struct TimeResolver {
    now: DateTime<Tz>,
    timezone: Tz,
    locale: Locale,
    tolerance: Duration,
}

impl TimeResolver {
    pub fn new(now: DateTime<Tz>, config: &ExtractionConfig) -> Self {
        Self {
            now: now.with_timezone(&config.timezone),
            timezone: config.timezone,
            locale: config.locale,
            tolerance: config.past_tolerance,
        }
    }

    /// Reference instant in the configured timezone
    pub fn now(&self) -> DateTime<Tz> {
        self.now
    }

    pub fn scan(&self, text: &str) -> Result<Scan, ExtractionError> {
        scan(text, self.locale, &self.timezone)
    }

    /// Resolve a free-text expression such as "завтра в 12:00" or "Friday 15:30"
    pub fn resolve(&self, expression: &str) -> Result<Resolved, ExtractionError> {
        let scan = self.scan(expression)?;
        self.resolve_parts(scan, expression)
    }

    /// Pin scanned parts to the reference date.
    ///
    /// A time without a date means today. A date without a time is returned as
    /// [`Resolved::DateOnly`].
    pub fn resolve_parts(&self, parts: Scan, source: &str) -> Result<Resolved, ExtractionError> {
        let today = self.now.date_naive();

        let time = match (parts.date, parts.time) {
            (None, None) => {
                return Err(ExtractionError::AmbiguousExpression(source.to_string()));
            }
            (Some(hint), None) => return Ok(Resolved::DateOnly(self.pin_date(hint)?)),
            (_, Some(time)) => time,
        };

        let date = match parts.date {
            Some(hint) => self.pin_date(hint)?,
            None => today,
        };
        let mut start = self.anchor(date, time)?;

        // Weekday names never point into the past: a passed slot today means next week
        if matches!(parts.date, Some(DateHint::Weekday { .. })) && self.is_past(start) {
            start = self.anchor(date + Duration::days(7), time)?;
        }

        if self.is_past(start) {
            debug!("Rejecting past start {} (now {})", start, self.now);
            return Err(ExtractionError::PastDateRejected { start, now: self.now });
        }

        let end = match parts.end_time {
            Some(end_time) => self
                .anchor(start.date_naive(), end_time)
                .ok()
                .filter(|end| *end > start),
            None => None,
        };

        Ok(Resolved::At { start, end })
    }

    /// Turn a date hint into a calendar date relative to the reference date
    pub fn pin_date(&self, hint: DateHint) -> Result<NaiveDate, ExtractionError> {
        let today = self.now.date_naive();
        match hint {
            DateHint::Calendar(date) => Ok(date),
            DateHint::DayMonth { day, month } => {
                NaiveDate::from_ymd_opt(today.year(), month, day).ok_or_else(invalid_date)
            }
            DateHint::OffsetDays(days) => Ok(today + Duration::days(days)),
            DateHint::Weekday { weekday, skip_week } => {
                let date = next_weekday(today, weekday);
                Ok(if skip_week { date + Duration::days(7) } else { date })
            }
        }
    }

    /// Attach the configured timezone to a wall-clock date and time
    pub fn anchor(&self, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Tz>, ExtractionError> {
        let naive = date.and_time(time);
        localize(&self.timezone, &naive).ok_or_else(|| {
            ExtractionError::AmbiguousExpression(format!("{} does not exist in {}", naive, self.timezone))
        })
    }

    fn is_past(&self, start: DateTime<Tz>) -> bool {
        start < self.now - self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Kyiv;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn config() -> ExtractionConfig {
        ExtractionConfig::new(Kyiv, Locale::Ru)
    }

    // Thursday
    fn resolver() -> TimeResolver {
        TimeResolver::new(Kyiv.with_ymd_and_hms(2026, 2, 12, 10, 0, 0).unwrap(), &config())
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
        Kyiv.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn start_of(resolved: Resolved) -> DateTime<Tz> {
        match resolved {
            Resolved::At { start, .. } => start,
            Resolved::DateOnly(date) => panic!("expected a start, got date {}", date),
        }
    }

    #[test_case("завтра в 12:00", at(2026, 2, 13, 12, 0) ; "tomorrow ru")]
    #[test_case("tomorrow at 3pm", at(2026, 2, 13, 15, 0) ; "tomorrow en 12h")]
    #[test_case("сегодня в 19-00", at(2026, 2, 12, 19, 0) ; "today dashed")]
    #[test_case("послезавтра в 9:30", at(2026, 2, 14, 9, 30) ; "day after tomorrow")]
    #[test_case("в пятницу в 15:30", at(2026, 2, 13, 15, 30) ; "weekday accusative")]
    #[test_case("Friday 15:30", at(2026, 2, 13, 15, 30) ; "weekday en")]
    #[test_case("в понедельник в 10:00", at(2026, 2, 16, 10, 0) ; "weekday next week")]
    #[test_case("в следующий понедельник в 10:00", at(2026, 2, 23, 10, 0) ; "next weekday skips a week")]
    #[test_case("13.02.26 12:00", at(2026, 2, 13, 12, 0) ; "two digit year")]
    #[test_case("13.02.2026 в 12:00", at(2026, 2, 13, 12, 0) ; "four digit year")]
    #[test_case("13 февраля в 12:00", at(2026, 2, 13, 12, 0) ; "month name ru")]
    #[test_case("February 13 at 12:30 pm", at(2026, 2, 13, 12, 30) ; "month name en")]
    #[test_case("2026-02-13T12:00", at(2026, 2, 13, 12, 0) ; "iso wall time")]
    #[test_case("2026-02-13T12:00:00+03:00", at(2026, 2, 13, 11, 0) ; "iso with offset keeps instant")]
    #[test_case("завтра в полдень", at(2026, 2, 13, 12, 0) ; "noon")]
    #[test_case("в 18:00", at(2026, 2, 12, 18, 0) ; "time only means today")]
    fn test_resolve(expression: &str, expected: DateTime<Tz>) {
        assert_eq!(start_of(resolver().resolve(expression).unwrap()), expected);
    }

    #[test]
    fn test_dash_and_colon_resolve_identically() {
        let r = resolver();
        assert_eq!(r.resolve("завтра 12-00").unwrap(), r.resolve("завтра 12:00").unwrap());
    }

    #[test]
    fn test_date_literal_ignores_now() {
        let later = TimeResolver::new(at(2026, 2, 13, 8, 0), &config());
        assert_eq!(
            start_of(later.resolve("13.02.26 12:00").unwrap()),
            start_of(resolver().resolve("13.02.26 12:00").unwrap())
        );
        assert_eq!(
            parse_date_value("13.02.26", Locale::Ru),
            Some(DateHint::Calendar(NaiveDate::from_ymd_opt(2026, 2, 13).unwrap()))
        );
    }

    #[test]
    fn test_date_without_time_is_reported() {
        assert_eq!(
            resolver().resolve("завтра").unwrap(),
            Resolved::DateOnly(NaiveDate::from_ymd_opt(2026, 2, 13).unwrap())
        );
    }

    #[test]
    fn test_past_start_is_rejected() {
        let err = resolver().resolve("сегодня в 8:00").unwrap_err();
        assert!(matches!(err, ExtractionError::PastDateRejected { .. }));

        let err = resolver().resolve("11.02.26 12:00").unwrap_err();
        assert!(matches!(err, ExtractionError::PastDateRejected { .. }));
    }

    #[test]
    fn test_small_lag_is_tolerated() {
        // Three minutes behind "now" is within the default tolerance
        let r = TimeResolver::new(at(2026, 2, 12, 12, 3), &config());
        assert_eq!(start_of(r.resolve("сегодня в 12:00").unwrap()), at(2026, 2, 12, 12, 0));
    }

    #[test]
    fn test_weekday_rolls_forward_instead_of_rejecting() {
        // Thursday 10:00, asking for Thursday 08:00 means next week
        assert_eq!(
            start_of(resolver().resolve("в четверг в 8:00").unwrap()),
            at(2026, 2, 19, 8, 0)
        );
    }

    #[test]
    fn test_weekday_resolution_is_idempotent() {
        let r = resolver();
        assert_eq!(r.resolve("Friday 15:30").unwrap(), r.resolve("Friday 15:30").unwrap());
    }

    #[test]
    fn test_ambiguous_expressions() {
        let r = resolver();
        assert!(matches!(
            r.resolve("завтра или в пятницу в 12:00"),
            Err(ExtractionError::AmbiguousExpression(_))
        ));
        assert!(matches!(
            r.resolve("завтра в 12:00 или в 15:00"),
            Err(ExtractionError::AmbiguousExpression(_))
        ));
        assert!(matches!(r.resolve("когда-нибудь"), Err(ExtractionError::AmbiguousExpression(_))));
    }

    #[test]
    fn test_invalid_date_literal() {
        assert_eq!(parse_date_value("31.02.26", Locale::Ru), None);
        assert_eq!(parse_date_value("12.13.26", Locale::Ru), None);
        assert_eq!(
            resolver().resolve("31.02.26 в 12:00").unwrap_err(),
            ExtractionError::ValidationFailed { fields: vec![MeetingField::Date] }
        );
    }

    #[test]
    fn test_time_range_yields_end() {
        let resolved = resolver().resolve("завтра с 8:00 до 14:00").unwrap();
        assert_eq!(
            resolved,
            Resolved::At { start: at(2026, 2, 13, 8, 0), end: Some(at(2026, 2, 13, 14, 0)) }
        );
    }

    #[test]
    fn test_nested_relative_words() {
        let r = TimeResolver::new(at(2026, 2, 12, 10, 0), &ExtractionConfig::new(Kyiv, Locale::En));
        assert_eq!(
            start_of(r.resolve("the day after tomorrow at 9am").unwrap()),
            at(2026, 2, 14, 9, 0)
        );
    }

    #[test]
    fn test_durations_are_not_dates() {
        let scan = resolver().scan("завтра в 12:00 на 1.5 часа").unwrap();
        assert_eq!(scan.date, Some(DateHint::OffsetDays(1)));
    }

    #[test]
    fn test_parse_time_value() {
        assert_eq!(parse_time_value("12-00"), NaiveTime::from_hms_opt(12, 0, 0));
        assert_eq!(parse_time_value("3:30 pm"), NaiveTime::from_hms_opt(15, 30, 0));
        assert_eq!(parse_time_value("12am"), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_time_value("25:00"), None);
        assert_eq!(parse_time_value("13pm"), None);
    }
}
