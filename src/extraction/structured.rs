//! Explicit `key - value` syntax:
//!
//! ```text
//! Титул - Зубной врач
//! Дата - 13.02.26
//! Время - 12-00
//! Протяженность (часы) - 1
//! ```

use crate::config::Locale;
use crate::extraction::models::{DateTimeSpec, DraftSource, MeetingDraft, MeetingField};
use crate::extraction::text::normalize_message;
use crate::extraction::time::{parse_date_value, parse_time_value};
use chrono::NaiveTime;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

lazy_static! {
    static ref FIELD_LINE: Regex = Regex::new(
        r"(?i)^\s*(титул|заголовок|название|title|дата|date|время|time|конец|окончание|end|протяж[её]нность|длительность|duration|заметки|описание|документы|notes)\s*(?:\(([^)]*)\))?\s*[-—–:=]\s*(.*?)\s*$"
    ).unwrap();
    static ref DURATION_VALUE: Regex =
        Regex::new(r"(?i)^(\d+(?:[.,]\d+)?)\s*(\p{L}+)?\.?$").unwrap();
    static ref LEADING_PREPOSITION: Regex = Regex::new(r"(?i)^(?:в|во|at|on)\s+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Key {
    Title,
    Date,
    Time,
    End,
    Duration,
    Notes,
}

impl Key {
    fn parse(word: &str) -> Option<Self> {
        let key = match word.to_lowercase().as_str() {
            "титул" | "заголовок" | "название" | "title" => Key::Title,
            "дата" | "date" => Key::Date,
            "время" | "time" => Key::Time,
            "конец" | "окончание" | "end" => Key::End,
            "протяженность" | "протяжённость" | "длительность" | "duration" => Key::Duration,
            "заметки" | "описание" | "документы" | "notes" => Key::Notes,
            _ => return None,
        };
        Some(key)
    }
}

/// Convert a duration such as `1`, `1.5 часа`, `45 мин` or `2h` to minutes.
///
/// `unit_hint` is the parenthesized unit from the key, e.g. `(часы)`.
/// Without any unit the number is taken as minutes.
pub fn parse_duration(value: &str, unit_hint: Option<&str>) -> Option<u32> {
    let caps = DURATION_VALUE.captures(value.trim())?;
    let amount = caps[1].replace(',', ".").parse::<f64>().ok()?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str())
        .or(unit_hint)
        .map(|u| u.trim().to_lowercase());

    let minutes = match unit.as_deref() {
        None => amount,
        Some(u) if u.starts_with('ч') || u.starts_with('h') => amount * 60.0,
        Some(u) if u.starts_with("мин") || u.starts_with("min") || u == "м" || u == "m" => amount,
        Some(_) => return None,
    };

    let minutes = minutes.round();
    if (1.0..=1440.0).contains(&minutes) {
        Some(minutes as u32)
    } else {
        None
    }
}

fn parse_clock_value(value: &str) -> Option<NaiveTime> {
    let value = normalize_message(value);
    let value = LEADING_PREPOSITION.replace(&value, "");
    parse_time_value(&value)
}

/// Parse explicit field syntax.
///
/// Returns `None` when the text has fewer than two non-empty lines or no
/// recognized key. Values that fail to parse leave their field unset and
/// mark it rejected; unrecognized lines are ignored.
pub fn parse(text: &str, locale: Locale) -> Option<MeetingDraft> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return None;
    }

    let mut draft = MeetingDraft::new(DraftSource::Structured);
    let mut seen: HashSet<Key> = HashSet::new();
    let mut date = None;
    let mut time = None;
    let mut end = None;
    let mut has_end_key = false;

    for line in lines {
        let Some(caps) = FIELD_LINE.captures(line) else {
            continue;
        };
        let Some(key) = Key::parse(&caps[1]) else {
            continue;
        };
        let value = caps.get(3).map_or("", |m| m.as_str()).trim();
        if value.is_empty() || !seen.insert(key) {
            continue;
        }

        match key {
            Key::Title => {
                draft.claim(MeetingField::Title);
                draft.set_title(value);
            }
            Key::Date => match parse_date_value(value, locale) {
                Some(hint) => {
                    draft.claim(MeetingField::Date);
                    date = Some(hint);
                }
                None => draft.reject(MeetingField::Date),
            },
            Key::Time => match parse_clock_value(value) {
                Some(t) => {
                    draft.claim(MeetingField::Time);
                    time = Some(t);
                }
                None => draft.reject(MeetingField::Time),
            },
            Key::End => {
                has_end_key = true;
                end = parse_clock_value(value);
            }
            Key::Duration => {
                match parse_duration(value, caps.get(2).map(|m| m.as_str())) {
                    Some(minutes) => {
                        draft.claim(MeetingField::Duration);
                        draft.set_duration_minutes(minutes);
                    }
                    None => draft.reject(MeetingField::Duration),
                }
            }
            Key::Notes => draft.set_notes(value),
        }
    }

    if seen.is_empty() {
        return None;
    }

    if has_end_key && !seen.contains(&Key::Duration) {
        match (time, end) {
            (Some(start), Some(end)) if end > start => {
                let minutes = (end - start).num_minutes() as u32;
                draft.claim(MeetingField::Duration);
                draft.set_duration_minutes(minutes);
            }
            (Some(_), _) => draft.reject(MeetingField::Duration),
            // Without a start time the end cannot be turned into a duration
            (None, _) => {}
        }
    }

    if date.is_some() || time.is_some() {
        draft.set_date_time(DateTimeSpec::Parts { date, time });
    }

    debug!("Structured draft: {:?}", draft);
    Some(draft)
}
