//! Pre-pass that rewrites spoken and loosely typed clock times into `HH:MM`
//! before either extraction path looks at the message.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// "в пять часов вечера", "в 5 вечера", "в 9 утра"
    static ref RU_PART_OF_DAY: Regex = Regex::new(
        r"(?i)\bв\s+(\d{1,2}|один|одна|два|две|три|четыре|пять|шесть|семь|восемь|девять|десять|одиннадцать|двенадцать)(?:\s*час(?:а|ов)?)?\s*(утра|дня|вечера|ночи)\b"
    ).unwrap();
    /// "в 15 часов"
    static ref RU_HOURS: Regex = Regex::new(r"(?i)\bв\s+(\d{1,2})\s*час(?:а|ов)?\b").unwrap();
    static ref DASHED_CLOCK: Regex = Regex::new(r"\b(\d{1,2})-(\d{2})\b").unwrap();
    static ref H_CLOCK: Regex = Regex::new(r"(?i)\b(\d{1,2})\s*h\s*(\d{2})\b").unwrap();
    /// "в 10.30", "с 9.00 до 10.30", "Время - 10.05"
    static ref DOTTED_CLOCK: Regex = Regex::new(
        r"(?i)(\b(?:в|во|с|до|по|at|from|to|until|till)\s+|\b(?:время|time)\s*[-—–:=]\s*)?\b(\d{1,2})\.(\d{2})\b"
    ).unwrap();
}

fn ru_number(word: &str) -> Option<u32> {
    let n = match word {
        "один" | "одна" => 1,
        "два" | "две" => 2,
        "три" => 3,
        "четыре" => 4,
        "пять" => 5,
        "шесть" => 6,
        "семь" => 7,
        "восемь" => 8,
        "девять" => 9,
        "десять" => 10,
        "одиннадцать" => 11,
        "двенадцать" => 12,
        digits => return digits.parse().ok(),
    };
    Some(n)
}

/// Convert an hour qualified by a Russian part-of-day word to 24-hour form
fn ru_hour_to_24h(hour: u32, part_of_day: &str) -> u32 {
    match part_of_day {
        "дня" | "вечера" if (1..=11).contains(&hour) => hour + 12,
        "ночи" if hour == 12 => 0,
        _ => hour,
    }
}

/// Whether the byte just outside a match continues a date or time literal
fn touches_literal(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let continues = |c: Option<char>| matches!(c, Some(c) if c.is_ascii_digit() || matches!(c, ':' | '-' | '.' | '/'));
    continues(before) || continues(after)
}

/// "1.25 часа" is a fractional duration, not a clock time
fn before_duration_unit(rest: &str) -> bool {
    let rest = rest.trim_start().to_lowercase();
    ["ч", "мин", "h", "min"].iter().any(|unit| rest.starts_with(unit))
}

/// Rewrite clock times in a message to `HH:MM`.
///
/// Dates such as `2026-02-13` or `13.02.26` are left untouched.
pub fn normalize_message(text: &str) -> String {
    let text = text.trim();

    let text = RU_PART_OF_DAY.replace_all(text, |caps: &Captures| {
        let word = caps[1].to_lowercase();
        let part = caps[2].to_lowercase();
        match ru_number(&word) {
            Some(hour) if hour <= 23 => format!("в {:02}:00", ru_hour_to_24h(hour, &part)),
            _ => caps[0].to_string(),
        }
    });

    let text = RU_HOURS.replace_all(&text, |caps: &Captures| match caps[1].parse::<u32>() {
        Ok(hour) if hour <= 23 => format!("в {:02}:00", hour),
        _ => caps[0].to_string(),
    });

    let text = H_CLOCK.replace_all(&text, "$1:$2");

    let dashed = text.to_string();
    let text = DASHED_CLOCK.replace_all(&dashed, |caps: &Captures| {
        let Some(whole) = caps.get(0) else {
            return String::new();
        };
        if touches_literal(&dashed, whole.start(), whole.end()) {
            return whole.as_str().to_string();
        }
        match (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
            (Ok(h), Ok(m)) if h <= 23 && m <= 59 => format!("{}:{}", &caps[1], &caps[2]),
            _ => whole.as_str().to_string(),
        }
    });

    let dotted = text.into_owned();
    let text = DOTTED_CLOCK.replace_all(&dotted, |caps: &Captures| {
        let (Some(whole), Some(hour), Some(minute)) = (caps.get(0), caps.get(2), caps.get(3)) else {
            return String::new();
        };
        if touches_literal(&dotted, hour.start(), minute.end()) || before_duration_unit(&dotted[minute.end()..]) {
            return whole.as_str().to_string();
        }
        let (Ok(h), Ok(m)) = (hour.as_str().parse::<u32>(), minute.as_str().parse::<u32>()) else {
            return whole.as_str().to_string();
        };
        // Without a time word in front only pairs that cannot be a day.month are clocks
        let is_day_month = (1..=31).contains(&h) && (1..=12).contains(&m);
        if h <= 23 && m <= 59 && (caps.get(1).is_some() || !is_day_month) {
            let prefix = caps.get(1).map_or("", |p| p.as_str());
            format!("{}{}:{}", prefix, hour.as_str(), minute.as_str())
        } else {
            whole.as_str().to_string()
        }
    });

    text.into_owned()
}
