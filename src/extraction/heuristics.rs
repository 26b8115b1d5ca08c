//! Offline guesses for title, duration and notes in free prose.

use crate::config::Locale;
use crate::extraction::structured::parse_duration;
use crate::extraction::titles::TitleCanonicalizer;
use lazy_static::lazy_static;
use regex::Regex;

const MAX_TITLE_CHARS: usize = 80;
const MAX_NOTES_CHARS: usize = 800;

lazy_static! {
    static ref LEAD_IN: Regex = Regex::new(
        r"(?i)^\s*(?:(?:запиши(?:те)?|добавь(?:те)?|создай(?:те)?|поставь(?:те)?|напомни(?:те)?)(?:\s+мне|\s+меня)?|есть|будет|нужно|надо|хочу|у\s+меня|у\s+нас|remind\s+me(?:\s+to)?|schedule|add|book)\b\s*[:\-—]*\s*"
    ).unwrap();
    static ref NOTE_MARKER: Regex =
        Regex::new(r"(?i)документ|взять|принести|не\s+забыть|очередь|bring|don't\s+forget").unwrap();
    static ref TRAILING_WHEN: Regex = Regex::new(
        r"(?is)(?:^|\s+)(?:(?:на|в|во|к|с|on|at|by|from|the)\s+)*(?:сегодня|завтра|послезавтра|today|tonight|tomorrow|day\s+after|next|следующ\w*|понедельник\w*|вторник\w*|сред[ауы]|четверг\w*|пятниц\w*|суббот\w*|воскресень\w*|monday|tuesday|wednesday|thursday|friday|saturday|sunday|полдень|полночь|noon|midnight|\d{1,2}:\d{2}|\d{1,2}[./]\d{1,2}(?:[./]\d{2,4})?|\d{4}-\d{2}-\d{2}|\d{1,2}\s+\p{L}+\s+\d{2,4}|\d{1,2}\s*(?:am|pm))\b.*$"
    ).unwrap();
    static ref DURATION_PHRASE: Regex = Regex::new(
        r"(?i)\b(\d+(?:[.,]\d+)?)\s*(минут\w*|мин\b|min(?:ute)?s?\b|час\w*|ч\b|h\b|hours?\b)"
    ).unwrap();
    static ref WORD_DURATION: Regex =
        Regex::new(r"(?i)\b(?:на\s+)?(полчаса|half\s+an\s+hour|an\s+hour|час)\b").unwrap();
    static ref DOCUMENT_MENTION: Regex =
        Regex::new(r"(?i)\b(?:документ\w*|паспорт\w*|очеред\w*|documents?|passport)\b").unwrap();
}

const TRIM: &[char] = &[' ', '-', '—', ':', ';', ',', '.', '\t', '\n', '\r'];

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Things to bring, starting at the first marker word
pub fn extract_notes(text: &str) -> Option<String> {
    let marker = NOTE_MARKER.find(text)?;
    let notes = text[marker.start()..].trim_matches(TRIM);
    if notes.is_empty() {
        None
    } else {
        Some(truncate_chars(notes, MAX_NOTES_CHARS))
    }
}

/// Title guessed from the message itself.
///
/// A known keyword wins. Otherwise lead-in phrases, notes and the trailing
/// date/time are cut off.
pub fn fallback_title(text: &str, titles: &TitleCanonicalizer, locale: Locale) -> String {
    let text = LEAD_IN.replace(text.trim(), "");
    if let Some(canonical) = titles.find(&text) {
        return canonical.to_string();
    }

    let mut title: &str = &text;
    if let Some(marker) = NOTE_MARKER.find(title) {
        title = &title[..marker.start()];
    }
    let title = TRAILING_WHEN.replace(title, "");
    let title = title.trim_matches(TRIM);

    if title.is_empty() {
        locale.default_title().to_string()
    } else {
        capitalize(&truncate_chars(title, MAX_TITLE_CHARS))
    }
}

/// Duration mentioned in prose: "на 45 минут", "2 часа", "на полчаса"
pub fn fallback_duration(text: &str) -> Option<u32> {
    for caps in DURATION_PHRASE.captures_iter(text) {
        let Some(minutes) = parse_duration(&format!("{} {}", &caps[1], &caps[2]), None) else {
            continue;
        };
        let is_hours = caps[2].to_lowercase().starts_with(|c| c == 'ч' || c == 'h');
        // "5 мин" is usually a reminder lead time rather than a meeting length
        if is_hours || minutes >= 5 {
            return Some(minutes);
        }
    }

    WORD_DURATION.captures(text).map(|caps| {
        match caps[1].to_lowercase().as_str() {
            "полчаса" => 30,
            word if word.starts_with("half") => 30,
            _ => 60,
        }
    })
}

/// Whether a candidate title from the service is usable as-is
pub fn is_plausible_title(title: &str) -> bool {
    let title = title.trim();
    !title.is_empty() && title.chars().count() <= 60 && !DOCUMENT_MENTION.is_match(title)
}
