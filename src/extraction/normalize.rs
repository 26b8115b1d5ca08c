use crate::config::ExtractionConfig;
use crate::error::ExtractionError;
use crate::extraction::models::{DateTimeSpec, MeetingDraft, MeetingEvent, MeetingField};
use std::collections::BTreeSet;

const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// Turn a draft with an anchored start into a final event.
///
/// Fills the default duration and the locale's default title. Every field
/// that was rejected or is still missing is reported in one
/// `ValidationFailed`.
pub fn normalize(draft: MeetingDraft, config: &ExtractionConfig) -> Result<MeetingEvent, ExtractionError> {
    let mut invalid: BTreeSet<MeetingField> = draft.rejected().collect();

    let start = match draft.date_time() {
        Some(DateTimeSpec::Absolute(start)) => Some(*start),
        _ => {
            invalid.extend(draft.missing_start_fields());
            None
        }
    };

    let duration_minutes = match draft.duration_minutes() {
        Some(minutes) if (1..=MAX_DURATION_MINUTES).contains(&minutes) => minutes,
        Some(_) => {
            invalid.insert(MeetingField::Duration);
            0
        }
        None => config.default_duration_minutes,
    };

    let start = match start {
        Some(start) if invalid.is_empty() => start,
        _ => {
            return Err(ExtractionError::ValidationFailed {
                fields: invalid.into_iter().collect(),
            })
        }
    };

    let title = draft.title().unwrap_or(config.locale.default_title());
    MeetingEvent::new(title, start, duration_minutes, draft.notes().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Locale;
    use crate::extraction::models::{DateHint, DraftSource};
    use chrono::{NaiveTime, TimeZone};
    use chrono_tz::Europe::Kyiv;
    use pretty_assertions::assert_eq;

    fn config() -> ExtractionConfig {
        ExtractionConfig::new(Kyiv, Locale::Ru)
    }

    #[test]
    fn test_defaults_are_filled() {
        let start = Kyiv.with_ymd_and_hms(2026, 2, 13, 12, 0, 0).unwrap();
        let mut draft = MeetingDraft::new(DraftSource::Inferred);
        draft.resolve_start(start);

        let event = normalize(draft, &config()).unwrap();
        assert_eq!(event.title(), "Встреча");
        assert_eq!(event.duration_minutes(), 60);
        assert_eq!(event.start(), start);
    }

    #[test]
    fn test_missing_time_is_reported() {
        let mut draft = MeetingDraft::new(DraftSource::Structured);
        draft.set_title("Обед");
        draft.set_date_time(DateTimeSpec::Parts {
            date: Some(DateHint::OffsetDays(1)),
            time: None,
        });

        assert_eq!(
            normalize(draft, &config()).unwrap_err(),
            ExtractionError::ValidationFailed { fields: vec![MeetingField::Time] }
        );
    }

    #[test]
    fn test_rejected_and_missing_fields_are_combined() {
        let mut draft = MeetingDraft::new(DraftSource::Structured);
        draft.reject(MeetingField::Date);
        draft.reject(MeetingField::Duration);
        draft.set_date_time(DateTimeSpec::Parts {
            date: None,
            time: NaiveTime::from_hms_opt(12, 0, 0),
        });

        assert_eq!(
            normalize(draft, &config()).unwrap_err(),
            ExtractionError::ValidationFailed {
                fields: vec![MeetingField::Date, MeetingField::Duration]
            }
        );
    }

    #[test]
    fn test_unresolved_expression_is_not_parsed() {
        let mut draft = MeetingDraft::new(DraftSource::Inferred);
        draft.set_date_time(DateTimeSpec::Expression("завтра в 12:00".into()));

        assert_eq!(
            normalize(draft, &config()).unwrap_err(),
            ExtractionError::ValidationFailed {
                fields: vec![MeetingField::Date, MeetingField::Time]
            }
        );
    }
}
