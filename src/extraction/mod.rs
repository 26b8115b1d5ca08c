//! Meeting-intent extraction: message text in, validated [`MeetingEvent`] out.
//!
//! Explicit `key - value` syntax is tried first. Free prose, or gaps in a
//! partial structured block, go through the [`LanguageUnderstanding`]
//! service. The time resolver anchors the start before the normalizer
//! builds the final event.

pub mod heuristics;
pub mod inference;
pub mod models;
pub mod normalize;
pub mod structured;
pub mod text;
pub mod time;
pub mod titles;

pub use inference::{HeuristicUnderstanding, IntentExtractor, LanguageUnderstanding, RawCandidate, UnderstandingRequest};
pub use models::{DateTimeSpec, MeetingDraft, MeetingEvent, MeetingField};
pub use time::{Resolved, TimeResolver};

use crate::config::ExtractionConfig;
use crate::error::ExtractionError;
use chrono::DateTime;
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stateless extraction pipeline shared by all incoming messages
#[derive(Clone)]
pub struct MeetingPipeline {
    config: ExtractionConfig,
    understanding: Arc<dyn LanguageUnderstanding>,
}

impl MeetingPipeline {
    pub fn new(config: ExtractionConfig, understanding: Arc<dyn LanguageUnderstanding>) -> Self {
        Self { config, understanding }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract a meeting from one message relative to `now`
    pub async fn run(&self, text: &str, now: DateTime<Tz>) -> Result<MeetingEvent, ExtractionError> {
        let text = text::normalize_message(text);
        if text.is_empty() {
            return Err(ExtractionError::ValidationFailed {
                fields: vec![MeetingField::Date, MeetingField::Time],
            });
        }

        let resolver = TimeResolver::new(now, &self.config);
        let extractor = IntentExtractor::new(&self.config, self.understanding.as_ref());

        let draft = match structured::parse(&text, self.config.locale) {
            // Bad literals are reported as-is instead of being guessed around
            Some(draft) if draft.has_rejections() => return normalize::normalize(draft, &self.config),
            Some(draft) if draft.has_complete_start() => draft,
            Some(mut draft) => {
                let missing = draft.missing_start_fields();
                match extractor.extract(&text, &resolver).await {
                    Ok(inferred) => {
                        draft.fill_from(&inferred);
                        draft
                    }
                    Err(ExtractionError::ExtractionUnavailable(reason)) => {
                        warn!("Cannot complete structured fields: {}", reason);
                        return Err(ExtractionError::ParseIncomplete { missing });
                    }
                    Err(e) => return Err(e),
                }
            }
            None => extractor.extract(&text, &resolver).await?,
        };

        let draft = resolve_start(draft, &resolver, &text)?;
        let event = normalize::normalize(draft, &self.config)?;
        info!(
            "Extracted meeting '{}' at {} for {} min",
            event.title(),
            event.start(),
            event.duration_minutes()
        );
        Ok(event)
    }
}

/// Route any pending date/time through the resolver
pub fn resolve_start(
    mut draft: MeetingDraft,
    resolver: &TimeResolver,
    text: &str,
) -> Result<MeetingDraft, ExtractionError> {
    let resolved = match draft.date_time() {
        Some(DateTimeSpec::Absolute(_)) => return Ok(draft),
        Some(DateTimeSpec::Expression(expression)) => resolver.resolve(expression)?,
        Some(DateTimeSpec::Parts { date, time }) => resolver.resolve_parts(
            time::Scan {
                date: *date,
                time: *time,
                end_time: None,
            },
            text,
        )?,
        None => return Err(ExtractionError::AmbiguousExpression(text.to_string())),
    };

    match resolved {
        Resolved::At { start, end } => {
            draft.resolve_start(start);
            if let Some(end) = end {
                draft.set_duration_minutes((end - start).num_minutes() as u32);
            }
        }
        Resolved::DateOnly(date) => {
            debug!("Only a date was found: {}", date);
            draft.resolve_date_only(date);
        }
    }

    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Locale;
    use chrono::TimeZone;
    use chrono_tz::Europe::Kyiv;
    use pretty_assertions::assert_eq;

    fn resolver() -> TimeResolver {
        TimeResolver::new(
            Kyiv.with_ymd_and_hms(2026, 2, 12, 10, 0, 0).unwrap(),
            &crate::config::ExtractionConfig::new(Kyiv, Locale::Ru),
        )
    }

    #[test]
    fn test_expression_is_resolved_with_range() {
        let mut draft = MeetingDraft::new(models::DraftSource::Inferred);
        draft.set_date_time(DateTimeSpec::Expression("завтра с 8:00 до 9:30".into()));

        let draft = resolve_start(draft, &resolver(), "").unwrap();
        assert_eq!(
            draft.date_time(),
            Some(&DateTimeSpec::Absolute(Kyiv.with_ymd_and_hms(2026, 2, 13, 8, 0, 0).unwrap()))
        );
        assert_eq!(draft.duration_minutes(), Some(90));
    }

    #[test]
    fn test_nothing_to_resolve_is_ambiguous() {
        let draft = MeetingDraft::new(models::DraftSource::Inferred);
        assert!(matches!(
            resolve_start(draft, &resolver(), "привет"),
            Err(ExtractionError::AmbiguousExpression(_))
        ));
    }
}
