use crate::config::{ExtractionConfig, Locale};
use crate::error::{BotResult, ExtractionError};
use crate::extraction::heuristics::{extract_notes, fallback_duration, fallback_title, is_plausible_title};
use crate::extraction::models::{DateTimeSpec, DraftSource, MeetingDraft};
use crate::extraction::structured::parse_duration;
use crate::extraction::time::{Scan, TimeResolver};
use crate::extraction::titles::TitleCanonicalizer;
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

/// What the understanding service is asked about
#[derive(Debug, Clone)]
pub struct UnderstandingRequest {
    pub text: String,
    /// "Now" in the configured timezone, for grounding relative dates
    pub reference: DateTime<Tz>,
    pub locale: Locale,
}

/// Unvalidated answer from an understanding service.
///
/// Every field is optional and loosely typed; nothing here is trusted until
/// [`IntentExtractor::interpret`] has checked it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default, alias = "start_datetime", alias = "date_time_expression")]
    pub date_time: Option<Value>,
    #[serde(default, alias = "end_datetime")]
    pub end: Option<Value>,
    #[serde(default)]
    pub duration_minutes: Option<Value>,
    #[serde(default)]
    pub notes: Option<Value>,
}

impl RawCandidate {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(Value::String(title.to_string()));
        self
    }

    pub fn with_date_time(mut self, expression: &str) -> Self {
        self.date_time = Some(Value::String(expression.to_string()));
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(Value::from(minutes));
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(Value::String(notes.to_string()));
        self
    }
}

/// External service that reads meaning out of free prose
#[async_trait]
pub trait LanguageUnderstanding: Send + Sync {
    async fn extract(&self, request: &UnderstandingRequest) -> BotResult<RawCandidate>;
}

fn text_value(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Array(items)) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        _ => None,
    }
}

fn duration_value(value: &Option<Value>) -> Option<u32> {
    match value {
        Some(Value::Number(n)) => {
            let minutes = n.as_f64()?.round();
            if (1.0..=1440.0).contains(&minutes) {
                Some(minutes as u32)
            } else {
                None
            }
        }
        Some(Value::String(s)) => parse_duration(s, None),
        _ => None,
    }
}

/// Turns free prose into a draft with the help of an understanding service
pub struct IntentExtractor<'a> {
    config: &'a ExtractionConfig,
    understanding: &'a dyn LanguageUnderstanding,
}

impl<'a> IntentExtractor<'a> {
    pub fn new(config: &'a ExtractionConfig, understanding: &'a dyn LanguageUnderstanding) -> Self {
        Self { config, understanding }
    }

    /// Ask the service about `text` and validate its answer.
    ///
    /// Service failures and timeouts become `ExtractionUnavailable`.
    pub async fn extract(&self, text: &str, resolver: &TimeResolver) -> Result<MeetingDraft, ExtractionError> {
        let request = UnderstandingRequest {
            text: text.to_string(),
            reference: resolver.now(),
            locale: self.config.locale,
        };

        let candidate = match timeout(self.config.understanding_timeout, self.understanding.extract(&request)).await {
            Ok(Ok(candidate)) => candidate,
            Ok(Err(e)) => {
                warn!("Language understanding failed: {}", e);
                return Err(ExtractionError::ExtractionUnavailable(e.to_string()));
            }
            Err(_) => {
                warn!(
                    "Language understanding timed out after {:?}",
                    self.config.understanding_timeout
                );
                return Err(ExtractionError::ExtractionUnavailable(format!(
                    "no answer within {} seconds",
                    self.config.understanding_timeout.as_secs()
                )));
            }
        };

        debug!("Understanding candidate: {:?}", candidate);
        self.interpret(candidate, text, resolver)
    }

    /// Validate a candidate against the original message.
    ///
    /// Dates come from the service expression first and the message second. An
    /// explicit clock time in the message beats the service's time.
    pub fn interpret(
        &self,
        candidate: RawCandidate,
        text: &str,
        resolver: &TimeResolver,
    ) -> Result<MeetingDraft, ExtractionError> {
        let titles: &TitleCanonicalizer = &self.config.titles;
        let mut draft = MeetingDraft::new(DraftSource::Inferred);

        let title = match text_value(&candidate.title) {
            Some(title) if is_plausible_title(&title) => titles.canonicalize(&title),
            _ => fallback_title(text, titles, self.config.locale),
        };
        draft.set_title(title);

        if let Some(notes) = text_value(&candidate.notes).or_else(|| extract_notes(text)) {
            draft.set_notes(notes);
        }

        let message = resolver.scan(text);
        let service = text_value(&candidate.date_time)
            .and_then(|expression| resolver.scan(&expression).ok())
            .filter(|scan| scan.date.is_some() || scan.time.is_some());
        let service_end = text_value(&candidate.end)
            .and_then(|expression| resolver.scan(&expression).ok())
            .and_then(|scan| scan.time);

        let merged = match (service, message) {
            (Some(service), Ok(message)) => Scan {
                date: service.date.or(message.date),
                time: message.time.or(service.time),
                end_time: message.end_time.or(service.end_time).or(service_end),
            },
            (Some(service), Err(_)) => Scan {
                end_time: service.end_time.or(service_end),
                ..service
            },
            (None, Ok(message)) => message,
            (None, Err(e)) => return Err(e),
        };

        // An explicit range beats any stated duration
        let range_minutes = match (merged.time, merged.end_time) {
            (Some(start), Some(end)) if end > start => Some((end - start).num_minutes() as u32),
            _ => None,
        };
        if let Some(minutes) = range_minutes
            .or_else(|| duration_value(&candidate.duration_minutes))
            .or_else(|| fallback_duration(text))
        {
            draft.set_duration_minutes(minutes);
        }

        if merged.date.is_some() || merged.time.is_some() {
            draft.set_date_time(DateTimeSpec::Parts {
                date: merged.date,
                time: merged.time,
            });
        }

        Ok(draft)
    }
}

/// Offline understanding built from keyword heuristics.
///
/// Used when no language model is configured. The whole message is passed on
/// as the date/time expression.
#[derive(Debug, Clone, Default)]
pub struct HeuristicUnderstanding {
    titles: TitleCanonicalizer,
}

impl HeuristicUnderstanding {
    pub fn new(titles: TitleCanonicalizer) -> Self {
        Self { titles }
    }
}

#[async_trait]
impl LanguageUnderstanding for HeuristicUnderstanding {
    async fn extract(&self, request: &UnderstandingRequest) -> BotResult<RawCandidate> {
        let mut candidate = RawCandidate::default()
            .with_title(&fallback_title(&request.text, &self.titles, request.locale))
            .with_date_time(&request.text);
        if let Some(minutes) = fallback_duration(&request.text) {
            candidate = candidate.with_duration(minutes);
        }
        if let Some(notes) = extract_notes(&request.text) {
            candidate = candidate.with_notes(&notes);
        }
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::language_model_error;
    use crate::extraction::models::DateHint;
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use chrono_tz::Europe::Kyiv;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    struct Fixed(RawCandidate);

    #[async_trait]
    impl LanguageUnderstanding for Fixed {
        async fn extract(&self, _request: &UnderstandingRequest) -> BotResult<RawCandidate> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl LanguageUnderstanding for Failing {
        async fn extract(&self, _request: &UnderstandingRequest) -> BotResult<RawCandidate> {
            Err(language_model_error("connection refused"))
        }
    }

    struct Slow;

    #[async_trait]
    impl LanguageUnderstanding for Slow {
        async fn extract(&self, _request: &UnderstandingRequest) -> BotResult<RawCandidate> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(RawCandidate::default())
        }
    }

    fn config() -> ExtractionConfig {
        ExtractionConfig::new(Kyiv, Locale::Ru)
    }

    fn resolver(config: &ExtractionConfig) -> TimeResolver {
        TimeResolver::new(Kyiv.with_ymd_and_hms(2026, 2, 12, 10, 0, 0).unwrap(), config)
    }

    fn parts(draft: &MeetingDraft) -> (Option<DateHint>, Option<NaiveTime>) {
        match draft.date_time() {
            Some(DateTimeSpec::Parts { date, time }) => (*date, *time),
            other => panic!("unexpected start {:?}", other),
        }
    }

    #[test]
    fn test_candidate_from_json() {
        let candidate: RawCandidate = serde_json::from_str(
            r#"{"title":"Врач","start_datetime":"2026-02-12T19:00:00+02:00","end_datetime":"","duration_minutes":60,"notes":"","extra":1}"#,
        )
        .unwrap();

        assert_eq!(candidate.title, Some(Value::String("Врач".into())));
        assert_eq!(duration_value(&candidate.duration_minutes), Some(60));
        assert_eq!(text_value(&candidate.end), None);
    }

    #[test]
    fn test_malformed_fields_fall_back() {
        let config = config();
        let understanding = HeuristicUnderstanding::default();
        let extractor = IntentExtractor::new(&config, &understanding);
        let candidate = RawCandidate {
            title: Some(Value::from(42)),
            date_time: Some(Value::Bool(true)),
            duration_minutes: Some(Value::from(-5)),
            ..Default::default()
        };

        let draft = extractor
            .interpret(candidate, "обед с Олегом завтра в 13:00", &resolver(&config))
            .unwrap();

        assert_eq!(draft.title(), Some("Обед с Олегом"));
        assert_eq!(draft.duration_minutes(), None);
        assert_eq!(
            parts(&draft),
            (Some(DateHint::OffsetDays(1)), NaiveTime::from_hms_opt(13, 0, 0))
        );
    }

    #[test]
    fn test_service_title_is_canonicalized() {
        let config = config();
        let understanding = HeuristicUnderstanding::default();
        let extractor = IntentExtractor::new(&config, &understanding);
        let candidate = RawCandidate::default().with_title("стоматолог");

        let draft = extractor
            .interpret(candidate, "к стоматологу завтра в 9:00", &resolver(&config))
            .unwrap();
        assert_eq!(draft.title(), Some("Зубной врач"));
    }

    #[test]
    fn test_document_heavy_title_is_replaced() {
        let config = config();
        let understanding = HeuristicUnderstanding::default();
        let extractor = IntentExtractor::new(&config, &understanding);
        let candidate = RawCandidate::default().with_title("Налоговая взять паспорт и документы");

        let draft = extractor
            .interpret(candidate, "в налоговую завтра в 9:00, взять паспорт", &resolver(&config))
            .unwrap();
        assert_eq!(draft.title(), Some("Налоговая"));
        assert_eq!(draft.notes(), Some("взять паспорт"));
    }

    #[test]
    fn test_message_time_overrides_service_time() {
        let config = config();
        let understanding = HeuristicUnderstanding::default();
        let extractor = IntentExtractor::new(&config, &understanding);
        let candidate = RawCandidate::default()
            .with_title("Собеседование")
            .with_date_time("2026-02-13T11:00:00+02:00");

        let draft = extractor
            .interpret(candidate, "собеседование завтра в 10:30", &resolver(&config))
            .unwrap();
        assert_eq!(
            parts(&draft),
            (
                Some(DateHint::Calendar(NaiveDate::from_ymd_opt(2026, 2, 13).unwrap())),
                NaiveTime::from_hms_opt(10, 30, 0)
            )
        );
    }

    #[test]
    fn test_unresolvable_service_expression_uses_message() {
        let config = config();
        let understanding = HeuristicUnderstanding::default();
        let extractor = IntentExtractor::new(&config, &understanding);
        let candidate = RawCandidate::default().with_date_time("sometime soon");

        let draft = extractor
            .interpret(candidate, "созвон в пятницу в 15:30", &resolver(&config))
            .unwrap();
        assert_eq!(
            parts(&draft),
            (
                Some(DateHint::Weekday { weekday: chrono::Weekday::Fri, skip_week: false }),
                NaiveTime::from_hms_opt(15, 30, 0)
            )
        );
    }

    #[test]
    fn test_range_sets_duration() {
        let config = config();
        let understanding = HeuristicUnderstanding::default();
        let extractor = IntentExtractor::new(&config, &understanding);
        let mut candidate = RawCandidate::default()
            .with_date_time("2026-02-13T08:00:00+02:00")
            .with_title("Смена");
        candidate.end = Some(Value::String("2026-02-13T14:00:00+02:00".into()));

        let draft = extractor
            .interpret(candidate, "смена завтра", &resolver(&config))
            .unwrap();
        assert_eq!(draft.duration_minutes(), Some(360));
    }

    #[tokio::test]
    async fn test_service_failure_is_unavailable() {
        let config = config();
        let extractor = IntentExtractor::new(&config, &Failing);
        let err = extractor
            .extract("к врачу завтра в 10:00", &resolver(&config))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionUnavailable(_)));
    }

    #[tokio::test]
    async fn test_service_timeout_is_unavailable() {
        let mut config = config();
        config.understanding_timeout = Duration::from_millis(50);
        let extractor = IntentExtractor::new(&config, &Slow);
        let err = extractor
            .extract("к врачу завтра в 10:00", &resolver(&config))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionUnavailable(_)));
    }

    #[tokio::test]
    async fn test_fixed_candidate_roundtrip() {
        let config = config();
        let service = Fixed(RawCandidate::default().with_title("Standup").with_duration(15));
        let extractor = IntentExtractor::new(&config, &service);

        let draft = extractor
            .extract("standup tomorrow 9:30", &resolver(&config))
            .await
            .unwrap();
        assert_eq!(draft.title(), Some("Standup"));
        assert_eq!(draft.duration_minutes(), Some(15));
    }

    #[tokio::test]
    async fn test_heuristic_understanding() {
        let request = UnderstandingRequest {
            text: "к зубному на завтра в 12:00 на 45 минут".into(),
            reference: Kyiv.with_ymd_and_hms(2026, 2, 12, 10, 0, 0).unwrap(),
            locale: Locale::Ru,
        };
        let candidate = HeuristicUnderstanding::default().extract(&request).await.unwrap();

        assert_eq!(text_value(&candidate.title), Some("Зубной врач".to_string()));
        assert_eq!(duration_value(&candidate.duration_minutes), Some(45));
        assert_eq!(text_value(&candidate.date_time), Some(request.text.clone()));
    }
}
