use crate::components::{CalendarWriter, CreatedEvent};
use crate::config::Locale;
use crate::error::{Error, ExtractionError};
use crate::extraction::{MeetingEvent, MeetingField, MeetingPipeline};
use crate::utils::time::now_in;
use chrono::DateTime;
use chrono_tz::Tz;
use miette::Diagnostic;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Why a message did not become a calendar event
#[derive(Debug, Error, Diagnostic)]
pub enum AssistantError {
    /// The user can fix this by rephrasing
    #[error(transparent)]
    #[diagnostic(transparent)]
    Extraction(#[from] ExtractionError),

    /// Writing to the calendar failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Calendar(Error),
}

/// A meeting that was extracted and written to the calendar
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedMeeting {
    pub event: MeetingEvent,
    pub calendar: CreatedEvent,
}

/// Turns message text into calendar events
#[derive(Clone)]
pub struct Assistant {
    pipeline: MeetingPipeline,
    calendar: Arc<dyn CalendarWriter>,
}

impl Assistant {
    pub fn new(pipeline: MeetingPipeline, calendar: Arc<dyn CalendarWriter>) -> Self {
        Self { pipeline, calendar }
    }

    pub fn locale(&self) -> Locale {
        self.pipeline.config().locale
    }

    pub fn timezone(&self) -> Tz {
        self.pipeline.config().timezone
    }

    /// Extract a meeting from `text` relative to `now` and create it
    pub async fn handle_text(&self, text: &str, now: DateTime<Tz>) -> Result<CreatedMeeting, AssistantError> {
        let event = self.pipeline.run(text, now).await?;

        let calendar = self.calendar.create_event(&event).await.map_err(|e| {
            error!("Calendar write failed: {}", e);
            AssistantError::Calendar(e)
        })?;

        info!("Meeting '{}' created as {}", event.title(), calendar.id);
        Ok(CreatedMeeting { event, calendar })
    }

    /// Same as [`Assistant::handle_text`] with the current time
    pub async fn handle_text_now(&self, text: &str) -> Result<CreatedMeeting, AssistantError> {
        self.handle_text(text, now_in(&self.timezone())).await
    }
}

fn field_names(fields: &[MeetingField], locale: Locale) -> String {
    fields
        .iter()
        .map(|field| {
            let key = match field {
                MeetingField::Title => "field_title",
                MeetingField::Date => "field_date",
                MeetingField::Time => "field_time",
                MeetingField::Duration => "field_duration",
            };
            t!(key, locale = locale.as_str()).to_string()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_event(meeting: &CreatedMeeting, locale: Locale) -> String {
    let event = &meeting.event;
    let end_format = if event.end().date_naive() == event.start().date_naive() {
        "%H:%M"
    } else {
        "%d.%m.%Y %H:%M"
    };

    let mut reply = t!(
        "meeting_created",
        locale = locale.as_str(),
        title = event.title(),
        start = event.start().format("%d.%m.%Y %H:%M").to_string(),
        end = event.end().format(end_format).to_string(),
        duration = event.duration_minutes()
    )
    .to_string();

    if let Some(notes) = event.notes() {
        reply.push('\n');
        reply.push_str(&t!("meeting_notes", locale = locale.as_str(), notes = notes));
    }
    if let Some(link) = &meeting.calendar.html_link {
        reply.push('\n');
        reply.push_str(link);
    }
    reply
}

/// Reply text for the outcome of one message
pub fn render_reply(outcome: &Result<CreatedMeeting, AssistantError>, locale: Locale) -> String {
    let l = locale.as_str();
    match outcome {
        Ok(meeting) => render_event(meeting, locale),
        Err(AssistantError::Extraction(e)) => match e {
            ExtractionError::ParseIncomplete { missing } => {
                t!("error_parse_incomplete", locale = l, fields = field_names(missing, locale)).to_string()
            }
            ExtractionError::AmbiguousExpression(_) => t!("error_ambiguous", locale = l).to_string(),
            ExtractionError::PastDateRejected { start, .. } => t!(
                "error_past_date",
                locale = l,
                start = start.format("%d.%m.%Y %H:%M").to_string()
            )
            .to_string(),
            ExtractionError::ExtractionUnavailable(_) => t!("error_unavailable", locale = l).to_string(),
            ExtractionError::ValidationFailed { fields } => {
                t!("error_validation", locale = l, fields = field_names(fields, locale)).to_string()
            }
        },
        Err(AssistantError::Calendar(e)) => t!("error_calendar", locale = l, error = e.to_string()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Kyiv;

    fn created(notes: Option<&str>) -> CreatedMeeting {
        let start = Kyiv.with_ymd_and_hms(2026, 2, 13, 12, 0, 0).unwrap();
        CreatedMeeting {
            event: MeetingEvent::new("Зубной врач", start, 60, notes.map(str::to_string)).unwrap(),
            calendar: CreatedEvent {
                id: "evt1".into(),
                html_link: Some("https://calendar.google.com/event?eid=evt1".into()),
            },
        }
    }

    #[test]
    fn test_render_created() {
        let reply = render_reply(&Ok(created(Some("взять полис"))), Locale::Ru);
        assert!(reply.contains("Зубной врач"));
        assert!(reply.contains("13.02.2026 12:00"));
        assert!(reply.contains("13:00"));
        assert!(reply.contains("60"));
        assert!(reply.contains("взять полис"));
        assert!(reply.ends_with("eid=evt1"));
    }

    #[test]
    fn test_render_validation_failure_names_fields() {
        let outcome = Err(AssistantError::Extraction(ExtractionError::ValidationFailed {
            fields: vec![MeetingField::Date],
        }));
        assert!(render_reply(&outcome, Locale::En).contains("date"));
        assert!(render_reply(&outcome, Locale::Ru).contains("дата"));
    }

    #[test]
    fn test_render_calendar_failure_is_verbatim() {
        let outcome = Err(AssistantError::Calendar(crate::error::google_calendar_error(
            "HTTP 403 - forbidden",
        )));
        assert!(render_reply(&outcome, Locale::En).contains("HTTP 403 - forbidden"));
    }

    #[test]
    fn test_reply_keys_are_translated() {
        let keys = [
            "meeting_created",
            "meeting_notes",
            "field_title",
            "field_date",
            "field_time",
            "field_duration",
            "error_parse_incomplete",
            "error_ambiguous",
            "error_past_date",
            "error_unavailable",
            "error_validation",
            "error_calendar",
            "transcript_echo",
            "transcription_failed",
            "transcription_unavailable",
            "help_title",
            "help_text",
            "ping_command",
            "ping_response",
            "error_title",
        ];
        for locale in ["en", "ru"] {
            for key in keys {
                let text = t!(key, locale = locale);
                assert!(!text.contains(key), "{} is missing in {}", key, locale);
            }
        }
    }
}
