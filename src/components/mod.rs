use crate::error::BotResult;
use crate::extraction::MeetingEvent;
use async_trait::async_trait;

// Export components
pub mod google_calendar;
pub mod language_model;
pub mod speech;

// Re-export Google Calendar handle
pub use google_calendar::GoogleCalendarHandle;
pub use language_model::OpenAiUnderstanding;
pub use speech::WhisperTranscriber;

/// Identifier of an event written to a calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
}

/// Calendar that meetings are written to.
///
/// Write failures are returned unchanged; callers must not retry or hide them.
#[async_trait]
pub trait CalendarWriter: Send + Sync {
    async fn create_event(&self, event: &MeetingEvent) -> BotResult<CreatedEvent>;
}

/// Speech-to-text service for voice messages
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> BotResult<String>;
}
