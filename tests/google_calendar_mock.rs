use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use chrono_tz::Europe::Kyiv;
use chrono_tz::Tz;
use sekretar::assistant::{render_reply, Assistant, AssistantError};
use sekretar::components::{CalendarWriter, CreatedEvent};
use sekretar::config::{ExtractionConfig, Locale};
use sekretar::error::{google_calendar_error, BotResult, Error, ExtractionError};
use sekretar::extraction::{HeuristicUnderstanding, MeetingEvent, MeetingPipeline};
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory calendar that records what it was asked to create
#[derive(Default)]
struct MockCalendar {
    events: Mutex<Vec<MeetingEvent>>,
    fail_with: Option<String>,
}

impl MockCalendar {
    fn failing(message: &str) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl CalendarWriter for MockCalendar {
    async fn create_event(&self, event: &MeetingEvent) -> BotResult<CreatedEvent> {
        if let Some(message) = &self.fail_with {
            return Err(google_calendar_error(message));
        }

        let mut events = self.events.lock().await;
        events.push(event.clone());
        Ok(CreatedEvent {
            id: format!("event{}", events.len()),
            html_link: None,
        })
    }
}

fn now() -> DateTime<Tz> {
    Kyiv.with_ymd_and_hms(2026, 2, 12, 10, 0, 0).unwrap()
}

fn assistant(calendar: Arc<MockCalendar>) -> Assistant {
    let pipeline = MeetingPipeline::new(
        ExtractionConfig::new(Kyiv, Locale::Ru),
        Arc::new(HeuristicUnderstanding::default()),
    );
    Assistant::new(pipeline, calendar)
}

#[tokio::test]
async fn test_meeting_is_written_to_calendar() {
    let calendar = Arc::new(MockCalendar::default());
    let assistant = assistant(Arc::clone(&calendar));

    let created = assistant
        .handle_text("запиши меня к зубному на завтра в 12:00", now())
        .await
        .unwrap();

    assert_eq!(created.calendar.id, "event1");
    let events = calendar.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title(), "Зубной врач");
    assert_eq!(events[0].start(), Kyiv.with_ymd_and_hms(2026, 2, 13, 12, 0, 0).unwrap());
}

#[tokio::test]
async fn test_extraction_failure_skips_calendar() {
    let calendar = Arc::new(MockCalendar::default());
    let assistant = assistant(Arc::clone(&calendar));

    let result = assistant.handle_text("привет!", now()).await;

    assert!(matches!(
        result,
        Err(AssistantError::Extraction(ExtractionError::AmbiguousExpression(_)))
    ));
    assert!(calendar.events.lock().await.is_empty());
}

#[tokio::test]
async fn test_calendar_failure_propagates_verbatim() {
    let calendar = Arc::new(MockCalendar::failing("Failed to create event: HTTP 403 Forbidden"));
    let assistant = assistant(calendar);

    let result = assistant
        .handle_text("запиши меня к зубному на завтра в 12:00", now())
        .await;

    match &result {
        Err(AssistantError::Calendar(Error::GoogleCalendar(message))) => {
            assert_eq!(message, "Failed to create event: HTTP 403 Forbidden")
        }
        other => panic!("expected a calendar error, got {:?}", other),
    }
    assert!(render_reply(&result, Locale::Ru).contains("HTTP 403 Forbidden"));
}

#[tokio::test]
async fn test_messages_are_independent() {
    let calendar = Arc::new(MockCalendar::default());
    let assistant = assistant(Arc::clone(&calendar));

    let (first, second) = tokio::join!(
        assistant.handle_text("обед завтра в 13:00", now()),
        assistant.handle_text("созвон в пятницу в 16:00 на 30 минут", now()),
    );

    assert_eq!(first.unwrap().event.duration_minutes(), 60);
    assert_eq!(second.unwrap().event.duration_minutes(), 30);
    assert_eq!(calendar.events.lock().await.len(), 2);
}
