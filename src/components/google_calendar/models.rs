use crate::extraction::MeetingEvent;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

/// Start or end of an event as the Calendar API expects it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    pub time_zone: String,
}

/// Request body for `events.insert`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventBody {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
}

impl EventBody {
    pub fn from_meeting(event: &MeetingEvent) -> Self {
        let time_zone = event.start().timezone().name().to_string();
        Self {
            summary: event.title().to_string(),
            description: event.notes().map(str::to_string),
            start: EventDateTime {
                date_time: event.start().to_rfc3339_opts(SecondsFormat::Secs, false),
                time_zone: time_zone.clone(),
            },
            end: EventDateTime {
                date_time: event.end().to_rfc3339_opts(SecondsFormat::Secs, false),
                time_zone,
            },
        }
    }
}

/// The parts of the `events.insert` response we keep
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedEvent {
    pub id: String,
    #[serde(default)]
    pub html_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Kyiv;
    use serde_json::json;

    #[test]
    fn test_event_body_json() {
        let start = Kyiv.with_ymd_and_hms(2026, 2, 13, 12, 0, 0).unwrap();
        let event = MeetingEvent::new("Зубной врач", start, 60, None).unwrap();

        let body = serde_json::to_value(EventBody::from_meeting(&event)).unwrap();
        assert_eq!(
            body,
            json!({
                "summary": "Зубной врач",
                "start": { "dateTime": "2026-02-13T12:00:00+02:00", "timeZone": "Europe/Kyiv" },
                "end": { "dateTime": "2026-02-13T13:00:00+02:00", "timeZone": "Europe/Kyiv" }
            })
        );
    }

    #[test]
    fn test_inserted_event_parse() {
        let inserted: InsertedEvent = serde_json::from_str(
            r#"{"kind":"calendar#event","id":"abc123","htmlLink":"https://calendar.google.com/event?eid=abc"}"#,
        )
        .unwrap();
        assert_eq!(inserted.id, "abc123");
        assert_eq!(inserted.html_link.as_deref(), Some("https://calendar.google.com/event?eid=abc"));
    }
}
