use super::models::{EventBody, InsertedEvent};
use super::token::TokenManager;
use crate::components::CreatedEvent;
use crate::config::Config;
use crate::error::{google_calendar_error, BotResult};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info};
use url::Url;

const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// The Google Calendar actor that processes messages
pub struct GoogleCalendarActor {
    config: Arc<RwLock<Config>>,
    token_manager: TokenManager,
    client: Client,
    command_rx: mpsc::Receiver<GoogleCalendarCommand>,
}

/// Commands that can be sent to the Google Calendar actor
pub enum GoogleCalendarCommand {
    CreateEvent(EventBody, mpsc::Sender<BotResult<CreatedEvent>>),
    Shutdown,
}

/// Handle for communicating with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarActorHandle {
    command_tx: mpsc::Sender<GoogleCalendarCommand>,
}

impl GoogleCalendarActorHandle {
    /// Insert an event into the configured calendar
    pub async fn create_event(&self, body: EventBody) -> BotResult<CreatedEvent> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(GoogleCalendarCommand::CreateEvent(body, response_tx))
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        let _ = self.command_tx.send(GoogleCalendarCommand::Shutdown).await;
        Ok(())
    }
}

/// `{API_BASE}/calendars/{calendar_id}/events`, with the id percent-encoded
pub fn events_url(calendar_id: &str) -> BotResult<Url> {
    let mut url = Url::parse(API_BASE)
        .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| google_calendar_error("Calendar API URL cannot be a base"))?
        .extend(["calendars", calendar_id, "events"]);
    Ok(url)
}

impl GoogleCalendarActor {
    /// Create a new actor and return its handle
    pub fn new(config: Arc<RwLock<Config>>) -> (Self, GoogleCalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            config: Arc::clone(&config),
            token_manager: TokenManager::new(config),
            client: Client::new(),
            command_rx,
        };

        let handle = GoogleCalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Google Calendar actor started");

        // Process commands
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                GoogleCalendarCommand::CreateEvent(body, response_tx) => {
                    let result = Self::create_event(
                        Arc::clone(&self.config),
                        self.token_manager.clone(),
                        self.client.clone(),
                        body,
                    )
                    .await;

                    if let Err(e) = &result {
                        error!("Failed to create calendar event: {}", e);
                    }

                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::Shutdown => {
                    info!("Google Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Google Calendar actor shut down");
    }

    /// Insert one event into the configured calendar
    pub async fn create_event(
        config: Arc<RwLock<Config>>,
        token_manager: TokenManager,
        client: Client,
        body: EventBody,
    ) -> BotResult<CreatedEvent> {
        // Get calendar ID from config
        let calendar_id = {
            let config_read = config.read().await;
            config_read.google_calendar_id.clone()
        };

        // Get authentication token
        let access_token = token_manager.get_token().await?;
        let url = events_url(&calendar_id)?;

        // Make API request
        let response = client
            .post(url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to create event: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to create event: HTTP {} - {}",
                status, error_body
            )));
        }

        let inserted: InsertedEvent = response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse event response: {}", e)))?;

        info!("Created calendar event {} ({})", inserted.id, body.summary);
        Ok(CreatedEvent {
            id: inserted.id,
            html_link: inserted.html_link,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_url_encodes_calendar_id() {
        assert_eq!(
            events_url("primary").unwrap().as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/primary/events"
        );
        assert_eq!(
            events_url("team#work@group.calendar.google.com").unwrap().as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/team%23work@group.calendar.google.com/events"
        );
    }
}
