use crate::config::{Config, Locale};
use crate::error::{language_model_error, BotResult};
use crate::extraction::{LanguageUnderstanding, RawCandidate, UnderstandingRequest};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::{from_str, json};
use tracing::{error, info};

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?i)^```(?:json)?\s*|\s*```$").unwrap();
}

const SYSTEM_PROMPT: &str = "You extract calendar events from chat messages. Reply with a single JSON object and nothing else.";

const USER_PROMPT_TEMPLATE: &str = "Extract the event described in the message below.

Return JSON with exactly these keys:
{\"title\":\"\",\"start_datetime\":\"\",\"end_datetime\":\"\",\"duration_minutes\":60,\"notes\":\"\"}

Rules:
1. title is a short subject (1-4 words) in {language}, without dates, times or documents to bring.
2. start_datetime and end_datetime are ISO 8601 with offset, e.g. {example}. Leave end_datetime empty unless a time range is given.
3. The user's current date is {date} and time is {time} ({timezone}). Resolve words like today, tomorrow and weekday names against it.
4. duration_minutes is the stated length in minutes; omit it or use null if none is stated.
5. notes lists things to bring or prepare, separated by \"; \", without words like \"bring\" or \"don't forget\". Empty if none.

Message:
{message}";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Language understanding through an OpenAI-compatible chat completions API
#[derive(Clone)]
pub struct OpenAiUnderstanding {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiUnderstanding {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Build from config, or `None` when no API key is configured
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .openai_api_key
            .as_deref()
            .map(|key| Self::new(key, &config.openai_base_url, &config.openai_model))
    }

    fn build_prompt(request: &UnderstandingRequest) -> String {
        let language = match request.locale {
            Locale::Ru => "Russian",
            Locale::En => "English",
        };
        let example = request.reference.format("%Y-%m-%dT15:30:00%:z").to_string();
        USER_PROMPT_TEMPLATE
            .replace("{language}", language)
            .replace("{example}", &example)
            .replace("{date}", &request.reference.format("%Y-%m-%d (%A)").to_string())
            .replace("{time}", &request.reference.format("%H:%M").to_string())
            .replace("{timezone}", request.reference.timezone().name())
            .replace("{message}", &request.text)
    }
}

/// Parse the JSON object out of a model reply.
///
/// Markdown code fences are dropped and, failing a clean parse, the outermost
/// `{...}` is tried.
pub fn parse_candidate(response: &str) -> BotResult<RawCandidate> {
    let cleaned = CODE_FENCE.replace_all(response.trim(), "");

    // Try to parse the entire response as JSON (in case it's already clean JSON)
    if let Ok(candidate) = from_str::<RawCandidate>(&cleaned) {
        return Ok(candidate);
    }

    // Try to extract JSON object from the text
    if let (Some(json_start), Some(json_end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if json_start < json_end {
            let json_str = &cleaned[json_start..=json_end];
            match from_str::<RawCandidate>(json_str) {
                Ok(candidate) => return Ok(candidate),
                Err(e) => {
                    error!("Failed to parse JSON from response: {}", e);
                    error!("JSON string: {}", json_str);
                }
            }
        }
    }

    // Could not extract valid JSON
    error!("Could not extract valid JSON from response: {}", response);
    Err(language_model_error("Could not extract valid JSON from the model response"))
}

#[async_trait]
impl LanguageUnderstanding for OpenAiUnderstanding {
    async fn extract(&self, request: &UnderstandingRequest) -> BotResult<RawCandidate> {
        info!("Asking {} about a {} character message", self.model, request.text.chars().count());

        let body = json!({
            "model": self.model,
            "temperature": 0,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": Self::build_prompt(request) },
            ],
        });

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| language_model_error(&format!("Failed to send request: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let error_body = res.text().await.unwrap_or_default();
            return Err(language_model_error(&format!(
                "Chat completion failed: HTTP {} - {}",
                status, error_body
            )));
        }

        let response: ChatResponse = res
            .json()
            .await
            .map_err(|e| language_model_error(&format!("Failed to parse response: {}", e)))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| language_model_error("Chat completion returned no content"))?;

        parse_candidate(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Kyiv;
    use serde_json::Value;

    #[test]
    fn test_parse_clean_json() {
        let candidate = parse_candidate(r#"{"title":"Врач","start_datetime":"2026-02-12T19:00:00+02:00"}"#).unwrap();
        assert_eq!(candidate.title, Some(Value::String("Врач".into())));
        assert_eq!(
            candidate.date_time,
            Some(Value::String("2026-02-12T19:00:00+02:00".into()))
        );
    }

    #[test]
    fn test_parse_fenced_json() {
        let candidate = parse_candidate("```json\n{\"title\":\"Собеседование\",\"duration_minutes\":60}\n```").unwrap();
        assert_eq!(candidate.title, Some(Value::String("Собеседование".into())));
        assert_eq!(candidate.duration_minutes, Some(Value::from(60)));
    }

    #[test]
    fn test_parse_json_with_chatter() {
        let candidate = parse_candidate("Sure! Here it is: {\"title\":\"Standup\"} Hope that helps.").unwrap();
        assert_eq!(candidate.title, Some(Value::String("Standup".into())));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_candidate("I cannot help with that").is_err());
        assert!(parse_candidate("{not json}").is_err());
    }

    #[test]
    fn test_prompt_carries_reference_time() {
        let request = UnderstandingRequest {
            text: "к врачу завтра".into(),
            reference: Kyiv.with_ymd_and_hms(2026, 2, 12, 10, 0, 0).unwrap(),
            locale: Locale::Ru,
        };
        let prompt = OpenAiUnderstanding::build_prompt(&request);

        assert!(prompt.contains("2026-02-12 (Thursday)"));
        assert!(prompt.contains("10:00 (Europe/Kyiv)"));
        assert!(prompt.contains("2026-02-12T15:30:00+02:00"));
        assert!(prompt.ends_with("к врачу завтра"));
    }
}
