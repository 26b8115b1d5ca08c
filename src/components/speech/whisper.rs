use crate::components::Transcriber;
use crate::config::Config;
use crate::error::{speech_error, BotResult, Error};
use async_trait::async_trait;
use reqwest::{header, multipart, Client, StatusCode};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// MIME type for an uploaded audio file, by extension
pub(super) fn mime_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "ogg" | "oga" | "opus" => "audio/ogg",
        "mp3" | "mpga" | "mpeg" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "wav" => "audio/wav",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// Map an unsuccessful transcription response to an error
fn describe_failure(status: StatusCode, body: &str) -> Error {
    if body.contains("insufficient_quota") || body.contains("exceeded your current quota") {
        return speech_error("OpenAI quota exhausted or billing not enabled, voice messages cannot be transcribed");
    }
    speech_error(&format!("Transcription failed: HTTP {} - {}", status, body))
}

/// Speech to text through the OpenAI `audio/transcriptions` endpoint
#[derive(Clone)]
pub struct WhisperTranscriber {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    language: String,
}

impl WhisperTranscriber {
    pub fn new(api_key: &str, base_url: &str, model: &str, language: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            language: language.to_string(),
        }
    }

    /// Build from config, or `None` when no API key is configured
    pub fn from_config(config: &Config) -> Option<Self> {
        config.openai_api_key.as_deref().map(|key| {
            Self::new(
                key,
                &config.openai_base_url,
                &config.whisper_model,
                &config.whisper_language,
            )
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> BotResult<String> {
        info!("Transcribing {} ({} bytes)", filename, audio.len());

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("language", self.language.clone())
            .text("response_format", "json")
            .part(
                "file",
                multipart::Part::bytes(audio)
                    .file_name(filename.to_string())
                    .mime_str(mime_for(filename))
                    .map_err(|e| speech_error(&format!("Failed to create multipart form: {}", e)))?,
            );

        let res = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|e| speech_error(&format!("Failed to send audio: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let error_body = res.text().await.unwrap_or_default();
            return Err(describe_failure(status, &error_body));
        }

        let response: TranscriptionResponse = res
            .json()
            .await
            .map_err(|e| speech_error(&format!("Failed to parse response: {}", e)))?;

        let text = response.text.trim().to_string();
        if text.is_empty() {
            return Err(speech_error("Empty transcription result"));
        }
        Ok(text)
    }
}
