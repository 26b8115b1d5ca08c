use crate::extraction::models::MeetingField;
use chrono::DateTime;
use chrono_tz::Tz;
use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Discord API error: {0}")]
    #[diagnostic(code(sekretar::discord_api))]
    DiscordApi(#[from] serenity::Error),

    #[error("Environment error: {0}")]
    #[diagnostic(code(sekretar::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(sekretar::config))]
    Config(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(sekretar::google_calendar))]
    GoogleCalendar(String),

    #[error("Language model error: {0}")]
    #[diagnostic(code(sekretar::language_model))]
    LanguageModel(String),

    #[error("Speech recognition error: {0}")]
    #[diagnostic(code(sekretar::speech))]
    Speech(String),

    #[error(transparent)]
    #[diagnostic(code(sekretar::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(sekretar::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(sekretar::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type BotResult<T> = Result<T, Error>;

/// Outcomes of the extraction pipeline that the user can fix by rephrasing.
///
/// None of these are faults: the chat layer renders each one as a reply.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ExtractionError {
    #[error("structured fields are incomplete, missing: {}", join_fields(.missing))]
    #[diagnostic(code(sekretar::parse_incomplete))]
    ParseIncomplete { missing: Vec<MeetingField> },

    #[error("cannot determine a single date and time from '{0}'")]
    #[diagnostic(code(sekretar::ambiguous_expression))]
    AmbiguousExpression(String),

    #[error("resolved start {start} is in the past (now {now})")]
    #[diagnostic(code(sekretar::past_date))]
    PastDateRejected { start: DateTime<Tz>, now: DateTime<Tz> },

    #[error("could not understand the message: {0}")]
    #[diagnostic(code(sekretar::extraction_unavailable))]
    ExtractionUnavailable(String),

    #[error("meeting is missing or has invalid: {}", join_fields(.fields))]
    #[diagnostic(code(sekretar::validation_failed))]
    ValidationFailed { fields: Vec<MeetingField> },
}

fn join_fields(fields: &[MeetingField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create language model errors
pub fn language_model_error(message: &str) -> Error {
    Error::LanguageModel(message.to_string())
}

/// Helper to create speech recognition errors
pub fn speech_error(message: &str) -> Error {
    Error::Speech(message.to_string())
}
