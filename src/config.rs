use crate::error::{config_error, env_error, BotResult, Error};
use crate::extraction::titles::{default_mappings, TitleCanonicalizer, TitleMapping};
use crate::utils::time::parse_timezone;
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;
use std::fmt;
use std::fs;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Default activity text for the bot
pub const DEFAULT_ACTIVITY: &str = "Записываю встречи";

/// Title canonicalization rules, optional
pub const TITLES_PATH: &str = "config/titles.toml";

pub const DEFAULT_TIMEZONE: &str = "Europe/Kyiv";
pub const DEFAULT_DURATION_MINUTES: u32 = 60;
pub const DEFAULT_PAST_TOLERANCE_MINUTES: u32 = 5;
pub const DEFAULT_UNDERSTANDING_TIMEOUT_SECS: u64 = 20;

/// Language for keywords, default titles and replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Ru => "ru",
            Locale::En => "en",
        }
    }

    /// Title used when nothing better can be extracted
    pub fn default_title(&self) -> &'static str {
        match self {
            Locale::Ru => "Встреча",
            Locale::En => "Meeting",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ru" | "ru-ru" | "russian" => Ok(Locale::Ru),
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::En),
            other => Err(config_error(&format!("Unsupported locale: {}", other))),
        }
    }
}

/// Main configuration structure for the bot
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,
    /// OpenAI API key; without it messages are understood heuristically
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub whisper_model: String,
    pub whisper_language: String,
    /// Google Calendar API client ID
    pub google_client_id: String,
    /// Google Calendar API client secret
    pub google_client_secret: String,
    /// Long-lived refresh token for the calendar owner
    pub google_refresh_token: String,
    /// Calendar that receives new events
    pub google_calendar_id: String,
    /// IANA timezone for interpreting user times
    pub timezone: String,
    pub locale: Locale,
    pub default_duration_minutes: u32,
    pub past_tolerance_minutes: u32,
    pub understanding_timeout_secs: u64,
    /// When set, plain messages are only handled in this channel
    pub meeting_channel_id: Option<u64>,
    /// Bot activity status text
    pub activity: String,
    /// Title canonicalization rules
    pub titles: Vec<TitleMapping>,
}

fn required(name: &str) -> BotResult<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| env_error(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn or_default(name: &str, default: &str) -> String {
    optional(name).unwrap_or_else(|| default.to_string())
}

fn parsed<T: FromStr>(name: &str, default: T) -> BotResult<T> {
    match optional(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| config_error(&format!("Invalid {} value: {}", name, raw))),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> BotResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let discord_token = required("DISCORD_TOKEN")?;
        let google_client_id = required("GOOGLE_CLIENT_ID")?;
        let google_client_secret = required("GOOGLE_CLIENT_SECRET")?;
        let google_refresh_token = required("GOOGLE_REFRESH_TOKEN")?;

        let openai_api_key = optional("OPENAI_API_KEY");
        if openai_api_key.is_none() {
            warn!("OPENAI_API_KEY is not set, falling back to heuristic understanding");
        }

        let timezone = optional("TIMEZONE")
            .or_else(|| optional("TZ"))
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        let locale = match optional("BOT_LOCALE") {
            Some(raw) => raw.parse()?,
            None => Locale::default(),
        };

        let meeting_channel_id = match optional("MEETING_CHANNEL_ID") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| env_error("Invalid MEETING_CHANNEL_ID format"))?,
            ),
            None => None,
        };

        let config = Config {
            discord_token,
            openai_api_key,
            openai_model: or_default("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            whisper_model: or_default("WHISPER_MODEL", "whisper-1"),
            whisper_language: or_default("WHISPER_LANGUAGE", locale.as_str()),
            google_client_id,
            google_client_secret,
            google_refresh_token,
            google_calendar_id: or_default("GOOGLE_CALENDAR_ID", "primary"),
            timezone,
            locale,
            default_duration_minutes: parsed("DEFAULT_DURATION_MINUTES", DEFAULT_DURATION_MINUTES)?,
            past_tolerance_minutes: parsed("PAST_TOLERANCE_MINUTES", DEFAULT_PAST_TOLERANCE_MINUTES)?,
            understanding_timeout_secs: parsed(
                "UNDERSTANDING_TIMEOUT_SECS",
                DEFAULT_UNDERSTANDING_TIMEOUT_SECS,
            )?,
            meeting_channel_id,
            activity: or_default("BOT_ACTIVITY", DEFAULT_ACTIVITY),
            titles: Self::load_titles()?,
        };

        // Fail at startup rather than on the first message
        config.extraction()?;
        Ok(config)
    }

    fn load_titles() -> BotResult<Vec<TitleMapping>> {
        match fs::read_to_string(TITLES_PATH) {
            Ok(content) => {
                let titles = TitleCanonicalizer::from_toml(&content)?;
                let mappings: Vec<TitleMapping> = titles.mappings().cloned().collect();
                info!("Loaded {} title rules from {}", mappings.len(), TITLES_PATH);
                Ok(mappings)
            }
            Err(_) => Ok(default_mappings()),
        }
    }

    /// Settings consumed by the extraction pipeline
    pub fn extraction(&self) -> BotResult<ExtractionConfig> {
        if !(1..=1440).contains(&self.default_duration_minutes) {
            return Err(config_error(&format!(
                "DEFAULT_DURATION_MINUTES must be between 1 and 1440, got {}",
                self.default_duration_minutes
            )));
        }

        Ok(ExtractionConfig {
            timezone: parse_timezone(&self.timezone)?,
            locale: self.locale,
            default_duration_minutes: self.default_duration_minutes,
            past_tolerance: chrono::Duration::minutes(self.past_tolerance_minutes as i64),
            understanding_timeout: Duration::from_secs(self.understanding_timeout_secs),
            titles: TitleCanonicalizer::new(self.titles.clone())?,
        })
    }
}

/// Immutable settings passed into every extraction run
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub timezone: Tz,
    pub locale: Locale,
    pub default_duration_minutes: u32,
    /// How far behind "now" a start may be before it counts as past
    pub past_tolerance: chrono::Duration,
    /// Upper bound for one language-understanding call
    pub understanding_timeout: Duration,
    pub titles: TitleCanonicalizer,
}

impl ExtractionConfig {
    /// Defaults for the given timezone and locale
    pub fn new(timezone: Tz, locale: Locale) -> Self {
        Self {
            timezone,
            locale,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            past_tolerance: chrono::Duration::minutes(DEFAULT_PAST_TOLERANCE_MINUTES as i64),
            understanding_timeout: Duration::from_secs(DEFAULT_UNDERSTANDING_TIMEOUT_SECS),
            titles: TitleCanonicalizer::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Kyiv;

    fn sample() -> Config {
        Config {
            discord_token: "token".into(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            openai_base_url: "https://api.openai.com/v1".into(),
            whisper_model: "whisper-1".into(),
            whisper_language: "ru".into(),
            google_client_id: "id".into(),
            google_client_secret: "secret".into(),
            google_refresh_token: "refresh".into(),
            google_calendar_id: "primary".into(),
            timezone: DEFAULT_TIMEZONE.into(),
            locale: Locale::Ru,
            default_duration_minutes: 60,
            past_tolerance_minutes: 5,
            understanding_timeout_secs: 20,
            meeting_channel_id: None,
            activity: DEFAULT_ACTIVITY.into(),
            titles: default_mappings(),
        }
    }

    #[test]
    fn test_locale_from_str() {
        assert_eq!("RU".parse::<Locale>().unwrap(), Locale::Ru);
        assert_eq!("en-US".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().is_err());
        assert_eq!(Locale::En.default_title(), "Meeting");
    }

    #[test]
    fn test_extraction_config() {
        let extraction = sample().extraction().unwrap();
        assert_eq!(extraction.timezone, Kyiv);
        assert_eq!(extraction.default_duration_minutes, 60);
        assert_eq!(extraction.past_tolerance, chrono::Duration::minutes(5));
        assert_eq!(extraction.understanding_timeout, Duration::from_secs(20));
        assert_eq!(extraction.titles.find("стоматолог"), Some("Зубной врач"));
    }

    #[test]
    fn test_extraction_config_rejects_bad_values() {
        let mut config = sample();
        config.timezone = "Nowhere/Special".into();
        assert!(config.extraction().is_err());

        let mut config = sample();
        config.default_duration_minutes = 0;
        assert!(config.extraction().is_err());
    }
}
