use poise::serenity_prelude as serenity;
use sekretar::assistant::Assistant;
use sekretar::components::Transcriber;
use sekretar::config::Locale;
use sekretar::error::BotResult;
use std::fmt;
use std::sync::Arc;

// Export submodules
pub mod meeting;
pub mod util;

const SUCCESS_COLOR: u32 = 0x57F287;
const ERROR_COLOR: u32 = 0xED4245;

/// Shared context for all commands
pub struct CommandContext {
    pub assistant: Arc<Assistant>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub locale: Locale,
    /// Only messages in this channel are treated as meeting requests
    pub meeting_channel_id: Option<u64>,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(assistant: Arc<Assistant>, locale: Locale) -> Self {
        Self {
            assistant,
            transcriber: None,
            locale,
            meeting_channel_id: None,
        }
    }

    /// Set the speech-to-text service for voice messages
    pub fn with_transcriber(mut self, transcriber: Option<Arc<dyn Transcriber>>) -> Self {
        self.transcriber = transcriber;
        self
    }

    /// Restrict plain-message handling to one channel
    pub fn with_meeting_channel(mut self, channel_id: Option<u64>) -> Self {
        self.meeting_channel_id = channel_id;
        self
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("locale", &self.locale)
            .field("timezone", &self.assistant.timezone().name())
            .field("voice_messages", &self.transcriber.is_some())
            .field("meeting_channel_id", &self.meeting_channel_id)
            .finish_non_exhaustive()
    }
}

/// Type alias for command result
pub type CommandResult = BotResult<()>;

/// Type alias for poise context
pub type Context<'a> = poise::Context<'a, CommandContext, sekretar::error::Error>;

pub fn create_success_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(SUCCESS_COLOR)
}

pub fn create_error_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(ERROR_COLOR)
}

/// All application commands
pub fn get_all_application_commands() -> Vec<poise::Command<CommandContext, sekretar::error::Error>> {
    vec![
        // Utility commands
        util::ping(),
        util::help(),
        // Meetings
        meeting::meeting(),
    ]
}
