use crate::commands::{create_error_embed, get_all_application_commands, meeting, CommandContext};
use crate::shutdown;
use poise::serenity_prelude as serenity;
use rust_i18n::t;
use sekretar::assistant::Assistant;
use sekretar::components::{language_model, GoogleCalendarHandle, Transcriber, WhisperTranscriber};
use sekretar::config::Config;
use sekretar::error::Error;
use sekretar::extraction::{HeuristicUnderstanding, MeetingPipeline};
use serenity::model::user::OnlineStatus;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,serenity=warn,poise=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Initialize and start the Discord bot
pub async fn start_bot(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let (token, activity, locale, meeting_channel_id, extraction, understanding, transcriber) = {
        let config_read = config.read().await;
        let extraction = config_read.extraction()?;
        let understanding = language_model::from_config(
            &config_read,
            HeuristicUnderstanding::new(extraction.titles.clone()),
        );
        let transcriber = WhisperTranscriber::from_config(&config_read)
            .map(|whisper| Arc::new(whisper) as Arc<dyn Transcriber>);
        (
            config_read.discord_token.clone(),
            config_read.activity.clone(),
            config_read.locale,
            config_read.meeting_channel_id,
            extraction,
            understanding,
            transcriber,
        )
    };

    // Set locale from config
    rust_i18n::set_locale(locale.as_str());
    info!("Setting locale to {}", locale);
    info!("Scheduling in timezone {}", extraction.timezone.name());

    if transcriber.is_none() {
        info!("No OpenAI API key configured, voice messages are disabled");
    }

    // Set up framework options
    let options = poise::FrameworkOptions {
        commands: get_all_application_commands(),
        on_error: |error| Box::pin(on_error(error)),
        event_handler: |ctx, event, framework, data| Box::pin(event_handler(ctx, event, framework, data)),
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some("!".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    // Plain messages carry the meeting requests
    let intents = serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    // Start the Google Calendar actor
    let calendar = GoogleCalendarHandle::new(Arc::clone(&config));

    let pipeline = MeetingPipeline::new(extraction, understanding);
    let assistant = Arc::new(Assistant::new(pipeline, Arc::new(calendar.clone())));

    // Create a shared data context for commands
    let command_data = CommandContext::new(assistant, locale)
        .with_transcriber(transcriber)
        .with_meeting_channel(meeting_channel_id);

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    // Spawn signal handler task
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, calendar).await;
    });

    // Create framework with new poise API
    let client_result = serenity::ClientBuilder::new(token, intents)
        .framework(poise::Framework::new(options, move |ctx, ready, framework| {
            Box::pin(async move {
                info!("{} is connected!", ready.user.name);

                // Set the bot's status
                ctx.set_presence(
                    Some(serenity::ActivityData::playing(&activity)),
                    OnlineStatus::Online,
                );
                info!("Setting activity to {}", activity);

                // Register slash commands
                if let Err(e) = poise::builtins::register_globally(ctx, &framework.options().commands).await {
                    error!("Failed to register slash commands: {:?}", e);
                } else {
                    info!("Slash commands registered successfully");
                }

                Ok(command_data)
            })
        }))
        .await;

    // Start the bot
    info!("Starting bot...");
    let mut client = client_result.map_err(Error::from)?;

    // Create a separate task to handle the client
    let client_handle = tokio::spawn(async move {
        if let Err(e) = client.start().await {
            Err(Error::from(e))
        } else {
            Ok(())
        }
    });

    // Wait for either the client to end or a shutdown signal
    tokio::select! {
        result = client_handle => {
            info!("Bot process ended");
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => {
                    error!("Client task error: {:?}", e);
                    Err(Error::Other(format!("Client task error: {}", e)).into())
                }
            }
        }
        _ = shutdown_recv => {
            info!("Received shutdown signal, shutting down bot...");
            Ok(())
        }
    }
}

/// Route gateway events to their handlers
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, CommandContext, Error>,
    data: &CommandContext,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        if let Err(e) = meeting::handle_message(ctx, new_message, data).await {
            error!("Failed to handle message {}: {:?}", new_message.id, e);
        }
    }
    Ok(())
}

/// Handle errors from commands
async fn on_error(error: poise::FrameworkError<'_, CommandContext, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Error during setup: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command '{}': {:?}", ctx.command().name, error);
            if let Err(e) = ctx
                .send(
                    poise::CreateReply::default()
                        .embed(create_error_embed(
                            &t!("error_title", context = "command"),
                            &format!("{}", error),
                        ))
                        .ephemeral(true),
                )
                .await
            {
                error!("Error while sending error message: {:?}", e);
            }
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!("Error handling event {}: {:?}", event.snake_case_name(), error);
        }
        error => {
            error!("Other error: {:?}", error);
        }
    }
}
