use crate::commands::{CommandContext, CommandResult, Context};
use poise::serenity_prelude as serenity;
use rust_i18n::t;
use sekretar::assistant::render_reply;
use sekretar::components::speech::is_audio;
use sekretar::error::BotResult;
use tracing::{debug, error, info};

/// Add a meeting to the calendar from a free-form description
#[poise::command(slash_command, prefix_command)]
pub async fn meeting(
    ctx: Context<'_>,
    #[description = "e.g. dentist tomorrow at 12:00"]
    #[rest]
    text: String,
) -> CommandResult {
    ctx.defer().await?;

    let data = ctx.data();
    info!("Meeting command from {}", ctx.author().name);
    let outcome = data.assistant.handle_text_now(&text).await;

    ctx.say(render_reply(&outcome, data.locale)).await?;
    Ok(())
}

/// Treat a plain chat message, typed or dictated, as a meeting request
pub async fn handle_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
    data: &CommandContext,
) -> BotResult<()> {
    if message.author.bot {
        return Ok(());
    }
    if let Some(channel_id) = data.meeting_channel_id {
        if message.channel_id.get() != channel_id {
            return Ok(());
        }
    }
    // Prefix commands are handled by the framework
    if message.content.trim_start().starts_with('!') {
        return Ok(());
    }

    info!(
        "Message {} in channel {} from {} ({} chars, {} attachments)",
        message.id,
        message.channel_id,
        message.author.id,
        message.content.chars().count(),
        message.attachments.len()
    );

    let audio = message
        .attachments
        .iter()
        .find(|attachment| is_audio(attachment.content_type.as_deref(), &attachment.filename));

    let text = match audio {
        Some(attachment) => {
            let Some(transcriber) = &data.transcriber else {
                message
                    .reply(&ctx.http, t!("transcription_unavailable", locale = data.locale.as_str()))
                    .await?;
                return Ok(());
            };

            let audio = attachment.download().await?;
            match transcriber.transcribe(audio, &attachment.filename).await {
                Ok(transcript) => {
                    message
                        .reply(
                            &ctx.http,
                            t!("transcript_echo", locale = data.locale.as_str(), text = transcript.as_str()),
                        )
                        .await?;
                    transcript
                }
                Err(e) => {
                    error!("Transcription failed: {}", e);
                    message
                        .reply(
                            &ctx.http,
                            t!(
                                "transcription_failed",
                                locale = data.locale.as_str(),
                                error = e.to_string()
                            ),
                        )
                        .await?;
                    return Ok(());
                }
            }
        }
        None => message.content.clone(),
    };

    if text.trim().is_empty() {
        debug!("Ignoring empty message {}", message.id);
        return Ok(());
    }

    if let Err(e) = message.channel_id.broadcast_typing(&ctx.http).await {
        debug!("Could not send typing indicator: {}", e);
    }

    let outcome = data.assistant.handle_text_now(&text).await;
    message
        .reply(&ctx.http, render_reply(&outcome, data.locale))
        .await?;
    Ok(())
}
