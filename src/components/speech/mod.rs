mod whisper;

pub use whisper::WhisperTranscriber;

/// Whether a Discord attachment looks like a voice message or audio file
pub fn is_audio(content_type: Option<&str>, filename: &str) -> bool {
    if let Some(content_type) = content_type {
        if content_type.starts_with("audio/") {
            return true;
        }
    }
    whisper::mime_for(filename).starts_with("audio/")
}
