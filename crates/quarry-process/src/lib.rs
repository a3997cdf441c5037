//! Quarry Process - Wrappers around the external tools extractors call out to.
//!
//! This crate provides:
//! - Audio extraction and probing (via FFmpeg CLI)
//! - Audio transcription (via Whisper CLI)
//! - YouTube audio download (via yt-dlp)
//! - Page rendering for script-heavy sites (via headless Chromium)
//!
//! Every tool is looked up on `PATH` at call time; a missing tool is reported
//! as [`ProcessError::ToolNotFound`] rather than a spawn failure.

mod browser;
mod error;
mod ffmpeg;
mod tool;
mod transcribe;
mod youtube;

pub use browser::render_page;
pub use error::{ProcessError, ProcessResult};
pub use ffmpeg::{extract_audio, media_duration};
pub use transcribe::{segments_to_text, transcribe_audio, TranscriptSegment, WhisperOptions};
pub use youtube::{download_audio, youtube_video_id};

/// Check which external tools are available.
pub fn check_dependencies() -> Vec<(&'static str, bool)> {
    ["ffmpeg", "ffprobe", "whisper", "yt-dlp", "chromium"]
        .into_iter()
        .map(|tool| (tool, tool::is_available(tool)))
        .collect()
}
