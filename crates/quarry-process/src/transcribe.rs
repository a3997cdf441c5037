//! Audio transcription using Whisper.

use crate::error::{ProcessError, ProcessResult};
use crate::tool;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, info};

/// A segment of transcribed audio.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    /// The transcribed text.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
}

/// Whisper model and language selection.
#[derive(Debug, Clone)]
pub struct WhisperOptions {
    pub model: String,
    pub language: String,
}

impl Default for WhisperOptions {
    fn default() -> Self {
        Self {
            model: "base".to_string(),
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WhisperJsonOutput {
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    text: String,
    start: f64,
    end: f64,
}

/// Transcribe an audio file using Whisper.
///
/// Requires the `whisper` CLI (`pip install openai-whisper`). Whisper writes
/// `<stem>.json` into `output_dir`, which is parsed into segments.
pub fn transcribe_audio(
    audio_path: &Path,
    options: &WhisperOptions,
    output_dir: &Path,
) -> ProcessResult<Vec<TranscriptSegment>> {
    if !audio_path.exists() {
        return Err(ProcessError::FileNotFound(audio_path.to_path_buf()));
    }

    info!(
        "Transcribing {:?} with model '{}'",
        audio_path, options.model
    );

    let args: Vec<OsString> = vec![
        audio_path.as_os_str().to_owned(),
        "--model".into(),
        options.model.clone().into(),
        "--output_format".into(),
        "json".into(),
        "--output_dir".into(),
        output_dir.as_os_str().to_owned(),
        "--language".into(),
        options.language.clone().into(),
    ];
    tool::run("whisper", args)?;

    let stem = audio_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let json_path = output_dir.join(format!("{}.json", stem));

    if !json_path.exists() {
        return Err(ProcessError::BadOutput {
            tool: "whisper".to_string(),
            message: format!("output file {} not written", json_path.display()),
        });
    }

    let segments = parse_whisper_json(&std::fs::read_to_string(&json_path)?)?;
    debug!("Transcribed {} segments", segments.len());
    Ok(segments)
}

fn parse_whisper_json(json: &str) -> ProcessResult<Vec<TranscriptSegment>> {
    let output: WhisperJsonOutput =
        serde_json::from_str(json).map_err(|e| ProcessError::BadOutput {
            tool: "whisper".to_string(),
            message: e.to_string(),
        })?;

    Ok(output
        .segments
        .into_iter()
        .map(|s| TranscriptSegment {
            text: s.text.trim().to_string(),
            start: s.start,
            end: s.end,
        })
        .filter(|s| !s.text.is_empty())
        .collect())
}

/// Join segment texts into one transcript.
pub fn segments_to_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
