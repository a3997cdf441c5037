//! FFmpeg integration for pulling audio out of video sources.

use crate::error::{ProcessError, ProcessResult};
use crate::tool;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Duration of an audio or video file in seconds.
pub fn media_duration(path: &Path) -> ProcessResult<f64> {
    if !path.exists() {
        return Err(ProcessError::FileNotFound(path.to_path_buf()));
    }

    let mut args: Vec<OsString> = ["-v", "quiet", "-print_format", "json", "-show_format"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_owned());

    let output = tool::run("ffprobe", args)?;
    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_duration(json: &str) -> ProcessResult<f64> {
    let probe: FfprobeOutput = serde_json::from_str(json).map_err(|e| ProcessError::BadOutput {
        tool: "ffprobe".to_string(),
        message: e.to_string(),
    })?;

    Ok(probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0))
}

/// Extract the audio track of a video as 16 kHz mono WAV.
///
/// Returns the path of the written file inside `output_dir`.
pub fn extract_audio(video_path: &Path, output_dir: &Path) -> ProcessResult<PathBuf> {
    if !video_path.exists() {
        return Err(ProcessError::FileNotFound(video_path.to_path_buf()));
    }

    let stem = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let audio_path = output_dir.join(format!("{}.wav", stem));

    info!("Extracting audio from {:?} to {:?}", video_path, audio_path);

    let mut args: Vec<OsString> = vec!["-i".into(), video_path.as_os_str().to_owned()];
    // Whisper works best on 16 kHz mono PCM.
    args.extend(
        ["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1", "-y"]
            .iter()
            .map(OsString::from),
    );
    args.push(audio_path.as_os_str().to_owned());

    tool::run("ffmpeg", args)?;

    debug!("Audio extracted successfully");
    Ok(audio_path)
}
