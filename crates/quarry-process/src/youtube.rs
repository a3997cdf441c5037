//! YouTube audio download via yt-dlp.

use crate::error::{ProcessError, ProcessResult};
use crate::tool;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

/// Extract the video id from the common YouTube URL shapes.
pub fn youtube_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let rest = rest.strip_prefix("m.").unwrap_or(rest);

    let candidate = if let Some(path) = rest.strip_prefix("youtu.be/") {
        path.split(['?', '&', '/']).next()
    } else if let Some(path) = rest.strip_prefix("youtube.com/") {
        if let Some(query) = path.strip_prefix("watch?") {
            query
                .split('&')
                .find_map(|pair| pair.strip_prefix("v="))
        } else {
            ["shorts/", "embed/", "live/"]
                .iter()
                .find_map(|prefix| path.strip_prefix(prefix))
                .and_then(|p| p.split(['?', '&', '/']).next())
        }
    } else {
        None
    };

    candidate
        .filter(|id| !id.is_empty())
        .filter(|id| id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .map(str::to_string)
}

/// Download the audio track of a YouTube video as MP3 into `output_dir`.
pub fn download_audio(url: &str, output_dir: &Path) -> ProcessResult<PathBuf> {
    let video_id = youtube_video_id(url)
        .ok_or_else(|| ProcessError::InvalidInput(format!("Not a YouTube URL: {}", url)))?;

    info!("Downloading audio for YouTube video {}", video_id);

    let template = output_dir.join(format!("{}.%(ext)s", video_id));
    let args: Vec<OsString> = vec![
        "--extract-audio".into(),
        "--audio-format".into(),
        "mp3".into(),
        "--no-playlist".into(),
        "--quiet".into(),
        "-o".into(),
        template.as_os_str().to_owned(),
        url.into(),
    ];
    tool::run("yt-dlp", args)?;

    let audio_path = output_dir.join(format!("{}.mp3", video_id));
    if !audio_path.exists() {
        return Err(ProcessError::BadOutput {
            tool: "yt-dlp".to_string(),
            message: format!("expected {} to be written", audio_path.display()),
        });
    }

    Ok(audio_path)
}
