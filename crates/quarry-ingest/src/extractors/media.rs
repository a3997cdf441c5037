//! Audio, video and YouTube sources, ingested as Whisper transcripts.

use super::{blocking, is_url, read_location, required_location, store_transcript, ExtractorContext};
use crate::error::{ExtractError, ExtractResult};
use crate::registry::{ExtractionSummary, Extractor};
use async_trait::async_trait;
use quarry_core::{RagSettings, SourceDescriptor};
use quarry_process::{
    download_audio, extract_audio, media_duration, transcribe_audio, youtube_video_id,
    TranscriptSegment, WhisperOptions,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// What a media source points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// `mp3`: an audio file, transcribed directly.
    Audio,
    /// `mp4`: a video file; the audio track is extracted first.
    Video,
    /// `youtube`: a video URL; the audio is downloaded first.
    Youtube,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Youtube => "youtube",
        }
    }

    /// Extension given to downloads whose URL carries none.
    fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio | MediaKind::Youtube => "mp3",
        }
    }
}

/// Transcribes a media source and stores timestamped chunks.
///
/// Files may be local paths or http(s) URLs; downloads and intermediate audio
/// live in a temporary directory removed when extraction ends.
pub struct MediaExtractor {
    ctx: Arc<ExtractorContext>,
    kind: MediaKind,
}

impl MediaExtractor {
    pub fn new(ctx: Arc<ExtractorContext>, kind: MediaKind) -> Self {
        Self { ctx, kind }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}

struct Transcript {
    segments: Vec<TranscriptSegment>,
    duration: Option<f64>,
}

fn transcribe_file(
    kind: MediaKind,
    input: &Path,
    whisper: &WhisperOptions,
    work_dir: &Path,
) -> ExtractResult<Transcript> {
    let duration = match media_duration(input) {
        Ok(d) => Some(d),
        Err(e) => {
            warn!("Could not probe {:?}: {}", input, e);
            None
        }
    };

    let audio: PathBuf = match kind {
        MediaKind::Video => extract_audio(input, work_dir)?,
        MediaKind::Audio | MediaKind::Youtube => input.to_path_buf(),
    };

    let segments = transcribe_audio(&audio, whisper, work_dir)?;
    Ok(Transcript { segments, duration })
}

#[async_trait]
impl Extractor for MediaExtractor {
    async fn extract(
        &self,
        source: &SourceDescriptor,
        settings: &RagSettings,
    ) -> ExtractResult<ExtractionSummary> {
        let location = required_location(source)?.to_string();
        let work_dir = tempfile::tempdir()?;
        let whisper = self.ctx.whisper.clone();
        let kind = self.kind;

        let input: PathBuf = match kind {
            MediaKind::Youtube => {
                if youtube_video_id(&location).is_none() {
                    return Err(ExtractError::InvalidField {
                        field: "location",
                        message: format!("not a YouTube URL: {}", location),
                    });
                }
                let url = location.clone();
                let dir = work_dir.path().to_path_buf();
                blocking(move || download_audio(&url, &dir).map_err(ExtractError::from)).await?
            }
            MediaKind::Audio | MediaKind::Video if is_url(&location) => {
                let (name, data) = read_location(&self.ctx.fetcher, &location).await?;
                let file_name = if name.contains('.') {
                    name
                } else {
                    format!("{}.{}", name, kind.default_extension())
                };
                let path = work_dir.path().join(file_name);
                tokio::fs::write(&path, data).await?;
                path
            }
            MediaKind::Audio | MediaKind::Video => {
                let path = PathBuf::from(&location);
                if !path.exists() {
                    return Err(ExtractError::FileNotFound(path));
                }
                path
            }
        };

        info!("Transcribing {:?} for source {}", input, source.id);

        let dir = work_dir.path().to_path_buf();
        let transcript = blocking(move || transcribe_file(kind, &input, &whisper, &dir)).await?;

        let metadata = serde_json::json!({
            "format": "transcript",
            "media": kind.as_str(),
            "location": location,
            "duration": transcript.duration,
            "source_type": source.normalized_type(),
        });
        store_transcript(&self.ctx.db, source, settings, transcript.segments, metadata).await
    }
}
