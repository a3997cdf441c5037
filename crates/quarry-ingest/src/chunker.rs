//! Content chunking for retrieval.
//!
//! Text is split recursively: first on paragraph breaks, then on line breaks,
//! then on spaces, and finally between characters. Pieces are merged back
//! greedily up to the chunk size, carrying the tail of each chunk into the
//! next one as overlap.

use quarry_core::{Chunk, RagSettings};
use quarry_process::TranscriptSegment;
use std::collections::VecDeque;

/// Separators tried in order, coarsest first. The empty separator splits
/// between characters.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum size of each chunk in characters.
    pub chunk_size: usize,
    /// Number of characters carried over between neighbouring chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::from_settings(&RagSettings::default())
    }
}

impl ChunkConfig {
    /// Take chunk size and overlap from the batch settings.
    pub fn from_settings(settings: &RagSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size.max(1),
            chunk_overlap: settings.chunk_overlap.min(settings.chunk_size.saturating_sub(1)),
        }
    }
}

/// Content chunker for splitting text.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    pub fn from_settings(settings: &RagSettings) -> Self {
        Self::new(ChunkConfig::from_settings(settings))
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split text into chunk-sized strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return vec![];
        }
        self.split_recursive(trimmed, &SEPARATORS)
    }

    /// Split text into chunks for a source, numbered from `first_index`.
    pub fn chunk_text(&self, source_id: &str, text: &str, first_index: i32) -> Vec<Chunk> {
        self.split_text(text)
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk::new(source_id.to_string(), first_index + i as i32, content))
            .collect()
    }

    /// Group transcript segments into chunks carrying start and end times.
    ///
    /// Segments are never cut unless a single segment is longer than the chunk
    /// size, in which case its pieces share the segment's timestamps.
    pub fn chunk_transcript(&self, source_id: &str, segments: &[TranscriptSegment]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&TranscriptSegment> = VecDeque::new();
        let mut window_len = 0;

        let push_chunk = |chunks: &mut Vec<Chunk>, content: String, start: f64, end: f64| {
            let index = chunks.len() as i32;
            chunks.push(Chunk::new(source_id.to_string(), index, content).with_timestamps(start, end));
        };

        for segment in segments {
            let len = segment.text.chars().count();

            if len > self.config.chunk_size {
                if let Some((content, start, end)) = join_segments(&window) {
                    push_chunk(&mut chunks, content, start, end);
                }
                window.clear();
                window_len = 0;

                for piece in self.split_text(&segment.text) {
                    push_chunk(&mut chunks, piece, segment.start, segment.end);
                }
                continue;
            }

            let joined_len = if window.is_empty() { len } else { window_len + 1 + len };
            if joined_len > self.config.chunk_size {
                if let Some((content, start, end)) = join_segments(&window) {
                    push_chunk(&mut chunks, content, start, end);
                }
                // Keep trailing segments as overlap while they leave room for this one.
                while let Some(front) = window.front() {
                    let over_overlap = window_len > self.config.chunk_overlap;
                    let no_room = window_len + 1 + len > self.config.chunk_size;
                    if !(over_overlap || no_room) {
                        break;
                    }
                    let front_len = front.text.chars().count();
                    window_len = window_len.saturating_sub(front_len + usize::from(window.len() > 1));
                    window.pop_front();
                }
            }

            window_len = if window.is_empty() { len } else { window_len + 1 + len };
            window.push_back(segment);
        }

        if let Some((content, start, end)) = join_segments(&window) {
            push_chunk(&mut chunks, content, start, end);
        }

        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, rest) = pick_separator(text, separators);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        let mut result = Vec::new();
        let mut fitting: Vec<String> = Vec::new();

        for piece in pieces {
            if piece.chars().count() <= self.config.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                result.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if rest.is_empty() {
                result.push(piece);
            } else {
                result.extend(self.split_recursive(&piece, rest));
            }
        }

        if !fitting.is_empty() {
            result.extend(self.merge(&fitting, separator));
        }

        result
    }

    /// Greedily join pieces up to the chunk size, keeping overlap.
    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = separator.chars().count();
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = piece.chars().count();
            let joiner = if current.is_empty() { 0 } else { sep_len };

            if total + joiner + len > self.config.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);

                while !current.is_empty() {
                    let over_overlap = total > self.config.chunk_overlap;
                    let no_room = total + sep_len + len > self.config.chunk_size;
                    if !(over_overlap || no_room) {
                        break;
                    }
                    if let Some(front) = current.pop_front() {
                        let removed_joiner = if current.is_empty() { 0 } else { sep_len };
                        total -= front.chars().count() + removed_joiner;
                    }
                }
            }

            let joiner = if current.is_empty() { 0 } else { sep_len };
            total += joiner + len;
            current.push_back(piece);
        }

        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

fn pick_separator<'a, 'b>(text: &str, separators: &'b [&'a str]) -> (&'a str, &'b [&'a str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

fn push_joined(chunks: &mut Vec<String>, pieces: &VecDeque<&str>, separator: &str) {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let joined = joined.trim();
    if !joined.is_empty() {
        chunks.push(joined.to_string());
    }
}

fn join_segments(window: &VecDeque<&TranscriptSegment>) -> Option<(String, f64, f64)> {
    let first = window.front()?;
    let last = window.back()?;
    let content = window
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Some((content, first.start, last.end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize, chunk_overlap: usize) -> Chunker {
        Chunker::new(ChunkConfig {
            chunk_size,
            chunk_overlap,
        })
    }

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = Chunker::new(ChunkConfig::default()).chunk_text("s1", "A small piece of text.", 0);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "A small piece of text.");
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].source_id, "s1");
    }

    #[test]
    fn test_empty_text() {
        let chunker = chunker(100, 10);
        assert!(chunker.split_text("").is_empty());
        assert!(chunker.split_text("  \n\n ").is_empty());
    }

    #[test]
    fn test_chunks_never_exceed_size() {
        let text = format!(
            "{}\n\n{}\n{}",
            numbered_words(120),
            "x".repeat(230),
            numbered_words(40)
        );

        for (size, overlap) in [(50, 0), (50, 15), (80, 40), (7, 3)] {
            let chunks = chunker(size, overlap).split_text(&text);
            assert!(chunks.len() > 1);
            for chunk in &chunks {
                assert!(
                    chunk.chars().count() <= size,
                    "chunk of {} chars exceeds {}",
                    chunk.chars().count(),
                    size
                );
            }
        }
    }

    #[test]
    fn test_no_words_lost() {
        let text = numbered_words(200);
        let chunks = chunker(60, 20).split_text(&text);
        let joined = chunks.join(" ");

        for i in 0..200 {
            let word = format!("w{}", i);
            assert!(
                joined.split(' ').any(|w| w == word),
                "missing {}",
                word
            );
        }
    }

    #[test]
    fn test_neighbouring_chunks_overlap() {
        let chunks = chunker(50, 15).split_text(&numbered_words(100));
        assert!(chunks.len() > 2);

        for pair in chunks.windows(2) {
            let first_word = pair[1].split(' ').next().unwrap();
            assert!(
                pair[0].split(' ').any(|w| w == first_word),
                "{:?} does not continue {:?}",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn test_zero_overlap_partitions_text() {
        let text = numbered_words(100);
        let chunks = chunker(40, 0).split_text(&text);
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_unbroken_text_is_hard_split() {
        let text = "a".repeat(250);
        let chunks = chunker(100, 0).split_text(&text);

        let lengths: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(lengths, vec![100, 100, 50]);
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let text = "First paragraph here.\n\nSecond paragraph with more content.\n\nThird.";
        let chunks = chunker(40, 0).split_text(text);

        assert_eq!(chunks[0], "First paragraph here.");
        assert_eq!(chunks[1], "Second paragraph with more content.");
    }

    #[test]
    fn test_utf8_text() {
        let text = "Hello ─── World! This has unicode: 日本語 and more ─ content here.";
        let chunks = chunker(12, 4).split_text(text);

        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.chars().count() <= 12));
    }

    #[test]
    fn test_chunk_indices_start_at_offset() {
        let chunks = chunker(20, 0).chunk_text("s1", &numbered_words(30), 5);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, 5 + i as i32);
        }
    }

    #[test]
    fn test_chunk_transcript_with_timestamps() {
        let segments = vec![
            TranscriptSegment {
                text: "Hello world".to_string(),
                start: 0.0,
                end: 1.0,
            },
            TranscriptSegment {
                text: "This is a test".to_string(),
                start: 1.0,
                end: 2.0,
            },
            TranscriptSegment {
                text: "More content here".to_string(),
                start: 2.0,
                end: 3.0,
            },
        ];

        let chunks = chunker(40, 15).chunk_transcript("s1", &segments);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "Hello world This is a test");
        assert_eq!(chunks[0].start_time, Some(0.0));
        assert_eq!(chunks[0].end_time, Some(2.0));
        assert_eq!(chunks[1].content, "This is a test More content here");
        assert_eq!(chunks[1].start_time, Some(1.0));
        assert_eq!(chunks[1].end_time, Some(3.0));
    }

    #[test]
    fn test_long_segment_is_split() {
        let segments = vec![TranscriptSegment {
            text: numbered_words(40),
            start: 4.0,
            end: 9.0,
        }];

        let chunks = chunker(30, 0).chunk_transcript("s1", &segments);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.start_time == Some(4.0) && c.end_time == Some(9.0)));
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 30));
    }
}
