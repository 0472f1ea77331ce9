use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use futures_util::Stream;
use std::io;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

use super::is_youtube_url;

pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Could not extract video data: {0}")]
    Extraction(String),

    #[error("Timeout after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("Video unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Failed(String),

    #[error("failed to run extractor: {0}")]
    Spawn(#[from] io::Error),

    #[error("malformed extractor output: {0}")]
    Decode(#[from] serde_json::Error),
}

impl UpstreamError {
    /// Failures the demo payload is allowed to stand in for.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, UpstreamError::Extraction(_) | UpstreamError::Timeout(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    AudioVideo,
    VideoOnly,
    AudioOnly,
}

/// A format entry as reported by the extractor, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFormat {
    pub itag: u32,
    pub has_video: bool,
    pub has_audio: bool,
    pub quality_label: Option<String>,
    pub height: Option<u32>,
    pub container: Option<String>,
    pub content_length: Option<u64>,
    pub mime_type: Option<String>,
}

impl RawFormat {
    /// `None` for entries carrying neither video nor audio (storyboards and the like).
    pub fn stream_kind(&self) -> Option<StreamKind> {
        match (self.has_video, self.has_audio) {
            (true, true) => Some(StreamKind::AudioVideo),
            (true, false) => Some(StreamKind::VideoOnly),
            (false, true) => Some(StreamKind::AudioOnly),
            (false, false) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawVideoDetails {
    pub title: String,
    pub video_url: String,
    pub thumbnails: Vec<String>,
    pub length_seconds: Option<u64>,
    pub author: Option<String>,
    pub view_count: Option<u64>,
    pub publish_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawVideo {
    pub details: RawVideoDetails,
    pub formats: Vec<RawFormat>,
}

impl RawVideo {
    /// Matches on the decimal form of the itag, as it arrives in a query string.
    pub fn find_format(&self, itag: &str) -> Option<&RawFormat> {
        self.formats.iter().find(|f| f.itag.to_string() == itag)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSearchVideo {
    pub id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub best_thumbnail: Option<String>,
    pub thumbnails: Vec<String>,
    pub duration_seconds: Option<u64>,
    pub channel: Option<String>,
    pub view_count: Option<u64>,
    pub uploaded_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawSearchItem {
    Video(RawSearchVideo),
    Playlist { id: String },
    Channel { id: String },
}

/// Upstream capability set: URL validation, search, metadata and byte streams.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn validate_url(&self, url: &str) -> bool {
        is_youtube_url(url)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawSearchItem>, UpstreamError>;

    async fn fetch_info(&self, url: &str) -> Result<RawVideo, UpstreamError>;

    async fn open_stream(&self, url: &str, format: &RawFormat) -> Result<ByteStream, UpstreamError>;
}
