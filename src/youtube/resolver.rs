use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{
    format_duration, format_publish_date, group_thousands, normalize_formats, video_id,
    Extractor, FormatType, RawVideo, UpstreamError, VideoFormat, VideoInfo, UNKNOWN,
};
use crate::error::ServiceError;

pub const DEMO_TITLE: &str = "Demo Video - YouTube Downloader API Test";
const DEMO_CHANNEL: &str = "Demo Channel";
const DEMO_DESCRIPTION: &str = "This is a demo video info response. The actual YouTube video data extraction is temporarily unavailable due to YouTube platform changes. This demonstrates the UI and download functionality.";

/// How a `VideoInfo` was obtained. Only extracted data is worth caching.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Extracted(VideoInfo),
    Fallback(VideoInfo),
}

impl Resolution {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback(_))
    }

    pub fn into_info(self) -> VideoInfo {
        match self {
            Resolution::Extracted(info) | Resolution::Fallback(info) => info,
        }
    }
}

pub struct VideoResolver {
    extractor: Arc<dyn Extractor>,
    timeout: Duration,
    demo_fallback: bool,
}

impl VideoResolver {
    pub fn new(extractor: Arc<dyn Extractor>, timeout: Duration, demo_fallback: bool) -> Self {
        Self {
            extractor,
            timeout,
            demo_fallback,
        }
    }

    pub fn extractor(&self) -> &Arc<dyn Extractor> {
        &self.extractor
    }

    pub fn ensure_valid(&self, url: &str) -> Result<(), ServiceError> {
        if self.extractor.validate_url(url) {
            Ok(())
        } else {
            Err(ServiceError::invalid_input("Invalid YouTube URL"))
        }
    }

    pub async fn resolve(&self, url: &str) -> Result<Resolution, ServiceError> {
        self.ensure_valid(url)?;

        match self.fetch_raw(url).await {
            Ok(raw) => Ok(Resolution::Extracted(compose_video_info(raw))),
            Err(err) if self.demo_fallback && err.is_recoverable() => {
                warn!(url, error = %err, "extraction failed, serving demo metadata");
                Ok(Resolution::Fallback(demo_video_info(url)))
            }
            Err(err) => {
                warn!(url, error = %err, "video resolution failed");
                Err(resolution_failure(err))
            }
        }
    }

    /// Upstream metadata bounded by the resolution timeout. A timed-out call is
    /// dropped rather than awaited.
    pub async fn fetch_raw(&self, url: &str) -> Result<RawVideo, UpstreamError> {
        info!(url, "fetching video info");
        match tokio::time::timeout(self.timeout, self.extractor.fetch_info(url)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.timeout)),
        }
    }
}

fn resolution_failure(err: UpstreamError) -> ServiceError {
    match err {
        UpstreamError::Timeout(_) => ServiceError::Timeout(err),
        UpstreamError::Unavailable(_) => ServiceError::ResolutionFailure {
            message: "Video is not available or private",
            source: err,
        },
        _ => ServiceError::ResolutionFailure {
            message: "Failed to get video information",
            source: err,
        },
    }
}

pub fn compose_video_info(raw: RawVideo) -> VideoInfo {
    let details = raw.details;
    VideoInfo {
        title: details.title,
        url: details.video_url,
        thumbnail: details.thumbnails.into_iter().next(),
        duration: format_duration(details.length_seconds.unwrap_or(0)),
        channel: details.author,
        views: group_thousands(details.view_count.unwrap_or(0)),
        publish_date: details
            .publish_date
            .map(format_publish_date)
            .unwrap_or_else(|| UNKNOWN.to_string()),
        description: details.description.unwrap_or_default(),
        formats: normalize_formats(&raw.formats),
    }
}

/// Fixed stand-in payload, shaped exactly like real data.
pub fn demo_video_info(url: &str) -> VideoInfo {
    let id = video_id(url).unwrap_or_else(|| "demo".to_string());
    let format = |itag, quality: &str, container: &str, size: &str, kind| VideoFormat {
        itag,
        quality: quality.to_string(),
        format: container.to_string(),
        size: size.to_string(),
        kind,
    };

    VideoInfo {
        title: DEMO_TITLE.to_string(),
        url: url.to_string(),
        thumbnail: Some(format!("https://i.ytimg.com/vi/{id}/maxresdefault.jpg")),
        duration: "10:30".to_string(),
        channel: Some(DEMO_CHANNEL.to_string()),
        views: "1,234,567".to_string(),
        publish_date: "January 15, 2024".to_string(),
        description: DEMO_DESCRIPTION.to_string(),
        formats: vec![
            format(22, "720p", "mp4", "50.2 MB", FormatType::Video),
            format(18, "360p", "mp4", "25.1 MB", FormatType::Video),
            format(140, "Audio Only", "m4a", "8.7 MB", FormatType::Audio),
        ],
    }
}
