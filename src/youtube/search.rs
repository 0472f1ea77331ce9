use std::sync::Arc;
use tracing::{debug, warn};

use super::{format_clock, group_thousands, Extractor, RawSearchItem, RawSearchVideo, SearchResultSummary};
use crate::error::ServiceError;

pub struct SearchService {
    extractor: Arc<dyn Extractor>,
    limit: usize,
}

impl SearchService {
    pub fn new(extractor: Arc<dyn Extractor>, limit: usize) -> Self {
        Self { extractor, limit }
    }

    /// Video results in upstream relevance order, capped at the configured limit.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResultSummary>, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::invalid_input("Query parameter 'q' is required"));
        }

        let items = self
            .extractor
            .search(query, self.limit)
            .await
            .map_err(|err| {
                warn!(query, error = %err, "search failed upstream");
                ServiceError::UpstreamFailure(err)
            })?;

        let total = items.len();
        let videos: Vec<_> = items
            .into_iter()
            .filter_map(|item| match item {
                RawSearchItem::Video(video) => Some(summarize(video)),
                RawSearchItem::Playlist { .. } | RawSearchItem::Channel { .. } => None,
            })
            .take(self.limit)
            .collect();

        debug!(query, total, videos = videos.len(), "search completed");
        Ok(videos)
    }
}

pub fn summarize(video: RawSearchVideo) -> SearchResultSummary {
    let thumbnail = video
        .best_thumbnail
        .or_else(|| video.thumbnails.into_iter().next());

    SearchResultSummary {
        id: video.id,
        title: video.title,
        url: video.url,
        thumbnail,
        duration: video.duration_seconds.map(format_clock),
        channel: video.channel,
        views: video.view_count.map(group_thousands),
        published_at: video.uploaded_at,
    }
}
