mod memory_cache;

pub use memory_cache::*;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::youtube::{SearchResultSummary, VideoInfo};

pub struct CacheEntry<V> {
    pub value: Arc<V>,
    pub stored_at: Instant,
}

/// Search results keyed by lower-cased query, video info keyed by the URL as given.
///
/// Each namespace sits behind its own lock, so a lookup's expiry check and
/// eviction happen together. There is no single-flight: two concurrent misses
/// on one key both resolve and the later write wins.
pub struct MetadataCache {
    searches: Mutex<TtlCache<Vec<SearchResultSummary>>>,
    videos: Mutex<TtlCache<VideoInfo>>,
}

impl MetadataCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            searches: Mutex::new(TtlCache::new(capacity, ttl)),
            videos: Mutex::new(TtlCache::new(capacity, ttl)),
        }
    }

    pub async fn search_results(&self, query: &str) -> Option<Arc<Vec<SearchResultSummary>>> {
        self.searches.lock().await.get(&query_key(query))
    }

    pub async fn store_search_results(
        &self,
        query: &str,
        results: Vec<SearchResultSummary>,
    ) -> Arc<Vec<SearchResultSummary>> {
        self.searches.lock().await.put(query_key(query), results)
    }

    pub async fn video_info(&self, url: &str) -> Option<Arc<VideoInfo>> {
        self.videos.lock().await.get(url)
    }

    pub async fn store_video_info(&self, url: &str, info: VideoInfo) -> Arc<VideoInfo> {
        self.videos.lock().await.put(url.to_string(), info)
    }
}

fn query_key(query: &str) -> String {
    query.to_lowercase()
}
