#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use yt_fetch_server::youtube::{
    ByteStream, Extractor, RawFormat, RawSearchItem, RawSearchVideo, RawVideo, RawVideoDetails,
    UpstreamError,
};

pub type ErrorFactory = Box<dyn Fn() -> UpstreamError + Send + Sync>;

pub enum InfoBehaviour {
    Video(RawVideo),
    Fail(ErrorFactory),
    Hang,
}

/// In-process stand-in for yt-dlp that counts how often each capability is used.
pub struct FakeExtractor {
    search_items: Option<Vec<RawSearchItem>>,
    info: InfoBehaviour,
    chunks: Vec<Result<&'static [u8], &'static str>>,
    pub search_calls: AtomicUsize,
    pub info_calls: AtomicUsize,
    pub stream_calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(info: InfoBehaviour) -> Self {
        Self {
            search_items: Some(Vec::new()),
            info,
            chunks: vec![Ok(&b"chunk-1"[..]), Ok(&b"chunk-2"[..])],
            search_calls: AtomicUsize::new(0),
            info_calls: AtomicUsize::new(0),
            stream_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_search_items(mut self, items: Vec<RawSearchItem>) -> Self {
        self.search_items = Some(items);
        self
    }

    pub fn with_failing_search(mut self) -> Self {
        self.search_items = None;
        self
    }

    /// Replaces the download body; `Err` items become stream errors.
    pub fn with_stream(mut self, chunks: Vec<Result<&'static [u8], &'static str>>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn infos(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn streams(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<RawSearchItem>, UpstreamError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_items
            .clone()
            .ok_or_else(|| UpstreamError::Failed("search backend exploded".into()))
    }

    async fn fetch_info(&self, _url: &str) -> Result<RawVideo, UpstreamError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        match &self.info {
            InfoBehaviour::Video(video) => Ok(video.clone()),
            InfoBehaviour::Fail(make_error) => Err(make_error()),
            InfoBehaviour::Hang => std::future::pending().await,
        }
    }

    async fn open_stream(&self, _url: &str, _format: &RawFormat) -> Result<ByteStream, UpstreamError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let chunks: Vec<io::Result<Bytes>> = self
            .chunks
            .iter()
            .map(|chunk| match chunk {
                Ok(bytes) => Ok(Bytes::from_static(*bytes)),
                Err(message) => Err(io::Error::new(io::ErrorKind::Other, *message)),
            })
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

pub fn failing(make_error: impl Fn() -> UpstreamError + Send + Sync + 'static) -> InfoBehaviour {
    InfoBehaviour::Fail(Box::new(make_error))
}

pub fn shared(extractor: FakeExtractor) -> Arc<FakeExtractor> {
    Arc::new(extractor)
}

pub fn search_video(id: &str) -> RawSearchItem {
    RawSearchItem::Video(RawSearchVideo {
        id: id.to_string(),
        title: Some(format!("Video {id}")),
        url: Some(format!("https://www.youtube.com/watch?v={id}")),
        thumbnails: vec![format!("https://i.ytimg.com/vi/{id}/default.jpg")],
        duration_seconds: Some(212),
        channel: Some("Channel".into()),
        view_count: Some(4321),
        ..Default::default()
    })
}

pub fn sample_video() -> RawVideo {
    let muxed = |itag, label: Option<&str>, height, length| RawFormat {
        itag,
        has_video: true,
        has_audio: true,
        quality_label: label.map(str::to_string),
        height,
        container: Some("mp4".into()),
        content_length: length,
        mime_type: Some("video/mp4; codecs=\"avc1.64001F, mp4a.40.2\"".into()),
    };

    RawVideo {
        details: RawVideoDetails {
            title: "Never Gonna: Give You Up!".into(),
            video_url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".into(),
            thumbnails: vec!["https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg".into()],
            length_seconds: Some(630),
            author: Some("Rick Astley".into()),
            view_count: Some(1_234_567_890),
            publish_date: chrono::NaiveDate::from_ymd_opt(2009, 10, 25),
            description: Some("The official video".into()),
        },
        formats: vec![
            muxed(22, Some("720p"), Some(720), Some(52_649_000)),
            muxed(45, Some("720p"), Some(720), Some(99_000_000)),
            muxed(18, None, Some(480), None),
            RawFormat {
                itag: 140,
                has_audio: true,
                container: Some("m4a".into()),
                content_length: Some(3_400_000),
                mime_type: Some("audio/mp4".into()),
                ..Default::default()
            },
            RawFormat {
                itag: 160,
                ..Default::default()
            },
        ],
    }
}
