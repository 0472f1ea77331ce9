mod common;

use std::time::Duration;

use common::{failing, sample_video, shared, FakeExtractor, InfoBehaviour};
use yt_fetch_server::error::ServiceError;
use yt_fetch_server::youtube::{FormatType, UpstreamError, VideoResolver, DEMO_TITLE};

const TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::test]
async fn extracted_info_is_normalized() {
    let extractor = shared(FakeExtractor::new(InfoBehaviour::Video(sample_video())));
    let resolver = VideoResolver::new(extractor.clone(), TIMEOUT, true);

    let resolution = resolver
        .resolve("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        .await
        .unwrap();
    assert!(!resolution.is_fallback());

    let info = resolution.into_info();
    assert_eq!(info.title, "Never Gonna: Give You Up!");
    assert_eq!(info.duration, "00:10:30");
    assert_eq!(info.views, "1,234,567,890");
    assert_eq!(info.publish_date, "October 25, 2009");
    assert_eq!(info.channel.as_deref(), Some("Rick Astley"));
    assert_eq!(
        info.thumbnail.as_deref(),
        Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg")
    );

    let summary: Vec<(u32, &str, &str, FormatType)> = info
        .formats
        .iter()
        .map(|f| (f.itag, f.quality.as_str(), f.size.as_str(), f.kind))
        .collect();
    assert_eq!(
        summary,
        vec![
            (22, "720p", "50.2 MB", FormatType::Video),
            (18, "480p", "Unknown", FormatType::Video),
            (140, "Audio Only", "3.2 MB", FormatType::Audio),
        ]
    );
    assert_eq!(extractor.infos(), 1);
}

#[tokio::test]
async fn extraction_failure_serves_demo_payload() {
    let extractor = shared(FakeExtractor::new(failing(|| {
        UpstreamError::Extraction("Could not extract functions".into())
    })));
    let resolver = VideoResolver::new(extractor, TIMEOUT, true);

    let resolution = resolver.resolve("https://youtu.be/abc123").await.unwrap();
    assert!(resolution.is_fallback());

    let info = resolution.into_info();
    assert_eq!(info.title, DEMO_TITLE);
    assert_eq!(info.title, "Demo Video - YouTube Downloader API Test");
    assert_eq!(info.url, "https://youtu.be/abc123");
    assert!(info.thumbnail.unwrap().contains("abc123"));
    let itags: Vec<u32> = info.formats.iter().map(|f| f.itag).collect();
    assert_eq!(itags, vec![22, 18, 140]);
}

#[tokio::test(start_paused = true)]
async fn timeout_serves_demo_payload() {
    let extractor = shared(FakeExtractor::new(InfoBehaviour::Hang));
    let resolver = VideoResolver::new(extractor, TIMEOUT, true);

    let resolution = resolver
        .resolve("https://www.youtube.com/watch?v=xyz")
        .await
        .unwrap();
    assert!(resolution.is_fallback());
    assert_eq!(
        resolution.into_info().thumbnail.as_deref(),
        Some("https://i.ytimg.com/vi/xyz/maxresdefault.jpg")
    );
}

#[tokio::test(start_paused = true)]
async fn timeout_without_fallback_is_reported() {
    let extractor = shared(FakeExtractor::new(InfoBehaviour::Hang));
    let resolver = VideoResolver::new(extractor, TIMEOUT, false);

    let err = resolver
        .resolve("https://www.youtube.com/watch?v=xyz")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Timeout(UpstreamError::Timeout(d)) if d == TIMEOUT));
    assert_eq!(err.to_string(), "Request timed out - video may be unavailable");
}

#[tokio::test]
async fn extraction_failure_without_fallback_is_reported() {
    let extractor = shared(FakeExtractor::new(failing(|| {
        UpstreamError::Extraction("Could not extract functions".into())
    })));
    let resolver = VideoResolver::new(extractor, TIMEOUT, false);

    let err = resolver.resolve("https://youtu.be/abc123").await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to get video information");
    assert!(err.details().unwrap().contains("Could not extract"));
}

#[tokio::test]
async fn unavailable_video_is_not_masked() {
    let extractor = shared(FakeExtractor::new(failing(|| {
        UpstreamError::Unavailable("Video unavailable".into())
    })));
    let resolver = VideoResolver::new(extractor, TIMEOUT, true);

    let err = resolver.resolve("https://youtu.be/abc123").await.unwrap_err();
    assert_eq!(err.to_string(), "Video is not available or private");
}

#[tokio::test]
async fn invalid_url_never_reaches_upstream() {
    let extractor = shared(FakeExtractor::new(InfoBehaviour::Video(sample_video())));
    let resolver = VideoResolver::new(extractor.clone(), TIMEOUT, true);

    let err = resolver.resolve("https://example.com/watch?v=abc").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(ref m) if m == "Invalid YouTube URL"));
    assert_eq!(extractor.infos(), 0);
}

#[tokio::test]
async fn download_target_uses_raw_format_list() {
    let extractor = shared(FakeExtractor::new(InfoBehaviour::Video(sample_video())));
    let resolver = VideoResolver::new(extractor, TIMEOUT, true);

    // 45 is dropped by dedup for display but remains downloadable.
    let target = resolver
        .select_download("https://youtu.be/dQw4w9WgXcQ", "45")
        .await
        .unwrap();
    assert_eq!(target.format.itag, 45);
    assert_eq!(target.filename, "Never Gonna Give You Up.mp4");
    assert!(target.content_type.starts_with("video/mp4"));

    let err = resolver
        .select_download("https://youtu.be/dQw4w9WgXcQ", "999")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::FormatNotFound(ref itag) if itag == "999"));
}
