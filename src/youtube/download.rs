use futures_util::{future, stream, StreamExt, TryStreamExt};
use tracing::warn;

use super::{ByteStream, RawFormat, UpstreamError, VideoResolver, DEFAULT_CONTAINER};
use crate::error::ServiceError;

const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// The upstream format picked for a download, with the response headers it implies.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadTarget {
    pub format: RawFormat,
    pub filename: String,
    pub content_type: String,
}

impl VideoResolver {
    /// Re-resolves the raw format list and picks the entry whose itag equals `itag`.
    pub async fn select_download(&self, url: &str, itag: &str) -> Result<DownloadTarget, ServiceError> {
        self.ensure_valid(url)?;

        let raw = self.fetch_raw(url).await.map_err(|err| {
            warn!(url, error = %err, "could not resolve formats for download");
            ServiceError::Download(err)
        })?;

        let format = raw
            .find_format(itag)
            .cloned()
            .ok_or_else(|| ServiceError::FormatNotFound(itag.to_string()))?;

        let extension = format.container.as_deref().unwrap_or(DEFAULT_CONTAINER);
        let filename = format!("{}.{}", sanitize_title(&raw.details.title), extension);
        let content_type = format
            .mime_type
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Ok(DownloadTarget {
            format,
            filename,
            content_type,
        })
    }

    /// Opens the upstream stream and waits for its first chunk.
    ///
    /// Until that chunk arrives nothing has been sent to the client, so an
    /// upstream that fails or produces no data is still reported as an error
    /// instead of an empty attachment.
    pub async fn open_download(&self, url: &str, target: &DownloadTarget) -> Result<ByteStream, ServiceError> {
        let failed = |err: UpstreamError| {
            warn!(url, itag = target.format.itag, error = %err, "could not open download stream");
            ServiceError::Download(err)
        };

        let mut body = self
            .extractor()
            .open_stream(url, &target.format)
            .await
            .map_err(failed)?;

        match body.try_next().await {
            Ok(Some(first)) => Ok(Box::pin(stream::once(future::ready(Ok(first))).chain(body))),
            Ok(None) => Err(failed(UpstreamError::Failed(
                "download stream ended before any data".into(),
            ))),
            Err(err) => Err(failed(UpstreamError::Failed(err.to_string()))),
        }
    }
}

/// Keeps ASCII word characters and spaces so the name is safe inside a quoted header.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '_' => Some(c),
            c if c.is_whitespace() => Some(' '),
            _ => None,
        })
        .collect();

    if cleaned.trim().is_empty() {
        "video".to_string()
    } else {
        cleaned
    }
}
