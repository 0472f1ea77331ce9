use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use futures_util::{future, stream, StreamExt};
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use super::{
    format_publish_date, ByteStream, Extractor, RawFormat, RawSearchItem, RawSearchVideo,
    RawVideo, RawVideoDetails, UpstreamError,
};

/// Extractor backed by the `yt-dlp` executable.
///
/// Every call runs a fresh child process. Children are killed when the future
/// driving them is dropped, so a timed-out lookup does not linger.
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--no-warnings")
            .arg("--no-progress")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    async fn dump_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T, UpstreamError> {
        let output = self.command().args(args).output().await?;
        if !output.status.success() {
            return Err(classify_failure(&String::from_utf8_lossy(&output.stderr)));
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[async_trait]
impl Extractor for YtDlp {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawSearchItem>, UpstreamError> {
        let target = format!("ytsearch{limit}:{query}");
        let listing: DumpedListing = self
            .dump_json(&["--flat-playlist", "--dump-single-json", target.as_str()])
            .await?;
        Ok(decode_listing(listing))
    }

    async fn fetch_info(&self, url: &str) -> Result<RawVideo, UpstreamError> {
        let video: DumpedVideo = self
            .dump_json(&["--dump-single-json", "--skip-download", "--", url])
            .await?;
        Ok(decode_video(video))
    }

    async fn open_stream(&self, url: &str, format: &RawFormat) -> Result<ByteStream, UpstreamError> {
        let itag = format.itag.to_string();
        let child = self
            .command()
            .args(["--quiet", "-f", itag.as_str(), "-o", "-", "--", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        child_output(child, url.to_string())
    }
}

/// Streams a child's stdout, then waits for it to exit.
///
/// A non-zero exit becomes a trailing error item carrying the last `ERROR:`
/// line from stderr, so a truncated download never looks complete.
fn child_output(mut child: Child, url: String) -> Result<ByteStream, UpstreamError> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| UpstreamError::Failed("extractor stdout unavailable".into()))?;
    let stderr = child.stderr.take();

    let stderr_url = url.clone();
    let last_error = tokio::spawn(async move {
        let mut last = None;
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(url = %stderr_url, "yt-dlp: {line}");
                if line.starts_with("ERROR:") {
                    last = Some(line);
                }
            }
        }
        last
    });

    let exit = stream::once(async move {
        let outcome: Option<io::Result<Bytes>> = match child.wait().await {
            Ok(status) if status.success() => {
                debug!(url = %url, "download stream finished");
                None
            }
            Ok(status) => {
                let message = last_error
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or_else(|| format!("extractor exited with {status}"));
                warn!(url = %url, %status, "download process exited with failure");
                Some(Err(io::Error::new(io::ErrorKind::Other, message)))
            }
            Err(err) => {
                warn!(url = %url, error = %err, "could not reap download process");
                Some(Err(err))
            }
        };
        outcome
    })
    .filter_map(future::ready);

    Ok(Box::pin(ReaderStream::new(stdout).chain(exit)))
}

/// Maps yt-dlp's stderr onto the upstream error kinds the resolver distinguishes.
pub fn classify_failure(stderr: &str) -> UpstreamError {
    let message = stderr
        .lines()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .unwrap_or_else(|| stderr.trim())
        .to_string();

    if message.contains("Video unavailable") || message.contains("Private video") {
        UpstreamError::Unavailable(message)
    } else if message.contains("Unable to extract") || message.contains("Could not extract") {
        UpstreamError::Extraction(message)
    } else {
        UpstreamError::Failed(message)
    }
}

#[derive(Debug, Deserialize)]
struct DumpedThumbnail {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DumpedFormat {
    format_id: String,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    format_note: Option<String>,
    filesize: Option<u64>,
    filesize_approx: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DumpedVideo {
    id: String,
    title: Option<String>,
    webpage_url: Option<String>,
    thumbnail: Option<String>,
    #[serde(default)]
    thumbnails: Vec<DumpedThumbnail>,
    duration: Option<f64>,
    channel: Option<String>,
    uploader: Option<String>,
    view_count: Option<u64>,
    upload_date: Option<String>,
    description: Option<String>,
    #[serde(default)]
    formats: Vec<DumpedFormat>,
}

#[derive(Debug, Deserialize)]
struct DumpedEntry {
    id: Option<String>,
    ie_key: Option<String>,
    url: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    channel: Option<String>,
    uploader: Option<String>,
    view_count: Option<u64>,
    upload_date: Option<String>,
    #[serde(default)]
    thumbnails: Vec<DumpedThumbnail>,
}

#[derive(Debug, Deserialize)]
struct DumpedListing {
    #[serde(default)]
    entries: Vec<DumpedEntry>,
}

fn has_codec(codec: &Option<String>) -> bool {
    codec.as_deref().is_some_and(|c| c != "none")
}

fn seconds(duration: Option<f64>) -> Option<u64> {
    duration.map(|d| d.max(0.0).round() as u64)
}

fn parse_upload_date(raw: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw?, "%Y%m%d").ok()
}

fn mime_type(ext: &str, has_video: bool) -> String {
    match (has_video, ext) {
        (true, ext) => format!("video/{ext}"),
        (false, "m4a") => "audio/mp4".to_string(),
        (false, ext) => format!("audio/{ext}"),
    }
}

fn decode_format(dumped: DumpedFormat) -> Option<RawFormat> {
    let Ok(itag) = dumped.format_id.parse::<u32>() else {
        debug!(format_id = %dumped.format_id, "skipping format without a numeric itag");
        return None;
    };
    let has_video = has_codec(&dumped.vcodec);
    let has_audio = has_codec(&dumped.acodec);

    Some(RawFormat {
        itag,
        has_video,
        has_audio,
        quality_label: dumped.format_note.filter(|_| has_video),
        height: dumped.height,
        mime_type: dumped.ext.as_deref().map(|ext| mime_type(ext, has_video)),
        container: dumped.ext,
        content_length: dumped.filesize.or(dumped.filesize_approx),
    })
}

fn decode_video(dumped: DumpedVideo) -> RawVideo {
    let video_url = dumped
        .webpage_url
        .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", dumped.id));
    let thumbnails = dumped
        .thumbnail
        .into_iter()
        .chain(dumped.thumbnails.into_iter().map(|t| t.url))
        .collect();

    RawVideo {
        details: RawVideoDetails {
            title: dumped.title.unwrap_or_default(),
            video_url,
            thumbnails,
            length_seconds: seconds(dumped.duration),
            author: dumped.channel.or(dumped.uploader),
            view_count: dumped.view_count,
            publish_date: parse_upload_date(dumped.upload_date.as_deref()),
            description: dumped.description,
        },
        formats: dumped.formats.into_iter().filter_map(decode_format).collect(),
    }
}

fn decode_entry(entry: DumpedEntry) -> Option<RawSearchItem> {
    let id = entry.id?;
    match entry.ie_key.as_deref() {
        Some("Youtube") => {
            let best_thumbnail = entry
                .thumbnails
                .iter()
                .filter_map(|t| Some((u64::from(t.width?) * u64::from(t.height?), t)))
                .max_by_key(|(area, _)| *area)
                .map(|(_, t)| t.url.clone());

            Some(RawSearchItem::Video(RawSearchVideo {
                url: entry
                    .url
                    .or_else(|| Some(format!("https://www.youtube.com/watch?v={id}"))),
                id,
                title: entry.title,
                best_thumbnail,
                thumbnails: entry.thumbnails.into_iter().map(|t| t.url).collect(),
                duration_seconds: seconds(entry.duration),
                channel: entry.channel.or(entry.uploader),
                view_count: entry.view_count,
                uploaded_at: parse_upload_date(entry.upload_date.as_deref()).map(format_publish_date),
            }))
        }
        Some("YoutubeTab") if entry.url.as_deref().is_some_and(|u| u.contains("list=")) => {
            Some(RawSearchItem::Playlist { id })
        }
        Some("YoutubeTab") => Some(RawSearchItem::Channel { id }),
        _ => None,
    }
}

fn decode_listing(listing: DumpedListing) -> Vec<RawSearchItem> {
    listing.entries.into_iter().filter_map(decode_entry).collect()
}
