use chrono::NaiveDate;
use std::collections::HashSet;

use super::{FormatType, RawFormat, StreamKind, VideoFormat};

pub const UNKNOWN: &str = "Unknown";
pub const AUDIO_ONLY: &str = "Audio Only";
pub const DEFAULT_CONTAINER: &str = "mp4";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Maps one upstream entry to its client-facing shape. Entries with no media are dropped.
pub fn derive_format(raw: &RawFormat) -> Option<VideoFormat> {
    let (quality, kind) = match raw.stream_kind()? {
        StreamKind::AudioVideo => {
            let quality = raw
                .quality_label
                .clone()
                .or_else(|| raw.height.map(|h| format!("{h}p")))
                .unwrap_or_else(|| UNKNOWN.to_string());
            (quality, FormatType::Video)
        }
        StreamKind::AudioOnly => (AUDIO_ONLY.to_string(), FormatType::Audio),
        StreamKind::VideoOnly => (UNKNOWN.to_string(), FormatType::Video),
    };

    Some(VideoFormat {
        itag: raw.itag,
        quality,
        format: raw
            .container
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTAINER.to_string()),
        size: format_size(raw.content_length),
        kind,
    })
}

/// Keeps the first entry for each `(quality, type)` pair, in upstream order.
pub fn normalize_formats(raw: &[RawFormat]) -> Vec<VideoFormat> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(derive_format)
        .filter(|f| seen.insert((f.quality.clone(), f.kind)))
        .collect()
}

pub fn format_size(content_length: Option<u64>) -> String {
    match content_length {
        Some(bytes) => format!("{:.1} MB", bytes as f64 / BYTES_PER_MB),
        None => UNKNOWN.to_string(),
    }
}

/// Zero-padded `HH:MM:SS`.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Player-style clock: `M:SS` under an hour, `H:MM:SS` above.
pub fn format_clock(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

pub fn format_publish_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
