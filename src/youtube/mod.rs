mod download;
mod extractor;
mod format;
mod links;
mod resolver;
mod search;
mod yt_dlp;

pub use download::*;
pub use extractor::*;
pub use format::*;
pub use links::*;
pub use resolver::*;
pub use search::*;
pub use yt_dlp::*;

use serde::Serialize;

/// One row of a search response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultSummary {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoFormat {
    pub itag: u32,
    pub quality: String,
    pub format: String,
    pub size: String,
    #[serde(rename = "type")]
    pub kind: FormatType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub views: String,
    pub publish_date: String,
    pub description: String,
    pub formats: Vec<VideoFormat>,
}
