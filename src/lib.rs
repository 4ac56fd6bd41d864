pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod summarize;
pub mod web;
pub mod youtube;

use serde::Serialize;
use url::Url;

pub use error::{Error, Result, Service, Stage, UpstreamKind};

/// Longest identifier accepted from a URL
const MAX_VIDEO_ID_LEN: usize = 64;

/// A single captioned segment
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Complete transcript for a video
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: String,
    pub title: String,
    pub language: String,
    /// Auto-generated (ASR) track rather than one authored by the uploader
    pub generated: bool,
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// All segment texts joined into a single blob
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Model-produced summary of one transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub video_id: String,
    pub text: String,
}

/// Validated video identifier extracted from a YouTube URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VideoReference(String);

impl VideoReference {
    pub fn parse(input: &str) -> Result<Self> {
        extract_video_id(input)
            .map(VideoReference)
            .ok_or_else(|| Error::InvalidUrl(input.trim().to_string()))
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_valid_video_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_VIDEO_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_youtube_host(host: &str) -> bool {
    matches!(
        host.to_ascii_lowercase().as_str(),
        "youtube.com" | "www.youtube.com" | "m.youtube.com" | "music.youtube.com"
    )
}

/// Extract video ID from the YouTube URL shapes that address a single video
pub fn extract_video_id(input: &str) -> Option<String> {
    let url = Url::parse(input.trim()).ok()?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return None;
    }
    let host = url.host_str()?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let candidate = if host.eq_ignore_ascii_case("youtu.be") {
        // youtu.be/ID
        segments.next()?.to_string()
    } else if is_youtube_host(host) {
        match segments.next()? {
            // youtube.com/watch?v=ID
            "watch" if segments.next().is_none() => url.query_pairs().find(|(k, _)| k == "v")?.1.into_owned(),
            // youtube.com/{embed,v,shorts,live}/ID
            "embed" | "v" | "shorts" | "live" => segments.next()?.to_string(),
            _ => return None,
        }
    } else {
        return None;
    };

    is_valid_video_id(&candidate).then_some(candidate)
}
