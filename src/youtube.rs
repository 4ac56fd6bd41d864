use async_trait::async_trait;
use log::{debug, info};
use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result, Service, UpstreamKind};
use crate::{Segment, Transcript, VideoReference};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub const DEFAULT_YOUTUBE_BASE: &str = "https://www.youtube.com";

/// Which caption language to pick when a video offers several
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePolicy {
    /// Language codes in order of preference
    pub preferred: Vec<String>,
    /// Accept any available track when none of the preferred languages exist
    pub allow_fallback: bool,
}

impl Default for LanguagePolicy {
    fn default() -> Self {
        LanguagePolicy {
            preferred: vec!["en".to_string()],
            allow_fallback: true,
        }
    }
}

/// Source of transcripts for a video
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    async fn fetch(&self, video: &VideoReference, language: &LanguagePolicy) -> Result<Transcript>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InnerTubePlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
    video_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    /// "asr" for auto-generated tracks, absent for uploaded ones
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Fetches captions through YouTube's InnerTube API
#[derive(Debug, Clone)]
pub struct YouTubeTranscripts {
    client: reqwest::Client,
    base_url: String,
}

impl YouTubeTranscripts {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_YOUTUBE_BASE)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        YouTubeTranscripts {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        self.client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(youtube_error)?
            .text()
            .await
            .map_err(youtube_error)
    }

    async fn player(&self, video_id: &str, api_key: &str, lang: &str) -> Result<InnerTubePlayerResponse> {
        let player_url = format!("{}/youtubei/v1/player?key={api_key}&prettyPrint=false", self.base_url);

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": lang,
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id
        });

        self.client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(youtube_error)?
            .json()
            .await
            .map_err(youtube_error)
    }
}

#[async_trait]
impl TranscriptFetcher for YouTubeTranscripts {
    async fn fetch(&self, video: &VideoReference, language: &LanguagePolicy) -> Result<Transcript> {
        let video_id = video.id();

        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("{}/watch?v={video_id}", self.base_url);
        debug!("Fetching watch page: {watch_url}");
        let page_html = self.get_text(&watch_url).await?;

        if page_html.contains("class=\"g-recaptcha\"") {
            return Err(Error::upstream(
                Service::YouTube,
                UpstreamKind::RateLimited,
                "YouTube answered with a captcha challenge",
            ));
        }

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let hl = language.preferred.first().map(String::as_str).unwrap_or("en");
        let resp = self.player(video_id, &api_key, hl).await?;

        if let Some(status) = &resp.playability_status
            && status.status != "OK"
        {
            return Err(Error::VideoUnavailable {
                video_id: video_id.to_string(),
                reason: status.reason.clone().unwrap_or_else(|| status.status.clone()),
            });
        }

        let title = resp
            .video_details
            .as_ref()
            .and_then(|vd| vd.title.clone())
            .unwrap_or_default();

        let tracks = resp
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default();

        if tracks.is_empty() {
            return Err(Error::TranscriptsDisabled(video_id.to_string()));
        }

        let track = select_track(&tracks, language).ok_or_else(|| {
            debug!(
                "No track in {:?}; available: {:?}",
                language.preferred,
                tracks.iter().map(|t| t.language_code.as_str()).collect::<Vec<_>>()
            );
            Error::NoTranscriptAvailable(video_id.to_string())
        })?;
        debug!(
            "Using caption track: lang={} generated={}",
            track.language_code,
            track.is_generated()
        );

        // Step 3: Fetch the caption XML
        let caption_url = track.base_url.replace("&fmt=srv3", "");
        let caption_xml = self.get_text(&caption_url).await?;
        let segments = parse_caption_xml(&caption_xml)?;

        if segments.is_empty() {
            return Err(Error::NoTranscriptAvailable(video_id.to_string()));
        }
        info!(
            "Fetched transcript for {video_id}: {} segments ({})",
            segments.len(),
            track.language_code
        );

        Ok(Transcript {
            video_id: video_id.to_string(),
            title,
            language: track.language_code.clone(),
            generated: track.is_generated(),
            segments,
        })
    }
}

fn youtube_error(err: reqwest::Error) -> Error {
    Error::from_reqwest(Service::YouTube, err)
}

/// Pick a caption track: preferred languages in order, uploaded tracks before
/// auto-generated ones, then any track if the policy allows it
fn select_track<'a>(tracks: &'a [CaptionTrack], policy: &LanguagePolicy) -> Option<&'a CaptionTrack> {
    for lang in &policy.preferred {
        let matching: Vec<&CaptionTrack> = tracks
            .iter()
            .filter(|t| t.language_code.eq_ignore_ascii_case(lang))
            .collect();
        if let Some(track) = matching.iter().find(|t| !t.is_generated()).or(matching.first()).copied() {
            return Some(track);
        }
    }

    if !policy.allow_fallback {
        return None;
    }
    tracks.iter().find(|t| !t.is_generated()).or_else(|| tracks.first())
}

fn extract_api_key(html: &str) -> Result<String> {
    let patterns = [r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#, r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#];

    for pattern in patterns {
        let re = Regex::new(pattern)
            .map_err(|e| Error::upstream(Service::YouTube, UpstreamKind::Protocol, e.to_string()))?;
        if let Some(caps) = re.captures(html) {
            return Ok(caps[1].to_string());
        }
    }

    Err(Error::upstream(
        Service::YouTube,
        UpstreamKind::Protocol,
        "could not extract InnerTube API key from watch page",
    ))
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current_start: Option<f64> = None;
    let mut current_dur: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => {
                            start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        b"dur" => {
                            dur = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        _ => {}
                    }
                }
                current_start = start;
                // Final cues sometimes omit dur
                current_dur = dur.or(Some(0.0));
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(start), Some(dur)) = (current_start.take(), current_dur.take()) {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).trim().to_string();
                    if !text.is_empty() {
                        segments.push(Segment {
                            text,
                            start,
                            duration: dur,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::upstream(
                    Service::YouTube,
                    UpstreamKind::Protocol,
                    format!("error parsing caption XML: {e}"),
                ));
            }
            _ => {}
        }
    }

    Ok(segments)
}
