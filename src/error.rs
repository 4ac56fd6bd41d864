use std::fmt;

use thiserror::Error;

/// Which external service an upstream failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    YouTube,
    Gemini,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::YouTube => write!(f, "YouTube"),
            Service::Gemini => write!(f, "Gemini"),
        }
    }
}

/// Category of an upstream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    Network,
    Authentication,
    RateLimited,
    InputTooLarge,
    Http(u16),
    /// The service answered, but not in a shape we understand
    Protocol,
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamKind::Network => write!(f, "network failure"),
            UpstreamKind::Authentication => write!(f, "authentication failed"),
            UpstreamKind::RateLimited => write!(f, "rate limit or quota exceeded"),
            UpstreamKind::InputTooLarge => write!(f, "input too large"),
            UpstreamKind::Http(status) => write!(f, "HTTP {status}"),
            UpstreamKind::Protocol => write!(f, "unexpected response"),
        }
    }
}

/// Stage of a summarize request, used to tell the user where it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Startup,
    Parse,
    FetchTranscript,
    Summarize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Startup => write!(f, "startup"),
            Stage::Parse => write!(f, "URL parsing"),
            Stage::FetchTranscript => write!(f, "transcript fetch"),
            Stage::Summarize => write!(f, "summarization"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("no transcript available for video {0}")]
    NoTranscriptAvailable(String),

    #[error("transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("video {video_id} is unavailable: {reason}")]
    VideoUnavailable { video_id: String, reason: String },

    #[error("summarization failed: {0}")]
    SummarizationFailed(String),

    #[error("{service} {kind}: {message}")]
    Upstream {
        service: Service,
        kind: UpstreamKind,
        message: String,
    },

    #[error("missing configuration: {0}")]
    MissingConfiguration(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn upstream(service: Service, kind: UpstreamKind, message: impl Into<String>) -> Self {
        Error::Upstream {
            service,
            kind,
            message: message.into(),
        }
    }

    /// Translate a transport-level reqwest failure
    pub fn from_reqwest(service: Service, err: reqwest::Error) -> Self {
        let kind = match err.status() {
            Some(status) if status.as_u16() == 429 => UpstreamKind::RateLimited,
            Some(status) => UpstreamKind::Http(status.as_u16()),
            None if err.is_decode() => UpstreamKind::Protocol,
            None => UpstreamKind::Network,
        };
        Error::upstream(service, kind, err.to_string())
    }

    pub fn stage(&self) -> Stage {
        match self {
            Error::InvalidUrl(_) => Stage::Parse,
            Error::NoTranscriptAvailable(_) | Error::TranscriptsDisabled(_) | Error::VideoUnavailable { .. } => {
                Stage::FetchTranscript
            }
            Error::SummarizationFailed(_) => Stage::Summarize,
            Error::Upstream { service, .. } => match service {
                Service::YouTube => Stage::FetchTranscript,
                Service::Gemini => Stage::Summarize,
            },
            Error::MissingConfiguration(_) => Stage::Startup,
        }
    }

    /// True when the failure is caused by what the user submitted rather than an upstream service
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_)
                | Error::NoTranscriptAvailable(_)
                | Error::TranscriptsDisabled(_)
                | Error::VideoUnavailable { .. }
        )
    }

    /// Short message shown on the web page
    pub fn user_message(&self) -> String {
        let detail = match self {
            Error::InvalidUrl(_) => "Invalid YouTube URL format".to_string(),
            Error::NoTranscriptAvailable(_) => "No transcripts found for this video".to_string(),
            Error::TranscriptsDisabled(_) => "Transcripts are disabled for this video".to_string(),
            Error::VideoUnavailable { reason, .. } => format!("Video is unavailable ({reason})"),
            Error::SummarizationFailed(msg) => format!("The model did not produce a summary: {msg}"),
            Error::Upstream { service, kind, .. } => format!("{service} request failed: {kind}"),
            Error::MissingConfiguration(msg) => msg.clone(),
        };
        format!("{} failed: {detail}", capitalize(&self.stage().to_string()))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
