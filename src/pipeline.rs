use std::sync::Arc;

use log::{info, warn};

use crate::error::{Error, Result};
use crate::summarize::{Summarizer, SummaryOptions};
use crate::youtube::{LanguagePolicy, TranscriptFetcher};
use crate::{Summary, VideoReference};

/// URL in, summary out. Holds no per-request state, so one instance serves every request.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn TranscriptFetcher>,
    summarizer: Arc<dyn Summarizer>,
    language: LanguagePolicy,
}

impl Pipeline {
    pub fn new(fetcher: Arc<dyn TranscriptFetcher>, summarizer: Arc<dyn Summarizer>, language: LanguagePolicy) -> Self {
        Pipeline {
            fetcher,
            summarizer,
            language,
        }
    }

    /// Parse the URL, fetch its transcript and summarize it. Stops at the first failing stage.
    pub async fn run(&self, url: &str, options: &SummaryOptions) -> Result<Summary> {
        let result = self.run_stages(url, options).await;
        if let Err(e) = &result {
            warn!("Request for {:?} failed during {}: {e}", url.trim(), e.stage());
        }
        result
    }

    async fn run_stages(&self, url: &str, options: &SummaryOptions) -> Result<Summary> {
        let video = VideoReference::parse(url)?;
        info!("Parsed video {video}");

        let transcript = self.fetcher.fetch(&video, &self.language).await?;
        if transcript.text().trim().is_empty() {
            return Err(Error::NoTranscriptAvailable(video.id().to_string()));
        }
        info!(
            "Transcript fetched for {video}: lang={} generated={} segments={}",
            transcript.language,
            transcript.generated,
            transcript.segments.len()
        );

        let summary = self.summarizer.summarize(&transcript, options).await?;
        info!("Summarized {video}");
        Ok(summary)
    }
}
