use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ytsum::summarize::{Summarizer, SummaryOptions};
use ytsum::{Error, Service, Summary, Transcript, UpstreamKind};

#[derive(Clone)]
pub struct MockSummarizer {
    pub summary: String,
    pub calls: Arc<Mutex<Vec<(String, SummaryOptions)>>>,
    pub fail_with: Option<UpstreamKind>,
}

impl MockSummarizer {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(kind: UpstreamKind) -> Self {
        Self {
            summary: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(kind),
        }
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, transcript: &Transcript, options: &SummaryOptions) -> Result<Summary, Error> {
        self.calls.lock().unwrap().push((transcript.text(), *options));
        if let Some(kind) = self.fail_with {
            return Err(Error::upstream(Service::Gemini, kind, "mock failure"));
        }
        Ok(Summary {
            video_id: transcript.video_id.clone(),
            text: self.summary.clone(),
        })
    }
}
