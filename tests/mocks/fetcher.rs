use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ytsum::youtube::{LanguagePolicy, TranscriptFetcher};
use ytsum::{Error, Segment, Transcript, VideoReference};

type ErrorFactory = Arc<dyn Fn(&str) -> Error + Send + Sync>;

#[derive(Clone)]
pub struct MockFetcher {
    pub text: String,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<ErrorFactory>,
}

impl MockFetcher {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(make: impl Fn(&str) -> Error + Send + Sync + 'static) -> Self {
        Self {
            text: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(Arc::new(make)),
        }
    }
}

#[async_trait]
impl TranscriptFetcher for MockFetcher {
    async fn fetch(&self, video: &VideoReference, _language: &LanguagePolicy) -> Result<Transcript, Error> {
        self.calls.lock().unwrap().push(video.id().to_string());
        if let Some(make) = &self.fail_with {
            return Err(make(video.id()));
        }
        Ok(Transcript {
            video_id: video.id().to_string(),
            title: "Mock video".to_string(),
            language: "en".to_string(),
            generated: true,
            segments: vec![Segment {
                text: self.text.clone(),
                start: 0.0,
                duration: 5.0,
            }],
        })
    }
}
