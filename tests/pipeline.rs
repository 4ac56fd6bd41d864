mod mocks;

use std::sync::Arc;

use mocks::{fetcher::MockFetcher, summarizer::MockSummarizer};
use ytsum::pipeline::Pipeline;
use ytsum::summarize::SummaryOptions;
use ytsum::youtube::LanguagePolicy;
use ytsum::{Error, Stage, UpstreamKind};

fn build_pipeline(fetcher: MockFetcher, summarizer: MockSummarizer) -> Pipeline {
    Pipeline::new(Arc::new(fetcher), Arc::new(summarizer), LanguagePolicy::default())
}

// ─── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_watch_url_produces_summary() {
    let fetcher = MockFetcher::new("Today we talk about ownership and borrowing.");
    let summarizer = MockSummarizer::new("## Main topic\nOwnership in Rust.");
    let fetch_calls = fetcher.calls.clone();
    let summarize_calls = summarizer.calls.clone();

    let pipeline = build_pipeline(fetcher, summarizer);
    let summary = pipeline
        .run("https://www.youtube.com/watch?v=abc123XYZ0", &SummaryOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.video_id, "abc123XYZ0");
    assert!(!summary.text.is_empty());
    assert_eq!(*fetch_calls.lock().unwrap(), vec!["abc123XYZ0".to_string()]);

    let summarize_calls = summarize_calls.lock().unwrap();
    assert_eq!(summarize_calls.len(), 1, "summarizer must be called exactly once");
    assert_eq!(summarize_calls[0].0, "Today we talk about ownership and borrowing.");
}

#[tokio::test]
async fn test_short_link_resolves_to_same_video() {
    let fetcher = MockFetcher::new("transcript");
    let fetch_calls = fetcher.calls.clone();
    let pipeline = build_pipeline(fetcher, MockSummarizer::new("summary"));

    pipeline
        .run("https://www.youtube.com/watch?v=abc123XYZ0", &SummaryOptions::default())
        .await
        .unwrap();
    pipeline
        .run("https://youtu.be/abc123XYZ0", &SummaryOptions::default())
        .await
        .unwrap();

    let calls = fetch_calls.lock().unwrap();
    assert_eq!(calls[0], calls[1]);
}

#[tokio::test]
async fn test_options_reach_summarizer() {
    let summarizer = MockSummarizer::new("summary");
    let calls = summarizer.calls.clone();
    let pipeline = build_pipeline(MockFetcher::new("text"), summarizer);

    let options = SummaryOptions::new(400, 0.8);
    pipeline.run("https://youtu.be/abc123XYZ0", &options).await.unwrap();

    assert_eq!(calls.lock().unwrap()[0].1, options);
}

#[tokio::test]
async fn test_repeated_requests_are_not_cached() {
    let fetcher = MockFetcher::new("transcript");
    let summarizer = MockSummarizer::new("summary");
    let fetch_calls = fetcher.calls.clone();
    let summarize_calls = summarizer.calls.clone();
    let pipeline = build_pipeline(fetcher, summarizer);

    for _ in 0..2 {
        pipeline
            .run("https://youtu.be/abc123XYZ0", &SummaryOptions::default())
            .await
            .unwrap();
    }

    assert_eq!(fetch_calls.lock().unwrap().len(), 2);
    assert_eq!(summarize_calls.lock().unwrap().len(), 2);
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_url_makes_no_calls() {
    let fetcher = MockFetcher::new("transcript");
    let summarizer = MockSummarizer::new("summary");
    let fetch_calls = fetcher.calls.clone();
    let summarize_calls = summarizer.calls.clone();
    let pipeline = build_pipeline(fetcher, summarizer);

    for input in ["not a url", "", "https://www.youtube.com/playlist?list=PL123"] {
        let err = pipeline.run(input, &SummaryOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)), "{input}: {err}");
        assert_eq!(err.stage(), Stage::Parse);
    }

    assert!(fetch_calls.lock().unwrap().is_empty());
    assert!(summarize_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_no_transcript_skips_summarizer() {
    let summarizer = MockSummarizer::new("summary");
    let summarize_calls = summarizer.calls.clone();
    let pipeline = build_pipeline(
        MockFetcher::failing(|id| Error::NoTranscriptAvailable(id.to_string())),
        summarizer,
    );

    let err = pipeline
        .run("https://youtu.be/abc123XYZ0", &SummaryOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoTranscriptAvailable(ref id) if id == "abc123XYZ0"));
    assert!(summarize_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_transcript_skips_summarizer() {
    let summarizer = MockSummarizer::new("summary of nothing");
    let summarize_calls = summarizer.calls.clone();
    let pipeline = build_pipeline(MockFetcher::new("   "), summarizer);

    let err = pipeline
        .run("https://youtu.be/abc123XYZ0", &SummaryOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoTranscriptAvailable(ref id) if id == "abc123XYZ0"));
    assert_eq!(err.stage(), Stage::FetchTranscript);
    assert!(summarize_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_transcripts_disabled_skips_summarizer() {
    let summarizer = MockSummarizer::new("summary");
    let summarize_calls = summarizer.calls.clone();
    let pipeline = build_pipeline(
        MockFetcher::failing(|id| Error::TranscriptsDisabled(id.to_string())),
        summarizer,
    );

    let err = pipeline
        .run("https://www.youtube.com/watch?v=abc123XYZ0", &SummaryOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TranscriptsDisabled(_)));
    assert_eq!(err.stage(), Stage::FetchTranscript);
    assert!(summarize_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_auth_failure_is_upstream_error_without_retry() {
    let summarizer = MockSummarizer::failing(UpstreamKind::Authentication);
    let summarize_calls = summarizer.calls.clone();
    let pipeline = build_pipeline(MockFetcher::new("transcript"), summarizer);

    let err = pipeline
        .run("https://www.youtube.com/watch?v=abc123XYZ0", &SummaryOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Upstream {
            kind: UpstreamKind::Authentication,
            ..
        }
    ));
    assert_eq!(err.stage(), Stage::Summarize);
    assert_eq!(summarize_calls.lock().unwrap().len(), 1, "no automatic retry");
}
