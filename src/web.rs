use axum::{
    Form, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use log::info;
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::Summary;
use crate::output::{MD_FILE_NAME, TXT_FILE_NAME, render_markdown, render_txt};
use crate::pipeline::Pipeline;
use crate::summarize::{MAX_WORDS, MIN_WORDS, SummaryOptions};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    /// Initial values of the length and creativity inputs
    pub defaults: SummaryOptions,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeForm {
    #[serde(default)]
    pub url: String,
    pub max_words: Option<String>,
    pub temperature: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    pub summary: String,
}

enum Outcome {
    Empty,
    Warning(String),
    Failed(String),
    Done(Summary),
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/summarize", post(summarize))
        .route("/download/{format}", post(download))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn run_server(router: Router, bind_addr: &str) -> eyre::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}

async fn index(State(state): State<AppState>) -> Html<String> {
    render_page("", &state.defaults, &Outcome::Empty)
}

async fn health() -> &'static str {
    "ok"
}

async fn summarize(State(state): State<AppState>, Form(form): Form<SummarizeForm>) -> (StatusCode, Html<String>) {
    let options = form_options(&form, &state.defaults);
    let url = form.url.trim();

    if url.is_empty() {
        let outcome = Outcome::Warning("Please enter a YouTube URL".to_string());
        return (StatusCode::UNPROCESSABLE_ENTITY, render_page(url, &options, &outcome));
    }

    match state.pipeline.run(url, &options).await {
        Ok(summary) => (StatusCode::OK, render_page(url, &options, &Outcome::Done(summary))),
        Err(e) => {
            let status = if e.is_user_error() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::BAD_GATEWAY
            };
            (status, render_page(url, &options, &Outcome::Failed(e.user_message())))
        }
    }
}

async fn download(Path(format): Path<String>, Form(form): Form<DownloadForm>) -> Response {
    let summary = Summary {
        video_id: String::new(),
        text: form.summary,
    };
    let (body, mime, file_name) = match format.as_str() {
        "txt" => (render_txt(&summary), "text/plain; charset=utf-8", TXT_FILE_NAME),
        "md" => (render_markdown(&summary), "text/markdown; charset=utf-8", MD_FILE_NAME),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        body,
    )
        .into_response()
}

/// Length and creativity from the form; missing or unparsable fields use the defaults
fn form_options(form: &SummarizeForm, defaults: &SummaryOptions) -> SummaryOptions {
    let max_words = form
        .max_words
        .as_deref()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(defaults.max_words);
    let temperature = form
        .temperature
        .as_deref()
        .and_then(|v| v.trim().parse::<f32>().ok())
        .unwrap_or(defaults.temperature);
    SummaryOptions::new(max_words, temperature)
}

fn render_page(url: &str, options: &SummaryOptions, outcome: &Outcome) -> Html<String> {
    let result = match outcome {
        Outcome::Empty => String::new(),
        Outcome::Warning(msg) => format!(r#"<p class="warning">{}</p>"#, encode_text(msg)),
        Outcome::Failed(msg) => format!(r#"<p class="error">{}</p>"#, encode_text(msg)),
        Outcome::Done(summary) => {
            let attr = encode_double_quoted_attribute(&summary.text);
            format!(
                r#"<p class="success">Summary generated successfully!</p>
<hr>
<h2>Summary</h2>
<pre class="summary">{text}</pre>
<div class="downloads">
<form method="post" action="/download/txt"><input type="hidden" name="summary" value="{attr}"><button type="submit">Download as TXT</button></form>
<form method="post" action="/download/md"><input type="hidden" name="summary" value="{attr}"><button type="submit">Download as MD</button></form>
</div>"#,
                text = encode_text(&summary.text),
            )
        }
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>YouTube AI Summarizer</title>
<style>
body {{ font-family: sans-serif; max-width: 46rem; margin: 2rem auto; padding: 0 1rem; }}
input[type=text] {{ width: 100%; }}
pre.summary {{ white-space: pre-wrap; background: #f6f6f6; padding: 1rem; }}
.warning {{ color: #8a6d00; }} .error {{ color: #b00020; }} .success {{ color: #1b7f3a; }}
.downloads form {{ display: inline-block; margin-right: 1rem; }}
</style>
</head>
<body>
<h1>YouTube AI Summarizer</h1>
<p>Generate concise summaries from YouTube video transcripts</p>
<form method="post" action="/summarize">
<label for="url">Enter YouTube URL:</label>
<input type="text" id="url" name="url" value="{url}" placeholder="https://www.youtube.com/watch?v=..." title="Paste any public YouTube video link">
<label for="max_words">Max summary length (words)</label>
<input type="number" id="max_words" name="max_words" min="{min}" max="{max}" step="10" value="{max_words}">
<label for="temperature">Creativity level</label>
<input type="number" id="temperature" name="temperature" min="0" max="1" step="0.05" value="{temperature}">
<button type="submit">Generate Summary</button>
</form>
{result}
<hr>
<p><small>Note: Requires videos with available transcripts. Some content may be filtered by safety systems.</small></p>
</body>
</html>
"#,
        url = encode_double_quoted_attribute(url),
        min = MIN_WORDS,
        max = MAX_WORDS,
        max_words = options.max_words,
        temperature = options.temperature,
    ))
}
