use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{Result, WrapErr};
use log::{debug, info};

mod cli;

use cli::Cli;
use ytsum::config::{Config, Settings};
use ytsum::pipeline::Pipeline;
use ytsum::summarize::GeminiSummarizer;
use ytsum::web::{AppState, build_router, run_server};
use ytsum::youtube::YouTubeTranscripts;

const LOG_FILTER_VAR: &str = "RUST_LOG";

/// Load `.env` into the process environment; `path` overrides the default lookup
fn load_dotenv(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(p) => dotenvy::from_path(p).ok().map(|_| p.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

fn logger_builder(filter_var: &str) -> env_logger::Builder {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(filter_var, "info"))
}

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    logger_builder(LOG_FILTER_VAR)
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytsum")
        .join("logs")
}

fn build_after_help() -> String {
    let log_path = log_dir().join("ytsum.log");
    let config_path = ytsum::config::config_path();

    format!(
        "\nENVIRONMENT:\n  {}  Gemini API key (required; also read from .env)\n\nConfig file: {}\nLogs are written to: {}",
        ytsum::config::API_KEY_VAR,
        config_path.display(),
        log_path.display()
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env may carry RUST_LOG, so it has to be loaded before the logger reads it
    let dotenv_path = load_dotenv(None);
    setup_logging()?;
    if let Some(path) = dotenv_path {
        debug!("Loaded environment from {}", path.display());
    }

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    let config = Config::load().wrap_err("failed to load config file")?;
    let settings = Settings::from_env(config, cli.overrides())?;

    if cli.verbose {
        let config_path = ytsum::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!(
            "Model: {}\nLanguages: {} (fallback: {})\nDefaults: {} words, temperature {}",
            settings.model,
            settings.language.preferred.join(","),
            settings.language.allow_fallback,
            settings.defaults.max_words,
            settings.defaults.temperature,
        );
    }

    let client = reqwest::Client::builder().timeout(settings.timeout).build()?;
    let summarizer = GeminiSummarizer::new(
        client.clone(),
        settings.api_key.clone(),
        settings.model.clone(),
        settings.gemini_endpoint.clone(),
    );

    if cli.list_models {
        for model in summarizer.list_models().await? {
            println!("- {}", model.name);
        }
        return Ok(());
    }

    let pipeline = Pipeline::new(
        Arc::new(YouTubeTranscripts::new(client)),
        Arc::new(summarizer),
        settings.language.clone(),
    );
    let router = build_router(AppState {
        pipeline,
        defaults: settings.defaults,
    });

    info!("Serving YouTube AI Summarizer with model {}", settings.model);
    eprintln!("Listening on http://{}", settings.bind);
    run_server(router, &settings.bind).await
}
