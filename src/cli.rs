use clap::Parser;

use ytsum::config::Overrides;

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "Summarize YouTube videos from their transcripts",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Address for the web form [default: 127.0.0.1:8501]
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Preferred caption language, may be repeated [default: en]
    #[arg(short, long = "lang")]
    pub langs: Vec<String>,

    /// Fail instead of using another language when no preferred caption exists
    #[arg(long)]
    pub no_lang_fallback: bool,

    /// Gemini model for summarization [default: gemini-1.5-pro-latest]
    #[arg(short, long)]
    pub model: Option<String>,

    /// List the models available to the API key and exit
    #[arg(long)]
    pub list_models: bool,

    /// Print resolved settings to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            bind: self.bind.clone(),
            languages: self.langs.clone(),
            no_language_fallback: self.no_lang_fallback,
            model: self.model.clone(),
        }
    }
}
