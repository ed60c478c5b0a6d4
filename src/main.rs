use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use bookforge::console::ConsoleInteraction;
use bookforge::output::{EpubSink, MultiSink, TextFileSink, overwrite_allowed};
use bookforge::services::llm::GeminiClient;
use bookforge::utils::output_stem;
use bookforge::{
    ApiKey, ApiTier, AppConfig, BookSpec, GenerationSession, Interrupt, OutputFormat,
    SessionOptions,
};

/// Generate a book outline and its chapters with the Gemini API.
#[derive(Debug, Parser)]
#[command(name = "bookforge", version)]
struct Cli {
    /// TOML file describing the book.
    book: PathBuf,

    /// Configuration file.
    #[arg(long, default_value = "bookforge.toml")]
    config: PathBuf,

    /// API tier; decides the pause between calls.
    #[arg(long, value_enum, default_value_t = ApiTier::Free)]
    tier: ApiTier,

    /// Output formats, comma separated. Defaults to the configured formats.
    #[arg(long, value_enum, value_delimiter = ',')]
    format: Vec<OutputFormat>,

    /// Output directory. Defaults to the configured directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Model name override.
    #[arg(long)]
    model: Option<String>,

    /// Regenerate units that come back well under their word target.
    #[arg(long)]
    regen_low_words: bool,

    /// Never prompt; every question is answered "no".
    #[arg(long)]
    unattended: bool,

    /// Overwrite existing output files without asking.
    #[arg(long)]
    force: bool,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(Some(cli.config.as_path()))?;
    if let Some(model) = cli.model {
        config.api.model = model;
    }

    let book_text = std::fs::read_to_string(&cli.book)
        .with_context(|| format!("failed to read book file {}", cli.book.display()))?;
    let book: BookSpec = toml::from_str(&book_text)
        .with_context(|| format!("failed to parse book file {}", cli.book.display()))?;

    let key = ApiKey::new(cli.api_key);
    if !key.looks_valid() {
        tracing::warn!("API key does not look like a Google AI key, continuing anyway");
    }

    let client = GeminiClient::new(config.api.clone())?;

    let formats = if cli.format.is_empty() {
        config.output.formats.clone()
    } else {
        cli.format
    };
    let out_dir = cli.out.unwrap_or_else(|| config.output.dir.clone());
    let stem = output_stem(&book.title);
    let targets: Vec<(OutputFormat, PathBuf)> = formats
        .iter()
        .map(|format| {
            let extension = match format {
                OutputFormat::Txt => "txt",
                OutputFormat::Epub => "epub",
            };
            (*format, out_dir.join(format!("{stem}.{extension}")))
        })
        .collect();
    if targets.is_empty() {
        anyhow::bail!("no output format selected");
    }

    let mut interaction = ConsoleInteraction::new(cli.unattended);
    let paths: Vec<PathBuf> = targets.iter().map(|(_, path)| path.clone()).collect();
    if !overwrite_allowed(&paths, cli.force, &mut interaction).await {
        anyhow::bail!("output already exists, generation cancelled (use --force to overwrite)");
    }

    let mut sink = MultiSink::new();
    for (format, path) in targets {
        match format {
            OutputFormat::Txt => {
                tracing::info!("TXT output: {}", path.display());
                sink.push(Box::new(TextFileSink::new(path)));
            }
            OutputFormat::Epub => {
                tracing::info!("EPUB output: {}", path.display());
                sink.push(Box::new(EpubSink::new(path, book.title.clone())));
            }
        }
    }

    let interrupt = Interrupt::new();
    {
        let interrupt = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping before the next unit");
                interrupt.trigger();
            }
        });
    }

    let options = SessionOptions {
        tier: cli.tier,
        regen_on_low_words: cli.regen_low_words,
    };
    let mut session = GenerationSession::new(book, config.generation.clone(), options, key)?;
    tracing::info!(session_id = %session.id(), "Session created");

    let report = session
        .run(&client, &mut interaction, &mut sink, &interrupt)
        .await
        .context("book generation failed")?;

    if report.interrupted {
        tracing::warn!("Partial output saved under {}", out_dir.display());
    } else {
        tracing::info!("Output saved under {}", out_dir.display());
        tracing::info!(
            "Review the generated text for flow and consistency; manual editing will likely be needed"
        );
    }
    Ok(())
}
