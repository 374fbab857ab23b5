//! # Redraw CLI
//!
//! Asks a multimodal model to draw a prompt as SVG, then repeatedly shows it
//! the rendered drawing and asks it to name the subject and draw it again.
//!
//! Usage:
//!   redraw
//!   redraw --prompt "<description>" --iterations <n>
//!
//! Examples:
//!   redraw
//!   redraw -p "A lighthouse on a rocky island" -n 5 -o out/
//!   redraw --provider openai --model gpt-4o-mini --background white

use clap::{Parser, ValueEnum};
use redraw_agent::{DrawingLoop, LoopConfig, LoopStatus, DEFAULT_ITERATIONS, DEFAULT_PROMPT};
use redraw_core::error::provider_failed;
use redraw_core::{
    parse_color, ErrorKind, FileStore, Provider, ProviderConfig, ProviderType, RasterConfig,
    ResvgRasterizer, Result, SpanExtractor,
};
use std::path::PathBuf;
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "redraw")]
#[command(author, version, about = "Redraw - a model draws, looks at its drawing, and draws it again")]
struct Cli {
    /// Description of the first drawing
    #[arg(short, long, default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Number of identify-and-redraw rounds
    #[arg(short = 'n', long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,

    /// Directory the SVG files are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Model backend
    #[arg(long, value_enum, default_value_t = ProviderArg::Gemini)]
    provider: ProviderArg,

    /// Model name (defaults to the provider's default model)
    #[arg(short, long)]
    model: Option<String>,

    /// Override the provider's API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Per-request timeout in seconds (no timeout by default)
    #[arg(long)]
    timeout: Option<u64>,

    /// Pixels per SVG unit when rendering
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Background painted under the drawing, e.g. "white" or "#ffeedd"
    #[arg(long)]
    background: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderArg {
    Gemini,
    Openai,
    Local,
}

impl From<ProviderArg> for ProviderType {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Gemini => ProviderType::Gemini,
            ProviderArg::Openai => ProviderType::OpenAI,
            ProviderArg::Local => ProviderType::Local,
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
}

/// Provider settings from the environment, adjusted by CLI flags
fn provider_config(cli: &Cli) -> Result<ProviderConfig> {
    let mut config = ProviderConfig::from_env(cli.provider.into())?;
    if let Some(model) = &cli.model {
        config = config.with_model(model);
    }
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(secs);
    }
    Ok(config)
}

fn raster_config(cli: &Cli) -> Result<RasterConfig> {
    let mut config = RasterConfig::default().with_scale(cli.scale);
    if let Some(color) = &cli.background {
        config = config.with_background(parse_color(color)?);
    }
    Ok(config)
}

/// What to tell the user when the provider's credential is missing
fn credential_hint(provider_type: ProviderType) -> Option<String> {
    provider_type
        .credential_env()
        .map(|var| format!("Please set the {} environment variable.", var))
}

async fn run(cli: &Cli, config: ProviderConfig) -> Result<()> {
    let provider_name = format!("{:?}", config.provider_type);
    let provider = Provider::from_config(config)
        .map_err(|e| provider_failed(&provider_name, e).with_operation("cli::run"))?;
    let rasterizer = ResvgRasterizer::new(raster_config(cli)?)?;
    let store = FileStore::new(&cli.output_dir)?;

    let loop_config = LoopConfig {
        model: None,
        temperature: cli.temperature,
    };

    let mut drawing = DrawingLoop::new(provider, rasterizer, SpanExtractor, store).with_config(loop_config);
    let outcome = drawing.run(&cli.prompt, cli.iterations).await?;

    if let LoopStatus::Aborted { iteration } = outcome.status {
        info!("Stopped early at iteration {} of {}", iteration, cli.iterations);
    }
    info!(
        "{} SVG files written to {}",
        outcome.artifacts.len(),
        cli.output_dir.display()
    );
    for (model, usage) in &outcome.usage.by_model {
        info!(
            "{}: {} prompt + {} completion tokens",
            model, usage.prompt_tokens, usage.completion_tokens
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = match provider_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e.message());
            if let Some(hint) = credential_hint(cli.provider.into()) {
                eprintln!("{}", hint);
            }
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, config).await {
        error!("{}", e);
        if e.kind() == ErrorKind::RenderFailed {
            eprintln!("The model's SVG could not be rendered; the files written so far are kept.");
        }
        std::process::exit(1);
    }

    info!("Process complete.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reproduce_reference_run() {
        let cli = Cli::try_parse_from(["redraw"]).unwrap();
        assert_eq!(cli.prompt, "A smiling sun over a green hill");
        assert_eq!(cli.iterations, 3);
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert_eq!(cli.provider, ProviderArg::Gemini);
        assert!(cli.timeout.is_none());
    }

    #[test]
    fn test_missing_credential_hint() {
        assert_eq!(
            credential_hint(ProviderType::Gemini).as_deref(),
            Some("Please set the GOOGLE_API_KEY environment variable.")
        );
        assert_eq!(
            credential_hint(ProviderType::OpenAI).as_deref(),
            Some("Please set the OPENAI_API_KEY environment variable.")
        );
        assert_eq!(credential_hint(ProviderType::Local), None);

        let err = ProviderConfig::from_lookup(ProviderType::Gemini, |_| None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "redraw", "-p", "a boat", "-n", "0", "--provider", "openai", "--scale", "2", "--background", "white",
        ])
        .unwrap();
        assert_eq!(cli.prompt, "a boat");
        assert_eq!(cli.iterations, 0);
        assert_eq!(ProviderType::from(cli.provider), ProviderType::OpenAI);

        let raster = raster_config(&cli).unwrap();
        assert_eq!(raster.scale, 2.0);
        assert_eq!(raster.background, Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_bad_background_is_rejected() {
        let cli = Cli::try_parse_from(["redraw", "--background", "#12"]).unwrap();
        assert_eq!(raster_config(&cli).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["redraw", "-v", "-q"]).is_err());
    }
}
