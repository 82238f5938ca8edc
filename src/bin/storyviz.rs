//! CLI for StoryViz - story illustrations.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use storyviz::config::{
    ENV_CUSTOM_IMAGE_API_KEY, ENV_CUSTOM_IMAGE_MODEL, ENV_GEMINI_API_KEY, ENV_USE_CLIPDROP,
};
use storyviz::{
    provider_chain, select_provider, FallbackRenderer, ImagePipeline, ImageRequest, Language,
    ProviderConfig, ProviderKind, RenderSpec,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "storyviz")]
#[command(about = "Illustrate a story via image APIs (Clipdrop, Hugging Face, Gemini) or a local renderer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce an illustration for a story
    Render(RenderArgs),

    /// Show the resolved provider chain
    Providers,
}

#[derive(Args)]
struct RenderArgs {
    /// Story title
    #[arg(short, long, default_value = "")]
    title: String,

    /// Story body text
    #[arg(short, long, conflicts_with = "body_file", required_unless_present = "body_file")]
    body: Option<String>,

    /// Read the story body from a file
    #[arg(long)]
    body_file: Option<PathBuf>,

    /// Story language
    #[arg(short, long, value_enum, default_value = "ar")]
    language: LanguageArg,

    /// Output file path (.png or .jpg)
    #[arg(short, long)]
    output: PathBuf,

    /// Skip the providers and render locally
    #[arg(long)]
    offline: bool,

    /// Font file for Latin text
    #[arg(long)]
    latin_font: Option<PathBuf>,

    /// Font file for Arabic text
    #[arg(long)]
    arabic_font: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LanguageArg {
    Ar,
    En,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Ar => Language::Ar,
            LanguageArg::En => Language::En,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("storyviz=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => {
            render(args, cli.json).await?;
        }
        Commands::Providers => {
            list_providers(cli.json)?;
        }
    }

    Ok(())
}

async fn render(args: RenderArgs, json_output: bool) -> anyhow::Result<()> {
    let body = match (args.body, &args.body_file) {
        (Some(body), _) => body,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => anyhow::bail!("one of --body or --body-file is required"),
    };
    let request = ImageRequest::new(args.title, body, args.language.into())?;

    let mut spec = RenderSpec::from_env();
    if let Some(path) = args.latin_font {
        spec = spec.with_latin_font(path);
    }
    if let Some(path) = args.arabic_font {
        spec = spec.with_arabic_font(path);
    }
    let renderer = FallbackRenderer::new(spec)?;

    let config = if args.offline {
        ProviderConfig::default()
    } else {
        ProviderConfig::from_env()
    };
    let pipeline = ImagePipeline::with_renderer(&config, renderer)?;
    let acquisition = pipeline.acquire_detailed(&request).await;
    let image = &acquisition.image;

    // Honour the requested extension, not the source format.
    let mut output = image.clone();
    if let Some(format) = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .and_then(format_for_extension)
    {
        output.format = format;
    }
    output.save(&args.output)?;

    if json_output {
        let failures: Vec<_> = acquisition
            .failures
            .iter()
            .map(|(kind, err)| {
                serde_json::json!({
                    "provider": kind,
                    "kind": format!("{:?}", err.kind()),
                    "status": err.status(),
                    "error": err.to_string(),
                })
            })
            .collect();
        let result = serde_json::json!({
            "type": "image",
            "success": true,
            "output": args.output.display().to_string(),
            "width": image.width(),
            "height": image.height(),
            "format": output.format.extension(),
            "source": acquisition.source,
            "failures": failures,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated image: {} ({}x{}) via {}",
            args.output.display(),
            image.width(),
            image.height(),
            acquisition.source.display_name()
        );
        for (kind, err) in &acquisition.failures {
            println!("  {} failed: {}", kind.display_name(), err);
        }
    }

    Ok(())
}

fn format_for_extension(ext: &str) -> Option<storyviz::ImageFormat> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some(storyviz::ImageFormat::Png),
        "jpg" | "jpeg" => Some(storyviz::ImageFormat::Jpeg),
        _ => None,
    }
}

fn list_providers(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ProviderInfo {
        name: &'static str,
        kind: ProviderKind,
        env_vars: &'static [&'static str],
        configured: bool,
    }

    const CLIPDROP_VARS: &[&str] = &[ENV_USE_CLIPDROP, ENV_CUSTOM_IMAGE_API_KEY];
    const GENERIC_VARS: &[&str] = &[ENV_CUSTOM_IMAGE_API_KEY, ENV_CUSTOM_IMAGE_MODEL];
    const GEMINI_VARS: &[&str] = &[ENV_GEMINI_API_KEY];
    const NO_VARS: &[&str] = &[];

    let config = ProviderConfig::from_env();
    let chain = provider_chain(&config);
    let providers = [
        (ProviderKind::Clipdrop, CLIPDROP_VARS),
        (ProviderKind::GenericModel, GENERIC_VARS),
        (ProviderKind::Gemini, GEMINI_VARS),
        (ProviderKind::Fallback, NO_VARS),
    ]
    .into_iter()
    .map(|(kind, env_vars)| ProviderInfo {
        name: kind.display_name(),
        kind,
        env_vars,
        configured: kind == ProviderKind::Fallback || chain.contains(&kind),
    })
    .collect::<Vec<_>>();

    if json_output {
        let result = serde_json::json!({
            "selected": select_provider(&config),
            "chain": chain,
            "providers": providers,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Providers (in priority order):\n");
        for p in &providers {
            let status = if p.configured { "✓" } else { "✗" };
            let vars = if p.env_vars.is_empty() {
                "always available".to_string()
            } else {
                p.env_vars.join(" + ")
            };
            println!("  {} {:<16} ({})", status, p.name, vars);
        }
        println!("\nSelected: {}", select_provider(&config).display_name());
    }

    Ok(())
}
