//! CLI for brandgen - branding image generation.

use brandgen::batch::{BatchReport, BatchRunner, Manifest, PRESET_NAMES};
use brandgen::image::providers::{ImageFetcher, API_KEY_ENV};
use brandgen::image::{GenerationRequest, GenerationResult, ImageProvider, ImageSize, Quality};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "brandgen")]
#[command(about = "Generate branding icons and illustrations via the OpenAI images API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// API key (defaults to the OPENAI_API_KEY environment variable)
    #[arg(long, global = true, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Override the image generation endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a single image from a text prompt
    Image(ImageArgs),

    /// Generate every image in a manifest or preset
    Batch(BatchArgs),

    /// List bundled presets
    Presets,
}

#[derive(Args)]
struct ImageArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Image dimensions
    #[arg(short, long, value_enum, default_value = "1024x1024")]
    size: SizeArg,

    /// Rendering quality
    #[arg(short, long, value_enum, default_value = "high")]
    quality: QualityArg,
}

#[derive(Args)]
struct BatchArgs {
    /// Path to a JSON manifest
    #[arg(short, long, conflicts_with = "preset", required_unless_present = "preset")]
    manifest: Option<PathBuf>,

    /// Name of a bundled preset (see `brandgen presets`)
    #[arg(short, long)]
    preset: Option<String>,

    /// Directory the manifest's output paths are resolved against
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Pause between requests in milliseconds (defaults to the manifest value, then 2000)
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SizeArg {
    #[value(name = "1024x1024")]
    Square,
    #[value(name = "1536x1024")]
    Landscape,
    #[value(name = "1024x1536")]
    Portrait,
}

impl From<SizeArg> for ImageSize {
    fn from(arg: SizeArg) -> Self {
        match arg {
            SizeArg::Square => ImageSize::Square,
            SizeArg::Landscape => ImageSize::Landscape,
            SizeArg::Portrait => ImageSize::Portrait,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QualityArg {
    High,
    Standard,
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::High => Quality::High,
            QualityArg::Standard => Quality::Standard,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("brandgen=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Image(ref args) => {
            let fetcher = build_fetcher(&cli)?;
            generate_image(&fetcher, args, cli.json).await?;
        }
        Commands::Batch(ref args) => {
            // Resolve the manifest before touching the credential so a typo
            // in a preset name is reported as such.
            let manifest = load_manifest(args)?;
            let fetcher = build_fetcher(&cli)?;
            run_batch(fetcher, manifest, args, cli.json).await?;
        }
        Commands::Presets => {
            list_presets(cli.json)?;
        }
    }

    Ok(())
}

fn build_fetcher(cli: &Cli) -> anyhow::Result<ImageFetcher> {
    let mut builder = ImageFetcher::builder();
    if let Some(key) = &cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(endpoint) = &cli.endpoint {
        builder = builder.endpoint(endpoint);
    }
    Ok(builder.build()?)
}

fn load_manifest(args: &BatchArgs) -> anyhow::Result<Manifest> {
    let manifest = match (&args.manifest, &args.preset) {
        (Some(path), _) => Manifest::load(path)?,
        (None, Some(name)) => Manifest::preset(name)?,
        (None, None) => anyhow::bail!("either --manifest or --preset is required"),
    };
    Ok(manifest)
}

async fn generate_image(
    fetcher: &ImageFetcher,
    args: &ImageArgs,
    json_output: bool,
) -> anyhow::Result<()> {
    let request = GenerationRequest::new(&args.prompt, &args.output)
        .with_size(args.size.into())
        .with_quality(args.quality.into());

    match fetcher.fetch(&request).await {
        GenerationResult::Success(saved) => {
            if json_output {
                let format = saved.format.map(|f| f.extension());
                let result = serde_json::json!({
                    "type": "image",
                    "success": true,
                    "output": saved.path.display().to_string(),
                    "size_bytes": saved.size_bytes,
                    "format": format,
                    "source": saved.source,
                    "model": fetcher.model(),
                    "duration_ms": saved.duration_ms,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "Generated image: {} ({} bytes) via {}",
                    saved.path.display(),
                    saved.size_bytes,
                    fetcher.name()
                );
                println!("Duration: {}ms", saved.duration_ms);
            }
            Ok(())
        }
        GenerationResult::Failure(failure) => {
            if json_output {
                let result = serde_json::json!({
                    "type": "image",
                    "success": false,
                    "output": args.output.display().to_string(),
                    "reason": failure.reason,
                    "detail": failure.detail,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            anyhow::bail!("image generation failed: {failure}")
        }
    }
}

async fn run_batch(
    fetcher: ImageFetcher,
    manifest: Manifest,
    args: &BatchArgs,
    json_output: bool,
) -> anyhow::Result<()> {
    let delay = args
        .delay_ms
        .map(Duration::from_millis)
        .or_else(|| manifest.delay())
        .unwrap_or(brandgen::batch::DEFAULT_DELAY);

    let jobs = manifest.jobs(&args.root);
    let runner = BatchRunner::new(fetcher).with_delay(delay);
    let report = runner.run(&jobs).await;

    if json_output {
        let result = serde_json::json!({
            "type": "batch",
            "title": manifest.title,
            "total": report.total(),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(manifest.title.as_deref().unwrap_or("Batch"), &report);
    }

    if !report.all_succeeded() {
        anyhow::bail!("{} of {} images failed", report.failed.len(), report.total());
    }
    Ok(())
}

fn print_summary(title: &str, report: &BatchReport) {
    println!("{}", "=".repeat(80));
    println!("{} complete", title);
    println!("{}", "=".repeat(80));
    println!("\nSuccessful: {}", report.succeeded.len());
    println!("Failed: {}", report.failed.len());

    if !report.succeeded.is_empty() {
        println!("\nGenerated:");
        for item in &report.succeeded {
            println!("  ✓ {} -> {}", item.name, item.path.display());
        }
    }

    if !report.failed.is_empty() {
        println!("\nFailed:");
        for item in &report.failed {
            println!("  ✗ {} ({}): {}", item.name, item.reason, item.detail);
        }
    }
}

fn list_presets(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct PresetInfo {
        name: &'static str,
        title: Option<String>,
        output_dir: Option<String>,
        items: usize,
    }

    let presets = PRESET_NAMES
        .iter()
        .map(|&name| -> brandgen::Result<PresetInfo> {
            let manifest = Manifest::preset(name)?;
            Ok(PresetInfo {
                name,
                title: manifest.title.clone(),
                output_dir: manifest.output_dir.as_ref().map(|d| d.display().to_string()),
                items: manifest.len(),
            })
        })
        .collect::<brandgen::Result<Vec<_>>>()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&presets)?);
    } else {
        println!("Available presets:\n");
        for p in &presets {
            println!(
                "  {} - {} ({} images)",
                p.name,
                p.title.as_deref().unwrap_or("untitled"),
                p.items
            );
            if let Some(dir) = &p.output_dir {
                println!("    Output: {}", dir);
            }
        }
    }

    Ok(())
}
