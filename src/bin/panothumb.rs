use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "panothumb", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch an equirectangular image over HTTP and write its thumbnail.
    Url(UrlArgs),
    /// Reproject a local equirectangular image file.
    File(FileArgs),
}

#[derive(Args, Debug)]
struct UrlArgs {
    /// Source image URL.
    url: String,

    /// Previously seen ETag; nothing is rendered if the source still carries it.
    #[arg(long)]
    etag: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct FileArgs {
    /// Source image path.
    path: PathBuf,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Output path.
    #[arg(long)]
    out: PathBuf,

    /// JSON thumbnail config; defaults apply to missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the output format.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// JPEG quality (1-100), used with `--format jpeg` or a JPEG config.
    #[arg(long)]
    quality: Option<u8>,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Disable row parallelism.
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Jpeg,
    Webp,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Url(args) => cmd_url(args).await,
        Command::File(args) => cmd_file(args).await,
    }
}

async fn cmd_url(args: UrlArgs) -> anyhow::Result<()> {
    let config = load_config(&args.render)?;
    let transport =
        panothumb::ReqwestTransport::with_timeout(Duration::from_secs(args.timeout_secs))?;
    let thumbnailer = panothumb::Thumbnailer::new(transport, config)?;

    match thumbnailer
        .thumbnail(&args.url, args.etag.as_deref())
        .await
        .with_context(|| format!("thumbnail for '{}'", args.url))?
    {
        panothumb::ThumbnailOutcome::Fresh { image, etag } => {
            write_output(&args.render.out, &image.bytes)?;
            eprintln!(
                "wrote {} ({}, etag {})",
                args.render.out.display(),
                image.content_type(),
                etag.as_deref().unwrap_or("-")
            );
        }
        panothumb::ThumbnailOutcome::Unchanged { etag } => {
            eprintln!(
                "source unchanged (etag {}); nothing written",
                etag.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

async fn cmd_file(args: FileArgs) -> anyhow::Result<()> {
    let config = load_config(&args.render)?;
    let bytes = std::fs::read(&args.path)
        .with_context(|| format!("read source image '{}'", args.path.display()))?;

    let image = tokio::task::spawn_blocking(move || {
        let source = panothumb::decode_image(&bytes)?;
        panothumb::render_thumbnail(&source, &config)
    })
    .await
    .context("render task")??;

    write_output(&args.render.out, &image.bytes)?;
    eprintln!(
        "wrote {} ({})",
        args.render.out.display(),
        image.content_type()
    );
    Ok(())
}

fn load_config(args: &RenderArgs) -> anyhow::Result<panothumb::ThumbnailConfig> {
    let mut config = match &args.config {
        Some(path) => panothumb::ThumbnailConfig::from_path(path)?,
        None => panothumb::ThumbnailConfig::default(),
    };

    match args.format {
        Some(FormatArg::Webp) => config.format = panothumb::OutputFormat::WebpLossless,
        Some(FormatArg::Jpeg) => {
            if !matches!(config.format, panothumb::OutputFormat::Jpeg { .. }) {
                config.format = panothumb::OutputFormat::default();
            }
        }
        None => {}
    }
    if let Some(q) = args.quality {
        match &mut config.format {
            panothumb::OutputFormat::Jpeg { quality, .. } => *quality = q,
            panothumb::OutputFormat::WebpLossless => {
                anyhow::bail!("--quality only applies to jpeg output")
            }
        }
    }

    if args.threads.is_some() {
        config.threading.threads = args.threads;
    }
    if args.sequential {
        config.threading.parallel = false;
    }
    config.validate()?;
    Ok(config)
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write output '{}'", path.display()))
}
