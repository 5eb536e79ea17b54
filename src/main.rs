use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reel_compositor::{
    build_video,
    config::{AppConfig, RenderConfig},
    error::{CompositorError, ConfigError, FetchError},
    fetch::{
        fetch_images, LocationClient, Provider, WebImageFetcher, DEFAULT_LOCATION_ENDPOINT,
        DEFAULT_MAX_IMAGES,
    },
    paths::{resolve_output_path, resolve_relative},
    schedule::fetch_missing_images,
    CompositionEngine,
};

const DEFAULT_IMAGES_DIR: &str = "assets/images";
const DEFAULT_RENDERS_DIR: &str = "outputs/renders";
const DEFAULT_OUTPUT: &str = "outputs/renders/render.mp4";

#[derive(Parser)]
#[command(
    name = "reel-compositor",
    version,
    about = "Turn folders of images into vertical slideshow videos",
    long_about = "Reel-Compositor fetches images for a place or keyword and renders them into a cover-cropped slideshow with fades and optional background music."
)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "config.ini")]
    config: PathBuf,

    /// Directory relative paths are resolved against (default: current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download images for a search query
    Fetch {
        query: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Folder name under the output base (default: the query made filesystem-safe)
        #[arg(long)]
        output_dir_name: Option<String>,
    },

    /// Render a slideshow from a folder of images
    Render {
        #[arg(long, default_value = DEFAULT_IMAGES_DIR)]
        input_dir: PathBuf,

        /// Output file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: RenderOverrides,
    },

    /// Download images for a keyword and render them
    FetchAndRender {
        /// Keyword and folder name
        name: String,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        overrides: RenderOverrides,
    },

    /// Fetch images for schedule rows that do not have them yet
    FetchMissing {
        #[arg(long, default_value = "schedule.csv")]
        csv: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Render a random location from the content server
    RandomLocation {
        /// Override the server base URL from the configuration
        #[arg(long)]
        base_url: Option<String>,

        #[arg(long, default_value = DEFAULT_LOCATION_ENDPOINT)]
        endpoint: String,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Image search provider (bing, google, baidu)
    #[arg(long, default_value = "bing", value_parser = parse_provider)]
    provider: Provider,

    /// Maximum number of images to download per query
    #[arg(long, default_value_t = DEFAULT_MAX_IMAGES)]
    max_num: usize,

    /// Base directory for downloaded images
    #[arg(long, default_value = DEFAULT_IMAGES_DIR)]
    output_base: PathBuf,
}

/// Command-line values that take precedence over the configuration file
#[derive(Args)]
struct RenderOverrides {
    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long)]
    fps: Option<u32>,

    #[arg(long)]
    image_duration: Option<f64>,

    #[arg(long)]
    fade_duration: Option<f64>,

    /// Render without background music
    #[arg(long)]
    no_music: bool,
}

impl RenderOverrides {
    fn apply(&self, config: RenderConfig) -> RenderConfig {
        RenderConfig {
            width: self.width.unwrap_or(config.width),
            height: self.height.unwrap_or(config.height),
            fps: self.fps.unwrap_or(config.fps),
            image_duration: self.image_duration.unwrap_or(config.image_duration),
            fade_duration: self.fade_duration.unwrap_or(config.fade_duration),
            include_music: config.include_music && !self.no_music,
            music_dir: config.music_dir,
        }
    }
}

fn parse_provider(value: &str) -> std::result::Result<Provider, String> {
    value.parse::<Provider>().map_err(|e| e.user_message())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Starting Reel-Compositor v{}", env!("CARGO_PKG_VERSION"));

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };
    let app_config = AppConfig::load(resolve_relative(&cli.config, &root));
    let base_config = app_config
        .render
        .with_music_dir(resolve_relative(&app_config.render.music_dir, &root));

    match cli.command {
        Command::Fetch { query, source, output_dir_name } => {
            let output_base = resolve_relative(&source.output_base, &root);
            let fetcher = WebImageFetcher::new(source.provider)?;
            let images = fetch_images(
                &query,
                &output_base,
                &fetcher,
                source.max_num,
                output_dir_name.as_deref(),
            )
            .await?;
            info!("Fetched {} images for '{}'", images.len(), query);
        }

        Command::Render { input_dir, output, overrides } => {
            let input_dir = resolve_relative(&input_dir, &root);
            let output = output
                .or_else(|| app_config.output.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
            let output_path = resolve_output_path(resolve_relative(&output, &root));

            render(input_dir, output_path, overrides.apply(base_config)).await?;
        }

        Command::FetchAndRender { name, source, overrides } => {
            let output_base = resolve_relative(&source.output_base, &root);
            let fetcher = WebImageFetcher::new(source.provider)?;
            let images =
                fetch_images(&name, &output_base, &fetcher, source.max_num, Some(&name)).await?;
            if images.is_empty() {
                return Err(FetchError::NoImagesDownloaded { query: name }.into());
            }

            let output_path = resolve_output_path(resolve_relative(
                Path::new(DEFAULT_RENDERS_DIR).join(format!("{}.mp4", name)),
                &root,
            ));
            render(output_base.join(&name), output_path, overrides.apply(base_config)).await?;
        }

        Command::FetchMissing { csv, source } => {
            let csv_path = resolve_relative(&csv, &root);
            let output_base = resolve_relative(&source.output_base, &root);
            let fetcher = WebImageFetcher::new(source.provider)?;

            let updated =
                fetch_missing_images(&csv_path, &fetcher, source.max_num, &output_base).await?;
            info!("Updated {} rows in {:?}", updated, csv_path);
        }

        Command::RandomLocation { base_url, endpoint } => {
            let base_url = base_url
                .or_else(|| app_config.server.base_url.clone())
                .ok_or(ConfigError::MissingServerUrl)
                .map_err(CompositorError::from)?;

            let client = LocationClient::new(base_url)?;
            let location = client.fetch_random(&endpoint).await?;
            let images_base = resolve_relative(DEFAULT_IMAGES_DIR, &root);
            let images = client.download(&location, &images_base).await?;
            info!("Saved {} images for {}", images.len(), location.name);

            let output_path = location.render_path(&resolve_relative(DEFAULT_RENDERS_DIR, &root));
            render(images_base.join(location.dir_name()), output_path, base_config).await?;
        }
    }

    Ok(())
}

/// Run the blocking render pipeline off the async runtime
async fn render(image_dir: PathBuf, output_path: PathBuf, config: RenderConfig) -> Result<()> {
    let written = tokio::task::spawn_blocking(move || {
        build_video(&image_dir, &output_path, &CompositionEngine::new(), &config)
    })
    .await
    .context("render task panicked")?
    .map_err(render_failure)?;

    info!("Wrote video to {:?}", written);
    Ok(())
}

/// Lead with the user-facing message but keep the error chain for `{:?}`
fn render_failure(err: CompositorError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_render_failure_keeps_source_chain() {
        let err = CompositorError::from(io::Error::new(io::ErrorKind::BrokenPipe, "encoder hung up"));
        let message = err.user_message();

        let wrapped = render_failure(err);
        assert_eq!(wrapped.to_string(), message);
        assert!(wrapped.chain().any(|cause| cause.downcast_ref::<io::Error>().is_some()));
        assert!(format!("{:?}", wrapped).contains("encoder hung up"));
    }
}
