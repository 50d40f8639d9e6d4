//! mixid-ai - chunked song recognition CLI
//!
//! ```text
//! mixid-ai run <URL|FILE> [--json] [--search] [--export-chunks DIR] [--dump-raw FILE]
//! mixid-ai extract <DUMP> [--json] [--search]
//! mixid-ai init-config [--force]
//! ```
//!
//! The first Ctrl-C cancels the current stage; a second one exits at once.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mixid_ai::config::{self as resolve, Overrides};
use mixid_ai::models::ExtractedTrack;
use mixid_ai::services::{
    dedupe, export_windows, extract_all, is_remote_locator, load_windows, search_tracks,
    AudioSource, LocalFileSource, YtDlpAcquirer,
};
use mixid_ai::workflow::{load_dump, save_dump, Pipeline, PipelineEvent};
use mixid_common::config::{default_config_path, init_config, load_or_default, TomlConfig};
use mixid_common::human_time::format_elapsed;
use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for mixid-ai
#[derive(Parser, Debug)]
#[command(name = "mixid-ai")]
#[command(about = "Identify the tracks in a long recording")]
#[command(version)]
struct Cli {
    /// TOML config file (default: ~/.config/mixid/config.toml)
    #[arg(short, long, global = true, env = "MIXID_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Acquire, segment and recognize a recording
    Run(RunArgs),

    /// Re-extract tracks from a raw payload dump without contacting any service
    Extract(ExtractArgs),

    /// Write a config file with every default filled in
    InitConfig {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// URL to download, or path to a local audio file
    source: String,

    /// Window length in seconds
    #[arg(short, long, env = "MIXID_WINDOW_SECONDS")]
    window: Option<u64>,

    /// Maximum recognition calls in flight
    #[arg(long, env = "MIXID_MAX_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Extra attempts for windows whose recognition failed
    #[arg(long, env = "MIXID_MAX_RETRIES")]
    retries: Option<u32>,

    /// Per-window recognition timeout in seconds
    #[arg(long, env = "MIXID_TIMEOUT_SECS")]
    timeout: Option<u64>,

    /// Recognition requests per second
    #[arg(long, env = "MIXID_REQUESTS_PER_SECOND")]
    rps: Option<u32>,

    /// Recognition service endpoint
    #[arg(long, env = "MIXID_RECOGNIZER_URL")]
    recognizer_url: Option<String>,

    /// File-search JSON-RPC endpoint
    #[arg(long, env = "MIXID_SEARCH_URL")]
    search_url: Option<String>,

    /// Audio format requested from the downloader
    #[arg(long, env = "MIXID_AUDIO_FORMAT")]
    audio_format: Option<String>,

    /// Write every window as chunk_<H_MM_SS>.wav into this directory
    #[arg(long, value_name = "DIR")]
    export_chunks: Option<PathBuf>,

    /// Save deduplicated raw payloads as JSON
    #[arg(long, value_name = "FILE")]
    dump_raw: Option<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Dump written by `run --dump-raw`, or a JSON array of raw payloads
    file: PathBuf,

    /// File-search JSON-RPC endpoint
    #[arg(long, env = "MIXID_SEARCH_URL")]
    search_url: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Print the tracklist as JSON
    #[arg(long)]
    json: bool,

    /// Search for files matching each track name
    #[arg(long)]
    search: bool,
}

impl RunArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            window_seconds: self.window,
            max_concurrency: self.concurrency,
            max_retries: self.retries,
            timeout_secs: self.timeout,
            requests_per_second: self.rps,
            recognizer_endpoint: self.recognizer_url.clone(),
            search_endpoint: self.search_url.clone(),
            audio_format: self.audio_format.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config file must not block writing a fresh one
    let file_config = match cli.command {
        Command::InitConfig { .. } => TomlConfig::default(),
        _ => load_or_default(cli.config.as_deref()).context("Failed to load config")?,
    };

    // Logs go to stderr so --json output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&file_config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting mixid-ai v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
    );

    match cli.command {
        Command::Run(args) => run(args, file_config).await,
        Command::Extract(args) => extract(args, file_config).await,
        Command::InitConfig { force } => {
            let path = cli
                .config
                .or_else(default_config_path)
                .context("Could not determine config directory; pass --config")?;
            init_config(&path, force).context("Failed to write config")?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

/// Cancellation token tied to Ctrl-C
fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            warn!("Interrupt received, cancelling (press Ctrl-C again to exit immediately)");
            cancel.cancel();

            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });
    cancel
}

/// Await `fut` unless the token fires first
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = T>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(mixid_ai::Error::Cancelled.into()),
        value = fut => Ok(value),
    }
}

async fn run(args: RunArgs, file_config: TomlConfig) -> Result<()> {
    let config = resolve::apply_overrides(file_config, &args.overrides())
        .context("Invalid configuration")?;
    let started = Instant::now();

    let cancel = interrupt_token();

    let acquired = until_cancelled(&cancel, async {
        if is_remote_locator(&args.source) {
            YtDlpAcquirer::new(config.pipeline.audio_format.clone())
                .acquire(&args.source)
                .await
        } else {
            LocalFileSource.acquire(&args.source).await
        }
    })
    .await?
    .context("Failed to acquire audio")?;

    let windows = until_cancelled(
        &cancel,
        load_windows(acquired.path(), resolve::window_duration(&config)),
    )
    .await?
    .context("Failed to prepare audio windows")?;
    info!(windows = windows.len(), "Audio segmented");

    if let Some(dir) = &args.export_chunks {
        export_windows(&windows, dir).context("Failed to export chunks")?;
    }

    let api_key = resolve::resolve_api_key(&config);
    let client = resolve::build_recognition_client(&config, api_key)?;

    let (event_tx, event_rx) = mpsc::channel(256);
    let progress = tokio::spawn(log_events(event_rx));

    let pipeline = Pipeline::with_events(client, resolve::pipeline_config(&config), event_tx);
    let matched = pipeline
        .run(&windows, &cancel)
        .await
        .context("Recognition run failed")?;
    drop(pipeline);
    let _ = progress.await;

    let unique = dedupe(matched);
    if let Some(path) = &args.dump_raw {
        save_dump(&unique, path).context("Failed to save raw dump")?;
    }

    let tracks = extract_all(&unique);
    info!(
        tracks = tracks.len(),
        elapsed = %format_elapsed(started.elapsed()),
        "Tracklist ready"
    );

    print_tracks(&tracks, args.output.json)?;
    if args.output.search {
        print_searches(&config, &tracks, &cancel).await?;
    }

    Ok(())
}

async fn extract(args: ExtractArgs, file_config: TomlConfig) -> Result<()> {
    let overrides = Overrides {
        search_endpoint: args.search_url.clone(),
        ..Overrides::default()
    };
    let config = resolve::apply_overrides(file_config, &overrides).context("Invalid configuration")?;

    let outcomes = load_dump(&args.file)
        .with_context(|| format!("Failed to load dump {}", args.file.display()))?;
    let tracks = extract_all(&dedupe(outcomes));

    print_tracks(&tracks, args.output.json)?;
    if args.output.search {
        print_searches(&config, &tracks, &interrupt_token()).await?;
    }

    Ok(())
}

async fn log_events(mut rx: mpsc::Receiver<PipelineEvent>) {
    let mut completed = 0usize;
    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::WindowStarted { window_index, total_windows } => {
                debug!(window_index, total_windows, "Window dispatched");
            }
            PipelineEvent::WindowCompleted { window_index, matched, attempts } => {
                completed += 1;
                info!(window_index, matched, attempts, completed, "Window finished");
            }
            PipelineEvent::RunCompleted { stats } => {
                debug!(?stats, "Run finished");
            }
        }
    }
}

fn print_tracks(tracks: &[ExtractedTrack], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tracks)?);
        return Ok(());
    }

    if tracks.is_empty() {
        println!("No tracks recognized.");
        return Ok(());
    }

    for track in tracks {
        println!(
            "[{}] {} - {}",
            track.timestamp, track.artist, track.track_name
        );
        println!(
            "        Album: {} | Genre: {} | Released: {}",
            track.album, track.genre, track.release_year
        );
    }
    Ok(())
}

async fn print_searches(
    config: &TomlConfig,
    tracks: &[ExtractedTrack],
    cancel: &CancellationToken,
) -> Result<()> {
    let search = resolve::build_search_client(config)?;
    let results = search_tracks(&search, tracks, cancel)
        .await
        .context("File search failed")?;

    for (query, candidates) in results {
        println!();
        println!("Searching for: {}", query);

        if candidates.is_empty() {
            println!("No results found for '{}'.", query);
            continue;
        }

        for candidate in candidates {
            println!("User: {}", candidate.owner_handle);
            println!("File: {}", candidate.file_path);
            match candidate.file_size_bytes {
                Some(size) => println!("Size: {} bytes", size),
                None => println!("Size: N/A"),
            }
            println!("{}", "-".repeat(40));
        }
    }
    Ok(())
}
