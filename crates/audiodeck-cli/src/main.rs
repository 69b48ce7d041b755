//! audiodeck CLI — paired text/audio page, archive export, and playback.
//!
//! ```text
//! audiodeck serve   [--root .] [--port 2004] [--host 127.0.0.1]
//! audiodeck render  [--root .] [--out index.html] [--no-archive]
//! audiodeck export  [--root . | --url http://host/] [--out .]
//! audiodeck play    [--root . | --url http://host/]      (reads ids from stdin)
//! audiodeck prepare input.txt [-o audio] [--no-audio] [--tts-url ...]
//! ```
//!
//! Every command accepts `--config audiodeck.toml` and `--count N`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use audiodeck_lib::audiodeck_core::types::{Catalog, Identifier};
use audiodeck_lib::config::DeckConfig;
use audiodeck_lib::export::{Exporter, default_archive};
use audiodeck_lib::fetch::{DirFetcher, HttpFetcher, SharedFetcher};
use audiodeck_lib::html::{HtmlOptions, render_html};
use audiodeck_lib::player::Player;
use audiodeck_lib::render::render_page;
use audiodeck_lib::server::{AppState, router};

/// audiodeck — paired text/audio files as a page, with "download all"
#[derive(Parser)]
#[command(name = "audiodeck", version, about)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true, env = "AUDIODECK_CONFIG")]
    config: Option<PathBuf>,
    /// Use identifiers 001..=N instead of the configured list
    #[arg(long, global = true)]
    count: Option<usize>,
    #[command(subcommand)]
    command: Command,
}

/// Where the pairs come from.
#[derive(Args)]
struct Source {
    /// Directory containing the audio folder
    #[arg(long, default_value = ".")]
    root: PathBuf,
    /// Fetch over HTTP from this base URL instead of reading `--root`
    #[arg(long)]
    url: Option<String>,
}

impl Source {
    fn fetcher(&self) -> SharedFetcher {
        match &self.url {
            Some(url) => Arc::new(HttpFetcher::new(url)),
            None => Arc::new(DirFetcher::new(&self.root)),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Serve the page, the resources, and the archive
    Serve {
        /// Directory containing the audio folder
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Listen port
        #[arg(long)]
        port: Option<u16>,
        /// Listen host
        #[arg(long)]
        host: Option<String>,
    },
    /// Write the page as a static index.html, with the archive beside it
    Render {
        #[command(flatten)]
        source: Source,
        /// Output file (default: <root>/index.html)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Skip building the archive; the page then has no "download all" link
        #[arg(long)]
        no_archive: bool,
    },
    /// Build the "download all" archive
    Export {
        #[command(flatten)]
        source: Source,
        /// Directory to write the archive into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Play tracks: type an identifier to start it, `stop`, `status`, or `quit`
    Play {
        #[command(flatten)]
        source: Source,
    },
    /// Split a text file into numbered .txt/.wav pairs
    Prepare {
        /// Text file, one sentence per line
        input: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "audio")]
        output_dir: PathBuf,
        /// Write only the .txt halves
        #[arg(long)]
        no_audio: bool,
        /// Kokoro TTS server URL
        #[arg(long, env = "AUDIODECK_TTS_URL")]
        tts_url: Option<String>,
        /// TTS voice
        #[arg(long)]
        voice: Option<String>,
        /// TTS playback speed
        #[arg(long)]
        speed: Option<f32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "audiodeck=info,audiodeck_lib=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = DeckConfig::load_or_default(cli.config.as_deref())
        .context("failed to load config")?;
    if let Some(n) = cli.count {
        config.identifiers = None;
        config.count = Some(n);
    }
    let catalog = config.catalog();

    match cli.command {
        Command::Serve { root, port, host } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            serve(&config, catalog, &root, &host, port).await
        }

        Command::Render {
            source,
            out,
            no_archive,
        } => {
            let out = out.unwrap_or_else(|| source.root.join("index.html"));
            let exporter = (!no_archive).then(|| {
                Exporter::new(catalog.clone(), source.fetcher(), default_archive())
                    .with_names(&config.archive_name, &config.archive_folder)
            });
            let rendered =
                render_static(&catalog, source.fetcher(), exporter.as_ref(), &out).await?;
            println!("wrote {} ({} panels)", out.display(), rendered.panels);
            if let Some(archive) = rendered.archive {
                println!("wrote {}", archive.display());
            }
            Ok(())
        }

        Command::Export { source, out } => {
            let exporter = Exporter::new(catalog.clone(), source.fetcher(), default_archive())
                .with_names(&config.archive_name, &config.archive_folder);
            let artifact = exporter.export().await?;
            let dest = artifact
                .save(&out)
                .await
                .with_context(|| format!("failed to write archive into {}", out.display()))?;
            println!(
                "wrote {} ({} of {} files)",
                dest.display(),
                artifact.entries.len(),
                catalog.total_resources()
            );
            for name in &artifact.skipped {
                eprintln!("skipped {name}");
            }
            Ok(())
        }

        Command::Play { source } => play(catalog, source.fetcher()).await,

        Command::Prepare {
            input,
            output_dir,
            no_audio,
            tts_url,
            voice,
            speed,
        } => {
            let mut tts = config.tts.clone();
            if let Some(url) = tts_url {
                tts.url = url;
            }
            if let Some(voice) = voice {
                tts.voice = voice;
            }
            if let Some(speed) = speed {
                tts.speed = speed;
            }
            let tts = (!no_audio).then_some(&tts);

            let report = audiodeck_lib::prepare::prepare(&input, &output_dir, tts).await?;
            println!(
                "wrote {} pairs to {}; use `count = {}` in your config",
                report.count(),
                output_dir.display(),
                report.count()
            );
            for id in &report.audio_failures {
                eprintln!("no audio for {id}");
            }
            Ok(())
        }
    }
}

struct StaticRender {
    panels: usize,
    archive: Option<PathBuf>,
}

/// Write `index.html` to `out` and, when an exporter is given, the archive
/// into the same directory so the page's "download all" link resolves.
///
/// If the archive cannot be built the link is left out of the page.
async fn render_static(
    catalog: &Catalog,
    fetcher: SharedFetcher,
    exporter: Option<&Exporter>,
    out: &Path,
) -> Result<StaticRender> {
    let dir = match out.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut page = render_page(catalog, fetcher).wait().await;
    let mut archive = None;
    let mut opts = HtmlOptions::default();

    match exporter {
        Some(exporter) if page.export_visible => match exporter.export().await {
            Ok(artifact) => {
                let dest = artifact
                    .save(&dir)
                    .await
                    .with_context(|| format!("failed to write archive into {}", dir.display()))?;
                opts = HtmlOptions::static_page(&artifact.file_name);
                archive = Some(dest);
            }
            Err(e) => {
                warn!("render: no archive, leaving out the download link: {e}");
                page.export_visible = false;
            }
        },
        _ => page.export_visible = false,
    }

    tokio::fs::write(out, render_html(&page, &opts))
        .await
        .with_context(|| format!("failed to write {}", out.display()))?;

    Ok(StaticRender {
        panels: page.panels.len(),
        archive,
    })
}

async fn serve(
    config: &DeckConfig,
    catalog: Catalog,
    root: &Path,
    host: &str,
    port: u16,
) -> Result<()> {
    if !root.join(catalog.base_dir()).is_dir() {
        bail!(
            "{} has no '{}' directory",
            root.display(),
            catalog.base_dir()
        );
    }

    let fetcher: SharedFetcher = Arc::new(DirFetcher::new(root));
    let exporter = Exporter::new(catalog.clone(), fetcher.clone(), default_archive())
        .with_names(&config.archive_name, &config.archive_folder);
    let html = HtmlOptions {
        archive_name: config.archive_name.clone(),
        ..Default::default()
    };
    let app = router(AppState::new(catalog, fetcher, exporter, html));

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("audiodeck listening on http://{addr}");

    axum::serve(listener, app).await.context("server error")
}

async fn play(catalog: Catalog, fetcher: SharedFetcher) -> Result<()> {
    let player = Player::new(catalog, fetcher)?;
    eprintln!("commands: [play] <id> | stop | status | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "stop" => player.stop()?,
            "status" => println!("{}", serde_json::to_string(&player.status())?),
            raw => match Identifier::parse(raw.strip_prefix("play ").unwrap_or(raw).trim()) {
                Ok(id) => {
                    if let Err(e) = player.play(&id).await {
                        eprintln!("{e}");
                    }
                }
                Err(e) => eprintln!("{e}"),
            },
        }
    }

    player.stop().ok();
    Ok(())
}
