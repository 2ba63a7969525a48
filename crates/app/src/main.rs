mod app;
mod audio;
mod repl;
mod terminal;

use anyhow::{Context, Result};
use app::{App, Flow};
use clap::{Parser, Subcommand};
use repl::{parse_line, ReplCommand};
use songbook_catalog::{HttpCatalog, PlaylistService, SongDirectory};
use songbook_core::{AppConfig, UserId};
use songbook_engine::{EngineConfig, PlaybackController};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use terminal::TerminalRenderer;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "songbook", about = "Browse, search and play a song catalog")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive player (default)
    Run,
    /// Print the song list and exit
    Songs {
        #[arg(long)]
        search: Option<String>,
    },
    /// Print your playlists and exit
    Playlists,
    /// Check that the catalog services answer
    Doctor,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.command.unwrap_or(Commands::Run);
    let cfg_path = cli.config.unwrap_or_else(default_config_path);

    match cmd {
        Commands::Config {
            action: ConfigAction::Init,
        } => {
            init_config(&cfg_path)?;
            println!("Initialized config at {}", cfg_path.display());
            Ok(())
        }
        Commands::Doctor => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            doctor(&cfg).await
        }
        Commands::Songs { search } => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            print_songs(&cfg, search.as_deref()).await
        }
        Commands::Playlists => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            print_playlists(&cfg).await
        }
        Commands::Run => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            run(cfg).await
        }
    }
}

async fn run(cfg: AppConfig) -> Result<()> {
    let catalog =
        Arc::new(HttpCatalog::from_app_config(&cfg).context("failed to build http client")?);
    let controller = PlaybackController::new(EngineConfig::from_app_config(&cfg));
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut app = App::new(
        catalog,
        cfg.user_id,
        controller,
        TerminalRenderer::new(std::io::stdout()),
        events_tx,
    );

    info!(api = %cfg.api_base_url, user = ?cfg.user_id, "songbook started");

    app.handle(ReplCommand::Songs).await;
    if cfg.user_id.is_some() {
        app.handle(ReplCommand::Playlists).await;
    } else {
        app.renderer_mut()
            .line("No user id configured; playlist commands are unavailable.");
    }

    let tick_every = Duration::from_millis(cfg.player.progress_tick_ms);
    let mut ticker = tokio::time::interval(tick_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    break;
                };
                match parse_line(&line) {
                    Ok(Some(cmd)) => {
                        if app.handle(cmd).await == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(text) => app.renderer_mut().line(text.trim_end()),
                }
                prompt();
            }
            _ = ticker.tick() => {
                app.tick(tick_every);
            }
            Some(event) = events_rx.recv() => {
                app.apply(event);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received ctrl-c; shutting down");
                break;
            }
        }
    }

    info!(
        queued = app.controller().session().len(),
        playing = app.controller().is_playing(),
        "session closed"
    );
    Ok(())
}

fn prompt() {
    let mut out = std::io::stdout();
    let _ = write!(out, "songbook> ");
    let _ = out.flush();
}

async fn print_songs(cfg: &AppConfig, search: Option<&str>) -> Result<()> {
    let catalog = HttpCatalog::from_app_config(cfg)?;
    let songs = catalog
        .list_songs(search)
        .await
        .context("failed to load songs")?;
    let mut renderer = TerminalRenderer::new(std::io::stdout());
    renderer.show_songs("Songs", &songs);
    Ok(())
}

async fn print_playlists(cfg: &AppConfig) -> Result<()> {
    let user = cfg
        .user_id
        .context("no user id configured (set user_id or SONGBOOK_USER_ID)")?;
    let catalog = HttpCatalog::from_app_config(cfg)?;
    let playlists = catalog
        .list_playlists(user)
        .await
        .context("failed to load playlists")?;
    let mut renderer = TerminalRenderer::new(std::io::stdout());
    renderer.show_playlists(&playlists);
    Ok(())
}

async fn doctor(cfg: &AppConfig) -> Result<()> {
    println!("== songbook doctor ==");
    println!("API base: {}", cfg.api_base_url);

    let catalog = HttpCatalog::from_app_config(cfg)?;
    match catalog.list_songs(None).await {
        Ok(songs) => println!("Song directory: reachable ({} songs)", songs.len()),
        Err(err) => println!("Song directory: not reachable ({err})"),
    }

    match cfg.user_id {
        Some(user) => match catalog.list_playlists(user).await {
            Ok(playlists) => println!(
                "Playlist service: reachable ({} playlists for user {user})",
                playlists.len()
            ),
            Err(err) => println!("Playlist service: not reachable ({err})"),
        },
        None => println!("Playlist service: skipped, no user id configured"),
    }

    Ok(())
}

fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("songbook").join("config.toml")
}

fn init_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let cfg = AppConfig::default();
    let toml = toml::to_string_pretty(&cfg)?;
    std::fs::write(path, toml)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

fn load_or_default(path: &Path) -> Result<AppConfig> {
    let mut cfg = if !path.exists() {
        AppConfig::default()
    } else {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?
    };
    apply_env_overrides(&mut cfg);
    cfg.validate()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    Ok(cfg)
}

fn init_logging(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("SONGBOOK_API_BASE_URL") {
        if !v.trim().is_empty() {
            cfg.api_base_url = v;
        }
    }
    if let Ok(v) = std::env::var("SONGBOOK_USER_ID") {
        if let Ok(user) = v.parse::<UserId>() {
            cfg.user_id = Some(user);
        }
    }
    if let Ok(v) = std::env::var("SONGBOOK_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.log_level = v;
        }
    }
}
