use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use plume::api::ApiClient;
use plume::app::App;
use plume::config::ConfigManager;
use plume::logging::{self, LogConfig};
use plume::server_config::ServerConfigManager;
use plume::session::SessionContext;
use plume::storage::{FileStorage, MemoryStorage, StorageAdapter};
use plume::{terminal, ui};

/// Plume - a keyboard-driven terminal client for a social posting backend
#[derive(Parser)]
#[command(name = "plume")]
#[command(about = "Browse, write and like posts from the terminal")]
#[command(version)]
struct Cli {
    /// Backend base URL (falls back to PLUME_API_URL, then the saved config)
    #[arg(long, short)]
    server: Option<String>,

    /// Remember the resolved server URL for future runs
    #[arg(long)]
    save_server: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,

    /// Directory for persisted session keys (default: ~/.plume/storage)
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Keep the session in memory only; nothing is written to disk
    #[arg(long)]
    ephemeral: bool,
}

// Load environment variables from .env file
// This allows PLUME_API_URL to be set without command-line args
fn load_env() {
    let _ = dotenv::dotenv();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_env();

    let config_manager = ConfigManager::new()?;

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let log_config = log_config.with_log_file(config_manager.config_dir().join("plume_debug.log"));
    logging::init_logging(&log_config)?;

    let storage: Arc<dyn StorageAdapter> = if cli.ephemeral {
        log::info!("Ephemeral session, storage kept in memory");
        Arc::new(MemoryStorage::new())
    } else {
        let dir = cli.storage_dir.clone().unwrap_or_else(|| config_manager.storage_dir());
        Arc::new(FileStorage::with_dir(dir))
    };

    let server_config_manager = ServerConfigManager::new(config_manager);
    let server_url = server_config_manager.determine_server_url(cli.server)?;
    if cli.save_server {
        server_config_manager.save_server_url(server_url.clone())?;
    }
    log::info!(
        "Using server {} ({})",
        server_url,
        ServerConfigManager::server_description(&server_url)
    );

    let session = SessionContext::hydrate(storage);
    let api = ApiClient::new(server_url, session);

    let mut app = App::new(api);
    app.log_config = log_config;

    terminal::install_panic_hook();
    let mut tui = terminal::init()?;

    let result = run(&mut tui, &mut app).await;

    terminal::restore()?;
    result
}

async fn run(tui: &mut terminal::Tui, app: &mut App) -> Result<()> {
    while app.running {
        app.tick(Instant::now());

        tui.draw(|frame| ui::render(app, frame))?;

        // Handle events with timeout so background results keep flowing in
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                // Keyboard-only navigation
                Event::Mouse(_) => continue,
                Event::Key(key) => app.handle_key(key).await?,
                _ => {}
            }
        }
    }
    Ok(())
}
