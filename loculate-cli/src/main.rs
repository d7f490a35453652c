//! `loculate`: drives the capture/panel flow against a JSON-file store.
//!
//! Each invocation plays one panel session: it mounts (which may fetch a travel
//! time for the stored pair), applies the requested action, and prints the
//! resulting panel state.

use anyhow::Context;
use clap::{Parser, Subcommand};
use loculate_core::config::ClientConfig;
use loculate_core::protocol::CAPTURE_MENU_ID;
use loculate_engine::coordinator::{CaptureEvent, Coordinator};
use loculate_engine::panel::{PanelController, PanelState, PanelStatus};
use loculate_runtime::bus;
use loculate_runtime::config_store::ConfigStore;
use loculate_runtime::menus::MemoryMenuRegistry;
use loculate_runtime::proxy_client::ProxyTravelTimeService;
use loculate_runtime::store::JsonFileStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const STATE_FILE: &str = "state.json";
const CONFIG_FILE: &str = "config.json";

#[derive(Parser, Debug)]
#[command(name = "loculate", about = "Driving time from saved origins to a captured address")]
struct Cli {
    /// Directory holding state.json and config.json.
    #[arg(long, default_value = ".loculate")]
    data_dir: PathBuf,

    /// Proxy base URL for this run (overrides config.json).
    #[arg(long)]
    proxy_url: Option<String>,

    /// Use the dark theme when none has been stored.
    #[arg(long)]
    prefers_dark: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture a selected address as the destination, as the context menu would.
    Capture {
        text: String,
        #[arg(long, default_value = CAPTURE_MENU_ID)]
        menu_id: String,
    },
    /// Show saved origins and the current result.
    Origins,
    AddOrigin { address: String },
    SelectOrigin { index: usize },
    DeleteOrigin { index: usize },
    /// Show the theme, or flip it with --toggle.
    Theme {
        #[arg(long)]
        toggle: bool,
    },
    /// Compute the travel time for the stored origin and destination.
    Travel,
    /// Show or update the client configuration.
    Config {
        #[arg(long)]
        set_proxy_url: Option<String>,
        #[arg(long)]
        request_timeout_ms: Option<u64>,
        #[arg(long)]
        reply_timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    std::fs::create_dir_all(&cli.data_dir)
        .with_context(|| format!("create data dir: {}", cli.data_dir.display()))?;
    let config_store = ConfigStore::at_path(cli.data_dir.join(CONFIG_FILE));
    let mut cfg = config_store.load_or_default()?;

    if let Command::Config {
        set_proxy_url,
        request_timeout_ms,
        reply_timeout_ms,
    } = &cli.command
    {
        return update_config(
            &config_store,
            cfg,
            set_proxy_url.as_deref(),
            *request_timeout_ms,
            *reply_timeout_ms,
        );
    }

    if let Some(url) = &cli.proxy_url {
        cfg.proxy_url = url.clone();
    }
    let store = Arc::new(JsonFileStore::at_path(cli.data_dir.join(STATE_FILE)));
    let (coordinator, mut panel) = wire(store, &cfg);

    if let Command::Capture { text, menu_id } = &cli.command {
        coordinator.on_installed(&MemoryMenuRegistry::new())?;
        let event = CaptureEvent {
            menu_item_id: menu_id.clone(),
            selection_text: Some(text.clone()),
        };
        if !coordinator.on_capture(&event).await? {
            println!("Nothing captured.");
            return Ok(());
        }
    }

    panel.mount(cli.prefers_dark).await;

    match cli.command {
        Command::Capture { .. } | Command::Travel | Command::Origins => {}
        Command::AddOrigin { address } => {
            panel.set_origin_input(address);
            if let Err(e) = panel.add_origin().await {
                println!("Could not add origin: {e}");
            }
        }
        Command::SelectOrigin { index } => panel.select_origin(index).await?,
        Command::DeleteOrigin { index } => panel.delete_origin(index).await?,
        Command::Theme { toggle } => {
            if toggle {
                panel.toggle_theme().await?;
            }
            println!("Theme: {}", panel.state().theme.as_str());
            return Ok(());
        }
        Command::Config { .. } => {}
    }

    print_state(panel.state());
    Ok(())
}

fn wire(store: Arc<JsonFileStore>, cfg: &ClientConfig) -> (Coordinator, PanelController) {
    // Nobody listens for capture signals: the panel below mounts from the store.
    let (launcher, _signals) = bus::panel_channel();
    let coordinator = Coordinator::new(
        store.clone(),
        Arc::new(ProxyTravelTimeService::from_config(cfg)),
        Arc::new(launcher),
    );

    let (broker, rx) = bus::channel(8);
    tokio::spawn(bus::serve(coordinator.clone(), rx));

    let panel = PanelController::new(store, Arc::new(broker))
        .with_reply_timeout(Duration::from_millis(cfg.reply_timeout_ms));
    (coordinator, panel)
}

fn update_config(
    store: &ConfigStore,
    mut cfg: ClientConfig,
    proxy_url: Option<&str>,
    request_timeout_ms: Option<u64>,
    reply_timeout_ms: Option<u64>,
) -> anyhow::Result<()> {
    let mut changed = false;
    if let Some(url) = proxy_url {
        cfg.proxy_url = url.to_string();
        changed = true;
    }
    if let Some(ms) = request_timeout_ms {
        cfg.request_timeout_ms = ms;
        changed = true;
    }
    if let Some(ms) = reply_timeout_ms {
        cfg.reply_timeout_ms = ms;
        changed = true;
    }
    if changed {
        store.save(&cfg)?;
        log::info!("saved config to {}", store.path().display());
    }

    println!("proxy_url: {}", cfg.proxy_url);
    println!("request_timeout_ms: {}", cfg.request_timeout_ms);
    println!("reply_timeout_ms: {}", cfg.reply_timeout_ms);
    Ok(())
}

fn print_state(state: &PanelState) {
    if state.origins.is_empty() {
        println!("No saved origins.");
    }
    for (i, origin) in state.origins.entries().iter().enumerate() {
        let marker = if state.origins.selected_index() == i as i64 {
            "*"
        } else {
            " "
        };
        println!("{marker} [{i}] {origin}");
    }
    if let Some(notice) = &state.notice {
        println!("{notice}");
    }

    match &state.destination {
        Some(d) => println!("Destination: {d}"),
        None => println!("Destination: (none captured)"),
    }

    match &state.status {
        PanelStatus::Idle => {}
        PanelStatus::Loading(_) => println!("Loading..."),
        PanelStatus::Success(result) => println!(
            "{} -> {}: {}, {}",
            result.pair.origin, result.pair.destination, result.data.duration, result.data.distance
        ),
        PanelStatus::Error(message) => println!("Error: {message}"),
    }
}
