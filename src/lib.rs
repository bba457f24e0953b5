pub mod discord;
pub mod error;
pub mod logging;
pub mod presence;
pub mod proxy_server;
pub mod settings;
pub mod steam;

use std::path::PathBuf;
use std::sync::Arc;

use discord::DiscordEventBus;
use error::PresenceError;
use presence::{
    start_presence_background_task, AssetResolver, DirectUrlResolver, EventBus,
    ExternalAssetResolver, PresenceManager, PresencePublisher, StdoutEventBus,
};
use proxy_server::ProfileProxy;
use settings::{get_settings_path, load_settings, save_settings, FetchMode, PresenceConfig};
use steam::client::STEAM_COMMUNITY_URL;
use steam::{FetchRoute, SteamProfileClient};

/// How the process was asked to run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Settings file; the per-user config directory when unset
    pub config_path: Option<PathBuf>,
    /// Run a single cycle and exit
    pub once: bool,
    /// Print updates as JSON lines instead of talking to Discord
    pub dry_run: bool,
    /// Only serve the local profile proxy
    pub serve_proxy: bool,
}

pub async fn run(options: RunOptions) -> Result<(), PresenceError> {
    let path = match options.config_path {
        Some(path) => path,
        None => get_settings_path().map_err(PresenceError::Config)?,
    };
    let settings = load_settings(&path).map_err(PresenceError::Config)?;

    // leave a template for the user to fill in
    if !path.exists() {
        save_settings(&path, &settings).map_err(PresenceError::Config)?;
        tracing::info!("Wrote default settings to {}", path.display());
    }

    if options.serve_proxy {
        let proxy = ProfileProxy::start(
            settings.proxy_port,
            STEAM_COMMUNITY_URL,
            tokio::runtime::Handle::current(),
        )
        .map_err(PresenceError::Config)?;
        tokio::signal::ctrl_c().await?;
        tokio::task::spawn_blocking(move || proxy.shutdown())
            .await
            .ok();
        return Ok(());
    }

    let config = Arc::new(PresenceConfig::from_settings(&settings).map_err(|e| {
        tracing::error!("Invalid settings in {}: {}", path.display(), e);
        PresenceError::Config(e)
    })?);

    let proxy = match config.fetch_mode {
        FetchMode::LocalProxy => Some(
            ProfileProxy::start(
                config.proxy_port,
                STEAM_COMMUNITY_URL,
                tokio::runtime::Handle::current(),
            )
            .map_err(PresenceError::Config)?,
        ),
        _ => None,
    };
    let route = FetchRoute::for_mode(config.fetch_mode, proxy.as_ref().map_or(0, |p| p.port));
    let fetcher = Arc::new(SteamProfileClient::new(route));

    let resolver: Arc<dyn AssetResolver> = match &config.asset_token {
        Some(token) => Arc::new(ExternalAssetResolver::new(token.clone())),
        None => Arc::new(DirectUrlResolver),
    };

    let bus: Arc<dyn EventBus> = if options.dry_run {
        Arc::new(StdoutEventBus)
    } else {
        let app_id = config.app_id_number().map_err(PresenceError::Config)?;
        Arc::new(DiscordEventBus::init(app_id))
    };

    let publisher = PresencePublisher::new(Arc::clone(&config), resolver, bus);
    let manager = Arc::new(PresenceManager::new(Arc::clone(&config), fetcher, publisher));

    if options.once {
        let outcome = manager.run_cycle().await?;
        tracing::info!("Presence cycle finished: {:?}", outcome);
    } else {
        let task = start_presence_background_task(Arc::clone(&manager));
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutting down");
        task.stop().await;
    }

    if let Some(proxy) = proxy {
        tokio::task::spawn_blocking(move || proxy.shutdown())
            .await
            .ok();
    }

    Ok(())
}
