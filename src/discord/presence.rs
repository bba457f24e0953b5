//! Discord Rich Presence bus using discord-sdk

use std::time::Duration;

use discord_sdk::{
    activity::{ActivityBuilder, Assets},
    wheel::{UserState, Wheel},
    Discord, Subscriptions,
};
use tokio::sync::mpsc;

use crate::presence::{Activity, ActivityUpdate, EventBus};

/// Timeout for waiting for Discord handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Forwards activity updates to the local Discord client over IPC.
///
/// The connection lives on a background task; updates sent before the
/// handshake finishes are queued, and are dropped if Discord is not running.
pub struct DiscordEventBus {
    update_tx: mpsc::UnboundedSender<ActivityUpdate>,
}

impl DiscordEventBus {
    /// Spawn the background task that owns the Discord connection for
    /// `app_id`.
    pub fn init(app_id: i64) -> Self {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_discord_task(app_id, update_rx));

        Self { update_tx }
    }

    async fn run_discord_task(app_id: i64, mut update_rx: mpsc::UnboundedReceiver<ActivityUpdate>) {
        let (wheel, handler) = Wheel::new(Box::new(|err| {
            tracing::warn!("Discord error: {:?}", err);
        }));

        let mut user_spoke = wheel.user();

        let discord = match Discord::new(app_id, Subscriptions::ACTIVITY, Box::new(handler)) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Discord not available: {:?}", e);
                return;
            }
        };

        tracing::info!("Discord connecting...");

        let user = match tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
            if user_spoke.0.changed().await.is_err() {
                Err("Discord connection closed".to_string())
            } else {
                match &*user_spoke.0.borrow() {
                    UserState::Connected(user) => Ok(user.clone()),
                    UserState::Disconnected(err) => Err(format!("Discord disconnected: {:?}", err)),
                }
            }
        })
        .await
        {
            Ok(Ok(user)) => user,
            Ok(Err(e)) => {
                tracing::warn!("{}", e);
                return;
            }
            Err(_) => {
                tracing::warn!("Discord handshake timed out");
                return;
            }
        };

        tracing::info!("Discord Rich Presence connected as {}", user.username);

        while let Some(update) = update_rx.recv().await {
            let result = match update.activity {
                Some(activity) => discord.update_activity(activity_builder(&activity)).await,
                None => discord.clear_activity().await,
            };

            if let Err(e) = result {
                tracing::debug!("Failed to update Discord activity: {:?}", e);
            }
        }

        discord.clear_activity().await.ok();
        discord.disconnect().await;
        tracing::info!("Discord Rich Presence disconnected");
    }
}

/// Discord takes the display name from the application itself, so only
/// state and assets carry over from the activity.
fn activity_builder(activity: &Activity) -> ActivityBuilder {
    let mut builder = ActivityBuilder::new();

    if let Some(state) = &activity.state {
        builder = builder.state(state.clone());
    }

    if let Some(assets) = &activity.assets {
        if let Some(image) = &assets.large_image {
            builder = builder.assets(Assets::default().large(image.clone(), assets.large_text.clone()));
        }
    }

    builder
}

impl EventBus for DiscordEventBus {
    fn name(&self) -> &'static str {
        "Discord"
    }

    fn dispatch(&self, update: &ActivityUpdate) {
        let _ = self.update_tx.send(update.clone());
    }
}
