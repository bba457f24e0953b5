//! Turns a miniprofile into an activity and publishes it

use std::sync::Arc;

use super::activity::{flags, Activity, ActivityAssets, ActivityType, ActivityUpdate};
use super::assets::{resolve_image, AssetResolver};
use super::traits::EventBus;
use crate::error::PresenceError;
use crate::settings::PresenceConfig;
use crate::steam::MiniProfile;

pub struct PresencePublisher {
    config: Arc<PresenceConfig>,
    resolver: Arc<dyn AssetResolver>,
    bus: Arc<dyn EventBus>,
}

impl PresencePublisher {
    pub fn new(
        config: Arc<PresenceConfig>,
        resolver: Arc<dyn AssetResolver>,
        bus: Arc<dyn EventBus>,
    ) -> Self {
        tracing::info!("Publishing presence to {}", bus.name());
        Self {
            config,
            resolver,
            bus,
        }
    }

    /// Builds the activity for a profile, or `None` when nothing is being
    /// played. Empty fields are already stripped from the result.
    pub async fn create_activity(
        &self,
        profile: &MiniProfile,
    ) -> Result<Option<Activity>, PresenceError> {
        let Some(game) = profile.current_game() else {
            return Ok(None);
        };

        let large_image = match game.capsule_url() {
            Some(url) => {
                let resolved =
                    resolve_image(self.resolver.as_ref(), &self.config.app_id, &url).await?;
                if resolved.is_none() {
                    tracing::warn!("No asset resolved for {}", url);
                }
                resolved
            }
            None => {
                tracing::debug!("No Steam app ID for {}, skipping image", game.name);
                None
            }
        };

        let activity = Activity {
            application_id: Some(self.config.app_id.clone()),
            name: Some(game.name.clone()),
            state: game.rich_presence,
            kind: ActivityType::Playing,
            assets: Some(ActivityAssets {
                large_image,
                large_text: Some(game.name),
            }),
            flags: flags::INSTANCE,
        };

        Ok(Some(activity.strip_empty()))
    }

    pub fn set_activity(&self, activity: Option<Activity>) {
        let update = ActivityUpdate::new(activity);
        tracing::debug!("Dispatching activity update: {:?}", update.activity);
        self.bus.dispatch(&update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::assets::DirectUrlResolver;
    use crate::settings::PresenceSettings;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBus {
        updates: Mutex<Vec<ActivityUpdate>>,
    }

    impl EventBus for RecordingBus {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn dispatch(&self, update: &ActivityUpdate) {
            self.updates.lock().unwrap().push(update.clone());
        }
    }

    fn config() -> Arc<PresenceConfig> {
        let settings = PresenceSettings {
            app_id: "1100".to_string(),
            steam_id: "76500000000000000".to_string(),
            ..Default::default()
        };
        Arc::new(PresenceConfig::from_settings(&settings).unwrap())
    }

    fn publisher(bus: Arc<RecordingBus>) -> PresencePublisher {
        PresencePublisher::new(config(), Arc::new(DirectUrlResolver), bus)
    }

    fn profile(json: &str) -> MiniProfile {
        MiniProfile::from_json(json).unwrap()
    }

    #[tokio::test]
    async fn builds_playing_activity() {
        let publisher = publisher(Arc::new(RecordingBus::default()));
        let activity = publisher
            .create_activity(&profile(
                r#"{"in_game":{"name":"Game X","rich_presence":"In Menu","logo":"https://cdn.akamai.steamstatic.com/steam/apps/440/capsule_184x69.jpg"}}"#,
            ))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            serde_json::to_value(&activity).unwrap(),
            json!({
                "application_id": "1100",
                "name": "Game X",
                "state": "In Menu",
                "type": 0,
                "assets": {
                    "large_image": "https://cdn.cloudflare.steamstatic.com/steam/apps/440/hero_capsule.jpg",
                    "large_text": "Game X"
                },
                "flags": 1
            })
        );
    }

    #[tokio::test]
    async fn no_in_game_yields_nothing() {
        let publisher = publisher(Arc::new(RecordingBus::default()));
        let activity = publisher
            .create_activity(&profile(r#"{"persona_name":"idle"}"#))
            .await
            .unwrap();
        assert!(activity.is_none());
    }

    #[tokio::test]
    async fn nameless_in_game_yields_nothing() {
        let publisher = publisher(Arc::new(RecordingBus::default()));
        let activity = publisher
            .create_activity(&profile(r#"{"in_game":{}}"#))
            .await
            .unwrap();
        assert!(activity.is_none());
    }

    #[tokio::test]
    async fn unmatched_logo_has_no_large_image() {
        let publisher = publisher(Arc::new(RecordingBus::default()));
        let activity = publisher
            .create_activity(&profile(
                r#"{"in_game":{"name":"Mod","logo":"https://example.com/mod.png"}}"#,
            ))
            .await
            .unwrap()
            .unwrap();

        let assets = activity.assets.unwrap();
        assert_eq!(assets.large_image, None);
        assert_eq!(assets.large_text.as_deref(), Some("Mod"));
        assert_eq!(activity.state, None);
    }

    #[tokio::test]
    async fn empty_status_is_stripped() {
        let publisher = publisher(Arc::new(RecordingBus::default()));
        let activity = publisher
            .create_activity(&profile(
                r#"{"in_game":{"name":"Game X","rich_presence":"","logo":"/steam/apps/1/"}}"#,
            ))
            .await
            .unwrap()
            .unwrap();

        let value = serde_json::to_value(&activity).unwrap();
        assert!(value.get("state").is_none());
        assert_eq!(value["type"], 0);
    }

    #[tokio::test]
    async fn set_activity_dispatches_tagged_update() {
        let bus = Arc::new(RecordingBus::default());
        let publisher = publisher(bus.clone());

        publisher.set_activity(None);

        let updates = bus.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].kind, "LOCAL_ACTIVITY_UPDATE");
        assert_eq!(updates[0].socket_id, "SteamPresence");
        assert!(updates[0].activity.is_none());
    }
}
