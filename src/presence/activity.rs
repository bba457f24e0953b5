//! Activity payloads and the event that carries them onto the bus

use serde::{Serialize, Serializer};

pub const LOCAL_ACTIVITY_UPDATE: &str = "LOCAL_ACTIVITY_UPDATE";
pub const SOCKET_ID: &str = "SteamPresence";

/// Only the variant this crate publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityType {
    #[default]
    Playing,
}

impl ActivityType {
    pub fn code(self) -> u8 {
        match self {
            ActivityType::Playing => 0,
        }
    }
}

impl Serialize for ActivityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

pub mod flags {
    /// The activity belongs to a live game session
    pub const INSTANCE: u32 = 1 << 0;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityAssets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_text: Option<String>,
}

impl ActivityAssets {
    pub fn is_empty(&self) -> bool {
        self.large_image.is_none() && self.large_text.is_none()
    }
}

/// Rich presence record. Absent fields are omitted when serialized;
/// `type` is always written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Activity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<ActivityAssets>,
    #[serde(skip_serializing_if = "is_zero")]
    pub flags: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Activity {
    /// Drops every empty value except the activity type.
    pub fn strip_empty(self) -> Self {
        let assets = self
            .assets
            .map(|assets| ActivityAssets {
                large_image: non_empty(assets.large_image),
                large_text: non_empty(assets.large_text),
            })
            .filter(|assets| !assets.is_empty());

        Self {
            application_id: non_empty(self.application_id),
            name: non_empty(self.name),
            state: non_empty(self.state),
            kind: self.kind,
            assets,
            flags: self.flags,
        }
    }
}

/// The event published on the bus. `activity: None` clears presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityUpdate {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub activity: Option<Activity>,
    pub socket_id: &'static str,
}

impl ActivityUpdate {
    pub fn new(activity: Option<Activity>) -> Self {
        Self {
            kind: LOCAL_ACTIVITY_UPDATE,
            activity,
            socket_id: SOCKET_ID,
        }
    }
}
