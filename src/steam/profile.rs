//! Miniprofile document types and the typed parse of its `in_game` block

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::PresenceError;

const CAPSULE_URL_BASE: &str = "https://cdn.cloudflare.steamstatic.com/steam/apps";

static STEAM_APP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/steam/apps/([0-9]+)/").unwrap());

/// The parts of `GET /miniprofile/{id}/json` this crate reads.
/// Everything else in the document is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MiniProfile {
    #[serde(default)]
    pub persona_name: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub in_game: Option<InGame>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InGame {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rich_presence: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub is_non_steam: Option<bool>,
}

/// What the user is playing right now, as far as the profile says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentGame {
    pub name: String,
    pub rich_presence: Option<String>,
    pub steam_app_id: Option<String>,
}

impl MiniProfile {
    pub fn from_json(body: &str) -> Result<Self, PresenceError> {
        Ok(serde_json::from_str(body)?)
    }

    /// `None` when the profile has no `in_game` block, or one without a
    /// game name.
    pub fn current_game(&self) -> Option<CurrentGame> {
        let game = self.in_game.as_ref()?;

        let Some(name) = game.name.as_deref().filter(|name| !name.is_empty()) else {
            tracing::debug!("Ignoring in_game block without a name: {:?}", game);
            return None;
        };

        if game.is_non_steam == Some(true) {
            tracing::debug!("{} is a non-Steam game", name);
        }

        Some(CurrentGame {
            name: name.to_string(),
            rich_presence: game.rich_presence.clone(),
            steam_app_id: game.logo.as_deref().and_then(extract_app_id),
        })
    }
}

impl CurrentGame {
    /// Hero capsule image for the game, if its app ID is known.
    pub fn capsule_url(&self) -> Option<String> {
        self.steam_app_id.as_deref().map(capsule_url)
    }
}

/// Pulls the numeric Steam app ID out of a store asset URL such as
/// `https://cdn.akamai.steamstatic.com/steam/apps/440/capsule_184x69.jpg`.
/// The digits are returned exactly as captured.
pub fn extract_app_id(logo_url: &str) -> Option<String> {
    STEAM_APP_RE
        .captures(logo_url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn capsule_url(app_id: &str) -> String {
    format!("{}/{}/hero_capsule.jpg", CAPSULE_URL_BASE, app_id)
}
