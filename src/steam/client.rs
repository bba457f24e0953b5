//! HTTP access to the Steam community miniprofile endpoint

use async_trait::async_trait;

use super::profile::MiniProfile;
use crate::error::PresenceError;
use crate::settings::FetchMode;

pub const STEAM_COMMUNITY_URL: &str = "https://steamcommunity.com";
pub const CODETABS_PROXY_URL: &str = "https://api.codetabs.com/v1/proxy";

/// Source of miniprofile documents.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_profile(&self, steam_id: &str) -> Result<MiniProfile, PresenceError>;
}

/// Where a request is sent before it reaches steamcommunity.com
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRoute {
    Direct,
    /// Wrapped as `{proxy}?quest={profile url}`
    Codetabs { proxy_url: String },
    /// The in-process profile proxy, which mirrors the community path
    Local { base_url: String },
}

impl FetchRoute {
    /// Route for a configured fetch mode. `local_port` is the port the
    /// profile proxy actually bound to.
    pub fn for_mode(mode: FetchMode, local_port: u16) -> Self {
        match mode {
            FetchMode::Direct => FetchRoute::Direct,
            FetchMode::Codetabs => FetchRoute::Codetabs {
                proxy_url: CODETABS_PROXY_URL.to_string(),
            },
            FetchMode::LocalProxy => FetchRoute::Local {
                base_url: format!("http://127.0.0.1:{}", local_port),
            },
        }
    }
}

pub struct SteamProfileClient {
    http: reqwest::Client,
    community_url: String,
    route: FetchRoute,
}

impl SteamProfileClient {
    pub fn new(route: FetchRoute) -> Self {
        Self::with_community_url(route, STEAM_COMMUNITY_URL)
    }

    pub fn with_community_url(route: FetchRoute, community_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            community_url: community_url.trim_end_matches('/').to_string(),
            route,
        }
    }

    pub fn profile_url(&self, steam_id: &str) -> String {
        let direct = miniprofile_url(&self.community_url, steam_id);

        match &self.route {
            FetchRoute::Direct => direct,
            FetchRoute::Codetabs { proxy_url } => format!("{}?quest={}", proxy_url, direct),
            FetchRoute::Local { base_url } => {
                miniprofile_url(base_url.trim_end_matches('/'), steam_id)
            }
        }
    }
}

pub fn miniprofile_url(base_url: &str, steam_id: &str) -> String {
    format!("{}/miniprofile/{}/json", base_url, steam_id)
}

/// GET a miniprofile and return the raw body, failing on non-2xx status.
pub async fn fetch_profile_body(
    http: &reqwest::Client,
    url: &str,
) -> Result<String, PresenceError> {
    let response = http.get(url).send().await?;

    if !response.status().is_success() {
        return Err(PresenceError::Status(response.status().as_u16()));
    }

    Ok(response.text().await?)
}

#[async_trait]
impl ProfileFetcher for SteamProfileClient {
    async fn fetch_profile(&self, steam_id: &str) -> Result<MiniProfile, PresenceError> {
        let url = self.profile_url(steam_id);
        tracing::debug!("Fetching miniprofile: {}", url);

        let body = fetch_profile_body(&self.http, &url).await?;
        tracing::debug!("Miniprofile response: {}", body);

        let profile = MiniProfile::from_json(&body)?;
        tracing::debug!(
            persona = profile.persona_name.as_deref().unwrap_or("<unknown>"),
            level = ?profile.level,
            avatar = ?profile.avatar_url,
            in_game = profile.in_game.is_some(),
            "Fetched miniprofile for {}",
            steam_id
        );

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const PLAYING: &str = r#"{"level":5,"persona_name":"p","in_game":{"name":"Portal 2","logo":"https://cdn/steam/apps/620/capsule.jpg","rich_presence":"Chapter 3"}}"#;

    #[test]
    fn builds_urls_per_route() {
        let direct = SteamProfileClient::new(FetchRoute::Direct);
        assert_eq!(
            direct.profile_url("765"),
            "https://steamcommunity.com/miniprofile/765/json"
        );

        let codetabs = SteamProfileClient::new(FetchRoute::for_mode(FetchMode::Codetabs, 0));
        assert_eq!(
            codetabs.profile_url("765"),
            "https://api.codetabs.com/v1/proxy?quest=https://steamcommunity.com/miniprofile/765/json"
        );

        let local = SteamProfileClient::new(FetchRoute::for_mode(FetchMode::LocalProxy, 4100));
        assert_eq!(
            local.profile_url("765"),
            "http://127.0.0.1:4100/miniprofile/765/json"
        );
    }

    #[tokio::test]
    async fn fetches_directly() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/miniprofile/76500000000000000/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PLAYING)
            .create_async()
            .await;

        let client = SteamProfileClient::with_community_url(FetchRoute::Direct, &server.url());
        let profile = client.fetch_profile("76500000000000000").await.unwrap();

        mock.assert_async().await;
        assert_eq!(profile.persona_name.as_deref(), Some("p"));
        assert_eq!(profile.level, Some(5));
        let game = profile.current_game().unwrap();
        assert_eq!(game.name, "Portal 2");
        assert_eq!(game.steam_app_id.as_deref(), Some("620"));
    }

    #[tokio::test]
    async fn fetches_through_codetabs() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/proxy")
            .match_query(Matcher::UrlEncoded(
                "quest".into(),
                "https://steamcommunity.com/miniprofile/42/json".into(),
            ))
            .with_status(200)
            .with_body(PLAYING)
            .create_async()
            .await;

        let route = FetchRoute::Codetabs {
            proxy_url: format!("{}/v1/proxy", server.url()),
        };
        let client = SteamProfileClient::new(route);
        let profile = client.fetch_profile("42").await.unwrap();

        mock.assert_async().await;
        assert!(profile.in_game.is_some());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/miniprofile/1/json")
            .with_status(429)
            .create_async()
            .await;

        let client = SteamProfileClient::with_community_url(FetchRoute::Direct, &server.url());
        let err = client.fetch_profile("1").await.unwrap_err();
        assert!(matches!(err, PresenceError::Status(429)));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/miniprofile/1/json")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = SteamProfileClient::with_community_url(FetchRoute::Direct, &server.url());
        let err = client.fetch_profile("1").await.unwrap_err();
        assert!(matches!(err, PresenceError::Parse(_)));
    }
}
