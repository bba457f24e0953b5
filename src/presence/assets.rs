//! Image asset resolution for activity payloads

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PresenceError;

pub const DISCORD_API_URL: &str = "https://discord.com/api/v9";

static ATTACHMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(cdn|media)\.discordapp\.(com|net)/attachments/").unwrap()
});

static ATTACHMENT_HOST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://(cdn|media)\.discordapp\.(com|net)/").unwrap());

/// Maps image URLs to asset references a presence payload can carry.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// One entry per resolved URL, in request order. An empty result means
    /// nothing could be resolved.
    async fn fetch_asset_ids(
        &self,
        application_id: &str,
        urls: &[String],
    ) -> Result<Vec<String>, PresenceError>;
}

/// Hands URLs back untouched; presence clients accept plain image URLs.
pub struct DirectUrlResolver;

#[async_trait]
impl AssetResolver for DirectUrlResolver {
    async fn fetch_asset_ids(
        &self,
        _application_id: &str,
        urls: &[String],
    ) -> Result<Vec<String>, PresenceError> {
        Ok(urls.to_vec())
    }
}

#[derive(Serialize)]
struct ExternalAssetsRequest<'a> {
    urls: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ExternalAsset {
    #[allow(dead_code)]
    url: String,
    external_asset_path: String,
}

/// Registers URLs with Discord's external-assets endpoint and returns
/// `mp:` media proxy references.
pub struct ExternalAssetResolver {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl ExternalAssetResolver {
    pub fn new(token: String) -> Self {
        Self::with_api_url(token, DISCORD_API_URL)
    }

    pub fn with_api_url(token: String, api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl AssetResolver for ExternalAssetResolver {
    async fn fetch_asset_ids(
        &self,
        application_id: &str,
        urls: &[String],
    ) -> Result<Vec<String>, PresenceError> {
        let endpoint = format!(
            "{}/applications/{}/external-assets",
            self.api_url, application_id
        );
        tracing::debug!("Resolving {} asset(s) via {}", urls.len(), endpoint);

        let response = self
            .http
            .post(&endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .json(&ExternalAssetsRequest { urls })
            .send()
            .await
            .map_err(|e| PresenceError::AssetResolution(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PresenceError::AssetResolution(format!(
                "external assets request failed: {}",
                response.status()
            )));
        }

        let assets: Vec<ExternalAsset> = response
            .json()
            .await
            .map_err(|e| PresenceError::AssetResolution(e.to_string()))?;

        Ok(assets
            .into_iter()
            .map(|asset| format!("mp:{}", asset.external_asset_path))
            .collect())
    }
}

/// Resolves one image URL. Discord attachment URLs are already hosted and
/// only need their host stripped; everything else goes to the resolver.
pub async fn resolve_image(
    resolver: &dyn AssetResolver,
    application_id: &str,
    image_url: &str,
) -> Result<Option<String>, PresenceError> {
    if ATTACHMENT_RE.is_match(image_url) {
        return Ok(Some(format!(
            "mp:{}",
            ATTACHMENT_HOST_RE.replace(image_url, "")
        )));
    }

    let ids = resolver
        .fetch_asset_ids(application_id, &[image_url.to_string()])
        .await?;

    Ok(ids.into_iter().next().filter(|id| !id.is_empty()))
}
