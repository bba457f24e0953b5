/// Errors raised while polling a profile and publishing presence.
///
/// None of these are retried inside a cycle; the background task logs them
/// and the next tick starts from scratch.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("profile request failed with status {0}")]
    Status(u16),

    #[error("failed to parse profile: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("asset resolution failed: {0}")]
    AssetResolution(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
