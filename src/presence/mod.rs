pub mod activity;
pub mod assets;
mod manager;
mod publisher;
mod traits;

pub use activity::{Activity, ActivityAssets, ActivityType, ActivityUpdate};
pub use assets::{AssetResolver, DirectUrlResolver, ExternalAssetResolver};
pub use manager::{start_presence_background_task, CycleOutcome, PresenceManager, PresenceTask};
pub use publisher::PresencePublisher;
pub use traits::{EventBus, StdoutEventBus};
