pub mod client;
pub mod profile;

pub use client::{FetchRoute, ProfileFetcher, SteamProfileClient};
pub use profile::{CurrentGame, MiniProfile};
