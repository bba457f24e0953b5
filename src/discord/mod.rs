mod presence;

pub use presence::DiscordEventBus;
