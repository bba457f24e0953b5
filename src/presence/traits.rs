use super::activity::ActivityUpdate;

/// Destination for activity updates (Discord IPC, stdout, a host dispatcher).
///
/// Dispatch is fire-and-forget: implementations queue or log failures
/// rather than report them back to the cycle.
pub trait EventBus: Send + Sync {
    /// Returns the name of this bus (for logging)
    fn name(&self) -> &'static str;

    fn dispatch(&self, update: &ActivityUpdate);
}

/// Writes each update as one JSON line on stdout.
pub struct StdoutEventBus;

impl EventBus for StdoutEventBus {
    fn name(&self) -> &'static str {
        "stdout"
    }

    fn dispatch(&self, update: &ActivityUpdate) {
        match serde_json::to_string(update) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!("Failed to serialize activity update: {}", e),
        }
    }
}
