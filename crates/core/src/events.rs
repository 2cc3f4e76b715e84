//! Engine-to-caller notifications.
//!
//! The engine itself is synchronous; state changes that a front end may want
//! to react to (refreshing price labels, redrawing a station panel) are
//! pushed through an unbounded channel the caller drains at its own pace.

use tokio::sync::mpsc;

use crate::session::StationId;

/// Notifications emitted by the engine after successful state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A rental session began on the given station.
    SessionStarted(StationId),
    /// A station returned to idle, either billed or discarded.
    SessionClosed(StationId),
    /// The price configuration was applied or reset; cached labels are stale.
    ConfigChanged,
}

/// Cloneable handle used by engine components to emit [`EngineEvent`]s.
///
/// A detached handle (no subscriber) swallows events, which keeps the engine
/// usable from tests without wiring a channel.
#[derive(Debug, Clone, Default)]
pub struct EngineEvents {
    sender: Option<mpsc::UnboundedSender<EngineEvent>>,
}

impl EngineEvents {
    /// Create a connected handle plus the receiving end for the caller.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// Handle that drops every event.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Emit an event; a closed or missing receiver is not an error.
    pub fn emit(&self, event: EngineEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
