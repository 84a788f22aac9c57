//! Event System
//!
//! Callbacks for RunShare events. Every event reaches every handler, in
//! dispatch order.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::network::ConnectionState;
use crate::tracking::SessionState;

/// Events emitted by RunShare.
#[derive(Debug, Clone, PartialEq)]
pub enum RunShareEvent {
    /// The tracking session changed state.
    SessionStateChanged {
        from: SessionState,
        to: SessionState,
    },

    /// A stopped session was saved to history.
    SessionFinished {
        /// Storage id of the saved run.
        run_id: i64,
    },

    /// Relay connection state changed.
    ConnectionStateChanged {
        /// The new connection state.
        state: ConnectionState,
    },

    /// A subscribed peer sent a new snapshot.
    PeerUpdated {
        /// The peer ID.
        peer_id: String,
    },

    /// A peer went offline or was unsubscribed.
    PeerRemoved {
        /// The peer ID.
        peer_id: String,
    },

    /// A snapshot was written to the offline cache instead of the relay.
    PublishedOffline,
}

/// Event handler trait.
///
/// Implement this trait to receive RunShare events.
pub trait EventHandler: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: RunShareEvent);
}

/// Simple callback-based event handler.
///
/// Wraps a closure for easy event handling.
pub struct CallbackHandler<F>
where
    F: Fn(RunShareEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(RunShareEvent) + Send + Sync,
{
    /// Creates a new callback handler.
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(RunShareEvent) + Send + Sync,
{
    fn on_event(&self, event: RunShareEvent) {
        (self.callback)(event);
    }
}

/// Event dispatcher for managing multiple handlers.
///
/// Handlers can be added while events are flowing; a handler only sees
/// events dispatched after it was added.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event handler.
    pub fn add_handler(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.write().push(handler);
    }

    /// Removes all handlers.
    pub fn clear_handlers(&self) {
        self.handlers.write().clear();
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Dispatches an event to all handlers.
    pub fn dispatch(&self, event: RunShareEvent) {
        let handlers = self.handlers.read().clone();
        for handler in &handlers {
            handler.on_event(event.clone());
        }
    }
}
