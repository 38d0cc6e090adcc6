//! Event handler capability
//!
//! The handler is the only thing sessions share. It is called from every
//! connection's task, possibly at the same time, so implementations must be
//! safe for concurrent use or serialize themselves.

use std::sync::Arc;

use lumberjack_protocol::FileEvent;

/// Consumer of decoded events
///
/// `handle` runs to completion before the event's ack is written, so any
/// side effect it has happens before the sender sees the ack.
pub trait EventHandler: Send + Sync {
    /// Consume one event
    fn handle(&self, event: FileEvent);
}

impl<F> EventHandler for F
where
    F: Fn(FileEvent) + Send + Sync,
{
    #[inline]
    fn handle(&self, event: FileEvent) {
        self(event)
    }
}

/// Handler shared by all sessions of a server
pub type SharedHandler = Arc<dyn EventHandler>;

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_closure_is_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: SharedHandler = Arc::new(move |event: FileEvent| {
            sink.lock().unwrap().push(event.text);
        });

        handler.handle(FileEvent {
            text: "first".into(),
            ..Default::default()
        });

        assert_eq!(*seen.lock().unwrap(), vec!["first".to_string()]);
    }
}
