use std::fmt;
use std::sync::RwLock;

use cart_schema::SchemaIssue;
use tokio::sync::broadcast;

/// Long-running store operations that report progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Save,
    Load,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Save => f.write_str("save"),
            Self::Load => f.write_str("load"),
        }
    }
}

/// Progress of a save or load, as shown to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationStatus {
    InProgress {
        operation: Operation,
    },
    Succeeded {
        operation: Operation,
        message: String,
    },
    /// The user dismissed the location prompt; nothing changed.
    Cancelled {
        operation: Operation,
    },
    Failed {
        operation: Operation,
        message: String,
        /// Schema path/message pairs when validation failed.
        issues: Vec<SchemaIssue>,
    },
}

impl OperationStatus {
    pub fn operation(&self) -> Operation {
        match self {
            Self::InProgress { operation }
            | Self::Succeeded { operation, .. }
            | Self::Cancelled { operation }
            | Self::Failed { operation, .. } => *operation,
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::InProgress { .. })
    }
}

/// Notifications emitted by a [`DocumentStore`](crate::DocumentStore).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Document content or the saved flag may have changed.
    Changed { saved: bool },
    /// The store returned to the empty state.
    Reset,
    Status(OperationStatus),
}

/// Receiver side of a subscription. Dropping it unsubscribes.
pub type EventStream = broadcast::Receiver<DocumentEvent>;

/// Fan-out of store events to every live subscriber.
pub(crate) struct EventRouter {
    subscribers: RwLock<Vec<broadcast::Sender<DocumentEvent>>>,
    capacity: usize,
}

impl EventRouter {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn subscribe(&self) -> EventStream {
        let (tx, rx) = broadcast::channel(self.capacity);
        self.subscribers
            .write()
            .expect("router lock poisoned")
            .push(tx);
        rx
    }

    /// Deliver `event` to every subscriber, pruning those whose receiver is gone.
    pub(crate) fn emit(&self, event: DocumentEvent) {
        let mut subs = self.subscribers.write().expect("router lock poisoned");
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("router lock poisoned")
            .len()
    }
}
