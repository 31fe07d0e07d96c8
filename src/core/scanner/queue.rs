// src/core/scanner/queue.rs

use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;

/// A message on the work queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// A raw input line, not yet normalized.
    Target(String),
    /// Tells exactly one worker to stop.
    Shutdown,
}

/// Unbounded FIFO shared by every worker of one scan.
///
/// Pushes never block. Pops wait until an item is available; workers take
/// turns on the receiver, so each item is delivered to exactly one of them.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    sender: UnboundedSender<WorkItem>,
    receiver: Arc<Mutex<UnboundedReceiver<WorkItem>>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    pub fn push(&self, item: WorkItem) {
        // The queue owns its receiver, so the channel cannot be closed here.
        let _ = self.sender.send(item);
    }

    pub async fn pop(&self) -> WorkItem {
        self.receiver
            .lock()
            .await
            .recv()
            .await
            .unwrap_or(WorkItem::Shutdown)
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}
