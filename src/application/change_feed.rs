//! In-process change notifications for usage and relay-log inserts.
//!
//! Analytics subscribers recompute their report from scratch on every
//! notification; there is no debouncing.

use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangedTable {
    UsageRecords,
    RelayLogs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub user_id: Uuid,
    pub table: ChangedTable,
}

#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, user_id: Uuid, table: ChangedTable) {
        let _ = self.sender.send(ChangeEvent { user_id, table });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
