use tokio::sync::broadcast;
use vaultfs_primitives::{EntryId, FsPath};

/// Notifications crossing the boundary between the local filesystem core
/// and the sync engine. The core publishes `EntryUpdated` and
/// `WorkspaceLoaded`; the remaining variants are published by the sync
/// engine and only consumed here (cache invalidation on remote changes).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FsEvent {
    EntryUpdated { id: EntryId },
    WorkspaceLoaded { path: FsPath, id: EntryId },
    EntryMinimalSynced { path: FsPath, id: EntryId },
    EntrySynced { path: FsPath, id: EntryId },
    EntryRemoteChanged { path: FsPath, id: EntryId },
}

/// Many-readers/one-writer fan-out. Publishing never blocks and never
/// fails: with no subscriber the event is simply dropped. Listeners must
/// not call back into the filesystem synchronously.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<FsEvent>,
}

const DEFAULT_CAPACITY: usize = 256;

impl EventBus {
    pub fn new(capacity: usize) -> EventBus {
        let (sender, _) = broadcast::channel(capacity);
        EventBus { sender }
    }

    pub fn send(&self, event: FsEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FsEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> EventBus {
        EventBus::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_fan_out_to_every_subscriber() {
        let bus = EventBus::default();

        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let event = FsEvent::EntryUpdated { id: EntryId::generate() };
        bus.send(event.clone());

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_send_without_subscribers_is_fine() {
        let bus = EventBus::default();

        bus.send(FsEvent::EntryUpdated { id: EntryId::generate() });
    }
}
