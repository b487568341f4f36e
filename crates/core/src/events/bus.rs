use tokio::sync::broadcast;

use super::types::{PageEvent, SiteEvent};

/// Fan-out of page changes to connected admin listeners. In-process only:
/// a listener attached to another node sees nothing.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SiteEvent>,
}

impl EventBus {
    /// Listeners that fall more than `capacity` events behind are told to
    /// reconnect.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Announce a committed page change. Returns how many listeners got it.
    pub fn notify(&self, event: PageEvent) -> usize {
        match self.sender.send(SiteEvent::Page(event)) {
            Ok(delivered) => delivered,
            Err(_) => {
                tracing::trace!("no page listeners");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SiteEvent> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PageEventKind;
    use chrono::Utc;
    use tokio::sync::broadcast::error::RecvError;
    use uuid::Uuid;

    fn event(kind: PageEventKind) -> PageEvent {
        PageEvent {
            kind,
            page_id: Uuid::new_v4(),
            slug: "roof-repair".into(),
            revision_id: None,
            actor: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn every_listener_sees_the_change() {
        let bus = EventBus::new(16);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.listener_count(), 2);

        assert_eq!(bus.notify(event(PageEventKind::Published)), 2);

        for rx in [&mut first, &mut second] {
            let SiteEvent::Page(got) = rx.recv().await.unwrap() else {
                panic!("expected page event");
            };
            assert_eq!(got.kind, PageEventKind::Published);
        }
    }

    #[test]
    fn notify_without_listeners_delivers_nothing() {
        let bus = EventBus::new(4);
        assert_eq!(bus.notify(event(PageEventKind::Updated)), 0);
    }

    #[tokio::test]
    async fn slow_listener_lags() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..3 {
            bus.notify(event(PageEventKind::Updated));
        }
        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
    }
}
