//! Real-time event sources.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use feedsync_protocol::WsEvent;
use tokio::sync::mpsc;

/// A stream of decoded real-time events.
///
/// Connection management (auth, reconnects, heartbeats) belongs to the
/// implementation. `None` means the stream ended.
#[async_trait]
pub trait EventSource: Send {
    /// Waits for the next event.
    async fn next_event(&mut self) -> Option<ClientResult<WsEvent>>;
}

/// An event source fed with raw JSON frames through a channel.
///
/// Frames that fail to decode are yielded as errors; the stream continues.
#[derive(Debug)]
pub struct ChannelEventSource {
    frames: mpsc::UnboundedReceiver<String>,
}

impl ChannelEventSource {
    /// Creates a source and the sender feeding it.
    pub fn new() -> (mpsc::UnboundedSender<String>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { frames: rx })
    }
}

#[async_trait]
impl EventSource for ChannelEventSource {
    async fn next_event(&mut self) -> Option<ClientResult<WsEvent>> {
        let frame = self.frames.recv().await?;
        Some(WsEvent::decode(&frame).map_err(ClientError::from))
    }
}

/// An event source replaying already decoded events.
#[derive(Debug, Default)]
pub struct ReplayEventSource {
    events: std::collections::VecDeque<WsEvent>,
}

impl ReplayEventSource {
    /// Creates a source yielding `events` in order.
    pub fn new(events: impl IntoIterator<Item = WsEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

#[async_trait]
impl EventSource for ReplayEventSource {
    async fn next_event(&mut self) -> Option<ClientResult<WsEvent>> {
        self.events.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_source_decodes_frames() {
        let (tx, mut source) = ChannelEventSource::new();
        tx.send(r#"{"type":"feeds.feed.deleted","fid":"user:bob","created_at":"2024-01-01T00:00:00Z"}"#.to_string())
            .unwrap();
        tx.send("not json".to_string()).unwrap();
        drop(tx);

        let event = source.next_event().await.unwrap().unwrap();
        assert_eq!(event.event_type(), "feeds.feed.deleted");
        assert!(source.next_event().await.unwrap().is_err());
        assert!(source.next_event().await.is_none());
    }

    #[tokio::test]
    async fn replay_source_yields_in_order() {
        let mut source = ReplayEventSource::new(vec![WsEvent::Unknown, WsEvent::Unknown]);
        assert!(source.next_event().await.is_some());
        assert!(source.next_event().await.is_some());
        assert!(source.next_event().await.is_none());
    }
}
