//! Event stream plumbing
//!
//! The engine's only output channel. Producers hold an [`EventSender`] and
//! the consumer drains an [`EventStream`]; when the consumer drops the
//! stream, every subsequent `emit` fails with [`ConsumerGone`], which the
//! engine treats as cancellation — no further events (in particular no
//! `round_complete`) are produced after that point.

use council_domain::CouncilEvent;
use thiserror::Error;
use tokio::sync::mpsc;

/// The event consumer went away; the run should wind down quietly
#[derive(Debug, Error)]
#[error("event consumer dropped, run cancelled")]
pub struct ConsumerGone;

/// Cloneable sending half of the event stream
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<CouncilEvent>,
}

impl EventSender {
    /// Emit one event to the consumer
    pub fn emit(&self, event: CouncilEvent) -> Result<(), ConsumerGone> {
        self.tx.send(event).map_err(|_| ConsumerGone)
    }
}

/// Receiving half of the event stream
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<CouncilEvent>,
}

impl EventStream {
    /// Create a connected sender/stream pair
    pub fn channel() -> (EventSender, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventSender { tx }, EventStream { rx })
    }

    /// Receive the next event; `None` once all senders are gone
    pub async fn next(&mut self) -> Option<CouncilEvent> {
        self.rx.recv().await
    }

    /// Drain the stream to completion
    pub async fn collect(mut self) -> Vec<CouncilEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_receive() {
        let (tx, mut stream) = EventStream::channel();
        tx.emit(CouncilEvent::Error {
            message: "x".into(),
        })
        .unwrap();
        drop(tx);

        assert!(matches!(
            stream.next().await,
            Some(CouncilEvent::Error { .. })
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_emit_after_consumer_drop_fails() {
        let (tx, stream) = EventStream::channel();
        drop(stream);
        assert!(tx
            .emit(CouncilEvent::Error {
                message: "x".into()
            })
            .is_err());
    }
}
