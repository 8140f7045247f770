//! Single-task event loop owning a receiver.
//!
//! Capacity changes, incoming transfers, cursor moves and settlements are all
//! funnelled through one channel, so they are applied strictly in the order
//! they were sent and never race each other.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{ReceiverError, Result};
use crate::receiver::Receiver;
use crate::transport::{DeliveryId, InboundTransfers, ReceiverEndpoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    SetCapacity(u32),
    /// The peer pushed one transfer onto the link.
    Incoming,
    Advance,
    Settle(DeliveryId),
    Close,
}

impl LinkEvent {
    fn kind(&self) -> &'static str {
        match self {
            LinkEvent::SetCapacity(_) => "set-capacity",
            LinkEvent::Incoming => "incoming",
            LinkEvent::Advance => "advance",
            LinkEvent::Settle(_) => "settle",
            LinkEvent::Close => "close",
        }
    }
}

/// Counters observed right before the link was closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSnapshot {
    pub name: String,
    pub capacity: u32,
    pub available: u32,
    pub unsettled: u32,
    pub flow_updates: u64,
    pub rejected_events: usize,
    pub closed: bool,
}

impl LinkSnapshot {
    pub fn print_summary(&self) {
        println!("=== Link {} ===", self.name);
        println!("Capacity: {}", self.capacity);
        println!("Available: {}", self.available);
        println!("Unsettled: {}", self.unsettled);
        println!("Flow updates: {}", self.flow_updates);
        println!("Rejected events: {}", self.rejected_events);
        println!("Closed: {}", self.closed);
    }
}

pub struct LinkDriver<E: ReceiverEndpoint> {
    receiver: Receiver<E>,
    events: mpsc::UnboundedReceiver<LinkEvent>,
    rejected: usize,
}

impl<E> LinkDriver<E>
where
    E: ReceiverEndpoint + InboundTransfers + Send + 'static,
{
    pub fn new(receiver: Receiver<E>) -> (Self, mpsc::UnboundedSender<LinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let driver = Self {
            receiver,
            events: rx,
            rejected: 0,
        };
        (driver, tx)
    }

    pub fn spawn(receiver: Receiver<E>) -> (mpsc::UnboundedSender<LinkEvent>, JoinHandle<Result<LinkSnapshot>>) {
        let (driver, tx) = Self::new(receiver);
        (tx, tokio::spawn(driver.run()))
    }

    /// Apply events until `Close` arrives or every sender is gone, then close
    /// the receiver.
    pub async fn run(mut self) -> Result<LinkSnapshot> {
        while let Some(event) = self.events.recv().await {
            let outcome = match event {
                LinkEvent::Close => break,
                LinkEvent::SetCapacity(capacity) => self.receiver.set_capacity(capacity),
                LinkEvent::Incoming => self.receiver.incoming().map(|delivery| {
                    debug!(link = self.receiver.name(), delivery = delivery.0, "transfer arrived");
                }),
                LinkEvent::Advance => self.receiver.advance().map(|consumed| {
                    debug!(link = self.receiver.name(), delivery = ?consumed, "cursor advanced");
                }),
                LinkEvent::Settle(delivery) => match self.receiver.settle(delivery) {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(ReceiverError::UnknownDelivery(delivery.0)),
                    Err(err) => Err(err),
                },
            };
            if let Err(err) = outcome {
                warn!(link = self.receiver.name(), event = event.kind(), error = %err, "event rejected");
                self.rejected += 1;
            }
        }

        let mut snapshot = LinkSnapshot {
            name: self.receiver.name().to_string(),
            capacity: self.receiver.capacity(),
            available: self.receiver.available()?,
            unsettled: self.receiver.unsettled()?,
            flow_updates: self.receiver.flow_updates(),
            rejected_events: self.rejected,
            closed: false,
        };
        self.receiver.close()?;
        snapshot.closed = self.receiver.is_closed();
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::transport::memory::{MemoryLink, MemorySession};

    fn receiver(session: &mut MemorySession) -> Receiver<MemoryLink> {
        Receiver::attach(session, "driven", Address::new("queue://work").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn events_apply_in_order() {
        let mut session = MemorySession::new();
        let (tx, handle) = LinkDriver::spawn(receiver(&mut session));

        tx.send(LinkEvent::SetCapacity(3)).unwrap();
        for _ in 0..3 {
            tx.send(LinkEvent::Incoming).unwrap();
        }
        tx.send(LinkEvent::Advance).unwrap();
        tx.send(LinkEvent::Close).unwrap();

        let snapshot = handle.await.unwrap().unwrap();
        assert_eq!(snapshot.capacity, 3);
        assert_eq!(snapshot.available, 2);
        assert_eq!(snapshot.unsettled, 3);
        assert_eq!(snapshot.flow_updates, 1);
        assert_eq!(snapshot.rejected_events, 0);
        assert!(snapshot.closed);
        assert_eq!(session.live_links(), 0);
    }

    #[tokio::test]
    async fn arrival_without_credit_is_rejected_not_fatal() {
        let mut session = MemorySession::new();
        let (tx, handle) = LinkDriver::spawn(receiver(&mut session));

        tx.send(LinkEvent::Incoming).unwrap();
        tx.send(LinkEvent::Settle(DeliveryId(42))).unwrap();
        tx.send(LinkEvent::SetCapacity(1)).unwrap();
        tx.send(LinkEvent::Incoming).unwrap();
        drop(tx);

        let snapshot = handle.await.unwrap().unwrap();
        assert_eq!(snapshot.rejected_events, 2);
        assert_eq!(snapshot.unsettled, 1);
        assert!(snapshot.closed);
    }
}
