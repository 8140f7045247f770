//! In-process session used by the demo binary and the tests.
//!
//! Links share a name registry with their session so a released link frees its
//! name, which also makes release observable through `live_links`.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;

use super::{DeliveryId, InboundTransfers, ReceiverEndpoint, Session};
use crate::error::TransportError;
use crate::terminus::Terminus;

type Registry = Arc<Mutex<HashSet<String>>>;

#[derive(Debug, Clone)]
pub struct MemorySession {
    id: String,
    ended: bool,
    filter_limit: Option<usize>,
    registry: Registry,
}

impl MemorySession {
    pub fn new() -> Self {
        Self {
            id: format!("session-{}", Uuid::new_v4().simple()),
            ended: false,
            filter_limit: None,
            registry: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Sources of links attached from now on reject filters above `limit` bytes.
    pub fn with_filter_limit(mut self, limit: usize) -> Self {
        self.filter_limit = Some(limit);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ended sessions refuse new attachments.
    pub fn end(&mut self) {
        self.ended = true;
    }

    pub fn live_links(&self) -> usize {
        self.registry.lock().map(|names| names.len()).unwrap_or(0)
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for MemorySession {
    type Endpoint = MemoryLink;

    fn attach_receiver(&mut self, name: &str) -> Result<MemoryLink, TransportError> {
        if self.ended {
            return Err(TransportError::InvalidSession(format!("{} has ended", self.id)));
        }
        let mut names = self
            .registry
            .lock()
            .map_err(|_| TransportError::InvalidSession(format!("{} registry poisoned", self.id)))?;
        if !names.insert(name.to_string()) {
            return Err(TransportError::NameCollision(name.to_string()));
        }
        drop(names);

        let source = match self.filter_limit {
            Some(limit) => Terminus::with_filter_limit(limit),
            None => Terminus::new(),
        };
        debug!(session = %self.id, link = name, "receiver link allocated");
        Ok(MemoryLink {
            name: name.to_string(),
            source,
            registry: Arc::clone(&self.registry),
            unsettled: Vec::new(),
            pending: VecDeque::new(),
            credit: 0,
            next_delivery: 0,
            flows: Vec::new(),
            closed: false,
        })
    }
}

#[derive(Debug)]
pub struct MemoryLink {
    name: String,
    source: Terminus,
    registry: Registry,
    unsettled: Vec<DeliveryId>,
    // arrived, cursor not yet moved past
    pending: VecDeque<DeliveryId>,
    credit: u32,
    next_delivery: u64,
    flows: Vec<u32>,
    closed: bool,
}

impl MemoryLink {
    pub fn credit(&self) -> u32 {
        self.credit
    }

    /// Every credit value announced to the peer, oldest first.
    pub fn flows(&self) -> &[u32] {
        &self.flows
    }

    fn position(&self, delivery: DeliveryId) -> Option<usize> {
        self.unsettled.iter().position(|&d| d == delivery)
    }
}

impl InboundTransfers for MemoryLink {
    fn arrive(&mut self) -> Result<DeliveryId, TransportError> {
        if self.closed {
            return Err(TransportError::Link(format!("{} is detaching", self.name)));
        }
        if self.credit == 0 {
            return Err(TransportError::NoCredit(self.name.clone()));
        }
        self.credit -= 1;
        let delivery = DeliveryId(self.next_delivery);
        self.next_delivery += 1;
        self.unsettled.push(delivery);
        self.pending.push_back(delivery);
        Ok(delivery)
    }
}

impl ReceiverEndpoint for MemoryLink {
    fn source(&self) -> &Terminus {
        &self.source
    }

    fn source_mut(&mut self) -> &mut Terminus {
        &mut self.source
    }

    fn unsettled_head(&self) -> Option<DeliveryId> {
        self.unsettled.first().copied()
    }

    fn unsettled_next(&self, delivery: DeliveryId) -> Option<DeliveryId> {
        self.position(delivery)
            .and_then(|index| self.unsettled.get(index + 1))
            .copied()
    }

    fn current(&self) -> Option<DeliveryId> {
        self.pending.front().copied()
    }

    fn flow(&mut self, link_credit: u32) {
        self.credit = link_credit;
        self.flows.push(link_credit);
    }

    fn advance(&mut self) -> bool {
        self.pending.pop_front().is_some()
    }

    fn settle(&mut self, delivery: DeliveryId) -> bool {
        match self.position(delivery) {
            Some(index) => {
                self.unsettled.remove(index);
                self.pending.retain(|&d| d != delivery);
                true
            }
            None => false,
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.credit = 0;
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) {
        if let Ok(mut names) = self.registry.lock() {
            names.remove(&self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_collide_until_released() {
        let mut session = MemorySession::new();
        let link = session.attach_receiver("a").unwrap();
        assert_eq!(
            session.attach_receiver("a").unwrap_err(),
            TransportError::NameCollision("a".into())
        );
        assert_eq!(session.live_links(), 1);
        drop(link);
        assert_eq!(session.live_links(), 0);
        assert!(session.attach_receiver("a").is_ok());
    }

    #[test]
    fn ended_session_refuses_attach() {
        let mut session = MemorySession::new();
        session.end();
        assert!(matches!(
            session.attach_receiver("a"),
            Err(TransportError::InvalidSession(_))
        ));
    }

    #[test]
    fn arrivals_consume_credit() {
        let mut session = MemorySession::new();
        let mut link = session.attach_receiver("a").unwrap();
        assert_eq!(link.arrive().unwrap_err(), TransportError::NoCredit("a".into()));

        link.flow(2);
        let first = link.arrive().unwrap();
        let second = link.arrive().unwrap();
        assert!(link.arrive().is_err());
        assert_eq!(link.unsettled_head(), Some(first));
        assert_eq!(link.unsettled_next(first), Some(second));
        assert_eq!(link.unsettled_next(second), None);
    }

    #[test]
    fn cursor_and_settlement() {
        let mut session = MemorySession::new();
        let mut link = session.attach_receiver("a").unwrap();
        link.flow(3);
        let d0 = link.arrive().unwrap();
        let d1 = link.arrive().unwrap();
        let d2 = link.arrive().unwrap();

        assert_eq!(link.current(), Some(d0));
        assert!(link.advance());
        assert_eq!(link.current(), Some(d1));

        assert!(link.settle(d1));
        assert!(!link.settle(d1));
        assert_eq!(link.current(), Some(d2));
        assert_eq!(link.unsettled_next(d0), Some(d2));
    }
}
