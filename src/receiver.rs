//! Receiving link context: identity, owned endpoint, credit and source terminus.
//!
//! A `Receiver` is driven from the thread or task that owns its session. Every
//! mutating call takes `&mut self` and no locking happens inside, so callers
//! that share a receiver must serialize access themselves (see `driver`).

use tracing::{debug, info};

use crate::address::Address;
use crate::error::{ReceiverError, Result};
use crate::ledger::{self, CreditLedger};
use crate::terminus::Terminus;
use crate::transport::{DeliveryId, InboundTransfers, ReceiverEndpoint, Session};

#[derive(Debug)]
pub struct Receiver<E: ReceiverEndpoint> {
    name: String,
    address: Address,
    endpoint: Option<E>,
    ledger: CreditLedger,
}

impl<E: ReceiverEndpoint> Receiver<E> {
    pub fn attach<S>(session: &mut S, name: &str, address: Address) -> Result<Self>
    where
        S: Session<Endpoint = E>,
    {
        let endpoint = session.attach_receiver(name).map_err(ReceiverError::Attach)?;
        debug!(link = name, source = address.name(), "receiver attached");
        Ok(Self {
            name: name.to_string(),
            address,
            endpoint: Some(endpoint),
            ledger: CreditLedger::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        self.address.name()
    }

    pub fn subject(&self) -> Option<&str> {
        self.address.subject()
    }

    // === TERMINUS ===
    /// Write address and subject filter into the link's source terminus.
    pub fn configure(&mut self) -> Result<()> {
        let address = &self.address;
        let endpoint = Self::open(&mut self.endpoint, &self.name)?;
        endpoint.source_mut().configure(address)?;
        debug!(link = %self.name, source = address.name(), subject = ?address.subject(), "source configured");
        Ok(())
    }

    pub fn terminus(&self) -> Result<&Terminus> {
        Ok(self.endpoint()?.source())
    }

    // === FLOW CONTROL ===
    pub fn set_capacity(&mut self, capacity: u32) -> Result<()> {
        let endpoint = Self::open(&mut self.endpoint, &self.name)?;
        let previous = self.ledger.requested();
        if self.ledger.reissue(endpoint, capacity) {
            debug!(link = %self.name, previous, capacity, "credit reissued");
        }
        Ok(())
    }

    pub fn capacity(&self) -> u32 {
        self.ledger.requested()
    }

    pub fn available(&self) -> Result<u32> {
        Ok(ledger::available_count(self.endpoint()?))
    }

    pub fn unsettled(&self) -> Result<u32> {
        Ok(ledger::unsettled_count(self.endpoint()?))
    }

    pub fn flow_updates(&self) -> u64 {
        self.ledger.reissued()
    }

    // === DELIVERIES ===
    /// Consume the delivery under the cursor, returning it.
    pub fn advance(&mut self) -> Result<Option<DeliveryId>> {
        let endpoint = Self::open(&mut self.endpoint, &self.name)?;
        let current = endpoint.current();
        if current.is_some() {
            endpoint.advance();
        }
        Ok(current)
    }

    /// Returns false if the delivery was not unsettled on this link.
    pub fn settle(&mut self, delivery: DeliveryId) -> Result<bool> {
        let endpoint = Self::open(&mut self.endpoint, &self.name)?;
        Ok(endpoint.settle(delivery))
    }

    /// Hand one incoming transfer from the peer to the link. Credit is only
    /// ever changed through `set_capacity`.
    pub fn incoming(&mut self) -> Result<DeliveryId>
    where
        E: InboundTransfers,
    {
        let endpoint = Self::open(&mut self.endpoint, &self.name)?;
        endpoint.arrive().map_err(ReceiverError::Transport)
    }

    /// Read-only view of the owned endpoint.
    pub fn endpoint(&self) -> Result<&E> {
        self.endpoint
            .as_ref()
            .ok_or_else(|| ReceiverError::ClosedLink(self.name.clone()))
    }

    // === LIFECYCLE ===
    /// Detach and release the endpoint. Closing twice is an error.
    pub fn close(&mut self) -> Result<()> {
        let mut endpoint = self
            .endpoint
            .take()
            .ok_or_else(|| ReceiverError::AlreadyClosed(self.name.clone()))?;
        endpoint.close();
        drop(endpoint);
        info!(link = %self.name, "receiver closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.endpoint.is_none()
    }

    fn open<'a>(endpoint: &'a mut Option<E>, name: &str) -> Result<&'a mut E> {
        endpoint
            .as_mut()
            .ok_or_else(|| ReceiverError::ClosedLink(name.to_string()))
    }
}
