//! Seams to the session layer that owns the wire.
//!
//! The receiver never touches frames. It asks a `Session` for an endpoint and
//! then walks the endpoint's unsettled deliveries, issues credit and settles
//! through it. Dropping an endpoint frees the transport-side link.

pub mod memory;

use crate::error::TransportError;
use crate::terminus::Terminus;

/// Identity of one transfer on a link. Only compared, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeliveryId(pub u64);

pub trait Session {
    type Endpoint: ReceiverEndpoint;

    fn attach_receiver(&mut self, name: &str) -> Result<Self::Endpoint, TransportError>;
}

pub trait ReceiverEndpoint {
    fn source(&self) -> &Terminus;
    fn source_mut(&mut self) -> &mut Terminus;

    /// Oldest delivery not yet settled.
    fn unsettled_head(&self) -> Option<DeliveryId>;
    fn unsettled_next(&self, delivery: DeliveryId) -> Option<DeliveryId>;
    /// Delivery under the consumption cursor.
    fn current(&self) -> Option<DeliveryId>;

    /// Announce `link_credit` to the peer. The value replaces any credit
    /// granted before; deliveries already counted by the peer are not granted
    /// again.
    fn flow(&mut self, link_credit: u32);

    /// Move the cursor past the current delivery. Returns false if there was none.
    fn advance(&mut self) -> bool;
    fn settle(&mut self, delivery: DeliveryId) -> bool;

    /// Begin the local detach. Resources are freed on drop.
    fn close(&mut self);
}

/// Transfers the peer pushes onto a link. Kept apart from `ReceiverEndpoint`
/// so code feeding deliveries cannot touch credit.
pub trait InboundTransfers {
    /// Peer sends one transfer, consuming a unit of credit.
    fn arrive(&mut self) -> Result<DeliveryId, TransportError>;
}
