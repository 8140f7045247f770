//! Receiving end of an AMQP 1.0 link.
//!
//! A [`Receiver`] attaches to a named source through a [`transport::Session`],
//! writes its source terminus (address plus optional legacy subject filter),
//! issues credit and reports how many deliveries are available and unsettled.

pub mod address;
pub mod codec;
pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod receiver;
pub mod terminus;
pub mod transport;

pub use address::Address;
pub use constants::FilterDescriptor;
pub use error::{CodecError, ReceiverError, Result, TransportError};
pub use receiver::Receiver;
pub use transport::{DeliveryId, InboundTransfers, ReceiverEndpoint, Session};
