use thiserror::Error;

// === ENCODER ERRORS ===
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Overflow: encoded size {size} exceeds limit {limit}")]
    Overflow { size: usize, limit: usize },
    #[error("Framing: {0}")]
    Framing(String),
}

// === TRANSPORT ERRORS ===
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Session: {0}")]
    InvalidSession(String),
    #[error("Link name already in use: {0}")]
    NameCollision(String),
    #[error("No link credit for incoming transfer on {0}")]
    NoCredit(String),
    #[error("Link: {0}")]
    Link(String),
}

// === RECEIVER ERRORS ===
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReceiverError {
    #[error("Attach: {0}")]
    Attach(TransportError),
    #[error("Transport: {0}")]
    Transport(TransportError),
    #[error("Encoding: {0}")]
    Encoding(#[from] CodecError),
    #[error("Address: {0}")]
    InvalidAddress(String),
    #[error("Link {0} is closed")]
    ClosedLink(String),
    #[error("Link {0} already closed")]
    AlreadyClosed(String),
    #[error("Delivery {0} is not unsettled")]
    UnknownDelivery(u64),
}

impl ReceiverError {
    /// Attach failures may succeed under another name; everything else is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReceiverError::Attach(_))
    }
}

pub type Result<T> = std::result::Result<T, ReceiverError>;
