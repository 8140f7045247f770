use crate::error::{ReceiverError, Result};

/// Resolved source descriptor handed over by the address resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    name: String,
    subject: Option<String>,
}

impl Address {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ReceiverError::InvalidAddress("resource name must not be empty".into()));
        }
        Ok(Self { name, subject: None })
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        self.subject = if subject.is_empty() { None } else { Some(subject) };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subject used for legacy topic filtering. Empty subjects are stored as `None`.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }
}
