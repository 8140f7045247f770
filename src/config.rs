use clap::Parser;
use uuid::Uuid;

use crate::address::Address;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverConfig {
    pub name: String,
    pub source: String,
    pub subject: Option<String>,
    pub capacity: u32,
}

impl ReceiverConfig {
    pub fn address(&self) -> Result<Address> {
        let address = Address::new(self.source.clone())?;
        Ok(match &self.subject {
            Some(subject) => address.with_subject(subject.clone()),
            None => address,
        })
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            name: generate_link_name(),
            source: "queue://default".to_string(),
            subject: None,
            capacity: 0,
        }
    }
}

pub fn generate_link_name() -> String {
    format!("receiver-{}", Uuid::new_v4().simple())
}

// === COMMAND LINE INTERFACE ===
#[derive(Parser, Debug, Clone)]
#[command(name = "amqp-receiver")]
#[command(about = "AMQP 1.0 receiver link over an in-memory session")]
#[command(version = "0.1.0")]
pub struct Config {
    #[arg(short, long, help = "Link name (generated when omitted)")]
    pub name: Option<String>,

    #[arg(short, long, default_value = "queue://default", help = "Source address")]
    pub source: String,

    #[arg(long, help = "Subject for the legacy topic filter")]
    pub subject: Option<String>,

    #[arg(short, long, default_value = "10", help = "Link capacity (credit)")]
    pub capacity: u32,

    #[arg(long, default_value = "3", help = "Transfers to simulate")]
    pub deliveries: u32,

    #[arg(long, default_value = "1", help = "Deliveries consumed before reporting")]
    pub consume: u32,

    #[arg(long, default_value = "0", help = "Deliveries settled before reporting")]
    pub settle: u32,

    #[arg(short, long, help = "Enable debug output")]
    pub debug: bool,

    #[arg(long, help = "Enable detailed tracing")]
    pub trace: bool,
}

impl Config {
    pub fn to_receiver_config(&self) -> ReceiverConfig {
        ReceiverConfig {
            name: self.name.clone().unwrap_or_else(generate_link_name),
            source: self.source.clone(),
            subject: self.subject.clone(),
            capacity: self.capacity,
        }
    }
}
