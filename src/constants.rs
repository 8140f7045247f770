//! AMQP 1.0 wire constants used by the terminus encoder.

// === FORMAT CODES ===
pub const DESCRIBED: u8 = 0x00;
pub const ULONG_ZERO: u8 = 0x44;
pub const SMALL_ULONG: u8 = 0x53;
pub const ULONG: u8 = 0x80;
pub const STR8: u8 = 0xA1;
pub const STR32: u8 = 0xB1;
pub const SYM8: u8 = 0xA3;
pub const SYM32: u8 = 0xB3;
pub const MAP8: u8 = 0xC1;
pub const MAP32: u8 = 0xD1;

/// Filter set key under which the legacy topic filter is registered.
pub const SUBJECT_FILTER_KEY: &str = "subject";

// === FILTER DESCRIPTORS ===
/// Descriptor codes for the source filters this receiver knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum FilterDescriptor {
    /// Subject-based selection kept for older brokers, domain 0x468C.
    LegacyTopic = 0x0000_468C_0000_0001,
}

impl FilterDescriptor {
    pub const fn code(self) -> u64 {
        self as u64
    }
}
