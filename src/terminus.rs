//! Source terminus and the legacy subject filter written into it.

use tracing::trace;

use crate::address::Address;
use crate::codec::{Data, Encoder};
use crate::constants::{FilterDescriptor, SUBJECT_FILTER_KEY};
use crate::error::CodecError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Terminus {
    address: Option<String>,
    filter: Data,
}

impl Terminus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminus whose filter buffer refuses encodings larger than `limit` bytes.
    pub fn with_filter_limit(limit: usize) -> Self {
        Self {
            address: None,
            filter: Data::with_limit(limit),
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn filter(&self) -> &Data {
        &self.filter
    }

    /// Rewrite address and filter from `address`. Both are built off to the
    /// side and only swapped in once every write succeeded.
    pub fn configure(&mut self, address: &Address) -> Result<(), CodecError> {
        let mut filter = self.filter.empty_like();
        if let Some(subject) = address.subject() {
            write_subject_filter(&mut filter, subject)?;
        }
        let bytes = filter.encode()?;
        trace!(address = address.name(), filter = %hex(&bytes), "source terminus encoded");

        self.address = Some(address.name().to_string());
        self.filter = filter;
        Ok(())
    }
}

/// `{ "subject": described(LegacyTopic, subject) }`
pub fn write_subject_filter<E: Encoder + ?Sized>(encoder: &mut E, subject: &str) -> Result<(), CodecError> {
    encoder.put_map()?;
    encoder.enter()?;
    encoder.put_symbol(SUBJECT_FILTER_KEY)?;
    encoder.put_described()?;
    encoder.enter()?;
    encoder.put_ulong(FilterDescriptor::LegacyTopic.code())?;
    encoder.put_string(subject)?;
    encoder.exit()?;
    encoder.exit()?;
    Ok(())
}

/// Lowercase hex rendering used when logging or printing encoded filters.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Value;

    /// Records every encoder call so the nesting order can be checked.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Encoder for Recorder {
        fn put_map(&mut self) -> Result<(), CodecError> {
            self.calls.push("map".into());
            Ok(())
        }
        fn put_described(&mut self) -> Result<(), CodecError> {
            self.calls.push("described".into());
            Ok(())
        }
        fn put_symbol(&mut self, symbol: &str) -> Result<(), CodecError> {
            self.calls.push(format!("symbol:{}", symbol));
            Ok(())
        }
        fn put_ulong(&mut self, value: u64) -> Result<(), CodecError> {
            self.calls.push(format!("ulong:{:#x}", value));
            Ok(())
        }
        fn put_string(&mut self, value: &str) -> Result<(), CodecError> {
            self.calls.push(format!("string:{}", value));
            Ok(())
        }
        fn enter(&mut self) -> Result<(), CodecError> {
            self.calls.push("enter".into());
            Ok(())
        }
        fn exit(&mut self) -> Result<(), CodecError> {
            self.calls.push("exit".into());
            Ok(())
        }
    }

    #[test]
    fn subject_filter_write_order() {
        let mut recorder = Recorder::default();
        write_subject_filter(&mut recorder, "orders").unwrap();
        assert_eq!(
            recorder.calls,
            vec![
                "map",
                "enter",
                "symbol:subject",
                "described",
                "enter",
                "ulong:0x468c00000001",
                "string:orders",
                "exit",
                "exit",
            ]
        );
    }

    #[test]
    fn configure_with_subject() {
        let address = Address::new("topic://events").unwrap().with_subject("orders");
        let mut terminus = Terminus::new();
        terminus.configure(&address).unwrap();

        assert_eq!(terminus.address(), Some("topic://events"));
        assert_eq!(
            terminus.filter().values().unwrap(),
            vec![Value::Map(vec![(
                Value::Symbol("subject".into()),
                Value::Described(
                    Box::new(Value::Ulong(0x0000_468C_0000_0001)),
                    Box::new(Value::String("orders".into()))
                )
            )])]
        );
    }

    #[test]
    fn hex_renders_lowercase_pairs() {
        assert_eq!(hex(&[0x00, 0x46, 0x8C, 0xff]), "00468cff");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn configure_without_subject_leaves_filter_empty() {
        let mut terminus = Terminus::new();
        terminus.configure(&Address::new("queue://plain").unwrap()).unwrap();
        assert_eq!(terminus.address(), Some("queue://plain"));
        assert!(terminus.filter().is_empty());
        assert!(terminus.filter().encode().unwrap().is_empty());
    }

    #[test]
    fn rejected_write_leaves_terminus_untouched() {
        let mut terminus = Terminus::with_filter_limit(16);
        let before = terminus.clone();
        let address = Address::new("queue://orders").unwrap().with_subject("a-subject-that-does-not-fit");

        let err = terminus.configure(&address).unwrap_err();
        assert!(matches!(err, CodecError::Overflow { limit: 16, .. }));
        assert_eq!(terminus, before);
    }
}
