//! Credit bookkeeping and the delivery counters derived from a link.
//!
//! Counters are recomputed from the endpoint's unsettled sequence on every
//! call; nothing is cached, so they cannot drift from what the transport holds.

use crate::transport::{DeliveryId, ReceiverEndpoint};

/// Walks the unsettled sequence from its head in arrival order.
pub struct Unsettled<'a, E: ?Sized> {
    endpoint: &'a E,
    next: Option<DeliveryId>,
}

impl<'a, E: ReceiverEndpoint + ?Sized> Unsettled<'a, E> {
    pub fn new(endpoint: &'a E) -> Self {
        Self {
            endpoint,
            next: endpoint.unsettled_head(),
        }
    }
}

impl<E: ReceiverEndpoint + ?Sized> Iterator for Unsettled<'_, E> {
    type Item = DeliveryId;

    fn next(&mut self) -> Option<DeliveryId> {
        let delivery = self.next?;
        self.next = self.endpoint.unsettled_next(delivery);
        Some(delivery)
    }
}

pub fn unsettled_count<E: ReceiverEndpoint + ?Sized>(endpoint: &E) -> u32 {
    Unsettled::new(endpoint).fold(0, |count, _| count + 1)
}

/// Deliveries from the head up to and including the cursor. A cursor outside
/// the unsettled sequence counts the whole sequence.
pub fn available_count<E: ReceiverEndpoint + ?Sized>(endpoint: &E) -> u32 {
    let current = endpoint.current();
    let mut count = 0;
    for delivery in Unsettled::new(endpoint) {
        count += 1;
        if Some(delivery) == current {
            break;
        }
    }
    count
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreditLedger {
    requested: u32,
    reissued: u64,
}

impl CreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> u32 {
        self.requested
    }

    /// Number of times credit was announced to the peer.
    pub fn reissued(&self) -> u64 {
        self.reissued
    }

    /// Commit `capacity` and announce it in one step. Nothing is sent when the
    /// value is unchanged. Returns whether a flow update went out.
    pub fn reissue<E: ReceiverEndpoint + ?Sized>(&mut self, endpoint: &mut E, capacity: u32) -> bool {
        if capacity == self.requested {
            return false;
        }
        self.requested = capacity;
        endpoint.flow(capacity);
        self.reissued += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::{MemoryLink, MemorySession};
    use crate::transport::{InboundTransfers, Session};
    use proptest::prelude::*;

    fn link_with(arrivals: u32, advances: u32) -> (MemorySession, MemoryLink) {
        let mut session = MemorySession::new();
        let mut link = session.attach_receiver("ledger").unwrap();
        link.flow(arrivals);
        for _ in 0..arrivals {
            link.arrive().unwrap();
        }
        for _ in 0..advances {
            link.advance();
        }
        (session, link)
    }

    #[test]
    fn empty_link_counts_nothing() {
        let (_session, link) = link_with(0, 0);
        assert_eq!(unsettled_count(&link), 0);
        assert_eq!(available_count(&link), 0);
    }

    #[test]
    fn available_stops_at_cursor() {
        let (_session, link) = link_with(3, 1);
        assert_eq!(available_count(&link), 2);
        assert_eq!(unsettled_count(&link), 3);
    }

    #[test]
    fn cursor_past_the_end_counts_everything() {
        let (_session, link) = link_with(3, 3);
        assert_eq!(link.current(), None);
        assert_eq!(available_count(&link), 3);
    }

    #[test]
    fn unchanged_capacity_sends_no_flow() {
        let (_session, mut link) = link_with(0, 0);
        let mut ledger = CreditLedger::new();
        assert!(!ledger.reissue(&mut link, 0));
        assert!(ledger.reissue(&mut link, 10));
        assert!(!ledger.reissue(&mut link, 10));
        assert_eq!(ledger.reissued(), 1);
        assert_eq!(link.flows(), &[0, 10]);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Arrive,
        Advance,
        Settle(usize),
        Flow(u32),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            3 => Just(Step::Arrive),
            2 => Just(Step::Advance),
            2 => any::<usize>().prop_map(Step::Settle),
            1 => (0u32..8).prop_map(Step::Flow),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn available_never_exceeds_unsettled(steps in proptest::collection::vec(step(), 0..80)) {
            let (_session, mut link) = link_with(4, 0);
            for step in steps {
                match step {
                    Step::Arrive => {
                        let _ = link.arrive();
                    }
                    Step::Advance => {
                        link.advance();
                    }
                    Step::Settle(pick) => {
                        let ids: Vec<_> = Unsettled::new(&link).collect();
                        if !ids.is_empty() {
                            link.settle(ids[pick % ids.len()]);
                        }
                    }
                    Step::Flow(credit) => link.flow(credit),
                }
                let available = available_count(&link);
                let unsettled = unsettled_count(&link);
                prop_assert!(available <= unsettled, "available {} > unsettled {}", available, unsettled);
                prop_assert_eq!(unsettled as usize, Unsettled::new(&link).count());
            }
        }

        #[test]
        fn requested_tracks_last_set(values in proptest::collection::vec(any::<u32>(), 1..20)) {
            let (_session, mut link) = link_with(0, 0);
            let mut ledger = CreditLedger::new();
            for &value in &values {
                ledger.reissue(&mut link, value);
                prop_assert_eq!(ledger.requested(), value);
                prop_assert_eq!(link.credit(), value);
            }
        }
    }
}
