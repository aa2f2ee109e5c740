//! Property tests for the tip rack allocator.
//!
//! Random request sequences (including invalid counts) must give the same
//! answers on every run, never un-consume a slot, and leave the rack
//! untouched whenever a request fails.

use multitip::{RackError, TipRackAllocator};
use multitip_common::rack::SlotState;
use proptest::prelude::*;
use std::collections::HashSet;

fn requests() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..=10, 0..80)
}

proptest! {
    #[test]
    fn same_requests_give_same_slots(seq in requests()) {
        let mut a = TipRackAllocator::standard();
        let mut b = TipRackAllocator::standard();
        for &n in &seq {
            prop_assert_eq!(a.allocate(n), b.allocate(n));
        }
        prop_assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn consumed_set_only_grows(seq in requests()) {
        let mut rack = TipRackAllocator::standard();
        let mut consumed = HashSet::new();
        for &n in &seq {
            let _ = rack.allocate(n);
            let now: HashSet<_> = rack.snapshot().consumed().collect();
            prop_assert!(consumed.is_subset(&now));
            consumed = now;
        }
    }

    #[test]
    fn failed_requests_change_nothing(seq in requests()) {
        let mut rack = TipRackAllocator::standard();
        for &n in &seq {
            let before = rack.snapshot();
            match rack.allocate(n) {
                Ok(_) => prop_assert_eq!(rack.consumed(), before.slots().len() - before.available_count() + n),
                Err(RackError::InvalidRequest { .. }) => {
                    prop_assert!(n == 0 || n > 8);
                    prop_assert_eq!(rack.snapshot(), before);
                }
                Err(RackError::OutOfTips { .. }) => prop_assert_eq!(rack.snapshot(), before),
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn returned_slot_tops_a_freshly_consumed_block(seq in requests()) {
        let mut rack = TipRackAllocator::standard();
        for &n in &seq {
            let before = rack.snapshot();
            if let Ok(slot) = rack.allocate(n) {
                // The block runs from `slot` down n - 1 rows, all newly consumed.
                let top = slot.row() as usize;
                prop_assert!(top + n <= 8);
                for row in top..top + n {
                    let cell = multitip_common::rack::SlotId::new(row as u8, slot.column()).unwrap();
                    prop_assert_eq!(before.state_of(cell), Some(SlotState::Available));
                    prop_assert_eq!(rack.state(cell), Some(SlotState::Consumed));
                }
            }
        }
    }
}
