//! Shuffle view bookkeeping.
//!
//! A shuffle view is a permutation of base playlist positions. The store
//! keeps one only while shuffle is on.

use rand::Rng;
use rand::seq::SliceRandom;

/// Permutation of `0..len` with `current` pinned at slot 0 and every other
/// position uniformly shuffled.
pub(crate) fn shuffled_order<R: Rng + ?Sized>(len: usize, current: usize, rng: &mut R) -> Vec<usize> {
    let mut rest: Vec<usize> = (0..len).filter(|&i| i != current).collect();
    rest.shuffle(rng);

    let mut order = Vec::with_capacity(len);
    if current < len {
        order.push(current);
    }
    order.extend(rest);
    order
}

/// Drop base position `removed` from `order` and shift the positions after
/// it down by one. Returns the slot it occupied.
pub(crate) fn remove_position(order: &mut Vec<usize>, removed: usize) -> Option<usize> {
    let slot = order.iter().position(|&i| i == removed);
    if let Some(slot) = slot {
        order.remove(slot);
    }
    for i in order.iter_mut() {
        if *i > removed {
            *i -= 1;
        }
    }
    slot
}
