//! Triple derivation and the collision check that picks the table modulus.

use crate::hash::{Triple, TripleHash};

/// Triples of every key at modulus `m3`, in input order.
pub(crate) fn fill_triples<K, V, H>(items: &[(K, V)], hasher: &H, m3: u32) -> Vec<Triple>
where
    H: TripleHash<K>,
{
    items.iter().map(|(k, _)| hasher.triple(k, m3)).collect()
}

/// `true` if two keys share all three slots.
///
/// Such keys would be parallel hyperedges, which never peel.
pub(crate) fn has_collision(triples: &[Triple]) -> bool {
    let mut sorted = triples.to_vec();
    sorted.sort_unstable();
    sorted.windows(2).any(|w| w[0] == w[1])
}

/// Smallest modulus worth probing: `⌊gamma·n/3⌋ + 1`.
///
/// `None` when `3 * m3` would not fit `u32` slot ids.
pub(crate) fn initial_m3(n: usize, gamma: f64) -> Option<u64> {
    const LIMIT: u64 = u32::MAX as u64 / 3;
    let start = (gamma * n as f64 / 3.0).floor();
    if !(start < LIMIT as f64) {
        return None;
    }
    (start as u64).checked_add(1).filter(|&m3| m3 <= LIMIT)
}
