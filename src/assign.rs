//! g-value assignment over a peel order.

use crate::graph::PeelOrder;
use crate::hash::Triple;

/// g-value of a slot that no key touched. `3 % 3 == 0`, so it is harmless in
/// lookup sums. Every slot of every key's triple ends up in `0..3`.
pub(crate) const UNASSIGNED: u8 = 3;

/// Walk `order` backwards, giving every key one slot of its own.
///
/// The first unvisited position `choice` of each triple gets
/// `g = (9 + choice - sum) % 3`. The triple's other unvisited slots are set to
/// `0` first, so `sum` only counts the chosen slot's `UNASSIGNED` and values
/// already fixed by later keys. Afterwards the triple's g-values sum to
/// `choice` mod 3, and since all three slots are now visited no later key can
/// change any of them.
pub(crate) fn assign(m: usize, edges: &[Triple], order: &PeelOrder) -> Vec<u8> {
    let mut g = vec![UNASSIGNED; m];
    let mut visited = vec![false; m];
    for &e in order.edges().iter().rev() {
        let t = edges[e as usize];
        let Some(choice) = (0..3).find(|&j| !visited[t[j] as usize]) else {
            panic!("edge {e}: all three vertices already visited");
        };
        for (j, v) in t.slots().into_iter().enumerate() {
            if j != choice && !visited[v as usize] {
                g[v as usize] = 0;
            }
        }
        let sum: u8 = t.slots().iter().map(|&v| g[v as usize]).sum();
        g[t[choice] as usize] = (9 + choice as u8 - sum) % 3;
        for v in t.slots() {
            visited[v as usize] = true;
        }
    }
    g
}
