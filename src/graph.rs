//! 3-uniform hypergraph over table slots and its peeling.
//!
//! Vertices are slot ids, hyperedges are key ids. Both the degree buckets and
//! the per-vertex incident-edge sets are doubly linked lists threaded through
//! flat `u32` arrays, so every removal and degree change is O(1) with no
//! per-node allocation.
//!
//! A node of an incident list is a *port*: the pair (edge `e`, position `j`)
//! encoded as `3 * e + j`, which belongs to the list of vertex `triple[e][j]`.

use crate::hash::Triple;

const NIL: u32 = u32::MAX;

/// Hyperedge ids in removal order; index 0 was peeled first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PeelOrder(Vec<u32>);

impl PeelOrder {
    #[inline]
    pub(crate) fn edges(&self) -> &[u32] {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_edges(edges: Vec<u32>) -> Self {
        Self(edges)
    }
}

/// Peeling stopped with a non-empty 2-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stalled {
    /// Hyperedges removed before the degree-1 bucket ran dry.
    pub(crate) peeled: usize,
}

pub(crate) struct Hypergraph<'a> {
    edges: &'a [Triple],
    degree: Vec<u32>,
    // degree -> first vertex; vertices chained through v_next/v_prev
    bucket_head: Vec<u32>,
    v_next: Vec<u32>,
    v_prev: Vec<u32>,
    // vertex -> first port; ports chained through p_next/p_prev
    inc_head: Vec<u32>,
    p_next: Vec<u32>,
    p_prev: Vec<u32>,
}

impl<'a> Hypergraph<'a> {
    /// `m` vertices, one hyperedge per triple. Every slot in `edges` must be
    /// below `m`, and `3 * edges.len()` must fit below `u32::MAX`.
    pub(crate) fn new(m: usize, edges: &'a [Triple]) -> Self {
        let n = edges.len();
        let mut graph = Self {
            edges,
            degree: vec![0; m],
            bucket_head: vec![NIL; n + 1],
            v_next: vec![NIL; m],
            v_prev: vec![NIL; m],
            inc_head: vec![NIL; m],
            p_next: vec![NIL; 3 * n],
            p_prev: vec![NIL; 3 * n],
        };
        for (e, t) in edges.iter().enumerate() {
            for (j, v) in t.slots().into_iter().enumerate() {
                graph.link_port(v, (3 * e + j) as u32);
                graph.degree[v as usize] += 1;
            }
        }
        for v in 0..m as u32 {
            graph.push_bucket(v);
        }
        graph
    }

    /// Remove hyperedges through degree-1 vertices until none are left.
    ///
    /// Panics if the lists disagree with the degree counts; that can only
    /// be a bug in this module.
    pub(crate) fn peel(mut self) -> Result<PeelOrder, Stalled> {
        let n = self.edges.len();
        let mut order = Vec::with_capacity(n);
        for peeled in 0..n {
            let u = self.bucket_head[1];
            if u == NIL {
                return Err(Stalled { peeled });
            }
            let port = self.inc_head[u as usize];
            assert!(
                port != NIL && self.p_next[port as usize] == NIL,
                "degree-1 vertex {u} must have exactly one incident edge"
            );
            let e = port / 3;
            self.remove_edge(e);
            order.push(e);
            assert!(
                self.inc_head[u as usize] == NIL,
                "vertex {u} kept incident edges after its last edge was peeled"
            );
        }
        Ok(PeelOrder(order))
    }

    fn remove_edge(&mut self, e: u32) {
        for (j, v) in self.edges[e as usize].slots().into_iter().enumerate() {
            self.unlink_bucket(v);
            self.degree[v as usize] -= 1;
            self.push_bucket(v);
            self.unlink_port(v, 3 * e + j as u32);
        }
    }

    fn push_bucket(&mut self, v: u32) {
        let d = self.degree[v as usize] as usize;
        let head = self.bucket_head[d];
        self.v_prev[v as usize] = NIL;
        self.v_next[v as usize] = head;
        if head != NIL {
            self.v_prev[head as usize] = v;
        }
        self.bucket_head[d] = v;
    }

    fn unlink_bucket(&mut self, v: u32) {
        let (prev, next) = (self.v_prev[v as usize], self.v_next[v as usize]);
        if prev == NIL {
            self.bucket_head[self.degree[v as usize] as usize] = next;
        } else {
            self.v_next[prev as usize] = next;
        }
        if next != NIL {
            self.v_prev[next as usize] = prev;
        }
    }

    fn link_port(&mut self, v: u32, port: u32) {
        let head = self.inc_head[v as usize];
        self.p_prev[port as usize] = NIL;
        self.p_next[port as usize] = head;
        if head != NIL {
            self.p_prev[head as usize] = port;
        }
        self.inc_head[v as usize] = port;
    }

    fn unlink_port(&mut self, v: u32, port: u32) {
        let (prev, next) = (self.p_prev[port as usize], self.p_next[port as usize]);
        if prev == NIL {
            self.inc_head[v as usize] = next;
        } else {
            self.p_next[prev as usize] = next;
        }
        if next != NIL {
            self.p_prev[next as usize] = prev;
        }
    }
}
