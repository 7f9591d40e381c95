use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use hashbrown::HashSet;
use log::{debug, info, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

#[cfg(feature = "serde")]
use crate::assign::UNASSIGNED;
use crate::assign::assign;
use crate::graph::{Hypergraph, Stalled};
use crate::hash::{SeededHasher, Triple, TripleHash, mix_salt};
use crate::probe::{fill_triples, has_collision, initial_m3};

/// Keys beyond this would overflow the `u32` port ids of the hypergraph.
const MAX_KEYS: usize = (u32::MAX as usize - 1) / 3;

/// Static key/value table over a BDZ minimal perfect hash.
///
/// `m = 3 * m3` slots; every key owns exactly one of its three candidate
/// slots, picked by the g-values:
///
/// index(k) = triple(k)[(g[h0] + g[h1] + g[h2]) % 3]
///
/// Keys are stored, so lookups of absent keys are exact misses.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, PartialEq, Eq)]
pub struct MphTable<K, V, H = SeededHasher> {
    m3: u32,
    len: usize,
    g: Vec<u8>,             // length == 3 * m3, values in 0..=3
    slots: Vec<Slot<K, V>>, // length == 3 * m3
    hasher: H,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot<K, V> {
    key: K, // the sentinel for unclaimed slots
    value: Option<V>,
}

// Hashers are often closures, so they stay out of the output.
impl<K: fmt::Debug, V: fmt::Debug, H> fmt::Debug for MphTable<K, V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MphTable")
            .field("m3", &self.m3)
            .field("len", &self.len)
            .field("g", &self.g)
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

impl<K, V> MphTable<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Build with the default configuration and seeded hashers.
    pub fn build<I>(items: I, invalid_key: K) -> Result<Self, MphError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Builder::new().build(items, invalid_key)
    }
}

impl<K, V, H> MphTable<K, V, H> {
    /// Slot the key routes to. For a stored key this is its own slot; for any
    /// other key it is some slot in `0..table_size()`.
    #[inline]
    pub fn index<Q>(&self, key: &Q) -> usize
    where
        Q: ?Sized,
        H: TripleHash<Q>,
    {
        self.hasher.triple(key, self.m3).route(&self.g) as usize
    }

    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
        H: TripleHash<Q>,
    {
        let slot = &self.slots[self.index(key)];
        let stored: &Q = slot.key.borrow();
        if stored == key {
            slot.value.as_ref()
        } else {
            None
        }
    }

    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
        H: TripleHash<Q>,
    {
        self.get(key).is_some()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots, `3 * m3`.
    pub fn table_size(&self) -> usize {
        self.g.len()
    }

    pub fn m3(&self) -> u32 {
        self.m3
    }

    /// Per-slot g-values; `3` marks slots no key touched.
    pub fn g_values(&self) -> &[u8] {
        &self.g
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Stored pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slots
            .iter()
            .filter_map(|s| s.value.as_ref().map(|v| (&s.key, v)))
    }
}

#[cfg(feature = "serde")]
impl<K, V, H> MphTable<K, V, H> {
    pub fn to_bytes(&self) -> Result<Vec<u8>, MphError>
    where
        Self: Serialize,
    {
        Ok(bincode::serialize(self)?)
    }

    /// Decode and check the structural invariants lookups rely on.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MphError>
    where
        Self: DeserializeOwned,
    {
        let table: Self = bincode::deserialize(bytes)?;
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), MphError> {
        if self.m3 == 0 {
            return Err(MphError::MalformedTable("zero modulus"));
        }
        let m = 3 * self.m3 as usize;
        if self.g.len() != m || self.slots.len() != m {
            return Err(MphError::MalformedTable("array lengths disagree with the modulus"));
        }
        if self.g.iter().any(|&x| x > UNASSIGNED) {
            return Err(MphError::MalformedTable("g-value out of range"));
        }
        if self.slots.iter().filter(|s| s.value.is_some()).count() != self.len {
            return Err(MphError::MalformedTable("stored pair count mismatch"));
        }
        Ok(())
    }
}

/// Builder configuration.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Initial slot/key ratio; the search starts at `m3 = ⌊gamma·n/3⌋ + 1`.
    /// The peeling threshold of random 3-hypergraphs is ~1.222.
    pub gamma: f64,
    /// How many moduli to try (each one bigger by 1) before giving up.
    pub max_attempts: u32,
    /// Base salt for the seeded hashers.
    pub salt: u64,
    /// Extra re-seeded rounds for seeded builds.
    pub rehash_limit: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            gamma: 1.23,
            max_attempts: 256,
            salt: 0xC0FF_EE00_D15E_A5E,
            rehash_limit: 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum MphError {
    #[error("duplicate key at input position {index}")]
    DuplicateKey { index: usize },
    #[error("input key at position {index} equals the sentinel key")]
    SentinelKey { index: usize },
    #[error("no collision-free table size after {attempts} attempts (last m3 = {m3})")]
    HashCollisionExhausted { attempts: u32, m3: u64 },
    #[error("hypergraph kept a non-empty 2-core after {attempts} attempts (last m3 = {m3})")]
    UnpeelableGraph { attempts: u32, m3: u64 },
    #[error("{n} keys do not fit 32-bit slot ids")]
    TooManyKeys { n: usize },
    #[error("gamma must be finite, positive and leave room for 32-bit slot ids, got {0}")]
    InvalidGamma(f64),
    #[error("malformed table: {0}")]
    MalformedTable(&'static str),
    #[cfg(feature = "serde")]
    #[error("serialization error: {0}")]
    Serde(#[from] bincode::Error),
}

impl MphError {
    /// `true` when other hash providers may succeed on the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MphError::HashCollisionExhausted { .. } | MphError::UnpeelableGraph { .. }
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Builder {
    cfg: BuildConfig,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            cfg: BuildConfig::default(),
        }
    }
    pub fn with_config(mut self, cfg: BuildConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Build with seeded XXH3/wyhash/aHash providers. **Unique** keys are
    /// required, and none may equal `invalid_key`.
    ///
    /// If the size search runs out, the providers are re-seeded with a salt
    /// mixed from the round number, up to `rehash_limit` times.
    pub fn build<K, V, I>(self, items: I, invalid_key: K) -> Result<MphTable<K, V>, MphError>
    where
        K: Hash + Eq + Clone,
        I: IntoIterator<Item = (K, V)>,
    {
        let items: Vec<(K, V)> = items.into_iter().collect();
        validate_keys(&items, &invalid_key)?;

        let mut last_err = None;
        for round in 0..=self.cfg.rehash_limit {
            let hasher = SeededHasher::seeded(mix_salt(self.cfg.salt, round));
            match search(&items, &hasher, &self.cfg) {
                Ok(layout) => return Ok(place(items, invalid_key, hasher, layout)),
                Err(e) if e.is_retryable() => {
                    warn!("round {round}: {e}; re-seeding");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or(MphError::HashCollisionExhausted {
            attempts: 0,
            m3: 0,
        }))
    }

    /// Build with caller-supplied hash providers. **Unique** keys are
    /// required, and none may equal `invalid_key`.
    pub fn build_with_hasher<K, V, H, I>(
        self,
        hasher: H,
        items: I,
        invalid_key: K,
    ) -> Result<MphTable<K, V, H>, MphError>
    where
        K: Hash + Eq + Clone,
        H: TripleHash<K>,
        I: IntoIterator<Item = (K, V)>,
    {
        let items: Vec<(K, V)> = items.into_iter().collect();
        validate_keys(&items, &invalid_key)?;
        let layout = search(&items, &hasher, &self.cfg)?;
        Ok(place(items, invalid_key, hasher, layout))
    }
}

/// Exact check, no probabilistic dedup.
fn validate_keys<K, V>(items: &[(K, V)], invalid_key: &K) -> Result<(), MphError>
where
    K: Hash + Eq,
{
    if items.len() > MAX_KEYS {
        return Err(MphError::TooManyKeys { n: items.len() });
    }
    let mut seen = HashSet::with_capacity(items.len());
    for (index, (key, _)) in items.iter().enumerate() {
        if key == invalid_key {
            return Err(MphError::SentinelKey { index });
        }
        if !seen.insert(key) {
            return Err(MphError::DuplicateKey { index });
        }
    }
    Ok(())
}

/// Outcome of a successful size search.
struct Layout {
    m3: u32,
    g: Vec<u8>,
    triples: Vec<Triple>,
}

enum Failure {
    Collision,
    Stalled,
}

/// Search for the smallest modulus that is collision-free and peels.
/// Steps per candidate `m3`:
/// 1) derive triples
/// 2) reject identical triples
/// 3) peel (degree-1 buckets)
/// 4) assign g[] in reverse peel order
fn search<K, V, H>(items: &[(K, V)], hasher: &H, cfg: &BuildConfig) -> Result<Layout, MphError>
where
    H: TripleHash<K>,
{
    if !(cfg.gamma.is_finite() && cfg.gamma > 0.0) {
        return Err(MphError::InvalidGamma(cfg.gamma));
    }
    let n = items.len();
    let Some(mut m3) = initial_m3(n, cfg.gamma) else {
        return Err(MphError::InvalidGamma(cfg.gamma));
    };
    let mut last = (Failure::Collision, m3);

    for attempt in 1..=cfg.max_attempts {
        // slot ids are u32, so the table must stay below u32::MAX slots
        let Some(m) = m3.checked_mul(3).filter(|&m| m <= u32::MAX as u64) else {
            return Err(MphError::TooManyKeys { n });
        };
        let m3_u32 = m3 as u32;
        let m = m as usize;
        let triples = fill_triples(items, hasher, m3_u32);

        if has_collision(&triples) {
            debug!("attempt {attempt}: triple collision at m3 = {m3}");
            last = (Failure::Collision, m3);
            m3 += 1;
            continue;
        }

        match Hypergraph::new(m, &triples).peel() {
            Ok(order) => {
                let g = assign(m, &triples, &order);
                info!(
                    "built {n} keys into {m} slots (m3 = {m3}) after {attempt} attempt(s)"
                );
                return Ok(Layout {
                    m3: m3_u32,
                    g,
                    triples,
                });
            }
            Err(Stalled { peeled }) => {
                debug!("attempt {attempt}: 2-core left after {peeled}/{n} edges at m3 = {m3}");
                last = (Failure::Stalled, m3);
                m3 += 1;
            }
        }
    }

    let attempts = cfg.max_attempts;
    Err(match last {
        (Failure::Collision, m3) => MphError::HashCollisionExhausted { attempts, m3 },
        (Failure::Stalled, m3) => MphError::UnpeelableGraph { attempts, m3 },
    })
}

/// Fill the slots: every key goes to the slot its triple routes to.
fn place<K, V, H>(items: Vec<(K, V)>, invalid_key: K, hasher: H, layout: Layout) -> MphTable<K, V, H>
where
    K: Clone,
{
    let Layout { m3, g, triples } = layout;
    let mut slots: Vec<Slot<K, V>> = (0..g.len())
        .map(|_| Slot {
            key: invalid_key.clone(),
            value: None,
        })
        .collect();

    let len = items.len();
    for ((key, value), t) in items.into_iter().zip(&triples) {
        let index = t.route(&g) as usize;
        let slot = &mut slots[index];
        assert!(slot.value.is_none(), "slot {index} claimed twice");
        *slot = Slot {
            key,
            value: Some(value),
        };
    }

    MphTable {
        m3,
        len,
        g,
        slots,
        hasher,
    }
}
