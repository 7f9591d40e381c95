use std::hash::{BuildHasher, Hash, Hasher};
use std::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

/// A hash provider: maps a key to an unsigned integer.
///
/// Providers must be deterministic. Any `Fn(&K) -> u64` is a provider, which
/// makes stub hashers in tests a one-liner.
pub trait KeyHasher<K: ?Sized> {
    fn hash_key(&self, key: &K) -> u64;
}

impl<K: ?Sized, F> KeyHasher<K> for F
where
    F: Fn(&K) -> u64,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self(key)
    }
}

/// The three candidate slots of a key.
///
/// Slot `i` lies in `[i * m3, (i + 1) * m3)`, so the three slots are always
/// distinct. Ordering is lexicographic over `(h0, h1, h2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Triple([u32; 3]);

impl Triple {
    #[inline]
    pub fn slots(&self) -> [u32; 3] {
        self.0
    }

    /// Slot selected by the sum of the three g-values, mod 3.
    #[inline]
    pub(crate) fn route(&self, g: &[u8]) -> u32 {
        let [a, b, c] = self.0;
        let sum = g[a as usize] + g[b as usize] + g[c as usize];
        self.0[(sum % 3) as usize]
    }
}

impl Index<usize> for Triple {
    type Output = u32;

    #[inline]
    fn index(&self, choice: usize) -> &u32 {
        &self.0[choice]
    }
}

/// Maps a key to its [`Triple`] for a given modulus `m3`.
///
/// Implementations must be pure: the table recomputes triples on every
/// lookup and relies on getting the same answer the builder got.
pub trait TripleHash<K: ?Sized> {
    fn triple(&self, key: &K, m3: u32) -> Triple;
}

/// Three independent [`KeyHasher`]s, one per slot range.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripleHasher<H0, H1, H2> {
    h0: H0,
    h1: H1,
    h2: H2,
}

impl<H0, H1, H2> TripleHasher<H0, H1, H2> {
    pub fn new(h0: H0, h1: H1, h2: H2) -> Self {
        Self { h0, h1, h2 }
    }
}

impl<K, H0, H1, H2> TripleHash<K> for TripleHasher<H0, H1, H2>
where
    K: ?Sized,
    H0: KeyHasher<K>,
    H1: KeyHasher<K>,
    H2: KeyHasher<K>,
{
    #[inline]
    fn triple(&self, key: &K, m3: u32) -> Triple {
        let m = m3 as u64;
        // Caller guarantees 3 * m3 fits in u32.
        let a = (self.h0.hash_key(key) % m) as u32;
        let b = (self.h1.hash_key(key) % m) as u32 + m3;
        let c = (self.h2.hash_key(key) % m) as u32 + 2 * m3;
        Triple([a, b, c])
    }
}

/// The default providers: XXH3, wyhash and aHash, seeded from one salt.
pub type SeededHasher = TripleHasher<Xxh3KeyHasher, WyKeyHasher, AKeyHasher>;

impl SeededHasher {
    /// Derive three independent providers from `salt`.
    pub fn seeded(salt: u64) -> Self {
        let s1 = splitmix64(salt ^ 0x9E37_79B9_7F4A_7C15);
        let s2 = splitmix64(salt.wrapping_mul(0xA24B_1F6F));
        let s3 = splitmix64(salt ^ 0x853C_49E6_0A6C_9D39);
        let s4 = splitmix64(s3);
        let s5 = splitmix64(s4);
        let s6 = splitmix64(s5);
        TripleHasher::new(
            Xxh3KeyHasher { seed: s1 },
            WyKeyHasher { seed: s2 },
            AKeyHasher {
                seeds: [s3, s4, s5, s6],
            },
        )
    }
}

/// XXH3 over the key's [`Hash`] stream.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xxh3KeyHasher {
    pub seed: u64,
}

impl<K: Hash + ?Sized> KeyHasher<K> for Xxh3KeyHasher {
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        let mut h = Xxh3::with_seed(self.seed);
        key.hash(&mut h);
        h.finish()
    }
}

/// wyhash over the key's [`Hash`] stream.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WyKeyHasher {
    pub seed: u64,
}

impl<K: Hash + ?Sized> KeyHasher<K> for WyKeyHasher {
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        let mut h = wyhash::WyHash::with_seed(self.seed);
        key.hash(&mut h);
        h.finish()
    }
}

/// aHash with fixed seeds.
///
/// aHash picks its algorithm by target features, so values are only stable
/// on one platform. Prefer the other providers for tables that travel.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AKeyHasher {
    pub seeds: [u64; 4],
}

impl<K: Hash + ?Sized> KeyHasher<K> for AKeyHasher {
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        let [a, b, c, d] = self.seeds;
        let mut h = ahash::RandomState::with_seeds(a, b, c, d).build_hasher();
        key.hash(&mut h);
        h.finish()
    }
}

#[inline]
pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Deterministically tweak base salt by round (FNV-like).
#[inline]
pub(crate) fn mix_salt(base: u64, round: u32) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut h = FNV_OFFSET ^ base;
    h ^= round as u64;
    h = h.wrapping_mul(FNV_PRIME);
    h ^ (h >> 33)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_fall_in_disjoint_ranges() {
        let hasher = SeededHasher::seeded(7);
        for m3 in [1u32, 2, 3, 17, 1_000] {
            for key in 0u64..500 {
                let [a, b, c] = hasher.triple(&key, m3).slots();
                assert!(a < m3);
                assert!((m3..2 * m3).contains(&b));
                assert!((2 * m3..3 * m3).contains(&c));
            }
        }
    }

    #[test]
    fn triple_is_deterministic() {
        let x = SeededHasher::seeded(42);
        let y = SeededHasher::seeded(42);
        for key in ["alpha", "beta", "gamma"] {
            assert_eq!(x.triple(key, 101), y.triple(key, 101));
        }
    }

    #[test]
    fn different_salts_give_different_providers() {
        let x = SeededHasher::seeded(1);
        let y = SeededHasher::seeded(2);
        let differ = (0u64..64).any(|k| x.triple(&k, 1 << 20) != y.triple(&k, 1 << 20));
        assert!(differ);
    }

    #[test]
    fn closures_are_providers() {
        let hasher = TripleHasher::new(|k: &u64| *k, |k: &u64| *k + 1, |k: &u64| *k + 2);
        assert_eq!(hasher.triple(&10u64, 4).slots(), [2, 7, 8]);
    }

    #[test]
    fn route_follows_sum_mod_three() {
        let t = Triple([0, 2, 4]);
        let mut g = vec![3u8; 6];
        assert_eq!(t.route(&g), 0);
        g[2] = 1;
        assert_eq!(t.route(&g), 2);
        g[4] = 1;
        assert_eq!(t.route(&g), 4);
    }

    #[test]
    fn mix_salt_changes_with_round() {
        assert_ne!(mix_salt(5, 0), mix_salt(5, 1));
        assert_eq!(mix_salt(5, 3), mix_salt(5, 3));
    }
}
