use bdz_table::{BuildConfig, Builder, MphError, MphTable, TripleHasher};
use hashbrown::HashSet;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// `n` distinct non-zero keys, deterministically.
fn random_keys(n: usize, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut set = HashSet::with_capacity(n);
    let mut keys = Vec::with_capacity(n);
    while keys.len() < n {
        let k = rng.next_u64();
        if k != 0 && set.insert(k) {
            keys.push(k);
        }
    }
    keys
}

fn splitmix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[test]
fn small_scenario() {
    let table = MphTable::build([(1u64, "a"), (2, "b"), (3, "c")], 0).unwrap();
    assert!(table.m3() >= 2);
    assert_eq!(table.get(&2), Some(&"b"));
    assert_eq!(table.get(&99), None);
}

#[test]
fn million_keys() {
    const N: usize = 1_000_000;
    let keys = random_keys(N, 42);
    let table = MphTable::build(keys.iter().map(|&k| (k, k ^ 0xABCD)), 0).unwrap();

    assert_eq!(table.len(), N);
    assert!(table.table_size() < 1_250_000, "m = {}", table.table_size());
    for &k in &keys {
        assert_eq!(table.get(&k), Some(&(k ^ 0xABCD)));
    }
}

#[test]
fn absent_keys_never_hit() {
    let keys = random_keys(20_000, 7);
    let table = MphTable::build(keys.iter().map(|&k| (k, ())), 0).unwrap();
    let present: HashSet<u64> = keys.into_iter().collect();

    let mut rng = StdRng::seed_from_u64(8);
    let mut probed = 0;
    while probed < 100_000 {
        let k = rng.next_u64();
        if k == 0 || present.contains(&k) {
            continue;
        }
        assert!(!table.contains_key(&k), "false positive for {k}");
        probed += 1;
    }
}

#[test]
fn load_factor_stays_below_bound() {
    for n in [10_000usize, 100_000] {
        let table = MphTable::build(random_keys(n, n as u64).into_iter().map(|k| (k, ())), 0)
            .unwrap();
        assert!((table.table_size() as f64) < 1.25 * n as f64);
    }
}

#[test]
fn rebuild_is_identical() {
    let keys = random_keys(50_000, 3);
    let a = MphTable::build(keys.iter().map(|&k| (k, k)), 0).unwrap();
    let b = MphTable::build(keys.iter().map(|&k| (k, k)), 0).unwrap();
    assert_eq!(a.g_values(), b.g_values());
    for &k in &keys {
        assert_eq!(a.index(&k), b.index(&k));
    }
    assert_eq!(a, b);
}

#[test]
fn caller_supplied_hashers() {
    let hasher = TripleHasher::new(
        |k: &u64| splitmix(*k ^ 0x1111),
        |k: &u64| splitmix(*k ^ 0x2222_0000),
        |k: &u64| splitmix(k.rotate_left(29)),
    );
    let keys = random_keys(30_000, 11);
    let table = Builder::new()
        .build_with_hasher(hasher, keys.iter().map(|&k| (k, k as u32)), 0)
        .unwrap();
    for &k in &keys {
        assert_eq!(table.get(&k), Some(&(k as u32)));
    }
    assert_eq!(table.get(&0), None);
}

#[test]
fn degenerate_hasher_fails_instead_of_looping() {
    let hasher = TripleHasher::new(|_: &u64| 0u64, |_: &u64| 0u64, |_: &u64| 0u64);
    let Err(err) = Builder::new().build_with_hasher(hasher, (1..=100u64).map(|k| (k, ())), 0)
    else {
        panic!("a constant hasher cannot separate 100 keys");
    };
    match err {
        MphError::HashCollisionExhausted { attempts, .. } => {
            assert_eq!(attempts, BuildConfig::default().max_attempts)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn weak_hasher_is_rescued_by_larger_tables() {
    // Every key hashes to itself: tiny moduli collide, larger ones work.
    let hasher = TripleHasher::new(|k: &u64| *k, |k: &u64| *k / 3, |k: &u64| *k / 7);
    let table = Builder::new()
        .build_with_hasher(hasher, (1..=20u64).map(|k| (k, k * 10)), 0)
        .unwrap();
    for k in 1..=20u64 {
        assert_eq!(table.get(&k), Some(&(k * 10)));
    }
}

#[test]
fn exhausted_seeded_build_reports_last_error() {
    let cfg = BuildConfig {
        // Far too small to ever peel: the search never leaves this region.
        gamma: 0.3,
        max_attempts: 2,
        rehash_limit: 1,
        ..Default::default()
    };
    let err = Builder::new()
        .with_config(cfg)
        .build(random_keys(10_000, 5).into_iter().map(|k| (k, ())), 0)
        .unwrap_err();
    assert!(err.is_retryable(), "{err}");
}

#[test]
fn string_keys_with_empty_sentinel() {
    let words = ["apple", "banana", "cherry", "date", "elderberry", "fig", "grape"];
    let table = MphTable::build(
        words.iter().map(|w| (w.to_string(), w.len())),
        String::new(),
    )
    .unwrap();
    for w in words {
        assert_eq!(table.get(w), Some(&w.len()));
    }
    assert_eq!(table.get("kiwi"), None);
    assert_eq!(table.get(""), None);

    let mut stored: Vec<&str> = table.iter().map(|(k, _)| k.as_str()).collect();
    stored.sort_unstable();
    assert_eq!(stored, words);
}
