use bdz_table::{BuildConfig, Builder, MphError};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashSet;
use std::time::Instant;

const N_KEYS: usize = 1_000_000;
const GEN_SEED: u64 = 42;
const MISSING: u64 = 0;

fn main() -> Result<(), MphError> {
    println!("--- bdz_table test ---");
    println!("n = {N_KEYS}");

    // 1) Generate unique keys
    let t0 = Instant::now();
    let keys = gen_unique_keys(N_KEYS, GEN_SEED);
    let gen_s = t0.elapsed().as_secs_f64();
    println!(
        "gen:    {:>8.3} s   ({:.1} M keys/s)",
        gen_s,
        N_KEYS as f64 / gen_s / 1e6
    );

    // 2) Build the table; each key maps to its position in `keys`
    let cfg = BuildConfig {
        // gamma can be varied between 1.23..1.30: higher builds in fewer
        // attempts but spends more slots
        gamma: 1.23,
        ..Default::default()
    };
    let t1 = Instant::now();
    let table = Builder::new()
        .with_config(cfg)
        .build(keys.iter().enumerate().map(|(i, &k)| (k, i as u32)), MISSING)?;
    let build_s = t1.elapsed().as_secs_f64();
    println!(
        "build:  {:>8.3} s   ({:.1} M keys/s)   m = {} ({:.3} slots/key)",
        build_s,
        N_KEYS as f64 / build_s / 1e6,
        table.table_size(),
        table.table_size() as f64 / N_KEYS as f64
    );

    // 3) Lookup all keys
    let t2 = Instant::now();
    let mut acc: u64 = 0;
    for chunk in keys.chunks(32_768) {
        for k in chunk {
            acc ^= table.get(k).copied().unwrap_or(u32::MAX) as u64;
        }
    }
    let lookup_s = t2.elapsed().as_secs_f64();
    println!(
        "lookup: {:>8.3} s   ({:.1} M lookups/s)   (acc={acc})",
        lookup_s,
        N_KEYS as f64 / lookup_s / 1e6
    );

    println!("----------------------------------------------");
    println!(
        "Total (gen + build + lookup): {:.3} s",
        gen_s + build_s + lookup_s
    );

    Ok(())
}

/// Generate N unique non-zero keys, deterministically.
fn gen_unique_keys(n: usize, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut set = HashSet::with_capacity(n * 2);
    let mut keys = Vec::with_capacity(n);
    while keys.len() < n {
        let k = rng.next_u64();
        if k != MISSING && set.insert(k) {
            keys.push(k);
        }
    }
    keys
}
