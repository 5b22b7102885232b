//! Deterministic series shared by the unit tests

/// Uniform shocks in `[-0.5, 0.5)` from a 64-bit linear congruential generator
pub(crate) fn shocks(seed: u64, n: usize) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
        })
        .collect()
}

/// `x[t] = phi * x[t-1] + e[t]` starting from zero
pub(crate) fn ar1(phi: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut level = 0.0;
    shocks(seed, n)
        .into_iter()
        .map(|e| {
            level = phi * level + e;
            level
        })
        .collect()
}

/// Random walk starting at 100
pub(crate) fn random_walk(n: usize, seed: u64) -> Vec<f64> {
    let mut level = 100.0;
    shocks(seed, n)
        .into_iter()
        .map(|e| {
            level += e;
            level
        })
        .collect()
}
