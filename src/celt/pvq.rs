//! Pyramid Vector Quantizer: combinatorial rank/unrank of integer vectors
//! with a fixed pulse count, used to code the normalized shape of each band.
//!
//! A PVQ codeword of dimension `n` and pulse count `k` is an integer vector
//! whose entries' absolute values sum to exactly `k`. The number of such
//! vectors, `V(n, k)`, is built once per decoder/encoder instance and then
//! reused to rank (`encode_pulses`) and unrank (`decode_pulses`) codewords
//! against a single combinatorial index in `[0, V(n, k))`.

/// Table of `V(n, k)`, the count of integer vectors of length `n` whose
/// absolute values sum to exactly `k`.
pub(crate) struct PulseCache {
    table: Vec<Vec<u64>>,
}

impl PulseCache {
    pub(crate) fn new(max_n: usize, max_k: usize) -> Self {
        let mut table = vec![vec![0u64; max_k + 1]; max_n + 1];
        table[0][0] = 1;
        for n in 1..=max_n {
            let mut prefix_prev = vec![0u64; max_k + 1];
            let mut acc = 0u64;
            for k in 0..=max_k {
                acc = acc.saturating_add(table[n - 1][k]);
                prefix_prev[k] = acc;
            }
            table[n][0] = 1;
            for k in 1..=max_k {
                let s_prev = prefix_prev[k - 1];
                table[n][k] = table[n - 1][k].saturating_add(2 * s_prev);
            }
        }
        Self { table }
    }

    pub(crate) fn v(&self, n: usize, k: usize) -> u64 {
        self.table[n][k]
    }
}

/// Ranks a pulse vector into its combinatorial index in `[0, V(n, k))`.
pub(crate) fn encode_pulses(y: &[i32], cache: &PulseCache) -> u64 {
    let mut n_rem = y.len();
    let mut k_rem: usize = y.iter().map(|c| c.unsigned_abs() as usize).sum();
    let mut index: u64 = 0;
    for &yi in y {
        let mag = yi.unsigned_abs() as usize;
        for u in 0..mag {
            let cnt = cache.v(n_rem - 1, k_rem - u);
            index += if u == 0 { cnt } else { 2 * cnt };
        }
        if mag > 0 && yi < 0 {
            index += cache.v(n_rem - 1, k_rem - mag);
        }
        k_rem -= mag;
        n_rem -= 1;
    }
    index
}

/// Unranks a combinatorial index into the pulse vector of dimension `n` and
/// pulse count `k` it was assigned during encoding.
pub(crate) fn decode_pulses(mut index: u64, n: usize, k: usize, cache: &PulseCache) -> Vec<i32> {
    let mut y = vec![0i32; n];
    let mut n_rem = n;
    let mut k_rem = k;
    for slot in y.iter_mut() {
        let mut mag = 0usize;
        loop {
            let cnt = cache.v(n_rem - 1, k_rem - mag);
            let block = if mag == 0 { cnt } else { 2 * cnt };
            if index < block {
                *slot = if mag == 0 {
                    0
                } else if index < cnt {
                    mag as i32
                } else {
                    index -= cnt;
                    -(mag as i32)
                };
                break;
            }
            index -= block;
            mag += 1;
        }
        k_rem -= mag;
        n_rem -= 1;
    }
    y
}

/// Greedy encoder-side pulse search: finds an integer vector with pulse count
/// `k` that approximately maximizes correlation with the target shape `x`
/// (the standard "xy/yy" normalized-correlation criterion), adding pulses
/// one at a time to whichever dimension improves the criterion the most.
pub(crate) fn search_pulses(x: &[f32], k: usize) -> Vec<i32> {
    let n = x.len();
    let mut y = vec![0i32; n];
    if k == 0 || n == 0 {
        return y;
    }

    for _ in 0..k {
        let mut best_idx = 0;
        let mut best_sign = 1.0f32;
        let mut best_gain = f32::MIN;
        for i in 0..n {
            let sign = if x[i] >= 0.0 { 1.0 } else { -1.0 };
            let new_xy: f32 = x
                .iter()
                .zip(y.iter())
                .enumerate()
                .map(|(j, (&xj, &yj))| xj * if j == i { yj as f32 + sign } else { yj as f32 })
                .sum();
            let new_yy: f32 = y
                .iter()
                .enumerate()
                .map(|(j, &yj)| {
                    let v = if j == i { yj as f32 + sign } else { yj as f32 };
                    v * v
                })
                .sum();
            let gain = if new_yy > 0.0 {
                new_xy * new_xy / new_yy
            } else {
                new_xy
            };
            if gain > best_gain {
                best_gain = gain;
                best_idx = i;
                best_sign = sign;
            }
        }
        y[best_idx] += best_sign as i32;
    }
    y
}

/// Normalizes an integer PVQ codeword to unit L2 norm.
pub(crate) fn normalize_shape(y: &[i32]) -> Vec<f32> {
    let energy: f32 = y.iter().map(|&v| (v * v) as f32).sum();
    if energy <= 0.0 {
        return vec![0.0; y.len()];
    }
    let inv_norm = 1.0 / energy.sqrt();
    y.iter().map(|&v| v as f32 * inv_norm).collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_pulse_counts_small_cases() {
        let cache = PulseCache::new(4, 4);
        // V(1, k): only +-k, so 1 for k=0 and 2 otherwise.
        assert_eq!(cache.v(1, 0), 1);
        assert_eq!(cache.v(1, 1), 2);
        assert_eq!(cache.v(1, 2), 2);
        // V(2, 1): (+-1,0) and (0,+-1) = 4.
        assert_eq!(cache.v(2, 1), 4);
        // V(2, 2): (+-2,0)x2 + (0,+-2)x2 + (+-1,+-1)x4 = 8.
        assert_eq!(cache.v(2, 2), 8);
    }

    #[test]
    fn test_rank_unrank_round_trip() {
        let cache = PulseCache::new(6, 6);
        let n = 4;
        let k = 3;
        let total = cache.v(n, k);
        for index in 0..total {
            let y = decode_pulses(index, n, k, &cache);
            let sum_abs: i32 = y.iter().map(|v| v.abs()).sum();
            assert_eq!(sum_abs as usize, k);
            let back = encode_pulses(&y, &cache);
            assert_eq!(back, index);
        }
    }

    #[test]
    fn test_search_pulses_matches_pulse_count() {
        let x = [0.1, -0.9, 0.3, 0.05];
        let k = 5;
        let y = search_pulses(&x, k);
        let sum_abs: i32 = y.iter().map(|v| v.abs()).sum();
        assert_eq!(sum_abs as usize, k);
        // The largest-magnitude input should get the most pulses.
        let max_idx = y.iter().map(|v| v.unsigned_abs()).enumerate().max_by_key(|&(_, v)| v).unwrap().0;
        assert_eq!(max_idx, 1);
    }

    #[test]
    fn test_normalize_shape_unit_norm() {
        let y = [3, -4, 0, 0];
        let shape = normalize_shape(&y);
        let energy: f32 = shape.iter().map(|v| v * v).sum();
        assert!((energy - 1.0).abs() < 1e-5);
    }
}
