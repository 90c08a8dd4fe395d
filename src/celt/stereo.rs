//! Stereo coupling: mid/side decorrelation, intensity-stereo panning
//! reconstruction, and anti-collapse noise re-injection.

/// Splits a stereo pair into mid/side channels ahead of per-channel coding.
pub(crate) fn mid_side_encode(left: &[f32], right: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let mid = left.iter().zip(right).map(|(&l, &r)| (l + r) * 0.5).collect();
    let side = left.iter().zip(right).map(|(&l, &r)| (l - r) * 0.5).collect();
    (mid, side)
}

/// Reconstructs a stereo pair from decoded mid/side channels.
pub(crate) fn mid_side_decode(mid: &[f32], side: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let left = mid.iter().zip(side).map(|(&m, &s)| m + s).collect();
    let right = mid.iter().zip(side).map(|(&m, &s)| m - s).collect();
    (left, right)
}

/// Reconstructs a panned mono band into left/right given an intensity angle
/// in `[0, 1]` (0 = fully left, 1 = fully right).
pub(crate) fn intensity_decode(mono: &[f32], angle: f32) -> (Vec<f32>, Vec<f32>) {
    let (gl, gr) = (1.0 - angle, angle);
    (
        mono.iter().map(|&m| m * gl).collect(),
        mono.iter().map(|&m| m * gr).collect(),
    )
}

/// Derives the intensity angle that best matches the observed left/right
/// energy split, for the encoder side of [`intensity_decode`].
pub(crate) fn intensity_angle(left_energy: f32, right_energy: f32) -> f32 {
    let total = left_energy + right_energy;
    if total <= 0.0 {
        0.5
    } else {
        right_energy / total
    }
}

/// Re-injects low-level noise into a band whose PVQ shape collapsed to
/// all-zero pulses, seeded from the frame's `rng_seed` so encoder and decoder
/// agree on the fill without side information.
pub(crate) fn anti_collapse(shape: &mut [f32], seed: &mut u32, energy: f32) {
    if energy <= 0.0 || !shape.iter().all(|&v| v == 0.0) {
        return;
    }
    let scale = energy.sqrt() * 1e-2;
    for v in shape.iter_mut() {
        *seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let r = ((*seed >> 16) as f32 / 65536.0) * 2.0 - 1.0;
        *v = r * scale;
    }
}
