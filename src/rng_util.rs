/// Generate a random `f64` in the range `[low, high)`.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Draw a fresh seed for a derived RNG.
#[inline]
pub(crate) fn next_seed(rng: &mut fastrand::Rng) -> u64 {
    rng.u64(..)
}

/// Generate a random point in the unit cube `[0, 1)^dims`.
pub(crate) fn unit_point(rng: &mut fastrand::Rng, dims: usize) -> Vec<f64> {
    (0..dims).map(|_| rng.f64()).collect()
}
