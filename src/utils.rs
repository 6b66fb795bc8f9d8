use rand::SeedableRng;
use rand::rngs::StdRng;

/// Linear interpolation, `t` is the fraction of the way from `a` to `b`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Euclidean distance between (x0, y0) and (xf, yf).
pub fn displacement(x0: f64, y0: f64, xf: f64, yf: f64) -> f64 {
    ((xf - x0).powi(2) + (yf - y0).powi(2)).sqrt()
}

/// Fixed seed gives a reproducible run, `None` draws from OS entropy.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub fn has_non_finite(xs: &[f64]) -> bool {
    xs.iter().any(|v| !v.is_finite())
}
