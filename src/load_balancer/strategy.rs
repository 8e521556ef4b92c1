//! Pick functions behind the selection strategies.

use rand::Rng;

/// Cumulative-weighted pick: index `i` is chosen when `draw` falls inside its
/// slice of the running total. `draw` is expected in `[0, sum(weights))`.
///
/// Non-positive or non-finite weights get no share; if nothing has a share,
/// the first index is returned. `weights` must not be empty.
pub fn pick_weighted(weights: &[f64], draw: f64) -> usize {
    let mut cumulative = 0.0;
    let mut last_positive = 0;

    for (i, &w) in weights.iter().enumerate() {
        if !(w.is_finite() && w > 0.0) {
            continue;
        }
        cumulative += w;
        last_positive = i;
        if draw < cumulative {
            return i;
        }
    }

    // draw at or past the total (float rounding)
    last_positive
}

/// Score-proportional random pick.
pub fn weighted<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights
        .iter()
        .filter(|w| w.is_finite() && **w > 0.0)
        .sum();

    if total <= 0.0 {
        return uniform(weights.len(), rng);
    }
    pick_weighted(weights, rng.gen::<f64>() * total)
}

/// Uniform random pick from `len` candidates. `len` must not be zero.
pub fn uniform<R: Rng>(len: usize, rng: &mut R) -> usize {
    rng.gen_range(0..len)
}
