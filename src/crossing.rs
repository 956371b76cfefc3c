//! Threshold-crossing extraction by linear interpolation.

use crate::error::Error;

/// Find the x value at which a sampled curve crosses `target`.
///
/// `xs` and `ys` are equal-length sequences, assumed monotonic in x (not
/// enforced). The first index where `ys - target` changes sign is located
/// and the crossing is linearly interpolated between the two samples. If no
/// sign change exists the result is `None`, unless `ys[0]` equals `target`
/// exactly, in which case the crossing is `xs[0]`.
///
/// Only the first crossing is reported. For non-monotonic curves later
/// crossings are ignored; this is a documented limitation, not a guarantee
/// of the true threshold.
pub fn find_crossing(xs: &[f32], ys: &[f32], target: f32) -> Result<Option<f32>, Error> {
    if xs.len() != ys.len() {
        return Err(Error::ShapeMismatch(format!(
            "xs has {} samples but ys has {}",
            xs.len(),
            ys.len()
        )));
    }

    for i in 0..ys.len().saturating_sub(1) {
        if (ys[i] >= target) != (ys[i + 1] >= target) {
            let x = xs[i] + (target - ys[i]) * (xs[i + 1] - xs[i]) / (ys[i + 1] - ys[i]);
            return Ok(Some(x));
        }
    }

    if !ys.is_empty() && ys[0] == target {
        return Ok(Some(xs[0]));
    }
    Ok(None)
}
