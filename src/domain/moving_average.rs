//! Trailing simple moving average.
//!
//! O(n) rolling-sum implementation. The first (window - 1) points have no
//! average yet and are `None`; callers must never trade on a `None` value.

/// Trailing mean of the most recent `window` values ending at each index.
///
/// Returns one element per input value: `None` during warmup, `Some(mean)`
/// once `window` values are available. A zero window yields all `None`.
pub fn trailing_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut window_sum = 0.0;

    for (i, &value) in values.iter().enumerate() {
        window_sum += value;
        if i >= window {
            window_sum -= values[i - window];
        }

        if i >= window - 1 {
            out.push(Some(window_sum / window as f64));
        } else {
            out.push(None);
        }
    }

    out
}
