//! Nearest-value lookup against an ordered reference list.
//!
//! The tie rule matters here: when a value sits exactly halfway between two
//! reference entries, the entry that comes first in `reference` wins. The
//! scan below makes that explicit instead of relying on whatever a generic
//! `min_by` reduction happens to do.

use ndarray::{Array, ArrayBase, Data, Dimension};

/// Index of the first element of a non-empty `reference` that minimizes
/// `|reference[i] - value|`.
///
/// # Note
/// Callers must guarantee that `reference` isn't empty.
pub(crate) fn scan_nearest(value: f64, reference: &[f64]) -> usize {
    let mut best = 0;
    let mut best_diff = (reference[0] - value).abs();
    for (i, &r) in reference.iter().enumerate().skip(1) {
        let diff = (r - value).abs();
        // strict comparison keeps the first minimizer
        if diff < best_diff {
            best = i;
            best_diff = diff;
        }
    }
    best
}

/// Returns the index of the entry of `reference` closest to `value`.
pub fn nearest_index(value: f64, reference: &[f64]) -> Result<usize, &'static str> {
    if reference.is_empty() {
        Err("reference must hold at least 1 value")
    } else {
        Ok(scan_nearest(value, reference))
    }
}

/// Replace every entry of `values` with the closest entry of `reference`.
///
/// The output has the same shape as `values`; `reference` is left untouched.
pub fn snap<S, D>(values: &ArrayBase<S, D>, reference: &[f64]) -> Result<Array<f64, D>, &'static str>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if reference.is_empty() {
        return Err("reference must hold at least 1 value");
    }
    Ok(values.map(|&v| reference[scan_nearest(v, reference)]))
}

/// Round `value` to the nearest multiple of `step` (halfway cases go to the
/// even multiple, like numpy's `round`).
pub fn round_to_multiple(value: f64, step: f64) -> f64 {
    (value / step).round_ties_even() * step
}
