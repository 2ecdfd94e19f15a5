//! Implements the wavenumber shells. A [`BinSet`] holds the shell centers
//! and the shell width; [`BinLabels`] records, for every grid cell, which
//! center its wavevector magnitude is closest to.

use crate::snap::scan_nearest;
use ndarray::{ArrayD, ArrayViewD};

/// The most raw edges automatic binning will produce
pub const MAX_AUTO_EDGES: usize = 1 << 20;

fn validate_dk(dk: f64) -> Result<(), &'static str> {
    if !dk.is_finite() {
        Err("dk must be finite")
    } else if dk <= 0.0 {
        Err("dk must be positive")
    } else {
        Ok(())
    }
}

/// An ordered sequence of shell centers, together with the shell width.
#[derive(Clone, Debug, PartialEq)]
pub struct BinSet {
    centers: Vec<f64>,
    dk: f64,
}

impl BinSet {
    /// Builds equal width bins spanning the range of `magnitude`.
    ///
    /// Raw edges start at the minimum magnitude and advance by `dk`, stopping
    /// before the maximum (a half-open range). Each center is the midpoint of
    /// 2 consecutive edges, so there is one fewer center than there are
    /// edges.
    pub fn auto(magnitude: &ArrayViewD<f64>, dk: f64) -> Result<BinSet, &'static str> {
        validate_dk(dk)?;
        let k_min = magnitude.fold(f64::INFINITY, |acc, &k| acc.min(k));
        let k_max = magnitude.fold(f64::NEG_INFINITY, |acc, &k| acc.max(k));
        if !k_min.is_finite() || !k_max.is_finite() {
            return Err("the magnitude field must be non-empty and finite");
        }

        // same length as numpy's arange(k_min, k_max, dk)
        let n_edges = ((k_max - k_min) / dk).ceil().max(0.0);
        if n_edges > MAX_AUTO_EDGES as f64 {
            return Err("dk is too small: the magnitude range holds too many bin edges");
        }
        let n_edges = n_edges as usize;
        let edges: Vec<f64> = (0..n_edges).map(|j| k_min + (j as f64) * dk).collect();
        let centers: Vec<f64> = edges.windows(2).map(|w| w[1] / 2.0 + w[0] / 2.0).collect();

        if centers.is_empty() {
            Err("dk is too large: the magnitude range doesn't hold 2 bin edges")
        } else {
            Ok(BinSet { centers, dk })
        }
    }

    /// Use caller supplied centers verbatim. `dk` still sets the shell width.
    pub fn explicit(centers: &[f64], dk: f64) -> Result<BinSet, &'static str> {
        validate_dk(dk)?;
        if centers.is_empty() {
            return Err("at least 1 bin center is required");
        }
        if centers.iter().any(|&x| !x.is_finite()) {
            return Err("bin centers must be finite");
        }
        for i in 1..centers.len() {
            if centers[i] <= centers[i - 1] {
                return Err("bin centers must be in strictly increasing order");
            }
        }
        Ok(BinSet {
            centers: centers.to_vec(),
            dk,
        })
    }

    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    pub fn dk(&self) -> f64 {
        self.dk
    }

    pub fn n_bins(&self) -> usize {
        self.centers.len()
    }

    /// Indices of every center `c` with `|c - centers[bin]| < dk/2`.
    ///
    /// With auto bins this is just `bin`, but explicit centers may be packed
    /// more tightly than `dk`.
    pub fn shell_members(&self, bin: usize) -> Vec<usize> {
        let kb = self.centers[bin];
        let half_width = self.dk / 2.0;
        self.centers
            .iter()
            .enumerate()
            .filter(|&(_, &c)| (c - kb).abs() < half_width)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Per-cell index of the nearest bin center.
#[derive(Clone, Debug)]
pub struct BinLabels {
    indices: ArrayD<usize>,
}

impl BinLabels {
    pub fn indices(&self) -> ArrayViewD<'_, usize> {
        self.indices.view()
    }

    pub fn shape(&self) -> &[usize] {
        self.indices.shape()
    }

    /// The magnitude field with every value replaced by its bin center.
    pub fn label_values(&self, bins: &BinSet) -> ArrayD<f64> {
        self.indices.map(|&i| bins.centers[i])
    }

    /// number of cells assigned to each bin
    pub fn occupancy(&self, n_bins: usize) -> Vec<usize> {
        let mut counts = vec![0; n_bins];
        for &i in self.indices.iter() {
            counts[i] += 1;
        }
        counts
    }

    /// Indicator of the shell around `bins.centers()[bin]`: 1.0 for every
    /// cell whose bin center lies strictly within `dk/2` of it, else 0.0.
    pub fn shell_mask(&self, bins: &BinSet, bin: usize) -> ArrayD<f64> {
        let mut in_shell = vec![false; bins.n_bins()];
        for i in bins.shell_members(bin) {
            in_shell[i] = true;
        }
        self.indices
            .map(|&i| if in_shell[i] { 1.0 } else { 0.0 })
    }
}

/// Assign every cell of `magnitude` to its closest bin center (ties go to
/// the lower index).
pub fn assign_labels(magnitude: &ArrayViewD<f64>, bins: &BinSet) -> BinLabels {
    // BinSet guarantees that centers is non-empty
    let indices = magnitude.map(|&k| scan_nearest(k, &bins.centers));
    BinLabels { indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxDims, compute_wavevectors, snap};
    use ndarray::{ArrayD, IxDyn, arr1};

    #[test]
    fn explicit_bins_invalid_creation() {
        // bad dk
        assert!(BinSet::explicit(&[1.0], 0.0).is_err());
        assert!(BinSet::explicit(&[1.0], -0.1).is_err());
        assert!(BinSet::explicit(&[1.0], f64::NAN).is_err());

        // no centers
        assert!(BinSet::explicit(&[], 0.1).is_err());

        // unsorted or repeated centers
        assert!(BinSet::explicit(&[2.0, 1.0], 0.1).is_err());
        assert!(BinSet::explicit(&[1.0, 1.0], 0.1).is_err());

        // Non-finite values
        assert!(BinSet::explicit(&[0.0, f64::INFINITY], 0.1).is_err());
    }

    #[test]
    fn auto_bins_from_line() {
        let magnitude = arr1(&[0.0, 1.0, 2.0, 3.0, 4.1]).into_dyn();
        let bins = BinSet::auto(&magnitude.view(), 1.0).unwrap();
        // raw edges are [0, 1, 2, 3, 4]
        assert_eq!(bins.centers(), &[0.5, 1.5, 2.5, 3.5]);
        assert_eq!(bins.dk(), 1.0);
    }

    #[test]
    fn auto_bins_exclusive_upper_edge() {
        // k_max coincides with an edge, so it is excluded from the edges
        let magnitude = arr1(&[0.0, 4.0]).into_dyn();
        let bins = BinSet::auto(&magnitude.view(), 1.0).unwrap();
        assert_eq!(bins.centers(), &[0.5, 1.5, 2.5]);
    }

    #[test]
    fn auto_bins_degenerate() {
        let magnitude = arr1(&[0.0, 1.0]).into_dyn();
        // a single raw edge
        assert!(BinSet::auto(&magnitude.view(), 1.0).is_err());
        assert!(BinSet::auto(&magnitude.view(), 5.0).is_err());
        // constant field
        let magnitude = ArrayD::<f64>::zeros(IxDyn(&[4]));
        assert!(BinSet::auto(&magnitude.view(), 0.1).is_err());
        // bad dk
        assert!(BinSet::auto(&magnitude.view(), 0.0).is_err());

        // tiny (but positive) dk
        let magnitude = arr1(&[0.0, 1.0]).into_dyn();
        assert!(BinSet::auto(&magnitude.view(), 1e-18).is_err());
        let dk = 1.0 / (MAX_AUTO_EDGES as f64);
        assert_eq!(
            BinSet::auto(&magnitude.view(), dk).unwrap().n_bins(),
            MAX_AUTO_EDGES - 1
        );
    }

    #[test]
    fn auto_bins_on_wavevector_grid() {
        let box_dims = BoxDims::cubic(10.0).unwrap();
        let field = compute_wavevectors(&[8, 8, 8], &box_dims).unwrap();
        let dk = 0.5;
        let bins = BinSet::auto(&field.magnitude(), dk).unwrap();
        let (k_min, k_max) = (field.k_min(), field.k_max());

        let expected_count = ((k_max - k_min) / dk).floor() as usize;
        assert_eq!(bins.n_bins(), expected_count);
        assert!(bins.centers().windows(2).all(|w| w[0] < w[1]));
        assert!(bins.centers()[0] >= 0.0);
        assert!(*bins.centers().last().unwrap() < k_max);
    }

    #[test]
    fn label_assignment() {
        let magnitude = arr1(&[0.0, 0.4, 1.0, 1.6, 9.0]).into_dyn();
        let bins = BinSet::explicit(&[0.5, 1.5], 1.0).unwrap();
        let labels = assign_labels(&magnitude.view(), &bins);
        // 1.0 is a tie and goes to the first center
        assert_eq!(labels.indices(), arr1(&[0_usize, 0, 0, 1, 1]).into_dyn());
        assert_eq!(labels.occupancy(bins.n_bins()), vec![3, 2]);
        assert_eq!(
            labels.label_values(&bins),
            snap(&magnitude, bins.centers()).unwrap()
        );
    }

    #[test]
    fn shell_masks() {
        let magnitude = arr1(&[0.0, 0.4, 1.0, 1.6, 2.6]).into_dyn();

        let bins = BinSet::explicit(&[0.5, 1.5, 2.5], 1.0).unwrap();
        let labels = assign_labels(&magnitude.view(), &bins);
        assert_eq!(bins.shell_members(1), vec![1]);
        assert_eq!(
            labels.shell_mask(&bins, 0),
            arr1(&[1.0, 1.0, 1.0, 0.0, 0.0]).into_dyn()
        );
        assert_eq!(
            labels.shell_mask(&bins, 2),
            arr1(&[0.0, 0.0, 0.0, 0.0, 1.0]).into_dyn()
        );

        // centers closer than dk/2 share their cells
        let magnitude = arr1(&[0.0, 0.4, 1.0, 1.4, 2.6]).into_dyn();
        let bins = BinSet::explicit(&[0.5, 0.7, 2.5], 1.0).unwrap();
        let labels = assign_labels(&magnitude.view(), &bins);
        assert_eq!(bins.shell_members(0), vec![0, 1]);
        assert_eq!(
            labels.shell_mask(&bins, 0),
            arr1(&[1.0, 1.0, 1.0, 1.0, 0.0]).into_dyn()
        );

        // a center exactly dk/2 away is outside the shell
        let magnitude = arr1(&[0.4, 0.6, 0.9, 1.2]).into_dyn();
        let bins = BinSet::explicit(&[0.5, 1.0], 1.0).unwrap();
        let labels = assign_labels(&magnitude.view(), &bins);
        assert_eq!(bins.shell_members(0), vec![0]);
        assert_eq!(bins.shell_members(1), vec![1]);
        assert_eq!(
            labels.shell_mask(&bins, 0),
            arr1(&[1.0, 1.0, 0.0, 0.0]).into_dyn()
        );
    }
}
