//! The bispectrum estimator.
//!
//! # Algorithm
//!
//! For a bin center `kb`, the shell indicator `M_b` is 1 on every Fourier
//! cell assigned to a bin whose center is within `dk/2` of `kb`, and 0
//! elsewhere. From the centered spectrum `F` of the field we build
//! - the filtered field `d_b = IFFT(M_b F)`
//! - the window `I_b = IFFT(M_b)`
//!
//! and estimate `B(k1, k2, k3) = Σ Re(d_1 d_2 d_3) / Σ Re(I_1 I_2 I_3)`, where
//! the sums run over every real-space cell.
//!
//! The denominator equals `T / n²`, where `n` is the number of cells and `T`
//! counts the triangles `q1 + q2 + q3 = 0` with every `qi` in its shell. When
//! `T` is zero the entry is undefined.
//!
//! # State
//!
//! An estimator can't exist without a valid geometry, so it starts out in
//! [`EstimatorState::GeometryReady`] (the wavevectors, bins and per-cell bin
//! labels are already computed). Loading a field moves it to
//! [`EstimatorState::DataLoaded`]. Computations requested before that fail
//! with [`ErrorCategory::NoDataLoaded`](crate::ErrorCategory).

use std::path::Path;

use bispec_internal::{
    BinLabels, BinSet, BoxDims, WavevectorField, assign_labels, compute_wavevectors,
};
use ndarray::{Array1, Array3, ArrayBase, ArrayD, ArrayViewD, Data, Dimension, Zip};
use num_complex::Complex64;
use tracing::{debug, trace};

use crate::{
    Error,
    fft::CenteredFft,
    field::{FieldLoader, FieldTransform},
    result::{Bispectrum, EquilateralBispectrum, FullBispectrum},
};

/// The shell width used when none is specified
pub const DEFAULT_DK: f64 = 0.05;

/// Where the estimator is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EstimatorState {
    /// wavevectors and bins exist, but no field has been loaded
    GeometryReady,
    /// a field transform is cached and results can be computed
    DataLoaded,
}

/// Everything derived from the box dimensions and the grid shape.
#[derive(Debug)]
struct Geometry {
    box_dims: BoxDims,
    wavevectors: WavevectorField,
    fft: CenteredFft,
}

impl Geometry {
    fn new(box_dims: BoxDims, shape: &[usize]) -> Result<Geometry, Error> {
        let wavevectors = compute_wavevectors(shape, &box_dims).map_err(Error::invalid_geometry)?;
        debug!(
            ?shape,
            box_dims = ?box_dims.lengths(),
            k_min = wavevectors.k_min(),
            k_max = wavevectors.k_max(),
            "computed wavevector grid"
        );
        Ok(Geometry {
            box_dims,
            wavevectors,
            fft: CenteredFft::new(shape),
        })
    }
}

/// The bin set and the per-cell bin labels.
#[derive(Clone, Debug)]
struct Binning {
    bins: BinSet,
    labels: BinLabels,
}

impl Binning {
    fn new(
        wavevectors: &WavevectorField,
        explicit_centers: Option<&[f64]>,
        dk: f64,
    ) -> Result<Binning, Error> {
        let bins = match explicit_centers {
            Some(centers) => BinSet::explicit(centers, dk),
            None => BinSet::auto(&wavevectors.magnitude(), dk),
        }
        .map_err(|what| Error::degenerate_binning(what, dk))?;
        let labels = assign_labels(&wavevectors.magnitude(), &bins);
        debug!(
            n_bins = bins.n_bins(),
            dk,
            explicit = explicit_centers.is_some(),
            "assigned cells to wavenumber bins"
        );
        Ok(Binning { bins, labels })
    }
}

/// The real-space products of a single shell.
struct ShellFilter {
    /// the field, band-passed through the shell
    filtered: ArrayD<Complex64>,
    /// the shell indicator itself, transformed back to real space
    window: ArrayD<Complex64>,
}

fn triple_sum(a: &ArrayD<Complex64>, b: &ArrayD<Complex64>, c: &ArrayD<Complex64>) -> f64 {
    Zip::from(a)
        .and(b)
        .and(c)
        .fold(0.0, |acc, &x, &y, &z| acc + (x * y * z).re)
}

/// Divide the triple products, or return `None` when the shells close no
/// triangle.
fn normalize(numerator: f64, denominator: f64, n_cells: usize) -> Option<f64> {
    // denominator * n_cells² is the (integer) triangle count
    let n = n_cells as f64;
    if denominator == 0.0 || denominator.abs() * n * n < 0.5 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Builds a [`BispectrumEstimator`].
///
/// The box dimensions and the grid shape are required. The shell width
/// defaults to [`DEFAULT_DK`] and the bins are derived from the magnitude
/// range unless explicit centers are given.
#[derive(Clone, Debug)]
pub struct EstimatorBuilder {
    box_dims: Option<Vec<f64>>,
    grid_shape: Option<Vec<usize>>,
    dk: f64,
    bin_centers: Option<Vec<f64>>,
}

impl Default for EstimatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatorBuilder {
    pub fn new() -> Self {
        EstimatorBuilder {
            box_dims: None,
            grid_shape: None,
            dk: DEFAULT_DK,
            bin_centers: None,
        }
    }

    /// Either a single length (used for every axis) or 3 lengths
    pub fn box_dims(mut self, lengths: &[f64]) -> Self {
        self.box_dims = Some(lengths.to_vec());
        self
    }

    /// a cubic `n × n × n` grid
    pub fn grid_size(mut self, n: usize) -> Self {
        self.grid_shape = Some(vec![n; 3]);
        self
    }

    /// a grid with 1, 2 or 3 axes
    pub fn grid_shape(mut self, shape: &[usize]) -> Self {
        self.grid_shape = Some(shape.to_vec());
        self
    }

    pub fn dk(mut self, dk: f64) -> Self {
        self.dk = dk;
        self
    }

    pub fn bin_centers(mut self, centers: &[f64]) -> Self {
        self.bin_centers = Some(centers.to_vec());
        self
    }

    pub fn build(self) -> Result<BispectrumEstimator, Error> {
        let Some(ref lengths) = self.box_dims else {
            return Err(Error::invalid_geometry("box dimensions were not specified"));
        };
        let Some(ref shape) = self.grid_shape else {
            return Err(Error::invalid_geometry("the grid shape was not specified"));
        };
        let box_dims = BoxDims::from_slice(lengths).map_err(Error::invalid_geometry)?;
        let geometry = Geometry::new(box_dims, shape)?;
        let binning = Binning::new(&geometry.wavevectors, self.bin_centers.as_deref(), self.dk)?;
        Ok(BispectrumEstimator {
            geometry,
            binning,
            transform: None,
        })
    }
}

/// Estimates the bispectrum of fields sampled on a fixed grid.
#[derive(Debug)]
pub struct BispectrumEstimator {
    geometry: Geometry,
    binning: Binning,
    transform: Option<FieldTransform>,
}

impl BispectrumEstimator {
    /// An estimator for a cubic `grid_size³` grid with automatic bins.
    ///
    /// `box_dims` holds either 1 or 3 lengths.
    pub fn new(box_dims: &[f64], grid_size: usize, dk: f64) -> Result<Self, Error> {
        EstimatorBuilder::new()
            .box_dims(box_dims)
            .grid_size(grid_size)
            .dk(dk)
            .build()
    }

    pub fn state(&self) -> EstimatorState {
        if self.transform.is_some() {
            EstimatorState::DataLoaded
        } else {
            EstimatorState::GeometryReady
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.geometry.wavevectors.shape()
    }

    pub fn box_dims(&self) -> &BoxDims {
        &self.geometry.box_dims
    }

    pub fn wavevectors(&self) -> &WavevectorField {
        &self.geometry.wavevectors
    }

    pub fn bin_set(&self) -> &BinSet {
        &self.binning.bins
    }

    pub fn bin_centers(&self) -> &[f64] {
        self.binning.bins.centers()
    }

    pub fn dk(&self) -> f64 {
        self.binning.bins.dk()
    }

    pub fn labels(&self) -> &BinLabels {
        &self.binning.labels
    }

    pub fn transform(&self) -> Option<&FieldTransform> {
        self.transform.as_ref()
    }

    /// Rebuild the bins, either from `explicit_centers` or from the range of
    /// wavevector magnitudes. A loaded field is kept.
    pub fn set_bins(&mut self, explicit_centers: Option<&[f64]>, dk: f64) -> Result<(), Error> {
        self.binning = Binning::new(&self.geometry.wavevectors, explicit_centers, dk)?;
        Ok(())
    }

    /// Load a field, replacing any previously loaded field.
    ///
    /// The field must have the grid's shape (see [`Self::set_field_regrid`]
    /// for fields of a different shape).
    pub fn set_field<S, D>(&mut self, field: &ArrayBase<S, D>) -> Result<(), Error>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let field = field.view().into_dyn();
        if field.shape() != self.shape() {
            return Err(Error::shape_mismatch(self.shape(), field.shape()));
        }
        self.transform = Some(FieldTransform::new(&field, &self.geometry.fft)?);
        debug!(shape = ?field.shape(), "loaded field");
        Ok(())
    }

    /// Load a field whose shape may differ from the grid's.
    ///
    /// When the shape differs, the wavevectors are recomputed for the new
    /// shape (with the same box dimensions) and automatic bins are rebuilt
    /// with width `dk`. When the shape matches, this is [`Self::set_field`]
    /// and `dk` is unused.
    pub fn set_field_regrid<S, D>(&mut self, field: &ArrayBase<S, D>, dk: f64) -> Result<(), Error>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let field = field.view().into_dyn();
        if field.shape() != self.shape() {
            debug!(
                old_shape = ?self.shape(),
                new_shape = ?field.shape(),
                "rebuilding the grid for a new field shape"
            );
            let geometry = Geometry::new(self.geometry.box_dims, field.shape())?;
            let binning = Binning::new(&geometry.wavevectors, None, dk)?;
            self.geometry = geometry;
            self.binning = binning;
            self.transform = None;
        }
        self.set_field(&field)
    }

    /// Fetch a field with `loader` and load it.
    pub fn set_field_from(
        &mut self,
        source: impl AsRef<Path>,
        loader: &impl FieldLoader,
    ) -> Result<(), Error> {
        let field = loader.load(source.as_ref())?;
        self.set_field(&field)
    }

    fn shell_filter(&self, spectrum: &ArrayViewD<Complex64>, bin: usize) -> Result<ShellFilter, Error> {
        let mask = self.binning.labels.shell_mask(&self.binning.bins, bin);
        let masked = Zip::from(spectrum)
            .and(&mask)
            .map_collect(|&s, &m| s * m);
        let filtered = self.geometry.fft.inverse(&masked.view())?;
        let window = self
            .geometry
            .fft
            .inverse(&mask.mapv(|m| Complex64::new(m, 0.0)).view())?;
        Ok(ShellFilter { filtered, window })
    }

    fn loaded_transform(&self) -> Result<&FieldTransform, Error> {
        self.transform.as_ref().ok_or_else(Error::no_data_loaded)
    }

    fn n_cells(&self) -> usize {
        self.shape().iter().product()
    }

    /// Compute the bispectrum for every triple of bins.
    ///
    /// Entry `[p, q, r]` corresponds to `(k[p], k[q], k[r])`.
    pub fn compute_full(&self) -> Result<FullBispectrum, Error> {
        let spectrum = self.loaded_transform()?.spectrum();
        let n_bins = self.binning.bins.n_bins();
        let n_cells = self.n_cells();

        // every shell takes part in O(n_bins²) triples, so build each once
        let filters = (0..n_bins)
            .map(|bin| self.shell_filter(&spectrum, bin))
            .collect::<Result<Vec<_>, Error>>()?;
        debug!(n_bins, "built shell filters");

        let mut bk = Array3::<f64>::from_elem((n_bins, n_bins, n_bins), f64::NAN);
        let mut undefined = Array3::from_elem((n_bins, n_bins, n_bins), true);

        // the products commute, so evaluate each unordered triple once and
        // store it under all of its permutations
        for p in 0..n_bins {
            for q in p..n_bins {
                for r in q..n_bins {
                    let (fp, fq, fr) = (&filters[p], &filters[q], &filters[r]);
                    let numerator = triple_sum(&fp.filtered, &fq.filtered, &fr.filtered);
                    let denominator = triple_sum(&fp.window, &fq.window, &fr.window);
                    let value = normalize(numerator, denominator, n_cells);
                    trace!(p, q, r, numerator, denominator, "evaluated triple");

                    let Some(value) = value else {
                        continue;
                    };
                    for idx in [
                        [p, q, r],
                        [p, r, q],
                        [q, p, r],
                        [q, r, p],
                        [r, p, q],
                        [r, q, p],
                    ] {
                        bk[idx] = value;
                        undefined[idx] = false;
                    }
                }
            }
        }

        let result = Bispectrum::new(self.bin_centers().to_vec(), bk, undefined);
        debug!(
            n_bins,
            n_undefined = result.n_undefined(),
            "computed full bispectrum"
        );
        Ok(result)
    }

    /// Compute the bispectrum for `k1 = k2 = k3`.
    ///
    /// If `bins` or `dk` is provided, the bins are rebuilt first: `bins` of
    /// `None` means automatic bins and `dk` of `None` keeps the current shell
    /// width.
    pub fn compute_equilateral(
        &mut self,
        bins: Option<&[f64]>,
        dk: Option<f64>,
    ) -> Result<EquilateralBispectrum, Error> {
        let _ = self.loaded_transform()?;
        if bins.is_some() || dk.is_some() {
            let dk = dk.unwrap_or(self.dk());
            self.set_bins(bins, dk)?;
        }

        let spectrum = self.loaded_transform()?.spectrum();
        let n_bins = self.binning.bins.n_bins();
        let n_cells = self.n_cells();
        let mut bk = Array1::<f64>::from_elem(n_bins, f64::NAN);
        let mut undefined = Array1::from_elem(n_bins, true);

        for bin in 0..n_bins {
            let filter = self.shell_filter(&spectrum, bin)?;
            let d = &filter.filtered;
            let w = &filter.window;
            let numerator = triple_sum(d, d, d);
            let denominator = triple_sum(w, w, w);
            trace!(bin, numerator, denominator, "evaluated equilateral bin");
            if let Some(value) = normalize(numerator, denominator, n_cells) {
                bk[bin] = value;
                undefined[bin] = false;
            }
        }

        let result = Bispectrum::new(self.bin_centers().to_vec(), bk, undefined);
        debug!(
            n_bins,
            n_undefined = result.n_undefined(),
            "computed equilateral bispectrum"
        );
        Ok(result)
    }

    /// Load `field` (rebuilding the grid with width `dk` if its shape is new)
    /// and compute the full bispectrum.
    pub fn compute_full_for<S, D>(
        &mut self,
        field: &ArrayBase<S, D>,
        dk: f64,
    ) -> Result<FullBispectrum, Error>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.set_field_regrid(field, dk)?;
        self.compute_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCategory;
    use ndarray::{Array3, IxDyn};

    #[test]
    fn normalize_rules() {
        assert_eq!(normalize(1.0, 0.0, 8), None);
        // less than half a triangle
        assert_eq!(normalize(1.0, 0.4 / 64.0, 8), None);
        assert_eq!(normalize(3.0, 2.0 / 64.0, 8), Some(96.0));
        assert_eq!(normalize(0.0, 1.0 / 64.0, 8), Some(0.0));
    }

    #[test]
    fn builder_requires_geometry() {
        let err = EstimatorBuilder::new().grid_size(4).build().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidGeometry);
        let err = EstimatorBuilder::new().box_dims(&[1.0]).build().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidGeometry);
    }

    #[test]
    fn builder_defaults() {
        let estimator = EstimatorBuilder::new()
            .box_dims(&[10.0])
            .grid_size(8)
            .build()
            .unwrap();
        assert_eq!(estimator.dk(), DEFAULT_DK);
        assert_eq!(estimator.shape(), &[8, 8, 8]);
        assert_eq!(estimator.box_dims().lengths(), &[10.0; 3]);
        assert_eq!(estimator.state(), EstimatorState::GeometryReady);
        assert!(estimator.transform().is_none());
    }

    #[test]
    fn builder_explicit_centers() {
        let estimator = EstimatorBuilder::new()
            .box_dims(&[10.0, 10.0, 10.0])
            .grid_size(5)
            .bin_centers(&[0.5, 1.5, 2.5])
            .dk(1.0)
            .build()
            .unwrap();
        assert_eq!(estimator.bin_centers(), &[0.5, 1.5, 2.5]);
        assert_eq!(estimator.labels().shape(), &[5, 5, 5]);
    }

    #[test]
    fn shell_filter_of_zero_mask() {
        // a bin that no cell is assigned to has an empty shell
        let mut estimator = BispectrumEstimator::new(&[10.0], 4, 0.5).unwrap();
        estimator.set_bins(Some(&[0.5, 1000.0]), 0.5).unwrap();
        estimator
            .set_field(&Array3::<f64>::ones((4, 4, 4)))
            .unwrap();
        let spectrum = estimator.transform().unwrap().spectrum();
        let filter = estimator.shell_filter(&spectrum, 1).unwrap();
        assert!(filter.window.iter().all(|w| *w == Complex64::new(0.0, 0.0)));
        assert!(filter.filtered.iter().all(|d| *d == Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn state_transitions() {
        let mut estimator = BispectrumEstimator::new(&[10.0], 4, 0.5).unwrap();
        assert_eq!(estimator.state(), EstimatorState::GeometryReady);
        let field = ArrayD::<f64>::zeros(IxDyn(&[4, 4, 4]));
        estimator.set_field(&field).unwrap();
        assert_eq!(estimator.state(), EstimatorState::DataLoaded);
        // rebinning keeps the field
        estimator.set_bins(None, 1.0).unwrap();
        assert_eq!(estimator.state(), EstimatorState::DataLoaded);
        // a failed rebin leaves the old bins in place
        assert!(estimator.set_bins(None, 1e3).is_err());
        assert_eq!(estimator.dk(), 1.0);
    }
}
