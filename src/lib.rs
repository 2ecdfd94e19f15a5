/*!
Estimates the bispectrum of scalar fields sampled on regular grids (e.g.
density or temperature fields from cosmological simulations).

# High-Level: the Bispectrum

The bispectrum is the Fourier-space counterpart of the 3-point correlation
function. It measures the correlation between 3 Fourier modes whose
wavevectors form a closed triangle, `k1 + k2 + k3 = 0`, and it is the lowest
order statistic that is sensitive to non-Gaussianity.

This crate uses a shell-filtering estimator. Fourier space is divided into
spherical shells of width `dk`. The field is band-passed through each shell
and transformed back to real space. The product of 3 band-passed fields,
summed over the grid, picks up exactly the closed triangles with one side in
each shell. Dividing by the same sum computed for the shell indicators alone
normalizes by the number of triangles.

# User Guide

```no_run
use bispec::BispectrumEstimator;
use ndarray::Array3;

let mut estimator = BispectrumEstimator::new(&[100.0], 32, 0.2)?;
let field = Array3::<f64>::zeros((32, 32, 32));
estimator.set_field(&field)?;
let equilateral = estimator.compute_equilateral(None, None)?;
for (k, bk) in equilateral.k().iter().zip(equilateral.bk().iter()) {
    println!("{k} {bk}");
}
# Ok::<(), bispec::Error>(())
```

For finer control (non-cubic grids, explicit bin centers), use
[`EstimatorBuilder`].

# Conventions

- Along an axis with `N` cells and length `L`, cell `i` has the wavenumber
  `2π (i - (N-1)/2) / L`.
- Spectra are centered: the zero frequency sits at index `N/2` of each axis.
- Every cell is assigned to its nearest bin center (ties go to the lower
  bin). A shell contains the cells assigned to bins whose centers lie
  strictly within `dk/2` of the shell's center.

# Developer Guide

The grid machinery (wavevectors, bins, snapping) lives in
[`bispec_internal`]. This crate adds the transforms, the estimator and the
error type.

*/

#![deny(rustdoc::broken_intra_doc_links)]

// inform build-system of the modules in this package
mod error;
mod estimator;
mod fft;
mod field;
mod result;

// pull in symbols that visible outside of the package
pub use bispec_internal::{
    BinLabels, BinSet, BoxDims, MAX_AUTO_EDGES, WavevectorField, assign_labels,
    compute_wavevectors, nearest_index, round_to_multiple, snap,
};
pub use error::{Error, ErrorCategory};
pub use estimator::{BispectrumEstimator, DEFAULT_DK, EstimatorBuilder, EstimatorState};
pub use fft::{CenteredFft, center_shift, uncenter_shift};
pub use field::{FieldLoader, FieldTransform, NpyLoader};
pub use result::{Bispectrum, EquilateralBispectrum, FullBispectrum};
