//! Implements the Fourier-space coordinates of a regular grid.
//!
//! For an axis with `N` cells and physical length `L`, the cell at index `i`
//! is assigned the angular wavenumber `2π (i - c) / L` where
//! `c = (N - 1) / 2`. The center is not rounded, so for even `N` no cell has
//! an exactly zero component along that axis.

use core::f64::consts::PI;
use ndarray::{ArrayD, ArrayViewD, IxDyn, Zip};

/// The physical extent of the box along each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxDims([f64; 3]);

impl BoxDims {
    pub fn new(lengths: [f64; 3]) -> Result<Self, &'static str> {
        if lengths.iter().any(|x| !x.is_finite()) {
            Err("box dimensions must be finite")
        } else if lengths.iter().any(|&x| x <= 0.0) {
            Err("box dimensions must be positive")
        } else {
            Ok(Self(lengths))
        }
    }

    /// a box with the same length along every axis
    pub fn cubic(length: f64) -> Result<Self, &'static str> {
        Self::new([length; 3])
    }

    /// Accepts either a single length (broadcast to every axis) or exactly
    /// 3 lengths.
    pub fn from_slice(lengths: &[f64]) -> Result<Self, &'static str> {
        match *lengths {
            [length] => Self::cubic(length),
            [lx, ly, lz] => Self::new([lx, ly, lz]),
            _ => Err("box dimensions must hold either 1 or 3 values"),
        }
    }

    pub fn lengths(&self) -> &[f64; 3] {
        &self.0
    }

    pub fn axis_length(&self, axis: usize) -> f64 {
        self.0[axis]
    }
}

/// Check that a grid shape is usable
pub fn check_grid_shape(shape: &[usize]) -> Result<(), &'static str> {
    if shape.is_empty() || shape.len() > 3 {
        Err("the grid must have 1, 2 or 3 axes")
    } else if shape.contains(&0) {
        Err("grid extents must not be 0")
    } else {
        Ok(())
    }
}

/// The per-cell wavevector components and their magnitude.
#[derive(Clone, Debug)]
pub struct WavevectorField {
    // one entry per grid axis
    components: Vec<ArrayD<f64>>,
    magnitude: ArrayD<f64>,
}

impl WavevectorField {
    pub fn shape(&self) -> &[usize] {
        self.magnitude.shape()
    }

    pub fn n_axes(&self) -> usize {
        self.components.len()
    }

    /// the wavevector component along `axis` (0 is `kx`)
    pub fn component(&self, axis: usize) -> ArrayViewD<'_, f64> {
        self.components[axis].view()
    }

    pub fn magnitude(&self) -> ArrayViewD<'_, f64> {
        self.magnitude.view()
    }

    pub fn k_min(&self) -> f64 {
        self.magnitude.fold(f64::INFINITY, |acc, &k| acc.min(k))
    }

    pub fn k_max(&self) -> f64 {
        self.magnitude.fold(f64::NEG_INFINITY, |acc, &k| acc.max(k))
    }
}

/// the wavenumbers along a single axis
fn axis_wavenumbers(n: usize, length: f64) -> Vec<f64> {
    // (max_index - min_index) / 2
    let center = (n - 1) as f64 / 2.0;
    (0..n)
        .map(|i| 2.0 * PI * (i as f64 - center) / length)
        .collect()
}

/// Compute the wavevector field for a grid of the given shape.
///
/// Axis `a` of the grid is paired with `box_dims.axis_length(a)`. For 1D and
/// 2D grids, the trailing box lengths are ignored.
pub fn compute_wavevectors(
    shape: &[usize],
    box_dims: &BoxDims,
) -> Result<WavevectorField, &'static str> {
    check_grid_shape(shape)?;
    let dim = IxDyn(shape);

    let components: Vec<ArrayD<f64>> = (0..shape.len())
        .map(|axis| {
            let axis_k = axis_wavenumbers(shape[axis], box_dims.axis_length(axis));
            ArrayD::from_shape_fn(dim.clone(), |idx| axis_k[idx[axis]])
        })
        .collect();

    let mut magnitude = ArrayD::<f64>::zeros(dim);
    for comp in components.iter() {
        Zip::from(&mut magnitude)
            .and(comp)
            .for_each(|sum, &k| *sum += k * k);
    }
    magnitude.mapv_inplace(f64::sqrt);

    Ok(WavevectorField {
        components,
        magnitude,
    })
}
