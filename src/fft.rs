//! n-dimensional FFTs whose spectra keep the zero frequency at the center of
//! the grid.
//!
//! The transforms are built from 1D `rustfft` plans applied one axis at a
//! time over the lanes of an [`ndarray`] array. For an axis of length `N`,
//! the zero frequency of a centered spectrum lives at index `N/2` (integer
//! division), matching numpy's `fftshift`.

use crate::Error;
use ndarray::{ArrayD, ArrayViewD, Axis};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// rolls every axis of `array` by half its length.
///
/// When `inverse` is true, this undoes the forward roll (numpy's `ifftshift`).
/// The 2 only differ for odd lengths.
fn roll_axes<T: Copy>(array: &mut ArrayD<T>, inverse: bool) {
    for axis in 0..array.ndim() {
        let n = array.len_of(Axis(axis));
        if n == 0 {
            continue;
        }
        let shift = if inverse { n - n / 2 } else { n / 2 };
        if shift % n == 0 {
            continue;
        }
        let mut buf: Vec<T> = Vec::with_capacity(n);
        for mut lane in array.lanes_mut(Axis(axis)) {
            buf.clear();
            buf.extend(lane.iter().copied());
            for (i, &v) in buf.iter().enumerate() {
                lane[(i + shift) % n] = v;
            }
        }
    }
}

/// Move the zero frequency of an uncentered spectrum to the center of the
/// grid (numpy's `fftshift`).
pub fn center_shift<T: Copy>(array: &ArrayViewD<T>) -> ArrayD<T> {
    let mut out = array.to_owned();
    roll_axes(&mut out, false);
    out
}

/// The inverse of [`center_shift`] (numpy's `ifftshift`).
pub fn uncenter_shift<T: Copy>(array: &ArrayViewD<T>) -> ArrayD<T> {
    let mut out = array.to_owned();
    roll_axes(&mut out, true);
    out
}

/// Forward and inverse centered transforms for a fixed grid shape.
///
/// The 1D plans for each axis are created once, when the object is built.
pub struct CenteredFft {
    shape: Vec<usize>,
    forward: Vec<Arc<dyn Fft<f64>>>,
    inverse: Vec<Arc<dyn Fft<f64>>>,
}

impl core::fmt::Debug for CenteredFft {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("CenteredFft")
            .field("shape", &self.shape)
            .finish()
    }
}

impl CenteredFft {
    pub fn new(shape: &[usize]) -> CenteredFft {
        let mut planner = FftPlanner::<f64>::new();
        let forward = shape.iter().map(|&n| planner.plan_fft_forward(n)).collect();
        let inverse = shape.iter().map(|&n| planner.plan_fft_inverse(n)).collect();
        CenteredFft {
            shape: shape.to_vec(),
            forward,
            inverse,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn check_shape(&self, shape: &[usize]) -> Result<(), Error> {
        if shape != self.shape.as_slice() {
            Err(Error::shape_mismatch(&self.shape, shape))
        } else {
            Ok(())
        }
    }

    /// applies a 1D plan along every axis (unnormalized)
    fn transform_axes(data: &mut ArrayD<Complex64>, plans: &[Arc<dyn Fft<f64>>]) {
        for (axis, fft) in plans.iter().enumerate() {
            let mut buf = vec![Complex64::new(0.0, 0.0); data.len_of(Axis(axis))];
            let mut scratch = vec![Complex64::new(0.0, 0.0); fft.get_inplace_scratch_len()];
            for mut lane in data.lanes_mut(Axis(axis)) {
                for (b, &v) in buf.iter_mut().zip(lane.iter()) {
                    *b = v;
                }
                fft.process_with_scratch(&mut buf, &mut scratch);
                for (v, &b) in lane.iter_mut().zip(buf.iter()) {
                    *v = b;
                }
            }
        }
    }

    /// Transform a real field and center the result.
    pub fn forward(&self, field: &ArrayViewD<f64>) -> Result<ArrayD<Complex64>, Error> {
        self.check_shape(field.shape())?;
        let mut spectrum = field.mapv(|x| Complex64::new(x, 0.0));
        Self::transform_axes(&mut spectrum, &self.forward);
        roll_axes(&mut spectrum, false);
        Ok(spectrum)
    }

    /// Undo the centering of `spectrum`, then apply the inverse transform
    /// (normalized by the number of cells).
    pub fn inverse(&self, spectrum: &ArrayViewD<Complex64>) -> Result<ArrayD<Complex64>, Error> {
        self.check_shape(spectrum.shape())?;
        let mut field = spectrum.to_owned();
        roll_axes(&mut field, true);
        Self::transform_axes(&mut field, &self.inverse);
        let norm = 1.0 / field.len() as f64;
        field.mapv_inplace(|x| x * norm);
        Ok(field)
    }
}
