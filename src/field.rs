//! Field ingestion: the cached centered spectrum of a field and the loader
//! abstraction used to fetch fields from storage.

use std::path::Path;

use ndarray::{ArrayD, ArrayViewD};
use ndarray_npy::read_npy;
use num_complex::Complex64;

use crate::{Error, fft::CenteredFft};

/// The centered Fourier transform of a real field.
#[derive(Clone, Debug)]
pub struct FieldTransform {
    spectrum: ArrayD<Complex64>,
}

impl FieldTransform {
    /// Transform `field`. Its shape must match the shape `fft` was planned
    /// for.
    pub fn new(field: &ArrayViewD<f64>, fft: &CenteredFft) -> Result<FieldTransform, Error> {
        Ok(FieldTransform {
            spectrum: fft.forward(field)?,
        })
    }

    pub fn spectrum(&self) -> ArrayViewD<'_, Complex64> {
        self.spectrum.view()
    }

    pub fn shape(&self) -> &[usize] {
        self.spectrum.shape()
    }
}

/// Something that can produce a real field from a storage location.
///
/// Any `Fn(&Path) -> Result<ArrayD<f64>, Error>` closure is a loader.
pub trait FieldLoader {
    fn load(&self, source: &Path) -> Result<ArrayD<f64>, Error>;
}

impl<F> FieldLoader for F
where
    F: Fn(&Path) -> Result<ArrayD<f64>, Error>,
{
    fn load(&self, source: &Path) -> Result<ArrayD<f64>, Error> {
        self(source)
    }
}

/// Reads a field of `f64` values from a `.npy` file (the format written by
/// numpy's `np.save`).
#[derive(Clone, Copy, Debug, Default)]
pub struct NpyLoader;

impl FieldLoader for NpyLoader {
    fn load(&self, source: &Path) -> Result<ArrayD<f64>, Error> {
        read_npy(source)
            .map_err(|err| Error::field_load(source.display().to_string(), err.to_string()))
    }
}
