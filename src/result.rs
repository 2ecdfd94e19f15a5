use ndarray::{Array, ArrayView, Dimension, Ix1, Ix3, NdIndex};

/// Bispectrum values together with the bin centers they were computed for.
///
/// An entry is *undefined* when its shells don't close a single Fourier
/// triangle, so the normalization is zero. Undefined entries hold `NaN` and
/// are flagged in [`Bispectrum::undefined`]; the rest of the computation is
/// unaffected.
#[derive(Clone, Debug)]
pub struct Bispectrum<D: Dimension> {
    k: Vec<f64>,
    bk: Array<f64, D>,
    undefined: Array<bool, D>,
}

/// values for every `(k1, k2, k3)` bin triple
pub type FullBispectrum = Bispectrum<Ix3>;

/// values for `k1 = k2 = k3`
pub type EquilateralBispectrum = Bispectrum<Ix1>;

impl<D: Dimension> Bispectrum<D> {
    pub(crate) fn new(k: Vec<f64>, bk: Array<f64, D>, undefined: Array<bool, D>) -> Self {
        debug_assert_eq!(bk.shape(), undefined.shape());
        Bispectrum { k, bk, undefined }
    }

    /// the bin centers (every axis of [`Self::bk`] is indexed by these)
    pub fn k(&self) -> &[f64] {
        &self.k
    }

    pub fn bk(&self) -> ArrayView<'_, f64, D> {
        self.bk.view()
    }

    pub fn undefined(&self) -> ArrayView<'_, bool, D> {
        self.undefined.view()
    }

    pub fn is_undefined<I: NdIndex<D>>(&self, index: I) -> bool {
        self.undefined[index]
    }

    pub fn n_undefined(&self) -> usize {
        self.undefined.iter().filter(|&&flag| flag).count()
    }

    pub fn into_parts(self) -> (Vec<f64>, Array<f64, D>, Array<bool, D>) {
        (self.k, self.bk, self.undefined)
    }
}
