// The internal crate reports failures as `&'static str`. Here we wrap them in
// a proper error type, the same way that we expect to handle any errors that
// the internal crate introduces in the future.
//
// The variants of `ErrorKind` are intentionally kept private. Callers that
// need to branch on the failure use `Error::category`.

/// The public error type of the crate
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// Coarse classification of an [`Error`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// malformed box dimensions or grid shape
    InvalidGeometry,
    /// the bin width and magnitude range (or explicit centers) don't produce
    /// a usable set of bins
    DegenerateBinning,
    /// a computation was requested before any field was loaded
    NoDataLoaded,
    /// a field doesn't have the grid's shape
    ShapeMismatch,
    /// the loader collaborator failed to produce a field
    FieldLoad,
}

/// The underlying internal error type
#[non_exhaustive]
#[derive(Clone, Debug)]
enum ErrorKind {
    /// An error that occurs when box dimensions or the grid shape are bad
    InvalidGeometry(InvalidGeometryError),
    /// An error that occurs when a bin set can't be constructed
    DegenerateBinning(DegenerateBinningError),
    /// An error that occurs when computing before a field is loaded
    NoDataLoaded(NoDataLoadedError),
    /// An error that occurs when a field has the wrong shape
    ShapeMismatch(ShapeMismatchError),
    /// An error that occurs while loading a field
    FieldLoad(FieldLoadError),
}

// define constructor methods for Error
impl Error {
    /// produce an error indicating that the geometry is malformed
    pub(crate) fn invalid_geometry(what: &'static str) -> Self {
        Error {
            kind: ErrorKind::InvalidGeometry(InvalidGeometryError(what)),
        }
    }

    /// produce an error indicating that no usable bins could be built
    pub(crate) fn degenerate_binning(what: &'static str, dk: f64) -> Self {
        Error {
            kind: ErrorKind::DegenerateBinning(DegenerateBinningError { what, dk }),
        }
    }

    /// produce an error indicating that no field has been loaded
    pub(crate) fn no_data_loaded() -> Self {
        Error {
            kind: ErrorKind::NoDataLoaded(NoDataLoadedError),
        }
    }

    /// produce an error indicating that a field has the wrong shape
    pub(crate) fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Error {
            kind: ErrorKind::ShapeMismatch(ShapeMismatchError {
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            }),
        }
    }

    /// produce an error indicating that loading a field failed
    pub(crate) fn field_load(source: String, what: String) -> Self {
        Error {
            kind: ErrorKind::FieldLoad(FieldLoadError { source, what }),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            ErrorKind::InvalidGeometry(_) => ErrorCategory::InvalidGeometry,
            ErrorKind::DegenerateBinning(_) => ErrorCategory::DegenerateBinning,
            ErrorKind::NoDataLoaded(_) => ErrorCategory::NoDataLoaded,
            ErrorKind::ShapeMismatch(_) => ErrorCategory::ShapeMismatch,
            ErrorKind::FieldLoad(_) => ErrorCategory::FieldLoad,
        }
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for ErrorKind {}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            ErrorKind::InvalidGeometry(ref err) => err.fmt(f),
            ErrorKind::DegenerateBinning(ref err) => err.fmt(f),
            ErrorKind::NoDataLoaded(ref err) => err.fmt(f),
            ErrorKind::ShapeMismatch(ref err) => err.fmt(f),
            ErrorKind::FieldLoad(ref err) => err.fmt(f),
        }
    }
}

/// An error that occurs when box dimensions or the grid shape are bad
#[derive(Clone, Debug)]
struct InvalidGeometryError(&'static str);

impl std::error::Error for InvalidGeometryError {}

impl core::fmt::Display for InvalidGeometryError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid geometry: {}", self.0)
    }
}

/// An error that occurs when a bin set can't be constructed
#[derive(Clone, Debug)]
struct DegenerateBinningError {
    what: &'static str,
    dk: f64,
}

impl std::error::Error for DegenerateBinningError {}

impl core::fmt::Display for DegenerateBinningError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let DegenerateBinningError { what, dk } = self;
        write!(f, "can't build wavenumber bins with dk={dk}: {what}")
    }
}

/// An error that occurs when computing before a field is loaded
#[derive(Clone, Debug)]
struct NoDataLoadedError;

impl std::error::Error for NoDataLoadedError {}

impl core::fmt::Display for NoDataLoadedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "no field has been loaded into the estimator")
    }
}

/// An error that occurs when a field has the wrong shape
#[derive(Clone, Debug)]
struct ShapeMismatchError {
    expected: Vec<usize>,
    actual: Vec<usize>,
}

impl std::error::Error for ShapeMismatchError {}

impl core::fmt::Display for ShapeMismatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "the field has shape {:?}, but the grid has shape {:?}. Use \
             `set_field_regrid` to rebuild the grid for a new shape",
            self.actual, self.expected
        )
    }
}

/// An error that occurs while loading a field
#[derive(Clone, Debug)]
struct FieldLoadError {
    source: String,
    // TODO chain the loader's error rather than flattening it to a string
    what: String,
}

impl std::error::Error for FieldLoadError {}

impl core::fmt::Display for FieldLoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let source = self.source.as_str();
        let what = self.what.as_str();
        write!(f, "problem loading {source}: {what}")
    }
}
