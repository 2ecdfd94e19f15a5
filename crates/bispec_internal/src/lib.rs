//! Grid machinery shared by the `bispec` crate: wavevector grids, shell
//! binning and nearest-value snapping.
//!
//! Errors are reported as `&'static str`. The public crate wraps them in its
//! own error type.

mod bins;
mod snap;
mod wavevector;

pub use bins::{BinLabels, BinSet, MAX_AUTO_EDGES, assign_labels};
pub use snap::{nearest_index, round_to_multiple, snap};
pub use wavevector::{BoxDims, WavevectorField, check_grid_shape, compute_wavevectors};
