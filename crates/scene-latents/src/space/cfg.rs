//! Sampling constants (internal).

/// Rejection attempts per entry before a bounded draw falls back to clipping.
pub(crate) const MAX_REJECTION_ATTEMPTS: usize = 1000;
/// Below this norm a Gaussian direction is redrawn instead of normalized.
pub(crate) const NORM_EPS: f64 = 1e-12;
/// Largest categorical lattice a box may carry.
pub(crate) const MAX_LATTICE_POINTS: usize = 1 << 24;
