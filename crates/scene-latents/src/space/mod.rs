//! Topological spaces: the geometric domains latent factors are drawn from.
//!
//! Purpose
//! - `NBoxSpace`: axis-aligned box `[min, max]^n` with uniform, normal,
//!   truncated-normal, categorical and delta draws.
//! - `NSphereSpace`: unit sphere in R^n for jointly drawn factors.
//!
//! Conventions
//! - Samples are `DMatrix<f64>` with one row per draw and `dim()` columns.
//! - `mean` arguments broadcast: either 1 row or `size` rows, `dim()` columns.
//! - RNG state is always passed in; nothing here holds a generator.

mod cfg;
pub mod nbox;
pub mod sphere;

pub use nbox::NBoxSpace;
pub use sphere::NSphereSpace;

use crate::dist::{Distribution, Family, Mode};
use crate::error::{Result, SampleError};
use nalgebra::DMatrix;
use rand::Rng;

/// A domain a latent space samples from.
#[derive(Clone, Debug, PartialEq)]
pub enum Space {
    Box(NBoxSpace),
    Sphere(NSphereSpace),
}

impl Space {
    pub fn dim(&self) -> usize {
        match self {
            Space::Box(b) => b.dim(),
            Space::Sphere(s) => s.dim(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Space::Box(_) => "box",
            Space::Sphere(_) => "sphere",
        }
    }

    /// Whether the domain can draw from `family` at all.
    pub fn supports(&self, family: Family) -> bool {
        match self {
            Space::Box(_) => true,
            Space::Sphere(_) => matches!(family, Family::Uniform | Family::Normal | Family::Delta),
        }
    }

    /// Draw `size` rows from `dist`, anchored at `mean`.
    ///
    /// `mean` must broadcast to `(size, dim)` for every family, including the
    /// ones that ignore it.
    pub fn sample<R: Rng>(
        &self,
        dist: &Distribution,
        mean: &DMatrix<f64>,
        mode: Mode,
        size: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        dist.validate()?;
        check_mean(mean, self.dim(), size)?;
        match self {
            Space::Box(b) => b.sample(dist, mean, mode, size, rng),
            Space::Sphere(s) => s.sample(dist, mean, mode, size, rng),
        }
    }
}

impl From<NBoxSpace> for Space {
    fn from(b: NBoxSpace) -> Self {
        Space::Box(b)
    }
}

impl From<NSphereSpace> for Space {
    fn from(s: NSphereSpace) -> Self {
        Space::Sphere(s)
    }
}

/// Check that `mean` broadcasts to `(size, n)`.
pub(crate) fn check_mean(mean: &DMatrix<f64>, n: usize, size: usize) -> Result<()> {
    if mean.ncols() != n {
        return Err(SampleError::shape("mean columns", n, mean.ncols()));
    }
    if mean.nrows() != 1 && mean.nrows() != size {
        return Err(SampleError::shape("mean rows", size, mean.nrows()));
    }
    Ok(())
}

#[inline]
pub(crate) fn mean_at(mean: &DMatrix<f64>, row: usize, col: usize) -> f64 {
    if mean.nrows() == 1 {
        mean[(0, col)]
    } else {
        mean[(row, col)]
    }
}
