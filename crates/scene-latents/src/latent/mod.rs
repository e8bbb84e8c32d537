//! Latent spaces: a domain plus a marginal and a conditional sampling strategy.
//!
//! Why this design
//! - Both strategies are bound at construction. A space without a conditional
//!   model says so explicitly with `Strategy::NotConfigured` and fails fast
//!   when asked to draw from it.
//! - Strategies are family tags; numeric parameters arrive per call as a
//!   `Distribution` and must match the bound family.
//! - Sampling is a pure function of (space, params, size, RNG).

pub mod product;

pub use product::{CausalEdge, ProductLatentSpace, CAUSAL_COMPONENTS, CAUSAL_SCHEDULE};

use crate::dist::{Distribution, Family, Mode};
use crate::error::{Result, SampleError};
use crate::space::Space;
use nalgebra::DMatrix;
use rand::Rng;

/// How a latent space draws in one mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Draw(Family),
    NotConfigured,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LatentSpace {
    space: Space,
    marginal: Strategy,
    conditional: Strategy,
}

impl LatentSpace {
    /// Bind `space` to its two strategies; fails if the domain cannot draw a
    /// bound family.
    pub fn new(space: impl Into<Space>, marginal: Strategy, conditional: Strategy) -> Result<Self> {
        let space = space.into();
        for strategy in [marginal, conditional] {
            if let Strategy::Draw(family) = strategy {
                if !space.supports(family) {
                    return Err(SampleError::UnsupportedDistribution {
                        domain: space.name(),
                        family,
                    });
                }
            }
        }
        Ok(Self {
            space,
            marginal,
            conditional,
        })
    }

    /// Same family in both modes.
    pub fn with_family(space: impl Into<Space>, family: Family) -> Result<Self> {
        Self::new(space, Strategy::Draw(family), Strategy::Draw(family))
    }

    #[inline]
    pub fn space(&self) -> &Space {
        &self.space
    }
    #[inline]
    pub fn dim(&self) -> usize {
        self.space.dim()
    }
    pub fn marginal(&self) -> Strategy {
        self.marginal
    }
    pub fn conditional(&self) -> Strategy {
        self.conditional
    }

    pub fn sample_marginal<R: Rng>(
        &self,
        mean: &DMatrix<f64>,
        dist: &Distribution,
        size: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        let family = match self.marginal {
            Strategy::Draw(f) => f,
            Strategy::NotConfigured => return Err(SampleError::MarginalNotConfigured),
        };
        self.draw(family, mean, dist, Mode::Marginal, size, rng)
    }

    pub fn sample_conditional<R: Rng>(
        &self,
        mean: &DMatrix<f64>,
        dist: &Distribution,
        size: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        let family = match self.conditional {
            Strategy::Draw(f) => f,
            Strategy::NotConfigured => return Err(SampleError::ConditionalNotConfigured),
        };
        self.draw(family, mean, dist, Mode::Conditional, size, rng)
    }

    fn draw<R: Rng>(
        &self,
        family: Family,
        mean: &DMatrix<f64>,
        dist: &Distribution,
        mode: Mode,
        size: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        if dist.family() != family {
            return Err(SampleError::UnsupportedDistribution {
                domain: self.space.name(),
                family: dist.family(),
            });
        }
        self.space.sample(dist, mean, mode, size, rng)
    }
}
