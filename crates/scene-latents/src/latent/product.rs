//! Cartesian product of latent spaces.
//!
//! Model
//! - Components are independent; component `i` owns the column block
//!   `offset(i)..offset(i) + dim_i`, identical in every sample matrix drawn
//!   from the product (marginal, conditional or causal).
//! - Concatenation order is construction order. The layout engine relies on
//!   it to map columns back to factors.
//!
//! Causal mode
//! - A fixed two-pass schedule over exactly ten components (`CAUSAL_SCHEDULE`).
//!   Pass 1 draws a zero-anchored baseline for every component; scheduled
//!   children are then redrawn from their own marginal strategy anchored at
//!   the source's baseline. Children never read another child's output, so
//!   the passes only fix the order in which the RNG is consumed.
//! - The schedule is a static table; there is no general DAG resolution.

use super::LatentSpace;
use crate::dist::Distribution;
use crate::error::{Result, SampleError};
use nalgebra::DMatrix;
use rand::Rng;

/// Number of components the causal schedule is written for.
pub const CAUSAL_COMPONENTS: usize = 10;

/// One causal dependency: `child` is drawn anchored at a source baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CausalEdge {
    pub child: usize,
    /// Source when the first branch (`first_content`) is selected.
    pub source_first: usize,
    pub source_other: usize,
    pub pass: u8,
}

impl CausalEdge {
    #[inline]
    pub fn source(&self, first_content: bool) -> usize {
        if first_content {
            self.source_first
        } else {
            self.source_other
        }
    }
}

/// The dependency schedule, in RNG consumption order.
pub const CAUSAL_SCHEDULE: [CausalEdge; 6] = [
    CausalEdge {
        child: 1,
        source_first: 6,
        source_other: 8,
        pass: 1,
    },
    CausalEdge {
        child: 6,
        source_first: 1,
        source_other: 8,
        pass: 1,
    },
    CausalEdge {
        child: 8,
        source_first: 6,
        source_other: 1,
        pass: 1,
    },
    CausalEdge {
        child: 0,
        source_first: 1,
        source_other: 1,
        pass: 2,
    },
    CausalEdge {
        child: 5,
        source_first: 6,
        source_other: 6,
        pass: 2,
    },
    CausalEdge {
        child: 7,
        source_first: 8,
        source_other: 8,
        pass: 2,
    },
];

#[derive(Clone, Debug, PartialEq)]
pub struct ProductLatentSpace {
    spaces: Vec<LatentSpace>,
    offsets: Vec<usize>,
    dim: usize,
}

impl ProductLatentSpace {
    pub fn new(spaces: Vec<LatentSpace>) -> Self {
        let mut offsets = Vec::with_capacity(spaces.len());
        let mut dim = 0;
        for s in &spaces {
            offsets.push(dim);
            dim += s.dim();
        }
        Self {
            spaces,
            offsets,
            dim,
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.spaces.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }
    pub fn components(&self) -> &[LatentSpace] {
        &self.spaces
    }
    /// First column of component `i`.
    pub fn offset(&self, i: usize) -> Option<usize> {
        self.offsets.get(i).copied()
    }

    /// Independent marginal draw per component, concatenated.
    pub fn sample_marginal<R: Rng>(
        &self,
        means: &DMatrix<f64>,
        params: &[Distribution],
        size: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        self.per_component(means, params, size, |s, mean, dist| {
            s.sample_marginal(mean, dist, size, rng)
        })
    }

    /// Conditional draw per component, each anchored at its block of `means`.
    pub fn sample_conditional<R: Rng>(
        &self,
        means: &DMatrix<f64>,
        params: &[Distribution],
        size: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        self.per_component(means, params, size, |s, mean, dist| {
            s.sample_conditional(mean, dist, size, rng)
        })
    }

    /// Marginal draw under the fixed causal schedule.
    ///
    /// `baseline[i]` parameterizes the pass-1 draw of component `i`; `std[i]`
    /// parameterizes its causal redraw, `None` leaving the baseline in place.
    pub fn sample_marginal_causal<R: Rng>(
        &self,
        baseline: &[Distribution],
        std: &[Option<Distribution>],
        size: usize,
        first_content: bool,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        if self.len() != CAUSAL_COMPONENTS {
            return Err(SampleError::ComponentCountMismatch {
                expected: CAUSAL_COMPONENTS,
                got: self.len(),
            });
        }
        self.check_params(baseline.len())?;
        self.check_params(std.len())?;

        let mut base = Vec::with_capacity(self.len());
        for (s, dist) in self.spaces.iter().zip(baseline) {
            base.push(s.sample_marginal(&DMatrix::zeros(1, s.dim()), dist, size, rng)?);
        }

        let mut out = DMatrix::zeros(size, self.dim);
        for (i, block) in base.iter().enumerate() {
            out.columns_mut(self.offsets[i], block.ncols())
                .copy_from(block);
        }
        for pass in [1u8, 2] {
            for edge in CAUSAL_SCHEDULE.iter().filter(|e| e.pass == pass) {
                let Some(dist) = &std[edge.child] else {
                    continue;
                };
                let child = &self.spaces[edge.child];
                let source = &base[edge.source(first_content)];
                if source.ncols() != child.dim() {
                    return Err(SampleError::shape(
                        "causal source columns",
                        child.dim(),
                        source.ncols(),
                    ));
                }
                let block = child.sample_marginal(source, dist, size, rng)?;
                out.columns_mut(self.offsets[edge.child], block.ncols())
                    .copy_from(&block);
            }
        }
        Ok(out)
    }

    fn check_params(&self, got: usize) -> Result<()> {
        if got < self.len() {
            return Err(SampleError::MissingComponentParams { index: got });
        }
        if got > self.len() {
            return Err(SampleError::ComponentCountMismatch {
                expected: self.len(),
                got,
            });
        }
        Ok(())
    }

    fn per_component(
        &self,
        means: &DMatrix<f64>,
        params: &[Distribution],
        size: usize,
        mut draw: impl FnMut(&LatentSpace, &DMatrix<f64>, &Distribution) -> Result<DMatrix<f64>>,
    ) -> Result<DMatrix<f64>> {
        if means.ncols() != self.dim {
            return Err(SampleError::ComponentCountMismatch {
                expected: self.dim,
                got: means.ncols(),
            });
        }
        self.check_params(params.len())?;
        let mut out = DMatrix::zeros(size, self.dim);
        for (i, (s, dist)) in self.spaces.iter().zip(params).enumerate() {
            let offset = self.offsets[i];
            let mean = means.columns(offset, s.dim()).into_owned();
            let block = draw(s, &mean, dist)?;
            if block.shape() != (size, s.dim()) {
                return Err(SampleError::shape("component sample rows", size, block.nrows()));
            }
            out.columns_mut(offset, s.dim()).copy_from(&block);
        }
        Ok(out)
    }
}
