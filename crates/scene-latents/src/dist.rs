//! Distribution families and their call-time parameters.
//!
//! A latent space binds a [`Family`] per sampling mode at construction; each
//! call then supplies a [`Distribution`] carrying the numeric parameters. The
//! two must agree, which is checked at call time.

use crate::error::{Result, SampleError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Distribution family tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Uniform,
    Normal,
    TruncatedNormal,
    Categorical,
    Delta,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Uniform => "uniform",
            Family::Normal => "normal",
            Family::TruncatedNormal => "truncated_normal",
            Family::Categorical => "categorical",
            Family::Delta => "delta",
        };
        f.write_str(name)
    }
}

/// Parameters of one draw.
///
/// - `Uniform { a, b }`: `mean + U[a, b]`, kept inside the domain.
/// - `Normal { std }`: `mean + std·N(0, 1)`, no clamping.
/// - `TruncatedNormal { std }`: as `Normal`, but never leaves the domain.
/// - `Categorical`: class draw on the domain's integer lattice; `weights` is
///   only read when `uniform` is false.
/// - `Delta`: the domain's fixed value; parameters are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Distribution {
    Uniform {
        a: f64,
        b: f64,
    },
    Normal {
        std: f64,
    },
    TruncatedNormal {
        std: f64,
    },
    Categorical {
        classes: usize,
        weights: Option<Vec<f64>>,
        uniform: bool,
    },
    Delta,
}

impl Distribution {
    pub fn family(&self) -> Family {
        match self {
            Distribution::Uniform { .. } => Family::Uniform,
            Distribution::Normal { .. } => Family::Normal,
            Distribution::TruncatedNormal { .. } => Family::TruncatedNormal,
            Distribution::Categorical { .. } => Family::Categorical,
            Distribution::Delta => Family::Delta,
        }
    }

    /// Equiprobable categorical over `classes` classes.
    pub fn uniform_categorical(classes: usize) -> Self {
        Distribution::Categorical {
            classes,
            weights: None,
            uniform: true,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Distribution::Uniform { a, b } => {
                if !(a.is_finite() && b.is_finite()) {
                    return Err(SampleError::invalid("uniform window must be finite"));
                }
                if a > b {
                    return Err(SampleError::invalid("uniform window needs a <= b"));
                }
            }
            Distribution::Normal { std } | Distribution::TruncatedNormal { std } => {
                if !std.is_finite() || *std < 0.0 {
                    return Err(SampleError::invalid("std must be finite and >= 0"));
                }
            }
            Distribution::Categorical {
                classes,
                weights,
                uniform,
            } => {
                if *classes == 0 {
                    return Err(SampleError::invalid("categorical needs at least one class"));
                }
                if !uniform {
                    let w = weights.as_ref().ok_or_else(|| {
                        SampleError::invalid("non-uniform categorical needs weights")
                    })?;
                    if w.len() != *classes {
                        return Err(SampleError::shape("categorical weights", *classes, w.len()));
                    }
                }
            }
            Distribution::Delta => {}
        }
        Ok(())
    }
}

/// Whether a draw is unconditional or anchored at a reference sample.
///
/// Only categorical draws read it: marginal draws pick a class outright,
/// conditional draws pick a neighbour of the reference class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Marginal,
    Conditional,
}
