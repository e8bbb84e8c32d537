//! Error type shared by spaces, latent spaces and the layout engine.
//!
//! Every failure aborts the current generation run; nothing here is
//! recoverable mid-batch.

use crate::dist::Family;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum SampleError {
    /// The domain cannot draw from the requested family (or the call-time
    /// parameters do not match the family bound on the latent space).
    UnsupportedDistribution {
        domain: &'static str,
        family: Family,
    },
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    MarginalNotConfigured,
    ConditionalNotConfigured,
    MissingComponentParams {
        index: usize,
    },
    ComponentCountMismatch {
        expected: usize,
        got: usize,
    },
    UnsupportedConfiguration {
        reason: String,
    },
    InvalidParams {
        reason: String,
    },
}

impl SampleError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported_config(reason: impl Into<String>) -> Self {
        Self::UnsupportedConfiguration {
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(what: &'static str, expected: usize, got: usize) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            got,
        }
    }
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedDistribution { domain, family } => {
                write!(f, "{family} distribution is not supported on {domain}")
            }
            Self::ShapeMismatch {
                what,
                expected,
                got,
            } => write!(f, "shape mismatch for {what}: expected {expected}, got {got}"),
            Self::MarginalNotConfigured => write!(f, "marginal sampler was not configured"),
            Self::ConditionalNotConfigured => {
                write!(f, "conditional sampler was not configured")
            }
            Self::MissingComponentParams { index } => {
                write!(f, "no distribution parameters for component {index}")
            }
            Self::ComponentCountMismatch { expected, got } => {
                write!(f, "component count mismatch: expected {expected}, got {got}")
            }
            Self::UnsupportedConfiguration { reason } => {
                write!(f, "unsupported configuration: {reason}")
            }
            Self::InvalidParams { reason } => write!(f, "invalid distribution params: {reason}"),
        }
    }
}

impl std::error::Error for SampleError {}

pub type Result<T> = std::result::Result<T, SampleError>;
