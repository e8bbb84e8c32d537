//! Paired scene-latent sampling.
//!
//! Layers, leaf first:
//! - `space`: box and sphere domains with their sampling primitives.
//! - `latent`: a domain bound to marginal/conditional strategies, and the
//!   product of such spaces (including the fixed causal schedule).
//! - `layout`: config → two views of scene factors in the canonical renderer
//!   column layout and renderer units.
//!
//! API Policy
//! - Project-internal; no stable public API.
//! - The library never touches the filesystem; writing outputs is the CLI's job.

pub mod dist;
pub mod error;
pub mod latent;
pub mod layout;
pub mod space;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use dist::{Distribution, Family, Mode};
pub use error::{Result, SampleError};

/// Common exports for callers driving the engine.
pub mod prelude {
    pub use crate::dist::{Distribution, Family};
    pub use crate::error::SampleError;
    pub use crate::latent::{LatentSpace, ProductLatentSpace, Strategy};
    pub use crate::layout::{
        generate, FactorFamily, FamilyFlags, GeneratedLatents, LatentsCfg, Layout, Partition,
        PositionDomain, View,
    };
    pub use crate::space::{NBoxSpace, NSphereSpace};
}
