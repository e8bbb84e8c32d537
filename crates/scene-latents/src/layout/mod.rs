//! Layout engine: config → product space → paired views in renderer units.
//!
//! Pipeline (per run)
//! 1. validate the config and assemble the product space in construction order
//!    (partition → family → factor → object);
//! 2. draw view 1 (marginal, or causal) and view 2 conditionally on view 1;
//! 3. append constant columns for every inactive family;
//! 4. permute into the canonical layout (`columns`);
//! 5. freeze ablated families, keep the result as `raw`;
//! 6. convert to renderer units (`convert`).
//!
//! Determinism: a `StdRng` seeded from `cfg.seed` is the only randomness, so
//! identical configs produce bit-identical views.

mod assemble;
mod cfg;
mod columns;
mod convert;
mod factor;

pub use assemble::{Assembly, Component};
pub use cfg::{ContinuousFamily, LatentsCfg, PositionDomain};
pub use columns::{fixed_columns, inject_fixed, Layout};
pub use convert::{
    freeze, to_renderer_units, ANGLE_SCALE, BOX_POSITION_SCALE, SPHERE_POSITION_SCALE,
};
pub use factor::{Column, Factor, FactorFamily, FamilyFlags, Partition};

use crate::error::Result;
use nalgebra::DMatrix;
use rand::{rngs::StdRng, SeedableRng};
use tracing::debug;

/// One view in canonical column order.
#[derive(Clone, Debug, PartialEq)]
pub struct View {
    /// Sampled values after fixed injection and freeze, before conversion.
    pub raw: DMatrix<f64>,
    /// `raw` in renderer units.
    pub latents: DMatrix<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedLatents {
    pub layout: Layout,
    /// Two views, or only view 1 in single-view mode.
    pub views: Vec<View>,
}

impl GeneratedLatents {
    pub fn n_pairs(&self) -> usize {
        self.views.first().map_or(0, |v| v.raw.nrows())
    }
}

/// Run the whole pipeline for `cfg`.
pub fn generate(cfg: &LatentsCfg) -> Result<GeneratedLatents> {
    cfg.validate()?;
    let asm = Assembly::from_cfg(cfg)?;
    let layout = Layout::canonical(cfg.n_objects);
    let product = &asm.product;
    let size = cfg.n_pairs;
    debug!(
        components = product.len(),
        dim = product.dim(),
        canonical = layout.len(),
        "assembled product space"
    );

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let view1 = if cfg.causal {
        product.sample_marginal_causal(
            &asm.marginal_params(),
            &asm.causal_params(),
            size,
            cfg.first_content,
            &mut rng,
        )?
    } else {
        product.sample_marginal(
            &DMatrix::zeros(1, product.dim()),
            &asm.marginal_params(),
            size,
            &mut rng,
        )?
    };
    let mut sampled = vec![view1];
    if !cfg.single_view {
        let view2 =
            product.sample_conditional(&sampled[0], &asm.conditional_params(), size, &mut rng)?;
        sampled.push(view2);
    }

    let inactive: Vec<FactorFamily> = FactorFamily::ALL
        .into_iter()
        .filter(|f| !cfg.flags(*f).active)
        .collect();
    let fixed = fixed_columns(&inactive, cfg.n_objects);
    let mut source = asm.columns();
    source.extend_from_slice(&fixed);
    debug!(?inactive, fixed = fixed.len(), freeze = ?cfg.freeze, "injecting fixed columns");

    let mut views = Vec::with_capacity(sampled.len());
    for m in &sampled {
        let mut raw = layout.reorder(&inject_fixed(m, &fixed), &source)?;
        freeze(&mut raw, &layout, &cfg.freeze);
        let latents = to_renderer_units(&raw, &layout, cfg.position_domain);
        views.push(View { raw, latents });
    }
    Ok(GeneratedLatents { layout, views })
}
