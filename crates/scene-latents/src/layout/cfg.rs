//! Generation config: which factors vary, how they are partitioned, and the
//! numeric parameters of every distribution family.
//!
//! Defaults follow the dataset generator's historical command-line defaults.

use super::factor::{FactorFamily, FamilyFlags};
use crate::error::{Result, SampleError};
use crate::latent::CAUSAL_COMPONENTS;
use serde::{Deserialize, Serialize};

/// Continuous family choice for content/style factors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuousFamily {
    Uniform,
    /// Normal draws restricted to the factor's box.
    Normal,
}

/// Domain object positions are drawn from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionDomain {
    /// Independent x/y/z in `[min, max]`, renderer scale ×2.
    #[default]
    Box,
    /// Joint x/y/z on the unit sphere, renderer scale ×3 on the upper hemisphere.
    Sphere,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatentsCfg {
    pub n_pairs: usize,
    pub n_objects: usize,
    pub seed: u64,

    pub causal: bool,
    /// Selects the first branch of the causal schedule.
    pub first_content: bool,
    /// Width (uniform) or std (normal) of causal redraws.
    pub causal_noise: f64,

    pub object: FamilyFlags,
    pub position: FamilyFlags,
    pub rotation: FamilyFlags,
    pub hue: FamilyFlags,

    pub min: f64,
    pub max: f64,
    pub continuous_marginal: ContinuousFamily,
    pub continuous_conditional: ContinuousFamily,
    pub normal_marginal_std: f64,
    pub normal_conditional_std: f64,
    pub normal_conditional_noise: f64,
    pub uniform_marginal_a: f64,
    pub uniform_marginal_b: f64,
    pub uniform_conditional_a: f64,
    pub uniform_conditional_b: f64,
    pub uniform_conditional_noise_a: f64,
    pub uniform_conditional_noise_b: f64,
    /// Neighbour classes for the conditional object-identity draw.
    pub multinomial_noise: usize,

    pub position_domain: PositionDomain,
    /// Families overwritten with their fixed values after sampling.
    pub freeze: Vec<FactorFamily>,
    /// Keep view 1 only.
    pub single_view: bool,
}

impl Default for LatentsCfg {
    fn default() -> Self {
        Self {
            n_pairs: 1_000_000,
            n_objects: 1,
            seed: 0,
            causal: false,
            first_content: true,
            causal_noise: 0.1,
            object: FamilyFlags::default(),
            position: FamilyFlags::default(),
            rotation: FamilyFlags::default(),
            hue: FamilyFlags::default(),
            min: -1.0,
            max: 1.0,
            continuous_marginal: ContinuousFamily::Uniform,
            continuous_conditional: ContinuousFamily::Normal,
            normal_marginal_std: 1.0,
            normal_conditional_std: 1.0,
            normal_conditional_noise: 1.0,
            uniform_marginal_a: -1.0,
            uniform_marginal_b: 1.0,
            uniform_conditional_a: -0.1,
            uniform_conditional_b: 0.1,
            uniform_conditional_noise_a: -0.1,
            uniform_conditional_noise_b: 0.1,
            multinomial_noise: 3,
            position_domain: PositionDomain::Box,
            freeze: Vec::new(),
            single_view: false,
        }
    }
}

impl LatentsCfg {
    pub fn flags(&self, family: FactorFamily) -> FamilyFlags {
        match family {
            FactorFamily::Object => self.object,
            FactorFamily::Position => self.position,
            FactorFamily::Rotation => self.rotation,
            FactorFamily::Hue => self.hue,
        }
    }

    pub fn flags_mut(&mut self, family: FactorFamily) -> &mut FamilyFlags {
        match family {
            FactorFamily::Object => &mut self.object,
            FactorFamily::Position => &mut self.position,
            FactorFamily::Rotation => &mut self.rotation,
            FactorFamily::Hue => &mut self.hue,
        }
    }

    /// Reject flag combinations without a defined sampling behaviour.
    pub fn validate(&self) -> Result<()> {
        if self.n_pairs == 0 {
            return Err(SampleError::invalid("n_pairs must be > 0"));
        }
        if self.n_objects == 0 {
            return Err(SampleError::invalid("n_objects must be > 0"));
        }
        if self.multinomial_noise == 0 {
            return Err(SampleError::invalid("multinomial_noise must be > 0"));
        }
        for family in FactorFamily::ALL {
            let flags = self.flags(family);
            if flags.active && flags.partition().is_none() {
                return Err(SampleError::unsupported_config(format!(
                    "{family} is active but has no content/style/ms partition"
                )));
            }
        }
        if self.causal {
            let all_active = FactorFamily::ALL.iter().all(|f| self.flags(*f).active);
            if !all_active || self.n_objects != 1 || self.position_domain != PositionDomain::Box
            {
                return Err(SampleError::unsupported_config(format!(
                    "causal sampling needs all four factor families active, one object and box \
                     positions ({CAUSAL_COMPONENTS} components)"
                )));
            }
        }
        Ok(())
    }
}
