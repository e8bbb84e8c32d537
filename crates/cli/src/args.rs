//! `generate` flags and their mapping onto `LatentsCfg`.
//!
//! Precedence: built-in defaults < `--config` JSON < explicit flags. Switches
//! can only turn things on; numeric flags override when given.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use scene_latents::layout::{ContinuousFamily, FactorFamily, LatentsCfg, PositionDomain};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ContinuousArg {
    Uniform,
    Normal,
}

impl From<ContinuousArg> for ContinuousFamily {
    fn from(a: ContinuousArg) -> Self {
        match a {
            ContinuousArg::Uniform => ContinuousFamily::Uniform,
            ContinuousArg::Normal => ContinuousFamily::Normal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DomainArg {
    Box,
    Sphere,
}

impl From<DomainArg> for PositionDomain {
    fn from(a: DomainArg) -> Self {
        match a {
            DomainArg::Box => PositionDomain::Box,
            DomainArg::Sphere => PositionDomain::Sphere,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FamilyArg {
    Object,
    Position,
    Rotation,
    Hue,
}

impl From<FamilyArg> for FactorFamily {
    fn from(a: FamilyArg) -> Self {
        match a {
            FamilyArg::Object => FactorFamily::Object,
            FamilyArg::Position => FactorFamily::Position,
            FamilyArg::Rotation => FactorFamily::Rotation,
            FamilyArg::Hue => FactorFamily::Hue,
        }
    }
}

/// Optional tabular copy of each view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TableFormat {
    #[default]
    None,
    Parquet,
    Csv,
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Destination folder for `m1/`, `m2/` and sidecars (required by `generate`)
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub output_folder: Option<PathBuf>,

    /// JSON config used as the base before flags are applied
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Also write each view as a table
    #[arg(long, value_enum, default_value_t = TableFormat::None)]
    pub table: TableFormat,

    #[arg(long)]
    pub n_pairs: Option<usize>,
    #[arg(long)]
    pub n_objects: Option<usize>,
    #[arg(long)]
    pub seed: Option<u64>,

    /// Sample view 1 under the fixed causal schedule
    #[arg(long)]
    pub causal: bool,
    /// Use the second branch of the causal schedule
    #[arg(long)]
    pub second_branch: bool,
    #[arg(long)]
    pub causal_noise: Option<f64>,

    #[arg(long)]
    pub object: bool,
    #[arg(long)]
    pub position: bool,
    #[arg(long)]
    pub rotation: bool,
    #[arg(long)]
    pub hue: bool,

    #[arg(long)]
    pub object_content: bool,
    #[arg(long)]
    pub object_style: bool,
    #[arg(long)]
    pub object_ms: bool,
    #[arg(long)]
    pub position_content: bool,
    #[arg(long)]
    pub position_style: bool,
    #[arg(long)]
    pub position_ms: bool,
    #[arg(long)]
    pub rotation_content: bool,
    #[arg(long)]
    pub rotation_style: bool,
    #[arg(long)]
    pub rotation_ms: bool,
    #[arg(long)]
    pub hue_content: bool,
    #[arg(long)]
    pub hue_style: bool,
    #[arg(long)]
    pub hue_ms: bool,

    #[arg(long, allow_hyphen_values = true)]
    pub min: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub max: Option<f64>,
    #[arg(long, value_enum)]
    pub continuous_marginal: Option<ContinuousArg>,
    #[arg(long, value_enum)]
    pub continuous_conditional: Option<ContinuousArg>,
    #[arg(long)]
    pub normal_marginal_std: Option<f64>,
    #[arg(long)]
    pub normal_conditional_std: Option<f64>,
    #[arg(long)]
    pub normal_conditional_noise: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub uniform_marginal_a: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub uniform_marginal_b: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub uniform_conditional_a: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub uniform_conditional_b: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub uniform_conditional_noise_a: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub uniform_conditional_noise_b: Option<f64>,
    /// Neighbour classes for the conditional object-identity draw
    #[arg(long)]
    pub multinomial_noise: Option<usize>,

    #[arg(long, value_enum)]
    pub position_domain: Option<DomainArg>,
    /// Families to overwrite with their fixed values after sampling
    #[arg(long, value_enum, value_delimiter = ',')]
    pub freeze: Vec<FamilyArg>,
    /// Write view 1 only, at the output root
    #[arg(long)]
    pub single_view: bool,
}

impl GenerateArgs {
    /// Resolve the run config: `--config` (or defaults) with flags on top.
    pub fn resolve(&self) -> Result<LatentsCfg> {
        let base = match &self.config {
            Some(path) => load_cfg(path)?,
            None => LatentsCfg::default(),
        };
        Ok(self.apply(base))
    }

    pub fn apply(&self, mut cfg: LatentsCfg) -> LatentsCfg {
        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = self.$field { cfg.$field = v; })*
            };
        }
        set!(
            n_pairs,
            n_objects,
            seed,
            causal_noise,
            min,
            max,
            normal_marginal_std,
            normal_conditional_std,
            normal_conditional_noise,
            uniform_marginal_a,
            uniform_marginal_b,
            uniform_conditional_a,
            uniform_conditional_b,
            uniform_conditional_noise_a,
            uniform_conditional_noise_b,
            multinomial_noise,
        );
        if let Some(v) = self.continuous_marginal {
            cfg.continuous_marginal = v.into();
        }
        if let Some(v) = self.continuous_conditional {
            cfg.continuous_conditional = v.into();
        }
        if let Some(v) = self.position_domain {
            cfg.position_domain = v.into();
        }

        cfg.causal |= self.causal;
        if self.second_branch {
            cfg.first_content = false;
        }
        cfg.single_view |= self.single_view;
        for f in &self.freeze {
            let family = FactorFamily::from(*f);
            if !cfg.freeze.contains(&family) {
                cfg.freeze.push(family);
            }
        }

        let switches = [
            (
                FactorFamily::Object,
                [self.object, self.object_content, self.object_style, self.object_ms],
            ),
            (
                FactorFamily::Position,
                [self.position, self.position_content, self.position_style, self.position_ms],
            ),
            (
                FactorFamily::Rotation,
                [self.rotation, self.rotation_content, self.rotation_style, self.rotation_ms],
            ),
            (FactorFamily::Hue, [self.hue, self.hue_content, self.hue_style, self.hue_ms]),
        ];
        for (family, [active, content, style, ms]) in switches {
            let flags = cfg.flags_mut(family);
            flags.active |= active;
            flags.content |= content;
            flags.style |= style;
            flags.ms |= ms;
        }
        cfg
    }
}

pub fn load_cfg(path: &Path) -> Result<LatentsCfg> {
    let bytes = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing config {}", path.display()))
}
