//! Config → product latent space, built in one pass.
//!
//! Each component is recorded together with the columns it fills and all of
//! its distribution parameters, so the column schema and the parameter lists
//! can never drift apart.
//!
//! Construction order: partition (content, style, ms), then family (object,
//! position, rotation, hue), then factor, then object.

use super::cfg::{ContinuousFamily, LatentsCfg, PositionDomain};
use super::factor::{Column, Factor, FactorFamily, Partition};
use crate::dist::{Distribution, Family};
use crate::error::Result;
use crate::latent::{LatentSpace, ProductLatentSpace, Strategy};
use crate::space::{NBoxSpace, NSphereSpace};

/// One latent space of the product plus everything needed to draw from it.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    /// Columns filled by this component, in its own column order.
    pub columns: Vec<Column>,
    pub partition: Partition,
    pub marginal: Distribution,
    pub conditional: Distribution,
    /// Parameters of the causal redraw; `None` keeps the baseline.
    pub causal: Option<Distribution>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Assembly {
    pub product: ProductLatentSpace,
    pub components: Vec<Component>,
}

impl Assembly {
    pub fn from_cfg(cfg: &LatentsCfg) -> Result<Self> {
        let mut spaces = Vec::new();
        let mut components = Vec::new();
        for partition in Partition::ALL {
            for family in FactorFamily::ALL {
                let flags = cfg.flags(family);
                if !flags.active || flags.partition() != Some(partition) {
                    continue;
                }
                if family == FactorFamily::Position && cfg.position_domain == PositionDomain::Sphere
                {
                    for object in 0..cfg.n_objects {
                        let (space, component) = sphere_position(cfg, partition, object)?;
                        spaces.push(space);
                        components.push(component);
                    }
                    continue;
                }
                for &factor in family.factors() {
                    for column in Column::instances(factor, cfg.n_objects) {
                        let (space, component) = box_factor(cfg, partition, column)?;
                        spaces.push(space);
                        components.push(component);
                    }
                }
            }
        }
        Ok(Self {
            product: ProductLatentSpace::new(spaces),
            components,
        })
    }

    /// Columns of a product sample, in product order.
    pub fn columns(&self) -> Vec<Column> {
        self.components
            .iter()
            .flat_map(|c| c.columns.iter().copied())
            .collect()
    }

    pub fn marginal_params(&self) -> Vec<Distribution> {
        self.components.iter().map(|c| c.marginal.clone()).collect()
    }

    pub fn conditional_params(&self) -> Vec<Distribution> {
        self.components
            .iter()
            .map(|c| c.conditional.clone())
            .collect()
    }

    pub fn causal_params(&self) -> Vec<Option<Distribution>> {
        self.components.iter().map(|c| c.causal.clone()).collect()
    }
}

fn box_factor(
    cfg: &LatentsCfg,
    partition: Partition,
    column: Column,
) -> Result<(LatentSpace, Component)> {
    if column.factor == Factor::Object {
        // Object identity is a class index on {0, …, n_objects - 1}.
        let space = NBoxSpace::new(1, 0.0, (cfg.n_objects - 1) as f64)?;
        let neighbours = if partition == Partition::Ms {
            1
        } else {
            cfg.multinomial_noise
        };
        let latent = LatentSpace::with_family(space, Family::Categorical)?;
        return Ok((
            latent,
            Component {
                columns: vec![column],
                partition,
                marginal: Distribution::uniform_categorical(cfg.n_objects),
                conditional: Distribution::uniform_categorical(neighbours),
                causal: None,
            },
        ));
    }

    let space = NBoxSpace::new(1, cfg.min, cfg.max)?;
    let (latent, marginal, conditional, causal) = match partition {
        Partition::Ms => (
            LatentSpace::with_family(space, Family::Delta)?,
            Distribution::Delta,
            Distribution::Delta,
            None,
        ),
        Partition::Content | Partition::Style => {
            let marginal = box_marginal(cfg);
            let conditional = box_conditional(cfg, partition);
            let causal = match cfg.continuous_marginal {
                ContinuousFamily::Uniform => Distribution::Uniform {
                    a: -cfg.causal_noise,
                    b: cfg.causal_noise,
                },
                ContinuousFamily::Normal => Distribution::TruncatedNormal {
                    std: cfg.causal_noise,
                },
            };
            let latent = LatentSpace::new(
                space,
                Strategy::Draw(marginal.family()),
                Strategy::Draw(conditional.family()),
            )?;
            (latent, marginal, conditional, Some(causal))
        }
    };
    Ok((
        latent,
        Component {
            columns: vec![column],
            partition,
            marginal,
            conditional,
            causal,
        },
    ))
}

fn box_marginal(cfg: &LatentsCfg) -> Distribution {
    match cfg.continuous_marginal {
        ContinuousFamily::Uniform => Distribution::Uniform {
            a: cfg.uniform_marginal_a,
            b: cfg.uniform_marginal_b,
        },
        ContinuousFamily::Normal => Distribution::TruncatedNormal {
            std: cfg.normal_marginal_std,
        },
    }
}

fn box_conditional(cfg: &LatentsCfg, partition: Partition) -> Distribution {
    let content = partition == Partition::Content;
    match cfg.continuous_conditional {
        ContinuousFamily::Uniform => {
            let (a, b) = if content {
                (cfg.uniform_conditional_a, cfg.uniform_conditional_b)
            } else {
                (
                    cfg.uniform_conditional_noise_a,
                    cfg.uniform_conditional_noise_b,
                )
            };
            Distribution::Uniform { a, b }
        }
        ContinuousFamily::Normal => Distribution::TruncatedNormal {
            std: if content {
                cfg.normal_conditional_std
            } else {
                cfg.normal_conditional_noise
            },
        },
    }
}

/// x/y/z of one object drawn jointly on the unit sphere.
///
/// Conditionals perturb view 1 (uniform window or normal std per partition)
/// and project back onto the sphere.
fn sphere_position(
    cfg: &LatentsCfg,
    partition: Partition,
    object: usize,
) -> Result<(LatentSpace, Component)> {
    let columns = FactorFamily::Position
        .factors()
        .iter()
        .map(|&f| Column::new(f, object))
        .collect();
    let space = NSphereSpace::new(3)?;
    // Uniform marginals cover the whole sphere; the window only matters
    // for conditional draws around view 1.
    let marginal = match cfg.continuous_marginal {
        ContinuousFamily::Uniform => Distribution::Uniform { a: -1.0, b: 1.0 },
        ContinuousFamily::Normal => Distribution::Normal {
            std: cfg.normal_marginal_std,
        },
    };
    let conditional = match (cfg.continuous_conditional, partition) {
        (ContinuousFamily::Uniform, _) => box_conditional(cfg, partition),
        (ContinuousFamily::Normal, Partition::Content) => Distribution::Normal {
            std: cfg.normal_conditional_std,
        },
        (ContinuousFamily::Normal, _) => Distribution::Normal {
            std: cfg.normal_conditional_noise,
        },
    };
    let (marginal, conditional) = match partition {
        Partition::Ms => (Distribution::Delta, Distribution::Delta),
        Partition::Content | Partition::Style => (marginal, conditional),
    };
    let latent = LatentSpace::new(
        space,
        Strategy::Draw(marginal.family()),
        Strategy::Draw(conditional.family()),
    )?;
    Ok((
        latent,
        Component {
            columns,
            partition,
            marginal,
            conditional,
            causal: None,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::factor::FamilyFlags;

    fn all_active(partition: Partition) -> LatentsCfg {
        let mut cfg = LatentsCfg::default();
        for family in FactorFamily::ALL {
            *cfg.flags_mut(family) = FamilyFlags::active_as(partition);
        }
        cfg
    }

    #[test]
    fn single_object_scene_has_ten_components_in_order() {
        let asm = Assembly::from_cfg(&all_active(Partition::Content)).unwrap();
        let names: Vec<String> = asm.columns().iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            [
                "object_object_0",
                "position_x_object_0",
                "position_y_object_0",
                "position_z_object_0",
                "rotation_object_alpha_object_0",
                "rotation_object_beta_object_0",
                "rotation_spot_object_0",
                "object_hue_object_0",
                "back_hue_object_0",
                "spot_hue_object_0",
            ]
        );
        assert_eq!(asm.product.dim(), 10);
        assert_eq!(asm.marginal_params().len(), asm.product.len());
        assert_eq!(asm.conditional_params().len(), asm.product.len());
    }

    #[test]
    fn partitions_are_visited_content_style_ms() {
        let mut cfg = LatentsCfg {
            n_objects: 2,
            ..LatentsCfg::default()
        };
        cfg.hue = FamilyFlags::active_as(Partition::Content);
        cfg.position = FamilyFlags::active_as(Partition::Ms);
        cfg.rotation = FamilyFlags::active_as(Partition::Style);
        let asm = Assembly::from_cfg(&cfg).unwrap();
        let families: Vec<FactorFamily> = asm
            .components
            .iter()
            .map(|c| c.columns[0].factor.family())
            .collect();
        let first_rotation = families
            .iter()
            .position(|f| *f == FactorFamily::Rotation)
            .unwrap();
        let first_position = families
            .iter()
            .position(|f| *f == FactorFamily::Position)
            .unwrap();
        assert!(families[..first_rotation]
            .iter()
            .all(|f| *f == FactorFamily::Hue));
        assert!(first_rotation < first_position);
        // hue: 2 object hues + back + spot; rotation: 2 + 2 + spot; position: 6.
        assert_eq!(asm.product.dim(), 4 + 5 + 6);
    }

    #[test]
    fn content_and_style_use_different_conditionals() {
        let mut cfg = LatentsCfg::default();
        cfg.hue = FamilyFlags::active_as(Partition::Content);
        cfg.rotation = FamilyFlags::active_as(Partition::Style);
        cfg.normal_conditional_std = 0.2;
        cfg.normal_conditional_noise = 0.7;
        let asm = Assembly::from_cfg(&cfg).unwrap();
        for c in &asm.components {
            let expected = match c.partition {
                Partition::Content => 0.2,
                Partition::Style => 0.7,
                Partition::Ms => unreachable!(),
            };
            assert_eq!(c.conditional, Distribution::TruncatedNormal { std: expected });
            assert_eq!(
                c.marginal,
                Distribution::Uniform { a: -1.0, b: 1.0 }
            );
        }
    }

    #[test]
    fn ms_factors_are_delta_and_skip_causal() {
        let asm = Assembly::from_cfg(&all_active(Partition::Ms)).unwrap();
        for c in &asm.components {
            if c.columns[0].factor == Factor::Object {
                assert_eq!(c.conditional, Distribution::uniform_categorical(1));
            } else {
                assert_eq!(c.marginal, Distribution::Delta);
                assert_eq!(c.conditional, Distribution::Delta);
            }
            assert!(c.causal.is_none());
        }
    }

    #[test]
    fn sphere_uniform_conditionals_use_partition_windows() {
        let mut cfg = LatentsCfg {
            position_domain: PositionDomain::Sphere,
            continuous_conditional: ContinuousFamily::Uniform,
            uniform_conditional_a: -0.05,
            uniform_conditional_b: 0.05,
            ..LatentsCfg::default()
        };
        cfg.position = FamilyFlags::active_as(Partition::Content);
        let asm = Assembly::from_cfg(&cfg).unwrap();
        assert_eq!(
            asm.components[0].conditional,
            Distribution::Uniform { a: -0.05, b: 0.05 }
        );
        cfg.position = FamilyFlags::active_as(Partition::Style);
        let asm = Assembly::from_cfg(&cfg).unwrap();
        assert_eq!(
            asm.components[0].conditional,
            Distribution::Uniform { a: -0.1, b: 0.1 }
        );
    }

    #[test]
    fn sphere_positions_are_one_component_per_object() {
        let mut cfg = LatentsCfg {
            n_objects: 3,
            position_domain: PositionDomain::Sphere,
            ..LatentsCfg::default()
        };
        cfg.position = FamilyFlags::active_as(Partition::Content);
        let asm = Assembly::from_cfg(&cfg).unwrap();
        assert_eq!(asm.product.len(), 3);
        for c in &asm.components {
            assert_eq!(c.conditional, Distribution::Normal { std: 1.0 });
        }
        assert_eq!(asm.product.dim(), 9);
        assert_eq!(
            asm.components[1].columns,
            vec![
                Column::new(Factor::PositionX, 1),
                Column::new(Factor::PositionY, 1),
                Column::new(Factor::PositionZ, 1),
            ]
        );
    }
}
