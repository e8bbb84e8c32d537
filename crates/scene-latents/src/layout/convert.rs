//! Raw latents → renderer units, plus the post-hoc freeze used for ablations.

use super::cfg::PositionDomain;
use super::columns::Layout;
use super::factor::{Factor, FactorFamily};
use nalgebra::DMatrix;
use std::f64::consts::PI;

/// Rotation and hue columns map `[-1, 1]` onto radians.
pub const ANGLE_SCALE: f64 = PI;
pub const BOX_POSITION_SCALE: f64 = 2.0;
pub const SPHERE_POSITION_SCALE: f64 = 3.0;

/// Renderer-ready copy of `raw` (canonical layout).
///
/// Angles: ×π. Positions: ×2 for box positions; for sphere positions ×3 with
/// z reflected onto the upper hemisphere. Object identities pass through.
pub fn to_renderer_units(
    raw: &DMatrix<f64>,
    layout: &Layout,
    positions: PositionDomain,
) -> DMatrix<f64> {
    let mut out = raw.clone();
    for (i, column) in layout.columns().iter().enumerate() {
        let mut col = out.column_mut(i);
        match column.factor.family() {
            FactorFamily::Rotation | FactorFamily::Hue => col *= ANGLE_SCALE,
            FactorFamily::Position => match positions {
                PositionDomain::Box => col *= BOX_POSITION_SCALE,
                PositionDomain::Sphere => {
                    if column.factor == Factor::PositionZ {
                        col.apply(|v| *v = v.abs());
                    }
                    col *= SPHERE_POSITION_SCALE;
                }
            },
            FactorFamily::Object => {}
        }
    }
    out
}

/// Overwrite every column of `families` with its fixed value.
pub fn freeze(m: &mut DMatrix<f64>, layout: &Layout, families: &[FactorFamily]) {
    for &family in families {
        for i in layout.indices_of(family) {
            let value = layout.columns()[i].factor.fixed_value();
            m.column_mut(i).fill(value);
        }
    }
}
