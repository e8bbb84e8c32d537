//! Canonical renderer column layout and the column permutations into it.
//!
//! Canonical order (every column always present):
//! 1. scene: `spot_hue`, `back_hue`, `rotation_spot`
//! 2. object hues, per object
//! 3. object rotations, per object `alpha, beta`
//! 4. positions, per object `x, y, z`
//! 5. object identities, per object

use super::factor::{Column, Factor, FactorFamily};
use crate::error::{Result, SampleError};
use nalgebra::DMatrix;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    columns: Vec<Column>,
}

impl Layout {
    pub fn canonical(n_objects: usize) -> Self {
        let mut columns = vec![
            Column::new(Factor::SpotHue, 0),
            Column::new(Factor::BackHue, 0),
            Column::new(Factor::RotationSpot, 0),
        ];
        let groups: [&[Factor]; 4] = [
            &[Factor::ObjectHue],
            &[Factor::RotationAlpha, Factor::RotationBeta],
            &[Factor::PositionX, Factor::PositionY, Factor::PositionZ],
            &[Factor::Object],
        ];
        for group in groups {
            for object in 0..n_objects {
                columns.extend(group.iter().map(|&f| Column::new(f, object)));
            }
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
    pub fn len(&self) -> usize {
        self.columns.len()
    }
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.to_string()).collect()
    }

    /// Canonical indices of the columns belonging to `family`.
    pub fn indices_of(&self, family: FactorFamily) -> impl Iterator<Item = usize> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.factor.family() == family)
            .map(|(i, _)| i)
    }

    /// `perm[i]` = position in `source` of canonical column `i`.
    ///
    /// Fails unless `source` is a permutation of the canonical columns.
    pub fn permutation(&self, source: &[Column]) -> Result<Vec<usize>> {
        if source.len() != self.len() {
            return Err(SampleError::shape("layout columns", self.len(), source.len()));
        }
        let mut perm = vec![usize::MAX; self.len()];
        for (src, column) in source.iter().enumerate() {
            let dst = self
                .columns
                .iter()
                .position(|c| c == column)
                .ok_or_else(|| {
                    SampleError::invalid(format!("column {column} is not part of the layout"))
                })?;
            if perm[dst] != usize::MAX {
                return Err(SampleError::invalid(format!("column {column} appears twice")));
            }
            perm[dst] = src;
        }
        Ok(perm)
    }

    /// Reorder `m` (columns labelled by `source`) into canonical order.
    pub fn reorder(&self, m: &DMatrix<f64>, source: &[Column]) -> Result<DMatrix<f64>> {
        if m.ncols() != source.len() {
            return Err(SampleError::shape("matrix columns", source.len(), m.ncols()));
        }
        let perm = self.permutation(source)?;
        Ok(DMatrix::from_fn(m.nrows(), self.len(), |r, c| m[(r, perm[c])]))
    }

    /// Inverse of [`Layout::reorder`]: back to the `source` column order.
    pub fn restore(&self, m: &DMatrix<f64>, source: &[Column]) -> Result<DMatrix<f64>> {
        if m.ncols() != self.len() {
            return Err(SampleError::shape("matrix columns", self.len(), m.ncols()));
        }
        let perm = self.permutation(source)?;
        let mut out = DMatrix::zeros(m.nrows(), self.len());
        for (canonical, &src) in perm.iter().enumerate() {
            out.set_column(src, &m.column(canonical));
        }
        Ok(out)
    }
}

/// Constant columns for every inactive family, in family order.
pub fn fixed_columns(inactive: &[FactorFamily], n_objects: usize) -> Vec<Column> {
    FactorFamily::ALL
        .iter()
        .filter(|f| inactive.contains(*f))
        .flat_map(|f| f.factors().iter())
        .flat_map(|&factor| Column::instances(factor, n_objects))
        .collect()
}

/// Append the fixed value of each column in `fixed` to `view`.
pub fn inject_fixed(view: &DMatrix<f64>, fixed: &[Column]) -> DMatrix<f64> {
    let sampled = view.ncols();
    let mut out = view.clone().resize_horizontally(sampled + fixed.len(), 0.0);
    for (i, column) in fixed.iter().enumerate() {
        out.column_mut(sampled + i).fill(column.factor.fixed_value());
    }
    out
}
