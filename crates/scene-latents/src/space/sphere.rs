//! Unit sphere S^{n-1} ⊂ R^n.
//!
//! Used to draw several coupled factors at once (e.g. a 3D position on a
//! shell around the scene centre). Only uniform, normal and delta draws are
//! defined. Normal draws, and uniform draws in conditional mode, perturb the
//! anchor in R^n and project back.

use super::cfg::{MAX_REJECTION_ATTEMPTS, NORM_EPS};
use super::{check_mean, mean_at};
use crate::dist::{Distribution, Mode};
use crate::error::{Result, SampleError};
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;

#[derive(Clone, Debug, PartialEq)]
pub struct NSphereSpace {
    n: usize,
}

impl NSphereSpace {
    pub fn new(n: usize) -> Result<Self> {
        if n < 2 {
            return Err(SampleError::invalid("sphere needs an ambient dimension >= 2"));
        }
        Ok(Self { n })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Uniform on the sphere (normalized isotropic Gaussian).
    pub fn uniform<R: Rng>(&self, size: usize, rng: &mut R) -> DMatrix<f64> {
        let origin = DVector::zeros(self.n);
        let mut out = DMatrix::zeros(size, self.n);
        for r in 0..size {
            let v = self.direction(rng, &origin, 1.0);
            out.set_row(r, &v.transpose());
        }
        out
    }

    /// `mean + std·N(0, I)` projected onto the sphere.
    pub fn normal<R: Rng>(
        &self,
        mean: &DMatrix<f64>,
        std: f64,
        size: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        check_mean(mean, self.n, size)?;
        let mut out = DMatrix::zeros(size, self.n);
        for r in 0..size {
            let anchor = DVector::from_fn(self.n, |c, _| mean_at(mean, r, c));
            let v = self.direction(rng, &anchor, std);
            out.set_row(r, &v.transpose());
        }
        Ok(out)
    }

    /// `mean + U[a, b]^n` projected onto the sphere.
    pub fn uniform_around<R: Rng>(
        &self,
        mean: &DMatrix<f64>,
        a: f64,
        b: f64,
        size: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        check_mean(mean, self.n, size)?;
        let mut out = DMatrix::zeros(size, self.n);
        for r in 0..size {
            let anchor = DVector::from_fn(self.n, |c, _| mean_at(mean, r, c));
            let v = self.project(rng, |rng| {
                DVector::from_fn(self.n, |c, _| anchor[c] + a + (b - a) * rng.gen::<f64>())
            });
            out.set_row(r, &v.transpose());
        }
        Ok(out)
    }

    /// The pole `e_n` on every row.
    pub fn delta(&self, size: usize) -> DMatrix<f64> {
        let mut out = DMatrix::zeros(size, self.n);
        out.column_mut(self.n - 1).fill(1.0);
        out
    }

    pub(crate) fn sample<R: Rng>(
        &self,
        dist: &Distribution,
        mean: &DMatrix<f64>,
        mode: Mode,
        size: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        match (dist, mode) {
            (Distribution::Uniform { .. }, Mode::Marginal) => Ok(self.uniform(size, rng)),
            (Distribution::Uniform { a, b }, Mode::Conditional) => {
                self.uniform_around(mean, *a, *b, size, rng)
            }
            (Distribution::Normal { std }, _) => self.normal(mean, *std, size, rng),
            (Distribution::Delta, _) => Ok(self.delta(size)),
            (other, _) => Err(SampleError::UnsupportedDistribution {
                domain: "sphere",
                family: other.family(),
            }),
        }
    }

    /// Draw `anchor + std·g` and normalize, redrawing degenerate vectors.
    ///
    /// A zero anchor with `std == 0` can never leave the origin, so the
    /// fallback is an anchor-free Gaussian direction.
    fn direction<R: Rng>(&self, rng: &mut R, anchor: &DVector<f64>, std: f64) -> DVector<f64> {
        let std = if anchor.norm() <= NORM_EPS && std == 0.0 {
            1.0
        } else {
            std
        };
        self.project(rng, |rng| {
            DVector::from_fn(self.n, |c, _| {
                let z: f64 = rng.sample(StandardNormal);
                anchor[c] + std * z
            })
        })
    }

    /// Normalize `draw()`, redrawing near-zero vectors. After
    /// `MAX_REJECTION_ATTEMPTS` degenerate draws, falls back to a Gaussian
    /// direction.
    fn project<R: Rng>(
        &self,
        rng: &mut R,
        mut draw: impl FnMut(&mut R) -> DVector<f64>,
    ) -> DVector<f64> {
        for _ in 0..MAX_REJECTION_ATTEMPTS {
            let v = draw(rng);
            let norm = v.norm();
            if norm > NORM_EPS {
                return v / norm;
            }
        }
        loop {
            let v = DVector::from_fn(self.n, |_, _| rng.sample::<f64, _>(StandardNormal));
            let norm = v.norm();
            if norm > NORM_EPS {
                return v / norm;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::Family;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn uniform_rows_have_unit_norm() {
        let mut rng = StdRng::seed_from_u64(8);
        let s = NSphereSpace::new(3).unwrap();
        let x = s.uniform(500, &mut rng);
        for row in x.row_iter() {
            assert!((row.norm() - 1.0).abs() < 1e-12);
        }
        // Mean of a uniform sphere sample is near the origin.
        let centroid = x.row_mean();
        assert!(centroid.norm() < 0.15);
    }

    #[test]
    fn normal_stays_close_to_anchor() {
        let mut rng = StdRng::seed_from_u64(8);
        let s = NSphereSpace::new(3).unwrap();
        let anchor = DMatrix::from_row_slice(1, 3, &[1.0, 0.0, 0.0]);
        let x = s.normal(&anchor, 0.01, 200, &mut rng).unwrap();
        for row in x.row_iter() {
            assert!((row.norm() - 1.0).abs() < 1e-12);
            assert!(row[0] > 0.99);
        }
    }

    #[test]
    fn zero_anchor_without_noise_still_yields_directions() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = NSphereSpace::new(2).unwrap();
        let x = s.normal(&DMatrix::zeros(1, 2), 0.0, 10, &mut rng).unwrap();
        assert!(x.row_iter().all(|row| (row.norm() - 1.0).abs() < 1e-12));
    }

    #[test]
    fn conditional_uniform_stays_near_anchor() {
        let mut rng = StdRng::seed_from_u64(21);
        let s = NSphereSpace::new(3).unwrap();
        let v1 = s.uniform(500, &mut rng);
        let dist = Distribution::Uniform { a: -0.1, b: 0.1 };
        let v2 = s
            .sample(&dist, &v1, Mode::Conditional, 500, &mut rng)
            .unwrap();
        for (a, b) in v1.row_iter().zip(v2.row_iter()) {
            assert!((b.norm() - 1.0).abs() < 1e-12);
            // Per-axis shift <= 0.1 moves a unit vector by at most 2·√3·0.1.
            assert!((a - b).norm() < 0.35);
        }
        // Marginal uniform ignores the anchor.
        let free = s
            .sample(&dist, &v1, Mode::Marginal, 500, &mut rng)
            .unwrap();
        let mean_gap: f64 =
            v1.row_iter().zip(free.row_iter()).map(|(a, b)| (a - b).norm()).sum::<f64>() / 500.0;
        assert!(mean_gap > 1.0);
    }

    #[test]
    fn delta_is_the_pole() {
        let s = NSphereSpace::new(3).unwrap();
        let x = s.delta(4);
        for row in x.row_iter() {
            assert_eq!(row.iter().copied().collect::<Vec<_>>(), vec![0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn categorical_and_truncated_are_unsupported() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = NSphereSpace::new(3).unwrap();
        let mean = DMatrix::zeros(1, 3);
        let err = s
            .sample(&Distribution::uniform_categorical(2), &mean, Mode::Marginal, 4, &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            SampleError::UnsupportedDistribution {
                domain: "sphere",
                family: Family::Categorical
            }
        );
        assert!(s
            .sample(&Distribution::TruncatedNormal { std: 1.0 }, &mean, Mode::Conditional, 4, &mut rng)
            .is_err());
    }

    #[test]
    fn new_rejects_circle_of_dim_one() {
        assert!(NSphereSpace::new(1).is_err());
    }
}
