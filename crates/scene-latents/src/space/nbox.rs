//! Bounded box `[min, max]^n`.
//!
//! Model
//! - Continuous draws are per entry; bounded families (`uniform_around`,
//!   `truncated_normal`) redraw out-of-box entries and clip after
//!   `MAX_REJECTION_ATTEMPTS`, so results never leave the box.
//! - Categorical draws live on the integer lattice `min, min + 1, …` inside
//!   the box. Marginal draws return `min + k`; conditional draws shift the
//!   reference by `k - (classes - 1) / 2` and wrap around the lattice.

use super::cfg::{MAX_LATTICE_POINTS, MAX_REJECTION_ATTEMPTS};
use super::{check_mean, mean_at};
use crate::dist::{Distribution, Mode};
use crate::error::{Result, SampleError};
use nalgebra::DMatrix;
use rand::distributions::{Distribution as _, WeightedIndex};
use rand::Rng;
use rand_distr::StandardNormal;

#[derive(Clone, Debug, PartialEq)]
pub struct NBoxSpace {
    n: usize,
    min: f64,
    max: f64,
}

impl NBoxSpace {
    pub fn new(n: usize, min: f64, max: f64) -> Result<Self> {
        if n == 0 {
            return Err(SampleError::invalid("box needs at least one dimension"));
        }
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(SampleError::invalid(format!(
                "box bounds must be finite with min <= max (got [{min}, {max}])"
            )));
        }
        Ok(Self { n, min, max })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.n
    }
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }
    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }

    /// Number of integer lattice points `min + j` inside the box.
    pub fn lattice_len(&self) -> Result<usize> {
        let span = (self.max - self.min).floor();
        if span >= MAX_LATTICE_POINTS as f64 {
            return Err(SampleError::invalid(format!(
                "[{}, {}] spans more than {MAX_LATTICE_POINTS} lattice points",
                self.min, self.max
            )));
        }
        Ok(span as usize + 1)
    }

    /// I.i.d. uniform over the whole box.
    pub fn uniform<R: Rng>(&self, size: usize, rng: &mut R) -> DMatrix<f64> {
        let span = self.max - self.min;
        let mut out = DMatrix::zeros(size, self.n);
        for r in 0..size {
            for c in 0..self.n {
                out[(r, c)] = self.min + span * rng.gen::<f64>();
            }
        }
        out
    }

    /// `mean + U[a, b]`, redrawn until inside the box.
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
            for c in 0..self.n {
                let m = mean_at(mean, r, c);
                out[(r, c)] = self.draw_bounded(rng, |rng| m + a + (b - a) * rng.gen::<f64>());
            }
        }
        Ok(out)
    }

    /// `mean + std·N(0, 1)`; clamping is left to the caller.
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
            for c in 0..self.n {
                let z: f64 = rng.sample(StandardNormal);
                out[(r, c)] = mean_at(mean, r, c) + std * z;
            }
        }
        Ok(out)
    }

    /// Normal draw restricted to the box by rejection.
    pub fn truncated_normal<R: Rng>(
        &self,
        mean: &DMatrix<f64>,
        std: f64,
        size: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        check_mean(mean, self.n, size)?;
        let mut out = DMatrix::zeros(size, self.n);
        for r in 0..size {
            for c in 0..self.n {
                let m = mean_at(mean, r, c);
                out[(r, c)] = self.draw_bounded(rng, |rng| {
                    let z: f64 = rng.sample(StandardNormal);
                    m + std * z
                });
            }
        }
        Ok(out)
    }

    /// Categorical draw on the box lattice.
    ///
    /// `reference = None` draws a class outright; `Some(mean)` draws a
    /// neighbour of the reference class (cyclic on the lattice).
    pub fn categorical<R: Rng>(
        &self,
        reference: Option<&DMatrix<f64>>,
        classes: usize,
        weights: Option<&[f64]>,
        uniform: bool,
        size: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        if classes == 0 {
            return Err(SampleError::invalid("categorical needs at least one class"));
        }
        let lattice = self.lattice_len()?;
        let weighted = if uniform {
            None
        } else {
            let w = weights
                .ok_or_else(|| SampleError::invalid("non-uniform categorical needs weights"))?;
            if w.len() != classes {
                return Err(SampleError::shape("categorical weights", classes, w.len()));
            }
            Some(WeightedIndex::new(w).map_err(|e| SampleError::invalid(e.to_string()))?)
        };
        let pick = |rng: &mut R| match &weighted {
            Some(dist) => dist.sample(rng),
            None => rng.gen_range(0..classes),
        };

        let mut out = DMatrix::zeros(size, self.n);
        match reference {
            None => {
                if classes > lattice {
                    return Err(SampleError::invalid(format!(
                        "{classes} classes do not fit the {lattice}-point lattice of [{}, {}]",
                        self.min, self.max
                    )));
                }
                for r in 0..size {
                    for c in 0..self.n {
                        out[(r, c)] = self.min + pick(rng) as f64;
                    }
                }
            }
            Some(mean) => {
                check_mean(mean, self.n, size)?;
                let centre = ((classes - 1) / 2) as i64;
                let lattice = lattice as i64;
                for r in 0..size {
                    for c in 0..self.n {
                        let base = (mean_at(mean, r, c) - self.min).round() as i64;
                        let shifted = (base + pick(rng) as i64 - centre).rem_euclid(lattice);
                        out[(r, c)] = self.min + shifted as f64;
                    }
                }
            }
        }
        Ok(out)
    }

    /// Constant `0.0` (clamped into the box).
    pub fn delta(&self, size: usize) -> DMatrix<f64> {
        DMatrix::from_element(size, self.n, 0.0_f64.clamp(self.min, self.max))
    }

    pub(crate) fn sample<R: Rng>(
        &self,
        dist: &Distribution,
        mean: &DMatrix<f64>,
        mode: Mode,
        size: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>> {
        match dist {
            Distribution::Uniform { a, b } => self.uniform_around(mean, *a, *b, size, rng),
            Distribution::Normal { std } => self.normal(mean, *std, size, rng),
            Distribution::TruncatedNormal { std } => self.truncated_normal(mean, *std, size, rng),
            Distribution::Categorical {
                classes,
                weights,
                uniform,
            } => {
                check_mean(mean, self.n, size)?;
                let reference = match mode {
                    Mode::Marginal => None,
                    Mode::Conditional => Some(mean),
                };
                self.categorical(reference, *classes, weights.as_deref(), *uniform, size, rng)
            }
            Distribution::Delta => Ok(self.delta(size)),
        }
    }

    fn draw_bounded<R: Rng>(&self, rng: &mut R, mut draw: impl FnMut(&mut R) -> f64) -> f64 {
        let mut v = draw(rng);
        for _ in 1..MAX_REJECTION_ATTEMPTS {
            if self.contains(v) {
                return v;
            }
            v = draw(rng);
        }
        v.clamp(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn unit_box() -> NBoxSpace {
        NBoxSpace::new(1, -1.0, 1.0).unwrap()
    }

    #[test]
    fn new_rejects_inverted_bounds() {
        assert!(NBoxSpace::new(1, 1.0, -1.0).is_err());
        assert!(NBoxSpace::new(0, -1.0, 1.0).is_err());
        assert!(NBoxSpace::new(2, 0.0, 0.0).is_ok());
    }

    #[test]
    fn uniform_stays_in_box() {
        let mut rng = StdRng::seed_from_u64(3);
        let b = NBoxSpace::new(3, -2.0, 5.0).unwrap();
        let x = b.uniform(2000, &mut rng);
        assert_eq!(x.shape(), (2000, 3));
        assert!(x.iter().all(|v| b.contains(*v)));
    }

    #[test]
    fn uniform_around_is_a_local_window() {
        let mut rng = StdRng::seed_from_u64(5);
        let b = unit_box();
        let mean = DMatrix::from_element(1, 1, 0.5);
        let x = b.uniform_around(&mean, -0.1, 0.1, 1000, &mut rng).unwrap();
        assert!(x.iter().all(|v| (*v - 0.5).abs() <= 0.1 + 1e-12));
    }

    #[test]
    fn uniform_around_near_edge_stays_inside() {
        let mut rng = StdRng::seed_from_u64(6);
        let b = unit_box();
        let mean = DMatrix::from_element(1, 1, 0.99);
        let x = b.uniform_around(&mean, -0.1, 0.1, 1000, &mut rng).unwrap();
        assert!(x.iter().all(|v| *v >= 0.89 - 1e-12 && *v <= 1.0));
    }

    #[test]
    fn normal_with_zero_std_returns_mean_rows() {
        let mut rng = StdRng::seed_from_u64(1);
        let b = NBoxSpace::new(2, -1.0, 1.0).unwrap();
        let mean = DMatrix::from_row_slice(3, 2, &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let x = b.normal(&mean, 0.0, 3, &mut rng).unwrap();
        assert_eq!(x, mean);
    }

    #[test]
    fn mean_shape_is_checked() {
        let mut rng = StdRng::seed_from_u64(1);
        let b = unit_box();
        let bad_cols = DMatrix::zeros(1, 2);
        assert_eq!(
            b.normal(&bad_cols, 1.0, 4, &mut rng),
            Err(SampleError::shape("mean columns", 1, 2))
        );
        let bad_rows = DMatrix::zeros(3, 1);
        assert_eq!(
            b.truncated_normal(&bad_rows, 1.0, 4, &mut rng),
            Err(SampleError::shape("mean rows", 4, 3))
        );
    }

    #[test]
    fn truncated_normal_far_outside_clips_into_box() {
        let mut rng = StdRng::seed_from_u64(9);
        let b = unit_box();
        let mean = DMatrix::from_element(1, 1, 50.0);
        let x = b.truncated_normal(&mean, 0.01, 10, &mut rng).unwrap();
        assert!(x.iter().all(|v| *v == 1.0));
    }

    #[test]
    fn uniform_categorical_frequencies() {
        let mut rng = StdRng::seed_from_u64(2024);
        let b = NBoxSpace::new(1, 0.0, 4.0).unwrap();
        let n = 100_000;
        let x = b.categorical(None, 5, None, true, n, &mut rng).unwrap();
        let mut counts = [0usize; 5];
        for v in x.iter() {
            assert_eq!(v.fract(), 0.0);
            counts[*v as usize] += 1;
        }
        for c in counts {
            let freq = c as f64 / n as f64;
            assert!((freq - 0.2).abs() < 0.01, "freq {freq}");
        }
    }

    #[test]
    fn weighted_categorical_skips_zero_weight() {
        let mut rng = StdRng::seed_from_u64(4);
        let b = NBoxSpace::new(1, 0.0, 2.0).unwrap();
        let w = [1.0, 0.0, 3.0];
        let x = b.categorical(None, 3, Some(&w), false, 5000, &mut rng).unwrap();
        assert!(x.iter().all(|v| *v == 0.0 || *v == 2.0));
        let twos = x.iter().filter(|v| **v == 2.0).count() as f64 / 5000.0;
        assert!((twos - 0.75).abs() < 0.03);
    }

    #[test]
    fn categorical_rejects_too_many_classes() {
        let mut rng = StdRng::seed_from_u64(4);
        let b = NBoxSpace::new(1, 0.0, 1.0).unwrap();
        assert!(matches!(
            b.categorical(None, 3, None, true, 1, &mut rng),
            Err(SampleError::InvalidParams { .. })
        ));
    }

    #[test]
    fn conditional_categorical_wraps_on_lattice() {
        let mut rng = StdRng::seed_from_u64(11);
        let b = NBoxSpace::new(1, 0.0, 3.0).unwrap();
        let reference = DMatrix::from_element(1, 1, 0.0);
        let x = b
            .categorical(Some(&reference), 3, None, true, 2000, &mut rng)
            .unwrap();
        // Neighbours of class 0 on the 4-point cycle are {3, 0, 1}.
        assert!(x.iter().all(|v| *v == 3.0 || *v == 0.0 || *v == 1.0));
        assert!(x.iter().any(|v| *v == 3.0));
    }

    #[test]
    fn huge_span_has_no_lattice() {
        let mut rng = StdRng::seed_from_u64(12);
        let b = NBoxSpace::new(1, -1e300, 1e300).unwrap();
        assert!(matches!(b.lattice_len(), Err(SampleError::InvalidParams { .. })));
        let reference = DMatrix::from_element(1, 1, 0.0);
        assert!(matches!(
            b.categorical(Some(&reference), 3, None, true, 4, &mut rng),
            Err(SampleError::InvalidParams { .. })
        ));
        assert_eq!(NBoxSpace::new(1, 0.0, 4.5).unwrap().lattice_len(), Ok(5));
    }

    #[test]
    fn single_point_lattice_is_constant() {
        let mut rng = StdRng::seed_from_u64(12);
        let b = NBoxSpace::new(1, 0.0, 0.0).unwrap();
        let reference = DMatrix::from_element(1, 1, 0.0);
        let x = b
            .categorical(Some(&reference), 3, None, true, 50, &mut rng)
            .unwrap();
        assert!(x.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn delta_is_constant_for_any_mode() {
        let mut rng = StdRng::seed_from_u64(0);
        let b = unit_box();
        let mean = DMatrix::from_element(1, 1, 0.7);
        for mode in [Mode::Marginal, Mode::Conditional] {
            for size in [1, 7, 300] {
                let x = b
                    .sample(&Distribution::Delta, &mean, mode, size, &mut rng)
                    .unwrap();
                assert_eq!(x.nrows(), size);
                assert!(x.iter().all(|v| *v == 0.0));
            }
        }
        let shifted = NBoxSpace::new(1, 0.5, 2.0).unwrap();
        assert!(shifted.delta(3).iter().all(|v| *v == 0.5));
    }

    proptest! {
        #[test]
        fn truncated_normal_never_leaves_box(
            lo in -5.0f64..0.0,
            width in 0.01f64..5.0,
            mean in -20.0f64..20.0,
            std in 0.0f64..10.0,
            seed in any::<u64>(),
        ) {
            let b = NBoxSpace::new(2, lo, lo + width).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let m = DMatrix::from_element(1, 2, mean);
            let x = b.truncated_normal(&m, std, 256, &mut rng).unwrap();
            prop_assert!(x.iter().all(|v| b.contains(*v)));
        }
    }
}
