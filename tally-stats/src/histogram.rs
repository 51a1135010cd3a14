//! Equi-width histogram for selectivity estimation on integer columns.

use std::fmt;
use std::ops::Bound;

use tally_result::{Error, Result};
use tally_types::CompareOp;

/// Bucket count for callers with no better information.
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 100;

/// Fixed-width histogram over the inclusive integer range `[min, max]`.
///
/// The histogram is filled once with [`add_value`](Self::add_value) during a
/// statistics pass and then queried any number of times. Queries take `&self`
/// and never mutate, so a filled histogram can be shared between readers.
///
/// Estimates interpolate linearly inside a bucket, assuming observations
/// are spread uniformly across its width.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectivityHistogram {
    min: i64,
    max: i64,
    /// `(max - min + 1) / buckets.len()`, may be below 1 when there are more
    /// buckets than distinct values.
    width: f64,
    buckets: Vec<u64>,
    observations: u64,
}

impl SelectivityHistogram {
    /// Create an empty histogram with `bucket_count` buckets over `[min, max]`.
    pub fn new(bucket_count: usize, min: i64, max: i64) -> Result<Self> {
        if bucket_count == 0 {
            return Err(Error::invalid_configuration(
                "histogram needs at least one bucket",
            ));
        }
        if min > max {
            return Err(Error::invalid_configuration(format!(
                "histogram lower bound {min} exceeds upper bound {max}"
            )));
        }
        let span = (i128::from(max) - i128::from(min) + 1) as f64;
        let width = span / bucket_count as f64;
        tracing::debug!(bucket_count, min, max, width, "histogram created");
        Ok(Self {
            min,
            max,
            width,
            buckets: vec![0; bucket_count],
            observations: 0,
        })
    }

    #[inline]
    pub fn min(&self) -> i64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> i64 {
        self.max
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn bucket_width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn bucket_counts(&self) -> &[u64] {
        &self.buckets
    }

    #[inline]
    pub fn observation_count(&self) -> u64 {
        self.observations
    }

    /// Record one observation. Values outside `[min, max]` are rejected, not
    /// clamped.
    pub fn add_value(&mut self, v: i64) -> Result<()> {
        if v < self.min || v > self.max {
            return Err(Error::OutOfRange {
                value: v,
                min: self.min,
                max: self.max,
            });
        }
        let index = self.bucket_index(v);
        self.buckets[index] += 1;
        self.observations += 1;
        Ok(())
    }

    /// Record every value, stopping at the first one out of range. Values
    /// before it stay recorded.
    pub fn add_values(&mut self, values: impl IntoIterator<Item = i64>) -> Result<()> {
        for v in values {
            self.add_value(v)?;
        }
        Ok(())
    }

    /// Estimated fraction of observations satisfying `value <op> v`, in `[0, 1]`.
    ///
    /// `v` may lie outside `[min, max]`; the estimate then saturates.
    pub fn estimate_selectivity(&self, op: CompareOp, v: i64) -> f64 {
        match op {
            CompareOp::Lt => self.less_than(v),
            CompareOp::LtEq => self.less_than_or_equal(v),
            CompareOp::Gt => 1.0 - self.less_than_or_equal(v),
            CompareOp::GtEq => 1.0 - self.less_than(v),
            CompareOp::Eq => self.equals(v),
            CompareOp::NotEq => 1.0 - self.equals(v),
        }
    }

    /// Estimated fraction of observations inside a range such as
    /// `lower <= value < upper`.
    pub fn estimate_range_selectivity(&self, lower: Bound<i64>, upper: Bound<i64>) -> f64 {
        let below_upper = match upper {
            Bound::Included(u) => self.less_than_or_equal(u),
            Bound::Excluded(u) => self.less_than(u),
            Bound::Unbounded => 1.0,
        };
        let below_lower = match lower {
            Bound::Included(l) => self.less_than(l),
            Bound::Excluded(l) => self.less_than_or_equal(l),
            Bound::Unbounded => 0.0,
        };
        (below_upper - below_lower).clamp(0.0, 1.0)
    }

    /// Expected selectivity of an equality predicate whose constant is drawn
    /// from the observed distribution.
    ///
    /// An observation in bucket `i` matches about `c_i / n / w` of all rows,
    /// where `w` is the number of integers per bucket (at least one). Weighting
    /// by the chance `c_i / n` of drawing from bucket `i` gives
    /// `Σ (c_i / n)² / w`. Uniform data yields `1 / (max - min + 1)`; skewed
    /// data yields larger values. `0.0` when nothing has been observed.
    pub fn avg_selectivity(&self) -> f64 {
        if self.observations == 0 {
            return 0.0;
        }
        let n = self.observations as f64;
        let sum_of_squares: f64 = self
            .buckets
            .iter()
            .map(|&c| {
                let share = c as f64 / n;
                share * share
            })
            .sum();
        sum_of_squares / self.width.max(1.0)
    }

    fn less_than(&self, v: i64) -> f64 {
        if v <= self.min {
            return 0.0;
        }
        if v >= self.max {
            return 1.0;
        }
        if self.observations == 0 {
            return 0.0;
        }
        let index = self.bucket_index(v);
        let before: u64 = self.buckets[..index].iter().sum();
        let offset = (v as f64 - self.bucket_start(index)) / self.width;
        let partial = self.buckets[index] as f64 * offset;
        ((before as f64 + partial) / self.observations as f64).clamp(0.0, 1.0)
    }

    fn less_than_or_equal(&self, v: i64) -> f64 {
        self.less_than(v.saturating_add(1))
    }

    fn equals(&self, v: i64) -> f64 {
        (self.less_than_or_equal(v) - self.less_than(v)).clamp(0.0, 1.0)
    }

    /// Bucket holding `v`; `v` must be within `[min, max]`.
    #[inline]
    fn bucket_index(&self, v: i64) -> usize {
        let offset = (i128::from(v) - i128::from(self.min)) as f64;
        ((offset / self.width).floor() as usize).min(self.buckets.len() - 1)
    }

    #[inline]
    fn bucket_start(&self, index: usize) -> f64 {
        self.min as f64 + index as f64 * self.width
    }
}

impl fmt::Display for SelectivityHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SelectivityHistogram(buckets={}, min={}, max={}, observations={})",
            self.buckets.len(),
            self.min,
            self.max,
            self.observations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn uniform_0_99() -> SelectivityHistogram {
        let mut h = SelectivityHistogram::new(10, 0, 99).unwrap();
        h.add_values(0..=99).unwrap();
        h
    }

    #[test]
    fn construction_rejects_degenerate_shapes() {
        assert!(matches!(
            SelectivityHistogram::new(0, 0, 10),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            SelectivityHistogram::new(4, 10, 0),
            Err(Error::InvalidConfiguration(_))
        ));
        let single = SelectivityHistogram::new(1, 5, 5).unwrap();
        assert_eq!(single.bucket_width(), 1.0);
    }

    #[test]
    fn values_land_in_their_bucket() {
        let mut h = SelectivityHistogram::new(4, 0, 7).unwrap();
        h.add_values([0, 1, 2, 7, 7]).unwrap();
        assert_eq!(h.bucket_counts(), &[2, 1, 0, 2]);
        assert_eq!(h.observation_count(), 5);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut h = SelectivityHistogram::new(4, 0, 7).unwrap();
        assert!(matches!(
            h.add_value(8),
            Err(Error::OutOfRange {
                value: 8,
                min: 0,
                max: 7
            })
        ));
        assert!(h.add_value(-1).is_err());
        assert_eq!(h.observation_count(), 0);
    }

    #[test]
    fn uniform_scenario() {
        let h = uniform_0_99();
        assert!((h.estimate_selectivity(CompareOp::Lt, 50) - 0.50).abs() < EPS);
        assert!((h.estimate_selectivity(CompareOp::Eq, 50) - 0.01).abs() < EPS);
        assert!((h.estimate_selectivity(CompareOp::Gt, 50) - 0.49).abs() < EPS);
        assert!((h.estimate_selectivity(CompareOp::GtEq, 50) - 0.50).abs() < EPS);
        assert!((h.estimate_selectivity(CompareOp::LtEq, 50) - 0.51).abs() < EPS);
    }

    #[test]
    fn boundary_laws() {
        let h = uniform_0_99();
        assert_eq!(h.estimate_selectivity(CompareOp::Lt, 0), 0.0);
        assert_eq!(h.estimate_selectivity(CompareOp::Lt, 99), 1.0);
        assert_eq!(h.estimate_selectivity(CompareOp::GtEq, 0), 1.0);
        assert_eq!(h.estimate_selectivity(CompareOp::Lt, i64::MIN), 0.0);
        assert_eq!(h.estimate_selectivity(CompareOp::LtEq, i64::MAX), 1.0);
        assert_eq!(h.estimate_selectivity(CompareOp::Eq, 1_000), 0.0);
        assert_eq!(h.estimate_selectivity(CompareOp::NotEq, -5), 1.0);
    }

    #[test]
    fn boundary_laws_at_the_ends_of_the_domain() {
        let mut low = SelectivityHistogram::new(1, i64::MIN, i64::MIN + 1).unwrap();
        low.add_values([i64::MIN, i64::MIN + 1]).unwrap();
        assert_eq!(low.estimate_selectivity(CompareOp::GtEq, i64::MIN), 1.0);
        assert_eq!(low.estimate_selectivity(CompareOp::Lt, i64::MIN), 0.0);

        let mut high = SelectivityHistogram::new(1, i64::MAX - 1, i64::MAX).unwrap();
        high.add_values([i64::MAX - 1, i64::MAX]).unwrap();
        assert_eq!(high.estimate_selectivity(CompareOp::Lt, i64::MAX), 1.0);
        assert_eq!(high.estimate_selectivity(CompareOp::Gt, i64::MAX), 0.0);
        assert_eq!(high.estimate_selectivity(CompareOp::GtEq, i64::MAX - 1), 1.0);
    }

    #[test]
    fn interpolates_inside_a_bucket() {
        let mut h = SelectivityHistogram::new(1, 0, 9).unwrap();
        h.add_values(0..10).unwrap();
        assert!((h.estimate_selectivity(CompareOp::Lt, 3) - 0.3).abs() < EPS);
    }

    #[test]
    fn empty_histogram_estimates_zero_inside_the_range() {
        let h = SelectivityHistogram::new(10, 0, 99).unwrap();
        assert_eq!(h.estimate_selectivity(CompareOp::Lt, 50), 0.0);
        assert_eq!(h.estimate_selectivity(CompareOp::Eq, 50), 0.0);
        assert_eq!(h.estimate_selectivity(CompareOp::Lt, 99), 1.0);
        assert_eq!(h.avg_selectivity(), 0.0);
    }

    #[test]
    fn range_selectivity_composes_bounds() {
        let h = uniform_0_99();
        let half_open = h.estimate_range_selectivity(Bound::Included(20), Bound::Excluded(40));
        assert!((half_open - 0.20).abs() < EPS);
        let closed = h.estimate_range_selectivity(Bound::Included(20), Bound::Included(40));
        assert!((closed - 0.21).abs() < EPS);
        let open = h.estimate_range_selectivity(Bound::Excluded(20), Bound::Excluded(40));
        assert!((open - 0.19).abs() < EPS);
        assert_eq!(
            h.estimate_range_selectivity(Bound::Unbounded, Bound::Unbounded),
            1.0
        );
        assert_eq!(
            h.estimate_range_selectivity(Bound::Included(60), Bound::Included(10)),
            0.0
        );
    }

    #[test]
    fn avg_selectivity_tracks_skew() {
        let uniform = uniform_0_99();
        assert!((uniform.avg_selectivity() - 0.01).abs() < EPS);

        let mut skewed = SelectivityHistogram::new(10, 0, 99).unwrap();
        skewed.add_values(std::iter::repeat_n(5, 90)).unwrap();
        skewed.add_values(90..100).unwrap();
        assert!(skewed.avg_selectivity() > uniform.avg_selectivity());
    }

    #[test]
    fn more_buckets_than_values() {
        let mut h = SelectivityHistogram::new(10, 0, 4).unwrap();
        h.add_values([0, 1, 2, 3, 4]).unwrap();
        assert!((h.estimate_selectivity(CompareOp::Eq, 2) - 0.2).abs() < EPS);
        assert!((h.avg_selectivity() - 0.2).abs() < EPS);
    }

    #[test]
    fn display_summarizes_shape() {
        let h = uniform_0_99();
        assert_eq!(
            h.to_string(),
            "SelectivityHistogram(buckets=10, min=0, max=99, observations=100)"
        );
    }
}
