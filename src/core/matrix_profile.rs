use crate::core::normalization::series_level;
use crate::error::{MatrixProfileError, Result};

/// Default variance floor applied before any division by a standard deviation.
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Default number of query windows processed together in one tile.
pub const DEFAULT_QUERY_BATCH: usize = 512;

/// Default number of reference windows scanned per reference tile.
pub const DEFAULT_REFERENCE_BATCH: usize = 8192;

/// Configuration for matrix profile computation.
///
/// Passed explicitly into the engine; there is no process-wide state.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixProfileConfig {
    /// Subsequence length.
    pub m: usize,
    /// Upper bound on query windows per tile.
    pub query_batch_size: usize,
    /// Upper bound on reference windows per tile. Reference rolling statistics
    /// are computed per reference tile.
    pub reference_batch_size: usize,
    /// Variance floor.
    pub epsilon: f64,
}

impl MatrixProfileConfig {
    pub fn new(m: usize) -> Self {
        Self {
            m,
            query_batch_size: DEFAULT_QUERY_BATCH,
            reference_batch_size: DEFAULT_REFERENCE_BATCH,
            epsilon: DEFAULT_EPSILON,
        }
    }

    pub fn with_query_batch_size(mut self, size: usize) -> Self {
        self.query_batch_size = size;
        self
    }

    pub fn with_reference_batch_size(mut self, size: usize) -> Self {
        self.reference_batch_size = size;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Self-join exclusion radius: pairs with `|i - j| < ceil(m / 2)` are trivial matches.
    pub fn exclusion_zone(&self) -> usize {
        self.m.div_ceil(2)
    }

    /// Check batch sizes and epsilon. Window length is checked against the
    /// inputs by the engine.
    pub fn validate(&self) -> Result<()> {
        if self.query_batch_size == 0 {
            return Err(MatrixProfileError::invalid_config(
                "query_batch_size must be >= 1",
            ));
        }
        if self.reference_batch_size == 0 {
            return Err(MatrixProfileError::invalid_config(
                "reference_batch_size must be >= 1",
            ));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(MatrixProfileError::invalid_config(format!(
                "epsilon must be finite and > 0, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// The matrix profile result.
///
/// A position with no permitted neighbor holds `f64::INFINITY` and the index
/// `reference_len` (one past the last valid sample).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixProfile {
    /// Nearest-neighbor distances for each query subsequence.
    #[cfg_attr(feature = "serde", serde(with = "no_match_distances"))]
    pub distances: Vec<f64>,
    /// Index of the nearest neighbor in the reference series.
    pub indices: Vec<usize>,
    /// Subsequence length used.
    pub m: usize,
    /// Exclusion radius applied; 0 for a join between two series.
    pub exclusion_zone: usize,
    /// Length of the reference series, doubling as the "no match" index.
    pub reference_len: usize,
}

impl MatrixProfile {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Whether this profile came from a self-join (trivial matches excluded).
    pub fn is_self_join(&self) -> bool {
        self.exclusion_zone > 0
    }

    /// Whether position `i` has a reported neighbor.
    pub fn has_match(&self, i: usize) -> bool {
        self.indices[i] < self.reference_len
    }
}

/// Left and right matrix profiles of a self-join.
///
/// Left entries only consider neighbors that start before the query window,
/// right entries only those that start after it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LeftRightProfile {
    #[cfg_attr(feature = "serde", serde(with = "no_match_distances"))]
    pub left_distances: Vec<f64>,
    pub left_indices: Vec<usize>,
    #[cfg_attr(feature = "serde", serde(with = "no_match_distances"))]
    pub right_distances: Vec<f64>,
    pub right_indices: Vec<usize>,
    pub m: usize,
    pub exclusion_zone: usize,
    /// Series length, doubling as the "no match" index.
    pub series_len: usize,
}

impl LeftRightProfile {
    pub fn len(&self) -> usize {
        self.left_distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left_distances.is_empty()
    }
}

/// Distances on the wire: a no-match entry (infinity) is written as `null`
/// and read back as infinity, since JSON has no representation for it.
#[cfg(feature = "serde")]
mod no_match_distances {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        distances: &[f64],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        distances
            .iter()
            .map(|&d| d.is_finite().then_some(d))
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<f64>, D::Error> {
        let wire = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(wire
            .into_iter()
            .map(|d| d.unwrap_or(f64::INFINITY))
            .collect())
    }
}

/// Rolling mean, standard deviation and distance helper term for all
/// subsequences of length `m`.
///
/// Computed with one cumulative-sum pass over the series and its square and a
/// lag-`m` difference. Samples are accumulated relative to the series mean so
/// a large constant offset does not swamp the variance. The variance is floored
/// at `epsilon`, so `std` is never below `sqrt(epsilon)` and `aux` stays finite
/// for constant windows.
#[derive(Debug, Clone)]
pub struct RollingStats {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    /// `sum((t - mean)^2) / std^2` per window: the squared norm of the
    /// normalized window. Equals `m` unless the variance floor kicked in.
    pub aux: Vec<f64>,
    /// Number of windows whose variance was below `epsilon`.
    pub floored: usize,
}

impl RollingStats {
    /// Compute rolling statistics for subsequences of length `m`.
    ///
    /// Callers guarantee `1 <= m <= ts.len()`.
    pub fn compute(ts: &[f64], m: usize, epsilon: f64) -> Self {
        debug_assert!(m > 0 && ts.len() >= m);

        let n = ts.len();
        let n_subs = n - m + 1;
        let level = series_level(ts);

        let mut cumsum = vec![0.0; n + 1];
        let mut cumsum_sq = vec![0.0; n + 1];
        for i in 0..n {
            let x = ts[i] - level;
            cumsum[i + 1] = cumsum[i] + x;
            cumsum_sq[i + 1] = cumsum_sq[i] + x * x;
        }

        let mut mean = Vec::with_capacity(n_subs);
        let mut std = Vec::with_capacity(n_subs);
        let mut aux = Vec::with_capacity(n_subs);
        let mut floored = 0;

        let m_f = m as f64;
        for i in 0..n_subs {
            let sum = cumsum[i + m] - cumsum[i];
            let sum_sq = cumsum_sq[i + m] - cumsum_sq[i];
            let mu = sum / m_f;
            // sum_sq - 2*mu*sum + m*mu^2 == sum_sq - sum*mu; clamp rounding
            // noise but let NaN through
            let centered = sum_sq - sum * mu;
            let centered = if centered < 0.0 { 0.0 } else { centered };
            let var = centered / m_f;
            let var_floored = if var < epsilon {
                floored += 1;
                epsilon
            } else {
                var
            };
            mean.push(mu + level);
            std.push(var_floored.sqrt());
            aux.push(centered / var_floored);
        }

        Self {
            mean,
            std,
            aux,
            floored,
        }
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

/// Running best `(distance, index)` per query position.
///
/// Updated only through an elementwise minimum; equal distances keep the
/// smaller index so results do not depend on traversal order.
#[derive(Debug, Clone)]
pub(crate) struct ProfileAccumulator {
    pub distances: Vec<f64>,
    pub indices: Vec<usize>,
    no_match: usize,
}

impl ProfileAccumulator {
    pub fn new(n: usize, no_match: usize) -> Self {
        Self {
            distances: vec![f64::INFINITY; n],
            indices: vec![no_match; n],
            no_match,
        }
    }

    /// Fold a single candidate into position `idx`. Non-finite candidates
    /// (masked entries) are ignored.
    #[inline]
    pub fn update(&mut self, idx: usize, distance: f64, neighbor: usize) {
        if !distance.is_finite() {
            return;
        }
        let curr = self.distances[idx];
        if distance < curr || (distance == curr && neighbor < self.indices[idx]) {
            self.distances[idx] = distance;
            self.indices[idx] = neighbor;
        }
    }

    /// Fold the minimum of a distance row into position `idx`.
    ///
    /// `row[k]` is the distance to reference window `offset + k`.
    pub fn fold_row(&mut self, idx: usize, row: &[f64], offset: usize) {
        let mut best = f64::INFINITY;
        let mut best_k = None;
        for (k, &d) in row.iter().enumerate() {
            if d < best {
                best = d;
                best_k = Some(k);
            }
        }
        if let Some(k) = best_k {
            self.update(idx, best, offset + k);
        }
    }

    /// Commit a tile-local accumulator covering positions `offset..offset + other.len()`.
    pub fn commit(&mut self, offset: usize, other: &ProfileAccumulator) {
        for (k, (&d, &j)) in other.distances.iter().zip(&other.indices).enumerate() {
            if j != other.no_match {
                self.update(offset + k, d, j);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_stats_simple() {
        // Subsequences of [1..5] with m=3: means 2, 3, 4; std sqrt(2/3)
        let ts = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = RollingStats::compute(&ts, 3, DEFAULT_EPSILON);

        assert_eq!(stats.len(), 3);
        assert!((stats.mean[0] - 2.0).abs() < 1e-10);
        assert!((stats.mean[1] - 3.0).abs() < 1e-10);
        assert!((stats.mean[2] - 4.0).abs() < 1e-10);

        let expected_std = (2.0_f64 / 3.0).sqrt();
        for s in &stats.std {
            assert!((s - expected_std).abs() < 1e-10);
        }
        for a in &stats.aux {
            assert!((a - 3.0).abs() < 1e-10, "aux should equal m, got {a}");
        }
        assert_eq!(stats.floored, 0);
    }

    #[test]
    fn test_rolling_stats_constant_floored() {
        let ts = vec![5.0; 10];
        let stats = RollingStats::compute(&ts, 4, DEFAULT_EPSILON);
        assert_eq!(stats.len(), 7);
        assert_eq!(stats.floored, 7);
        for (mu, (s, a)) in stats.mean.iter().zip(stats.std.iter().zip(&stats.aux)) {
            assert!((mu - 5.0).abs() < 1e-10);
            assert!((s - DEFAULT_EPSILON.sqrt()).abs() < 1e-12);
            assert!(a.is_finite() && *a < 1e-6);
        }
    }

    #[test]
    fn test_rolling_stats_large_offset() {
        // same windows as test_rolling_stats_simple shifted by 1e6
        let ts: Vec<f64> = [1.0, 2.0, 3.0, 4.0, 5.0].iter().map(|x| x + 1e6).collect();
        let stats = RollingStats::compute(&ts, 3, DEFAULT_EPSILON);
        let expected_std = (2.0_f64 / 3.0).sqrt();
        for (i, (mu, s)) in stats.mean.iter().zip(&stats.std).enumerate() {
            assert!((mu - (1e6 + 2.0 + i as f64)).abs() < 1e-9);
            assert!((s - expected_std).abs() < 1e-10, "std {s} at {i}");
        }
        for a in &stats.aux {
            assert!((a - 3.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_rolling_stats_nan_is_not_clamped() {
        // squares overflow; the NaN must reach the distance check
        let ts = [1e200, -1e200, 1e200, -1e200];
        let stats = RollingStats::compute(&ts, 2, DEFAULT_EPSILON);
        assert!(stats.aux.iter().any(|a| a.is_nan()));
    }

    #[test]
    fn test_rolling_stats_full_length_window() {
        let stats = RollingStats::compute(&[1.0, 3.0], 2, DEFAULT_EPSILON);
        assert_eq!(stats.len(), 1);
        assert!((stats.mean[0] - 2.0).abs() < 1e-12);
        assert!((stats.std[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_accumulator_min_and_tie_break() {
        let mut acc = ProfileAccumulator::new(2, 99);
        acc.update(0, 1.5, 7);
        acc.update(0, 2.0, 1);
        assert_eq!((acc.distances[0], acc.indices[0]), (1.5, 7));

        // equal distance, smaller index wins
        acc.update(0, 1.5, 3);
        assert_eq!(acc.indices[0], 3);
        acc.update(0, 1.5, 5);
        assert_eq!(acc.indices[0], 3);

        // masked candidates never land
        acc.update(1, f64::INFINITY, 0);
        assert_eq!(acc.indices[1], 99);
    }

    #[test]
    fn test_fold_row_offsets_and_ties() {
        let mut acc = ProfileAccumulator::new(1, 50);
        acc.fold_row(0, &[3.0, 1.0, 1.0, f64::INFINITY], 10);
        assert_eq!((acc.distances[0], acc.indices[0]), (1.0, 11));

        // all masked: untouched
        let mut acc = ProfileAccumulator::new(1, 50);
        acc.fold_row(0, &[f64::INFINITY; 3], 0);
        assert!(acc.distances[0].is_infinite());
        assert_eq!(acc.indices[0], 50);
    }

    #[test]
    fn test_commit_is_order_independent() {
        let mut a = ProfileAccumulator::new(3, 9);
        a.fold_row(1, &[2.0, 0.5], 4);
        let mut b = ProfileAccumulator::new(3, 9);
        b.fold_row(1, &[0.5, 3.0], 2);

        let mut ab = ProfileAccumulator::new(3, 9);
        ab.commit(0, &a);
        ab.commit(0, &b);
        let mut ba = ProfileAccumulator::new(3, 9);
        ba.commit(0, &b);
        ba.commit(0, &a);

        assert_eq!(ab.indices, ba.indices);
        assert_eq!(ab.indices[1], 2);
        assert_eq!(ab.indices[0], 9);
    }

    #[test]
    fn test_exclusion_zone_is_half_window() {
        assert_eq!(MatrixProfileConfig::new(3).exclusion_zone(), 2);
        assert_eq!(MatrixProfileConfig::new(4).exclusion_zone(), 2);
        assert_eq!(MatrixProfileConfig::new(9).exclusion_zone(), 5);
    }

    #[test]
    fn test_config_validation() {
        assert!(MatrixProfileConfig::new(4).validate().is_ok());
        assert!(MatrixProfileConfig::new(4)
            .with_query_batch_size(0)
            .validate()
            .is_err());
        assert!(MatrixProfileConfig::new(4)
            .with_reference_batch_size(0)
            .validate()
            .is_err());
        assert!(MatrixProfileConfig::new(4)
            .with_epsilon(0.0)
            .validate()
            .is_err());
        assert!(MatrixProfileConfig::new(4)
            .with_epsilon(f64::NAN)
            .validate()
            .is_err());
    }
}
