use crate::algorithms::common::SlidingSimilarity;
use crate::algorithms::tiling::ExclusionBand;
use crate::core::matrix_profile::RollingStats;
use crate::core::normalization::{center, znorm, znorm_with};
use crate::error::{check_finite, check_window, MatrixProfileError, Result};

/// A query window normalized to zero mean and unit variance, with the two
/// sums the distance formula needs.
#[derive(Debug, Clone)]
pub struct QuerySummary {
    pub normalized: Vec<f64>,
    pub sum: f64,
    pub sum_sq: f64,
}

impl QuerySummary {
    /// Normalize `window` from scratch.
    pub fn new(window: &[f64], epsilon: f64) -> Self {
        Self::from_normalized(znorm(window, epsilon))
    }

    /// Normalize `window` with statistics taken from a [`RollingStats`].
    pub fn with_stats(window: &[f64], mean: f64, std: f64) -> Self {
        Self::from_normalized(znorm_with(window, mean, std))
    }

    fn from_normalized(normalized: Vec<f64>) -> Self {
        let sum = normalized.iter().sum();
        let sum_sq = normalized.iter().map(|x| x * x).sum();
        Self {
            normalized,
            sum,
            sum_sq,
        }
    }
}

impl AsRef<[f64]> for QuerySummary {
    fn as_ref(&self) -> &[f64] {
        &self.normalized
    }
}

/// Turn sliding dot products into z-normalized Euclidean distances.
///
/// `qt[j]` is the dot product of the normalized query with target window `j`
/// (raw, not normalized); `stats` are the target's rolling statistics:
///
/// ```text
/// d^2 = aux_t - 2 * (qt - sum_q * mean_t) / max(std_t, eps) + sum_q^2
/// d   = sqrt(|d^2|)
/// ```
///
/// A non-finite result is reported as a numerical failure.
pub fn distances_from_dot_products(
    qt: &[f64],
    stats: &RollingStats,
    query: &QuerySummary,
    epsilon: f64,
) -> Result<Vec<f64>> {
    if qt.len() != stats.len() {
        return Err(MatrixProfileError::LengthMismatch {
            left: qt.len(),
            right: stats.len(),
        });
    }
    let mut out = Vec::with_capacity(qt.len());
    for (j, &dot) in qt.iter().enumerate() {
        let std = stats.std[j].max(epsilon);
        let d2 = stats.aux[j] - 2.0 * (dot - query.sum * stats.mean[j]) / std + query.sum_sq;
        let d = d2.abs().sqrt();
        if !d.is_finite() {
            return Err(MatrixProfileError::numerical(format!(
                "non-finite distance at target window {j}"
            )));
        }
        out.push(d);
    }
    Ok(out)
}

/// Mask trivial matches in a distance row.
///
/// `row[k]` belongs to target window `target_offset + k`; every entry within
/// the band around `query_idx` is set to infinity, which is larger than any
/// real distance and never selected by the min-fold.
pub fn mask_trivial_matches(
    row: &mut [f64],
    query_idx: usize,
    target_offset: usize,
    band: &ExclusionBand,
) {
    for (k, d) in row.iter_mut().enumerate() {
        if band.excludes(query_idx, target_offset + k) {
            *d = f64::INFINITY;
        }
    }
}

/// Distance profile of an arbitrary query against a series (MASS).
///
/// Returns one z-normalized Euclidean distance per window of `ts`; no
/// exclusion is applied.
pub fn distance_profile(query: &[f64], ts: &[f64], epsilon: f64) -> Result<Vec<f64>> {
    let m = query.len();
    check_window(m, ts.len())?;
    check_finite(query)?;
    check_finite(ts)?;

    let ts = center(ts);
    let stats = RollingStats::compute(&ts, m, epsilon);
    let summary = QuerySummary::new(query, epsilon);
    let qt = SlidingSimilarity::new(&ts, m)?.dot_products(&summary.normalized)?;
    distances_from_dot_products(&qt, &stats, &summary, epsilon)
}
