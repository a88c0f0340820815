use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace, warn};

use crate::algorithms::common::SlidingSimilarity;
use crate::algorithms::distance_profile::{
    distances_from_dot_products, mask_trivial_matches, QuerySummary,
};
use crate::algorithms::tiling::{ExclusionBand, Tile, TilePlan};
use crate::core::matrix_profile::{
    LeftRightProfile, MatrixProfile, MatrixProfileConfig, ProfileAccumulator, RollingStats,
};
use crate::core::normalization::center;
use crate::error::{check_finite, check_window, MatrixProfileError, Result};

/// Compute the self-join matrix profile of `ts`.
///
/// Every window is compared against every other window of the same series;
/// pairs with `|i - j| < ceil(m / 2)` are trivial matches and excluded.
pub fn self_join(
    ts: &[f64],
    config: &MatrixProfileConfig,
    cancel: Option<&AtomicBool>,
) -> Result<MatrixProfile> {
    let acc = run_join(ts, ts, config, JoinKind::SelfJoin, cancel)?;
    Ok(MatrixProfile {
        distances: acc.nearest.distances,
        indices: acc.nearest.indices,
        m: config.m,
        exclusion_zone: config.exclusion_zone(),
        reference_len: ts.len(),
    })
}

/// Compute the matrix profile of `query` against `reference`.
///
/// No exclusion is applied: a neighbor at the same or an overlapping offset
/// is a legitimate match between two different series.
pub fn ab_join(
    query: &[f64],
    reference: &[f64],
    config: &MatrixProfileConfig,
    cancel: Option<&AtomicBool>,
) -> Result<MatrixProfile> {
    let acc = run_join(query, reference, config, JoinKind::TwoSeries, cancel)?;
    Ok(MatrixProfile {
        distances: acc.nearest.distances,
        indices: acc.nearest.indices,
        m: config.m,
        exclusion_zone: 0,
        reference_len: reference.len(),
    })
}

/// Compute the left and right self-join profiles of `ts`.
///
/// Positions without a permitted neighbor on one side (the edges of the
/// series) report `f64::INFINITY` and the index `ts.len()`.
pub fn left_right(
    ts: &[f64],
    config: &MatrixProfileConfig,
    cancel: Option<&AtomicBool>,
) -> Result<LeftRightProfile> {
    let acc = run_join(ts, ts, config, JoinKind::LeftRight, cancel)?;
    Ok(LeftRightProfile {
        left_distances: acc.left.distances,
        left_indices: acc.left.indices,
        right_distances: acc.right.distances,
        right_indices: acc.right.indices,
        m: config.m,
        exclusion_zone: config.exclusion_zone(),
        series_len: ts.len(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinKind {
    TwoSeries,
    SelfJoin,
    LeftRight,
}

impl JoinKind {
    fn is_self_join(self) -> bool {
        matches!(self, JoinKind::SelfJoin | JoinKind::LeftRight)
    }
}

/// Reference-side state for one reference tile, prepared once and shared
/// read-only by every query tile.
struct ReferenceTile<'a> {
    tile: Tile,
    stats: RollingStats,
    similarity: SlidingSimilarity<'a>,
}

/// Running accumulators. Only the ones the join kind needs are non-empty.
struct JoinAccumulators {
    nearest: ProfileAccumulator,
    left: ProfileAccumulator,
    right: ProfileAccumulator,
}

impl JoinAccumulators {
    fn new(kind: JoinKind, n: usize, no_match: usize) -> Self {
        let (n_nearest, n_sides) = match kind {
            JoinKind::LeftRight => (0, n),
            _ => (n, 0),
        };
        Self {
            nearest: ProfileAccumulator::new(n_nearest, no_match),
            left: ProfileAccumulator::new(n_sides, no_match),
            right: ProfileAccumulator::new(n_sides, no_match),
        }
    }

    /// Fold one masked distance row for query window `qi` (local position `local`).
    fn fold(&mut self, kind: JoinKind, local: usize, qi: usize, row: &[f64], offset: usize) {
        match kind {
            JoinKind::TwoSeries | JoinKind::SelfJoin => self.nearest.fold_row(local, row, offset),
            JoinKind::LeftRight => {
                // targets before qi go left, the rest right
                let split = qi.saturating_sub(offset).min(row.len());
                self.left.fold_row(local, &row[..split], offset);
                self.right.fold_row(local, &row[split..], offset + split);
            }
        }
    }

    fn commit(&mut self, offset: usize, other: &JoinAccumulators) {
        self.nearest.commit(offset, &other.nearest);
        self.left.commit(offset, &other.left);
        self.right.commit(offset, &other.right);
    }
}

struct JoinContext<'a> {
    query: &'a [f64],
    query_stats: RollingStats,
    reference_tiles: Vec<ReferenceTile<'a>>,
    config: &'a MatrixProfileConfig,
    kind: JoinKind,
    band: Option<ExclusionBand>,
    no_match: usize,
    cancel: Option<&'a AtomicBool>,
}

impl JoinContext<'_> {
    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Run one query tile against every reference tile.
    ///
    /// Works on tile-local accumulators only; the caller commits them once
    /// the whole tile has finished.
    fn process_query_tile(&self, tile: Tile) -> Result<JoinAccumulators> {
        let m = self.config.m;
        let epsilon = self.config.epsilon;

        let summaries: Vec<QuerySummary> = (tile.offset..tile.end())
            .map(|i| {
                QuerySummary::with_stats(
                    &self.query[i..i + m],
                    self.query_stats.mean[i],
                    self.query_stats.std[i],
                )
            })
            .collect();

        let mut local = JoinAccumulators::new(self.kind, tile.len, self.no_match);

        for rt in &self.reference_tiles {
            if self.is_cancelled() {
                return Err(MatrixProfileError::Cancelled);
            }
            // fold each row before computing the next
            for (k, summary) in summaries.iter().enumerate() {
                let qi = tile.offset + k;
                let qt = rt.similarity.dot_products(&summary.normalized)?;
                let mut row = distances_from_dot_products(&qt, &rt.stats, summary, epsilon)?;
                if let Some(band) = &self.band {
                    mask_trivial_matches(&mut row, qi, rt.tile.offset, band);
                }
                local.fold(self.kind, k, qi, &row, rt.tile.offset);
            }
            trace!(
                "tile done: queries {}..{} x references {}..{}",
                tile.offset,
                tile.end(),
                rt.tile.offset,
                rt.tile.end()
            );
        }

        Ok(local)
    }
}

fn run_join(
    query: &[f64],
    reference: &[f64],
    config: &MatrixProfileConfig,
    kind: JoinKind,
    cancel: Option<&AtomicBool>,
) -> Result<JoinAccumulators> {
    let m = config.m;
    config.validate()?;
    check_window(m, query.len())?;
    check_window(m, reference.len())?;
    check_finite(query)?;
    if !kind.is_self_join() {
        check_finite(reference)?;
    }

    // distances are shift-invariant; work on mean-centered copies
    let centered_query = center(query);
    let centered_reference = if kind.is_self_join() {
        None
    } else {
        Some(center(reference))
    };
    let query = centered_query.as_slice();
    let reference = centered_reference.as_deref().unwrap_or(query);

    let n_query = query.len() - m + 1;
    let n_reference = reference.len() - m + 1;
    let plan = TilePlan::new(n_query, n_reference, config);
    debug!(
        "{:?} m={}: {} query windows in {} tiles, {} reference windows in {} tiles",
        kind,
        m,
        n_query,
        plan.query_tiles.len(),
        n_reference,
        plan.reference_tiles.len()
    );

    let query_stats = RollingStats::compute(query, m, config.epsilon);
    if query_stats.floored > 0 {
        warn!(
            "{} of {} query windows have variance below {:e}; their distances are approximate",
            query_stats.floored, n_query, config.epsilon
        );
    }

    let reference_tiles = plan
        .reference_tiles
        .iter()
        .map(|&tile| {
            let segment = &reference[tile.sample_range(m)];
            Ok(ReferenceTile {
                tile,
                stats: RollingStats::compute(segment, m, config.epsilon),
                similarity: SlidingSimilarity::new(segment, m)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if !kind.is_self_join() {
        let floored: usize = reference_tiles.iter().map(|rt| rt.stats.floored).sum();
        if floored > 0 {
            warn!(
                "{} of {} reference windows have variance below {:e}; their distances are approximate",
                floored, n_reference, config.epsilon
            );
        }
    }

    let no_match = reference.len();
    let ctx = JoinContext {
        query,
        query_stats,
        reference_tiles,
        config,
        kind,
        band: kind.is_self_join().then(|| ExclusionBand::new(m)),
        no_match,
        cancel,
    };

    #[cfg(feature = "parallel")]
    let results: Vec<JoinAccumulators> = {
        use rayon::prelude::*;
        plan.query_tiles
            .par_iter()
            .map(|&tile| ctx.process_query_tile(tile))
            .collect::<Result<_>>()?
    };
    #[cfg(not(feature = "parallel"))]
    let results: Vec<JoinAccumulators> = plan
        .query_tiles
        .iter()
        .map(|&tile| ctx.process_query_tile(tile))
        .collect::<Result<_>>()?;

    let mut acc = JoinAccumulators::new(kind, n_query, no_match);
    for (tile, local) in plan.query_tiles.iter().zip(&results) {
        acc.commit(tile.offset, local);
    }
    Ok(acc)
}
