pub mod algorithms;
pub mod core;
pub mod error;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub use crate::algorithms::chains::{anchored_chain, Chain, ChainSet};
pub use crate::algorithms::common::{sliding_dot_product, DotProductStrategy, SlidingSimilarity};
pub use crate::algorithms::motifs::{
    find_best_n_discords, find_best_n_motifs, find_discords, find_motifs, Discord, Motif,
};
pub use crate::algorithms::tiling::{ExclusionBand, Tile, TilePlan};
pub use crate::core::matrix_profile::{
    LeftRightProfile, MatrixProfile, MatrixProfileConfig, RollingStats, DEFAULT_EPSILON,
};
pub use crate::core::normalization::znorm;
pub use crate::error::{MatrixProfileError, Result};

/// High-level facade for matrix profile computation.
///
/// Holds the configuration explicitly; nothing is read from global state.
///
/// # Examples
///
/// ```
/// use mpjoin::{Engine, MatrixProfileConfig};
///
/// let ts = vec![1.0, 2.0, 3.0, 2.0, 1.0, 2.0, 3.0, 2.0, 1.0];
/// let engine = Engine::new(MatrixProfileConfig::new(4));
/// let mp = engine.self_join(&ts).unwrap();
/// assert_eq!(mp.distances.len(), ts.len() - 4 + 1);
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    config: MatrixProfileConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl Engine {
    /// Create a new engine with the given configuration.
    pub fn new(config: MatrixProfileConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Abort running requests with [`MatrixProfileError::Cancelled`] once `flag`
    /// is set. Checked between tiles.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &MatrixProfileConfig {
        &self.config
    }

    fn cancel_flag(&self) -> Option<&AtomicBool> {
        self.cancel.as_deref()
    }

    /// Self-join matrix profile, trivial matches excluded.
    pub fn self_join(&self, ts: &[f64]) -> Result<MatrixProfile> {
        algorithms::join::self_join(ts, &self.config, self.cancel_flag())
    }

    /// Nearest neighbor in `reference` for every window of `query`.
    pub fn ab_join(&self, query: &[f64], reference: &[f64]) -> Result<MatrixProfile> {
        algorithms::join::ab_join(query, reference, &self.config, self.cancel_flag())
    }

    /// Left and right self-join profiles.
    pub fn left_right(&self, ts: &[f64]) -> Result<LeftRightProfile> {
        algorithms::join::left_right(ts, &self.config, self.cancel_flag())
    }

    /// All maximal chains of `ts`.
    pub fn chains(&self, ts: &[f64]) -> Result<ChainSet> {
        ChainSet::from_profile(&self.left_right(ts)?)
    }

    /// Distance profile of an arbitrary `query` against `ts`, without exclusion.
    ///
    /// The query length takes precedence over the configured `m`.
    pub fn distance_profile(&self, query: &[f64], ts: &[f64]) -> Result<Vec<f64>> {
        algorithms::distance_profile::distance_profile(query, ts, self.config.epsilon)
    }
}

/// Matrix profile of `query` against `reference` with default batching.
pub fn ab_join(query: &[f64], reference: &[f64], m: usize) -> Result<MatrixProfile> {
    Engine::new(MatrixProfileConfig::new(m)).ab_join(query, reference)
}

/// Self-join matrix profile with default batching.
pub fn self_join(ts: &[f64], m: usize) -> Result<MatrixProfile> {
    Engine::new(MatrixProfileConfig::new(m)).self_join(ts)
}

/// Left and right self-join profiles with default batching.
pub fn left_right(ts: &[f64], m: usize) -> Result<LeftRightProfile> {
    Engine::new(MatrixProfileConfig::new(m)).left_right(ts)
}

/// All maximal chains of `ts` for subsequence length `m`.
pub fn get_chains(ts: &[f64], m: usize) -> Result<ChainSet> {
    Engine::new(MatrixProfileConfig::new(m)).chains(ts)
}
