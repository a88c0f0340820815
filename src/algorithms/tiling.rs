use crate::core::matrix_profile::MatrixProfileConfig;

/// A contiguous run of windows `[offset, offset + len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub offset: usize,
    pub len: usize,
}

impl Tile {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Samples of the underlying series covered by this tile's windows.
    pub fn sample_range(&self, m: usize) -> std::ops::Range<usize> {
        self.offset..self.end() + m - 1
    }
}

/// Split `n_windows` windows into consecutive tiles of at most `batch` windows.
pub fn split_into_tiles(n_windows: usize, batch: usize) -> Vec<Tile> {
    let batch = batch.max(1);
    (0..n_windows)
        .step_by(batch)
        .map(|offset| Tile {
            offset,
            len: batch.min(n_windows - offset),
        })
        .collect()
}

/// Query and reference tiles for one join request.
///
/// Peak working memory per query tile is `query_batch_size * reference_batch_size`
/// distances regardless of the series lengths.
#[derive(Debug, Clone)]
pub struct TilePlan {
    pub query_tiles: Vec<Tile>,
    pub reference_tiles: Vec<Tile>,
}

impl TilePlan {
    pub fn new(n_query: usize, n_reference: usize, config: &MatrixProfileConfig) -> Self {
        Self {
            query_tiles: split_into_tiles(n_query, config.query_batch_size),
            reference_tiles: split_into_tiles(n_reference, config.reference_batch_size),
        }
    }

    pub fn n_tiles(&self) -> usize {
        self.query_tiles.len() * self.reference_tiles.len()
    }
}

/// Band of trivial matches in a self-join: `|query - target| < radius`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionBand {
    radius: usize,
}

impl ExclusionBand {
    /// Band for subsequence length `m`, radius `ceil(m / 2)`.
    pub fn new(m: usize) -> Self {
        Self {
            radius: m.div_ceil(2),
        }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    #[inline]
    pub fn excludes(&self, query_idx: usize, target_idx: usize) -> bool {
        query_idx.abs_diff(target_idx) < self.radius
    }
}
