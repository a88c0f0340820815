use crate::core::matrix_profile::LeftRightProfile;
use crate::error::{MatrixProfileError, Result};

/// A single time series chain: an ordered sequence of window indices
/// representing a pattern that evolves through time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chain {
    /// Subsequence indices in link order.
    pub indices: Vec<usize>,
}

impl Chain {
    /// The number of links in this chain.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether this chain is empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Every window of a series partitioned into maximal chains.
///
/// A link `i -> j` exists when `right_indices[i] == j` and
/// `left_indices[j] == i`. Windows without links form single-element chains,
/// so each window belongs to exactly one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainSet {
    pub chains: Vec<Chain>,
}

impl ChainSet {
    /// Build all maximal chains from left/right nearest-neighbor indices.
    ///
    /// Index values outside `0..len` mean "no neighbor" and never form a link.
    pub fn from_indices(left_indices: &[usize], right_indices: &[usize]) -> Result<Self> {
        let n = left_indices.len();
        if right_indices.len() != n {
            return Err(MatrixProfileError::LengthMismatch {
                left: n,
                right: right_indices.len(),
            });
        }

        let next: Vec<Option<usize>> = (0..n)
            .map(|i| {
                let j = right_indices[i];
                (j < n && j != i && left_indices[j] == i).then_some(j)
            })
            .collect();
        let mut has_predecessor = vec![false; n];
        for j in next.iter().flatten() {
            has_predecessor[*j] = true;
        }

        let mut visited = vec![false; n];
        let mut chains = Vec::new();

        // Anchors first; a second pass picks up windows only reachable
        // through a cycle, which well-formed left/right indices never produce.
        let anchors = (0..n).filter(|&i| !has_predecessor[i]);
        let leftovers = 0..n;
        for start in anchors.chain(leftovers) {
            if visited[start] {
                continue;
            }
            let mut indices = vec![start];
            visited[start] = true;
            let mut current = start;
            while let Some(j) = next[current] {
                if visited[j] {
                    break;
                }
                indices.push(j);
                visited[j] = true;
                current = j;
            }
            chains.push(Chain { indices });
        }

        chains.sort_by_key(|c| c.indices[0]);
        Ok(Self { chains })
    }

    /// Build all maximal chains from a left/right profile.
    pub fn from_profile(lr: &LeftRightProfile) -> Result<Self> {
        Self::from_indices(&lr.left_indices, &lr.right_indices)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// The longest chain; the earliest one wins ties.
    pub fn longest(&self) -> Option<&Chain> {
        self.chains
            .iter()
            .reduce(|best, c| if c.len() > best.len() { c } else { best })
    }

    /// The chain containing window `index`.
    pub fn chain_of(&self, index: usize) -> Option<&Chain> {
        self.chains.iter().find(|c| c.indices.contains(&index))
    }

    /// Flattened form: concatenated indices plus a parallel chain id per
    /// index. Ids start at 1; 0 is reserved for "no chain".
    pub fn flatten(&self) -> (Vec<usize>, Vec<usize>) {
        let total = self.chains.iter().map(Chain::len).sum();
        let mut indices = Vec::with_capacity(total);
        let mut ids = Vec::with_capacity(total);
        for (k, chain) in self.chains.iter().enumerate() {
            indices.extend_from_slice(&chain.indices);
            ids.extend(std::iter::repeat(k + 1).take(chain.len()));
        }
        (indices, ids)
    }
}

/// Anchored chain: follow validated right-neighbor links starting at `anchor`.
///
/// Unlike the chains of a [`ChainSet`], the anchor may itself have a
/// predecessor; the walk only goes forward.
pub fn anchored_chain(lr: &LeftRightProfile, anchor: usize) -> Result<Chain> {
    let n = lr.len();
    if anchor >= n {
        return Err(MatrixProfileError::IndexOutOfRange {
            index: anchor,
            len: n,
        });
    }

    let mut indices = vec![anchor];
    let mut current = anchor;
    loop {
        let next = lr.right_indices[current];
        // Stop if next is out of bounds or not strictly forward
        if next >= n || next <= current {
            break;
        }
        if lr.left_indices[next] != current {
            break;
        }
        indices.push(next);
        current = next;
    }

    Ok(Chain { indices })
}
