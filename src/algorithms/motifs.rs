use crate::algorithms::common::apply_exclusion_zone;
use crate::core::matrix_profile::MatrixProfile;
use crate::error::{MatrixProfileError, Result};

/// A discovered motif (recurring pattern).
///
/// A motif is a subsequence together with its nearest neighbor, taken from
/// the smallest entries of the matrix profile.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Motif {
    /// Index of the subsequence.
    pub index: usize,
    /// Index of its nearest-neighbor match.
    pub neighbor: usize,
    /// Distance between the two subsequences.
    pub distance: f64,
}

/// A discovered discord (anomaly).
///
/// A discord is a subsequence whose nearest neighbor is unusually far away,
/// indicating it is unlike any other pattern in the time series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Discord {
    /// Index of the anomalous subsequence.
    pub index: usize,
    /// Index of its nearest neighbor.
    pub neighbor: usize,
    /// Distance to its nearest neighbor (high = anomalous).
    pub distance: f64,
}

/// Find the `n` best motifs: the smallest profile entries.
///
/// Candidates are ranked by `(distance ascending, index ascending)`. For a
/// self-join, once a motif is taken, windows within `ceil(m/2) - 1` of it or
/// of its neighbor are no longer eligible, so the same pattern is not
/// reported twice. Entries without a neighbor (infinite distance) are never
/// selected, so fewer than `n` motifs may come back.
///
/// Fails if `n` exceeds the profile length.
pub fn find_best_n_motifs(
    distances: &[f64],
    indices: &[usize],
    m: usize,
    n: usize,
    self_join: bool,
) -> Result<Vec<Motif>> {
    let picked = select(distances, indices, m, n, self_join, Rank::Smallest)?;
    Ok(picked
        .into_iter()
        .map(|i| Motif {
            index: i,
            neighbor: indices[i],
            distance: distances[i],
        })
        .collect())
}

/// Find the `n` top discords: the largest finite profile entries.
///
/// Ranked by `(distance descending, index ascending)`; self-join suppression
/// applies around each chosen window.
pub fn find_best_n_discords(
    distances: &[f64],
    indices: &[usize],
    m: usize,
    n: usize,
    self_join: bool,
) -> Result<Vec<Discord>> {
    let picked = select(distances, indices, m, n, self_join, Rank::Largest)?;
    Ok(picked
        .into_iter()
        .map(|i| Discord {
            index: i,
            neighbor: indices[i],
            distance: distances[i],
        })
        .collect())
}

/// [`find_best_n_motifs`] on a computed profile.
pub fn find_motifs(mp: &MatrixProfile, n: usize) -> Result<Vec<Motif>> {
    find_best_n_motifs(&mp.distances, &mp.indices, mp.m, n, mp.is_self_join())
}

/// [`find_best_n_discords`] on a computed profile.
pub fn find_discords(mp: &MatrixProfile, n: usize) -> Result<Vec<Discord>> {
    find_best_n_discords(&mp.distances, &mp.indices, mp.m, n, mp.is_self_join())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rank {
    Smallest,
    Largest,
}

fn select(
    distances: &[f64],
    indices: &[usize],
    m: usize,
    n: usize,
    self_join: bool,
    rank: Rank,
) -> Result<Vec<usize>> {
    if distances.len() != indices.len() {
        return Err(MatrixProfileError::LengthMismatch {
            left: distances.len(),
            right: indices.len(),
        });
    }
    let len = distances.len();
    if n > len {
        return Err(MatrixProfileError::TooManyRequested { n, available: len });
    }
    if self_join && m < 2 {
        return Err(MatrixProfileError::InvalidWindow {
            m,
            len: len + m.saturating_sub(1),
        });
    }

    let mut order: Vec<usize> = (0..len).filter(|&i| distances[i].is_finite()).collect();
    order.sort_by(|&a, &b| {
        let by_distance = match rank {
            Rank::Smallest => distances[a].total_cmp(&distances[b]),
            Rank::Largest => distances[b].total_cmp(&distances[a]),
        };
        by_distance.then(a.cmp(&b))
    });

    // |i - j| < ceil(m/2)  <=>  |i - j| <= ceil(m/2) - 1
    let zone = m.div_ceil(2).saturating_sub(1);
    // infinity marks windows that are no longer eligible
    let mut eligible = vec![0.0_f64; len];
    let mut picked = Vec::with_capacity(n);

    for i in order {
        if picked.len() == n {
            break;
        }
        if eligible[i].is_infinite() {
            continue;
        }
        picked.push(i);
        if self_join {
            apply_exclusion_zone(&mut eligible, i, zone);
            if rank == Rank::Smallest {
                apply_exclusion_zone(&mut eligible, indices[i], zone);
            }
        }
    }

    Ok(picked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::join::self_join;
    use crate::core::matrix_profile::MatrixProfileConfig;

    #[test]
    fn test_find_motifs_basic() {
        // A distinctive pattern appears exactly twice, far apart, with
        // non-repeating noise in between.
        let m = 8;
        let n = 56;
        let mut ts = vec![0.0; n];

        let pattern = [0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0];
        ts[0..8].copy_from_slice(&pattern);
        for (i, val) in ts.iter_mut().enumerate().take(40).skip(8) {
            *val = (i as f64).powi(2) * 0.01 + (i as f64 * 1.7).sin() * 3.0;
        }
        ts[40..48].copy_from_slice(&pattern);
        for (i, val) in ts.iter_mut().enumerate().take(n).skip(48) {
            *val = -(i as f64).powi(2) * 0.01 + (i as f64 * 2.3).cos() * 5.0;
        }

        let mp = self_join(&ts, &MatrixProfileConfig::new(m), None).unwrap();
        let motifs = find_motifs(&mp, 3).unwrap();

        assert!(!motifs.is_empty());
        let top = &motifs[0];
        assert!(
            top.distance < 1e-4,
            "Top motif distance should be very small, got {}",
            top.distance
        );
        let pair = (top.index.min(top.neighbor), top.index.max(top.neighbor));
        assert_eq!(pair, (0, 40), "Top motif should be at (0, 40)");
    }

    #[test]
    fn test_find_discords_basic() {
        let mut ts: Vec<f64> = (0..100).map(|i| (i as f64 * 0.2).sin()).collect();
        ts[25] = 10.0;
        ts[26] = -10.0;

        let mp = self_join(&ts, &MatrixProfileConfig::new(8), None).unwrap();
        let discords = find_discords(&mp, 3).unwrap();

        let top = &discords[0];
        assert!(
            (18..=30).contains(&top.index),
            "Top discord at index {} should be near anomaly at 25",
            top.index
        );
    }

    #[test]
    fn test_single_motif_is_global_minimum() {
        let d = [0.9, 0.4, 0.7, 0.4, 1.2, 0.8];
        let idx = [3, 5, 0, 1, 1, 2];
        let motifs = find_best_n_motifs(&d, &idx, 2, 1, true).unwrap();
        // tie at 0.4: the smaller index wins
        assert_eq!(
            motifs,
            vec![Motif {
                index: 1,
                neighbor: 5,
                distance: 0.4
            }]
        );

        let discords = find_best_n_discords(&d, &idx, 2, 1, true).unwrap();
        assert_eq!(discords[0].index, 4);
        assert_eq!(discords[0].distance, 1.2);
    }

    #[test]
    fn test_self_join_suppression() {
        // m = 4 -> windows within distance 1 of a pick (or its neighbor) are skipped
        let d = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];
        let idx = [6, 7, 7, 0, 0, 0, 0, 0];
        let motifs = find_best_n_motifs(&d, &idx, 4, 3, true).unwrap();
        // pick 0 (blocks 0,1 and 5,6,7), then 2 (blocks 1..3 and 6..7), then 4
        let picked: Vec<usize> = motifs.iter().map(|m| m.index).collect();
        assert_eq!(picked, vec![0, 2, 4]);

        // no suppression for two-series joins
        let motifs = find_best_n_motifs(&d, &idx, 4, 3, false).unwrap();
        let picked: Vec<usize> = motifs.iter().map(|m| m.index).collect();
        assert_eq!(picked, vec![0, 1, 2]);
    }

    #[test]
    fn test_discord_suppression_only_around_pick() {
        let d = [0.1, 0.9, 0.8, 0.2, 0.7];
        let idx = [3, 3, 4, 0, 0];
        let discords = find_best_n_discords(&d, &idx, 4, 3, true).unwrap();
        let picked: Vec<usize> = discords.iter().map(|x| x.index).collect();
        // 1 blocks 0..=2 and 4 blocks 3..=4, nothing else is left
        assert_eq!(picked, vec![1, 4]);
    }

    #[test]
    fn test_sorted_output() {
        let ts: Vec<f64> = (0..200).map(|i| (i as f64 * 0.15).sin() + (i as f64 * 0.041).cos()).collect();
        let mp = self_join(&ts, &MatrixProfileConfig::new(10), None).unwrap();
        let motifs = find_motifs(&mp, 5).unwrap();
        for w in motifs.windows(2) {
            assert!(w[0].distance <= w[1].distance);
        }
        let discords = find_discords(&mp, 5).unwrap();
        for w in discords.windows(2) {
            assert!(w[0].distance >= w[1].distance);
        }
    }

    #[test]
    fn test_too_many_requested() {
        let d = [1.0, 2.0];
        let idx = [1, 0];
        assert_eq!(
            find_best_n_motifs(&d, &idx, 2, 3, false),
            Err(MatrixProfileError::TooManyRequested { n: 3, available: 2 })
        );
        assert!(find_best_n_discords(&d, &idx, 2, 2, false).is_ok());
    }

    #[test]
    fn test_infinite_entries_are_skipped() {
        let d = [f64::INFINITY, 0.5, f64::INFINITY];
        let idx = [3, 3, 3];
        let motifs = find_best_n_motifs(&d, &idx, 2, 3, false).unwrap();
        assert_eq!(motifs.len(), 1);
        let discords = find_best_n_discords(&d, &idx, 2, 3, false).unwrap();
        assert_eq!(discords.len(), 1);
        assert_eq!(discords[0].index, 1);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            find_best_n_motifs(&[1.0], &[0, 1], 2, 1, false),
            Err(MatrixProfileError::LengthMismatch { .. })
        ));
    }
}
