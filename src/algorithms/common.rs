use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use crate::error::{MatrixProfileError, Result};

/// Size threshold (n * m) above which we dispatch to the FFT path.
/// Below this, the naive O(n*m) loop wins due to lower constant overhead.
const FFT_THRESHOLD: usize = 256 * 1024;

/// How sliding dot products are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DotProductStrategy {
    /// FFT when `n * m` exceeds an internal threshold, naive otherwise.
    #[default]
    Auto,
    Naive,
    Fft,
}

/// Precomputed target spectrum plus the FFT plans that produced it.
struct Spectrum {
    fft_len: usize,
    values: Vec<Complex<f64>>,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
}

/// Sliding dot products of many query windows against one target series.
///
/// The target's transform is computed once in [`SlidingSimilarity::new`] and
/// reused by every query, so a batch of `b` queries costs one forward and one
/// inverse transform per query on top of the shared target transform.
pub struct SlidingSimilarity<'a> {
    target: &'a [f64],
    m: usize,
    spectrum: Option<Spectrum>,
}

impl<'a> SlidingSimilarity<'a> {
    /// Prepare `target` for queries of length `m`.
    pub fn new(target: &'a [f64], m: usize) -> Result<Self> {
        Self::with_strategy(target, m, DotProductStrategy::Auto)
    }

    pub fn with_strategy(
        target: &'a [f64],
        m: usize,
        strategy: DotProductStrategy,
    ) -> Result<Self> {
        if m == 0 || target.len() < m {
            return Err(MatrixProfileError::InvalidWindow {
                m,
                len: target.len(),
            });
        }
        let use_fft = match strategy {
            DotProductStrategy::Auto => target.len() * m > FFT_THRESHOLD,
            DotProductStrategy::Naive => false,
            DotProductStrategy::Fft => true,
        };
        let spectrum = if use_fft {
            Some(Self::target_spectrum(target, m)?)
        } else {
            None
        };
        Ok(Self {
            target,
            m,
            spectrum,
        })
    }

    fn target_spectrum(target: &[f64], m: usize) -> Result<Spectrum> {
        let fft_len = (target.len() + m - 1).next_power_of_two();
        let mut planner = RealFftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let mut padded = forward.make_input_vec();
        padded[..target.len()].copy_from_slice(target);
        let mut values = forward.make_output_vec();
        forward
            .process(&mut padded, &mut values)
            .map_err(|e| MatrixProfileError::numerical(format!("forward transform: {e}")))?;

        Ok(Spectrum {
            fft_len,
            values,
            forward,
            inverse,
        })
    }

    /// Number of alignments, `target.len() - m + 1`.
    pub fn len(&self) -> usize {
        self.target.len() - self.m + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn uses_fft(&self) -> bool {
        self.spectrum.is_some()
    }

    /// Dot product of `query` with every alignment of the target.
    pub fn dot_products(&self, query: &[f64]) -> Result<Vec<f64>> {
        if query.len() != self.m {
            return Err(MatrixProfileError::LengthMismatch {
                left: query.len(),
                right: self.m,
            });
        }
        match &self.spectrum {
            Some(spectrum) => self.dot_products_fft(spectrum, query),
            None => Ok(sliding_dot_product_naive(query, self.target)),
        }
    }

    /// One output vector per query, in input order.
    pub fn dot_products_batch<Q: AsRef<[f64]>>(&self, queries: &[Q]) -> Result<Vec<Vec<f64>>> {
        queries.iter().map(|q| self.dot_products(q.as_ref())).collect()
    }

    fn dot_products_fft(&self, spectrum: &Spectrum, query: &[f64]) -> Result<Vec<f64>> {
        let m = self.m;
        let n_subs = self.len();

        // Reverse query into zero-padded buffer
        let mut q_padded = spectrum.forward.make_input_vec();
        for (dst, src) in q_padded.iter_mut().zip(query.iter().rev()) {
            *dst = *src;
        }

        let mut q_spectrum = spectrum.forward.make_output_vec();
        spectrum
            .forward
            .process(&mut q_padded, &mut q_spectrum)
            .map_err(|e| MatrixProfileError::numerical(format!("forward transform: {e}")))?;

        for (q_val, t_val) in q_spectrum.iter_mut().zip(spectrum.values.iter()) {
            *q_val *= t_val;
        }
        // DC and Nyquist bins of a real signal are real
        if let Some(first) = q_spectrum.first_mut() {
            first.im = 0.0;
        }
        if let Some(last) = q_spectrum.last_mut() {
            last.im = 0.0;
        }

        let mut result = spectrum.inverse.make_output_vec();
        spectrum
            .inverse
            .process(&mut q_spectrum, &mut result)
            .map_err(|e| MatrixProfileError::numerical(format!("inverse transform: {e}")))?;

        // realfft inverse is unnormalized
        let norm = 1.0 / spectrum.fft_len as f64;
        Ok(result[m - 1..m - 1 + n_subs]
            .iter()
            .map(|&x| x * norm)
            .collect())
    }
}

/// Compute the sliding dot product between a query subsequence `q` and time series `ts`.
///
/// Returns a vector of length `ts.len() - q.len() + 1` where element `i` is
/// `dot(q, ts[i..i+m])`.
pub fn sliding_dot_product(q: &[f64], ts: &[f64]) -> Result<Vec<f64>> {
    SlidingSimilarity::new(ts, q.len())?.dot_products(q)
}

/// Naive O(n*m) sliding dot product. Callers guarantee `ts.len() >= q.len()`.
pub fn sliding_dot_product_naive(q: &[f64], ts: &[f64]) -> Vec<f64> {
    let m = q.len();
    let n_subs = ts.len() + 1 - m;

    (0..n_subs)
        .map(|i| q.iter().zip(&ts[i..i + m]).map(|(a, b)| a * b).sum())
        .collect()
}

/// FFT-based O(n log n) sliding dot product via cross-correlation with the
/// reversed query.
pub fn sliding_dot_product_fft(q: &[f64], ts: &[f64]) -> Result<Vec<f64>> {
    SlidingSimilarity::with_strategy(ts, q.len(), DotProductStrategy::Fft)?.dot_products(q)
}

/// Apply an exclusion zone around index `idx`, setting entries within the zone to infinity.
///
/// The zone covers indices `[idx - zone, idx + zone]` (clamped to bounds).
#[inline]
pub fn apply_exclusion_zone(profile: &mut [f64], idx: usize, zone: usize) {
    if idx >= profile.len() + zone {
        return;
    }
    let start = idx.saturating_sub(zone);
    let end = (idx + zone + 1).min(profile.len());
    for val in &mut profile[start..end] {
        *val = f64::INFINITY;
    }
}
