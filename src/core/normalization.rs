/// Z-normalize a series: subtract its mean and divide by its standard deviation.
///
/// The variance is floored at `epsilon` before the square root, so a constant
/// (or near-constant) series maps to values close to zero instead of dividing
/// by zero.
pub fn znorm(series: &[f64], epsilon: f64) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let var = series.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n;
    znorm_with(series, mean, var.max(epsilon).sqrt())
}

/// Z-normalize using a precomputed mean and (already floored) standard deviation.
///
/// Used by the join engine, which derives per-window statistics once from
/// cumulative sums instead of re-scanning every window.
pub fn znorm_with(series: &[f64], mean: f64, std: f64) -> Vec<f64> {
    let inv = 1.0 / std;
    series.iter().map(|x| (x - mean) * inv).collect()
}

/// Mean of `series`, or 0 when it is empty or not representable.
///
/// Used as the reference level subtracted before accumulating sums.
pub fn series_level(series: &[f64]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let level = series.iter().sum::<f64>() / series.len() as f64;
    if level.is_finite() {
        level
    } else {
        0.0
    }
}

/// Copy of `series` shifted by its own mean.
///
/// Z-normalized distances are shift-invariant, so joins run on centered
/// copies to keep dot products and sums small for data far from zero.
pub fn center(series: &[f64]) -> Vec<f64> {
    let level = series_level(series);
    series.iter().map(|x| x - level).collect()
}
