use serde::{Deserialize, Serialize};

/// Descriptive statistics over one numeric list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub mean: f64,
    pub median: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Mean and spread of pairwise (model - ref) deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffStats {
    pub mean_diff: f64,
    pub stdev_diff: f64,
    pub count: usize,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation; 0 for a single value, None for none.
pub fn stdev(values: &[f64]) -> Option<f64> {
    match values.len() {
        0 => None,
        1 => Some(0.0),
        n => {
            let m = mean(values)?;
            let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
            Some(var.sqrt())
        }
    }
}

/// Full descriptive summary; None for empty input.
pub fn summarize(values: &[f64]) -> Option<ScoreStats> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(ScoreStats {
        mean: mean(values)?,
        median: median(values)?,
        stdev: stdev(values)?,
        min,
        max,
        count: values.len(),
    })
}

/// Average pairwise absolute difference; defined only for non-empty lists of
/// equal length.
pub fn mean_abs_diff(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return None;
    }
    let diffs: Vec<f64> = a.iter().zip(b).map(|(x, y)| (x - y).abs()).collect();
    mean(&diffs)
}

/// Fraction of pairwise exact equalities; defined only for non-empty lists
/// of equal length.
pub fn exact_match_rate<T: PartialEq>(a: &[T], b: &[T]) -> Option<f64> {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return None;
    }
    let matches = a.iter().zip(b).filter(|(x, y)| x == y).count();
    Some(matches as f64 / a.len() as f64)
}

/// Sample Pearson correlation; None for fewer than two points, mismatched
/// lengths, or zero variance on either side.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() < 2 || xs.len() != ys.len() {
        return None;
    }
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;
    let cov = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum::<f64>()
        / (xs.len() - 1) as f64;
    let sx = stdev(xs)?;
    let sy = stdev(ys)?;
    if sx == 0.0 || sy == 0.0 {
        return None;
    }
    Some(cov / (sx * sy))
}

/// Statistics over pairwise (second - first) deltas, taken over the common
/// prefix of the two lists. None when either list is empty.
pub fn diff_stats(first: &[f64], second: &[f64]) -> Option<DiffStats> {
    if first.is_empty() || second.is_empty() {
        return None;
    }
    let diffs: Vec<f64> = second.iter().zip(first).map(|(s, f)| s - f).collect();
    Some(DiffStats {
        mean_diff: mean(&diffs)?,
        stdev_diff: stdev(&diffs)?,
        count: diffs.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_median() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(median(&[1.0, 3.0, 2.0]), Some(2.0));
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    #[test]
    fn test_stdev_edge_cases() {
        assert_eq!(stdev(&[]), None);
        assert_eq!(stdev(&[5.0]), Some(0.0));
        // Sample stdev of [1, 3] is sqrt(2).
        assert!((stdev(&[1.0, 3.0]).unwrap() - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_summarize() {
        assert_eq!(summarize(&[]), None);
        let stats = summarize(&[2.0, 0.0, 1.0]).unwrap();
        assert_eq!(stats.mean, 1.0);
        assert_eq!(stats.median, 1.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 2.0);
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_mean_abs_diff_symmetry_and_sign() {
        let a = [1.0, 2.0, 5.0];
        let b = [2.0, 0.0, 5.0];
        let d = mean_abs_diff(&a, &b).unwrap();
        assert_eq!(mean_abs_diff(&b, &a), Some(d));
        assert!(d >= 0.0);
        assert_eq!(mean_abs_diff(&a, &[1.0]), None);
        assert_eq!(mean_abs_diff(&[], &[]), None);
    }

    #[test]
    fn test_exact_match_rate_identity() {
        let a = ["x", "y", "z"];
        assert_eq!(exact_match_rate(&a, &a), Some(1.0));
        assert_eq!(
            exact_match_rate(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]),
            Some(2.0 / 3.0)
        );
        assert_eq!(exact_match_rate::<i64>(&[], &[]), None);
    }

    #[test]
    fn test_pearson_defined() {
        let x = [1.0, 2.0, 3.0];
        let y = [2.0, 4.0, 6.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        let inv = [3.0, 2.0, 1.0];
        assert!((pearson(&x, &inv).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_undefined_on_zero_variance() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn test_diff_stats() {
        let d = diff_stats(&[1.0, 1.0], &[2.0, 3.0]).unwrap();
        assert_eq!(d.mean_diff, 1.5);
        assert_eq!(d.count, 2);
        assert_eq!(diff_stats(&[], &[1.0]), None);
    }
}
