use statrs::statistics::Statistics;

/// Pearson correlation of two equally long series.
///
/// `None` when fewer than two pairs exist or either side has no variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let covariance = a.iter().covariance(b.iter());
    let denominator = a.iter().std_dev() * b.iter().std_dev();
    if denominator > 0.0 && denominator.is_finite() {
        Some((covariance / denominator).clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Rescale so the first value maps to `base`.
pub fn rebase(values: &[f64], base: f64) -> Vec<f64> {
    match values.first() {
        Some(&first) if first != 0.0 => values.iter().map(|v| v / first * base).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfectly_linear_series_correlate() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b: Vec<f64> = a.iter().map(|x| 3.0 * x + 7.0).collect();
        let inverse: Vec<f64> = a.iter().map(|x| -0.5 * x).collect();
        assert!((pearson(&a, &b).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&a, &inverse).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn known_value() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 1.0, 4.0, 3.0];
        assert!((pearson(&a, &b).unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), None);
    }

    #[test]
    fn rebase_to_one_hundred() {
        assert_eq!(rebase(&[50.0, 75.0, 25.0], 100.0), vec![100.0, 150.0, 50.0]);
        assert!(rebase(&[], 100.0).is_empty());
        assert!(rebase(&[0.0, 1.0], 100.0).is_empty());
    }
}
