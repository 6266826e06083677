//! Order statistics over interval aggregates

/// Nearest-rank percentile without interpolation
///
/// Sorts ascending and returns the element at `round(p/100 * (n-1))`.
/// `p` is clamped to `[0, 100]`. NaN samples are dropped. Returns `None`
/// when no sample is left.
pub fn percentile(p: f64, values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let idx = ((p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    Some(sorted[idx.min(sorted.len() - 1)])
}

/// Largest value, ignoring NaN
pub fn max_value(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .max_by(f64::total_cmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_nearest_rank() {
        let values = vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        // round(0.9 * 6) = 5
        assert_eq!(percentile(90.0, &values), Some(9.0));
    }

    #[test]
    fn test_percentile_ignores_input_order() {
        let sorted = vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0];
        let shuffled = vec![13.0, 1.0, 34.0, 5.0, 2.0, 21.0, 8.0, 3.0];
        for p in [0.0, 25.0, 50.0, 90.0, 99.0, 100.0] {
            assert_eq!(percentile(p, &sorted), percentile(p, &shuffled), "p{}", p);
        }
    }

    #[test]
    fn test_percentile_bounds() {
        let values = vec![3.5, -1.0, 7.25, 0.0, 2.0];
        assert_eq!(percentile(0.0, &values), Some(-1.0));
        assert_eq!(percentile(100.0, &values), Some(7.25));
        assert_eq!(percentile(150.0, &values), Some(7.25));
    }

    #[test]
    fn test_percentile_single_and_empty() {
        assert_eq!(percentile(90.0, &[42.0]), Some(42.0));
        assert_eq!(percentile(90.0, &[]), None);
    }

    #[test]
    fn test_percentile_skips_nan() {
        let values = vec![f64::NAN, 3.0, 1.0, f64::NAN, 2.0, f64::NAN, 5.0, 4.0];
        assert_eq!(percentile(0.0, &values), Some(1.0));
        assert_eq!(percentile(100.0, &values), Some(5.0));
        assert_eq!(percentile(50.0, &values), Some(3.0));
        assert_eq!(percentile(90.0, &[f64::NAN]), None);
    }

    #[test]
    fn test_max_value() {
        assert_eq!(max_value(vec![1.0, f64::NAN, 3.0, 2.0]), Some(3.0));
        assert_eq!(max_value(Vec::new()), None);
    }
}
