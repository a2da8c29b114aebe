//! Floating-point summary statistics over run samples.
//!
//! All functions return `None` instead of panicking when the input cannot
//! produce a defined value (empty slice, too few samples, non-positive
//! values for the geometric mean).

/// Arithmetic mean.
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Median; the mean of the two middle values for an even count.
pub fn median(samples: &[f64]) -> Option<f64> {
    let n = samples.len();
    if n == 0 {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    if n % 2 == 0 {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    } else {
        Some(sorted[n / 2])
    }
}

/// Sample standard deviation (n - 1 denominator) around a given center.
///
/// The center is used as-is, so passing the median yields the spread around
/// the median rather than around the mean.
pub fn stdev_around(samples: &[f64], center: f64) -> Option<f64> {
    let n = samples.len();
    if n < 2 {
        return None;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s - center) * (s - center)).sum();
    Some((sum_sq / (n - 1) as f64).sqrt())
}

/// Geometric mean: the n-th root of the product, computed in log space.
pub fn geometric_mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() || samples.iter().any(|&s| s <= 0.0 || !s.is_finite()) {
        return None;
    }
    if let [only] = samples {
        return Some(*only);
    }
    let log_sum: f64 = samples.iter().map(|s| s.ln()).sum();
    Some((log_sum / samples.len() as f64).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn mean_and_stdev_closed_form() {
        let samples = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&samples).unwrap();
        assert!((m - 5.0).abs() < EPS);
        let sd = stdev_around(&samples, m).unwrap();
        assert!((sd - (32.0f64 / 7.0).sqrt()).abs() < EPS);
        assert!((sd - 2.138).abs() < 1e-3);
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[5.0, 1.0, 9.0, 3.0, 7.0]), Some(5.0));
        assert_eq!(median(&[10.0, 20.0]), Some(15.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn stdev_around_median_differs_from_mean() {
        let samples = [1.0, 2.0, 10.0];
        let around_mean = stdev_around(&samples, mean(&samples).unwrap()).unwrap();
        let around_median = stdev_around(&samples, median(&samples).unwrap()).unwrap();
        assert!(around_median > around_mean);
    }

    #[test]
    fn stdev_needs_two_samples() {
        assert_eq!(stdev_around(&[42.0], 42.0), None);
        assert_eq!(stdev_around(&[], 0.0), None);
    }

    #[test]
    fn geometric_mean_values() {
        assert!((geometric_mean(&[2.0, 8.0]).unwrap() - 4.0).abs() < EPS);
        assert!((geometric_mean(&[3.0]).unwrap() - 3.0).abs() < EPS);
        assert!((geometric_mean(&[1.0, 10.0, 100.0]).unwrap() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn geometric_mean_rejects_non_positive() {
        assert_eq!(geometric_mean(&[]), None);
        assert_eq!(geometric_mean(&[1.0, 0.0]), None);
        assert_eq!(geometric_mean(&[1.0, -2.0]), None);
    }

    #[test]
    fn geometric_mean_not_above_arithmetic() {
        let samples = [1.0, 2.0, 4.0, 16.0];
        assert!(geometric_mean(&samples).unwrap() <= mean(&samples).unwrap());
    }
}
