//! Descriptive statistics over price-change samples

/// Arithmetic mean, 0 for an empty slice
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population standard deviation (divides by N), 0 for fewer than 2 values
pub fn stddev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let variance = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean() {
        assert!((mean(&[1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_stddev_short_inputs() {
        assert_eq!(stddev(&[]), 0.0);
        assert_eq!(stddev(&[42.0]), 0.0);
    }

    #[test]
    fn test_stddev_constant() {
        for len in 2..20 {
            let xs = vec![3.75; len];
            assert_eq!(stddev(&xs), 0.0);
        }
    }

    #[test]
    fn test_stddev_is_population() {
        // sample stddev would be sqrt(32/7) ≈ 2.138
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((stddev(&xs) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_stddev_symmetric() {
        let xs = [-1.0, 1.0, -1.0, 1.0];
        assert!((stddev(&xs) - 1.0).abs() < 1e-12);
    }
}
