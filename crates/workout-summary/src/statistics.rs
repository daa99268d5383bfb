//! Dispersion statistics over per-rep measurements

/// Scale (degrees) at which a standard deviation halves the consistency score
pub const CONSISTENCY_SCALE_DEG: f64 = 10.0;

/// Spread of one measurement across reps
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dispersion {
    /// Number of samples
    pub count: usize,
    /// Mean value
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl Dispersion {
    /// Compute dispersion from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        let variance = values
            .iter()
            .map(|v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        Self {
            count: values.len(),
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        }
    }

    /// Inverse-dispersion score in (0, 100]; 0 when there are no samples
    pub fn consistency_score(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        100.0 / (1.0 + self.std_dev / CONSISTENCY_SCALE_DEG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mean_and_range() {
        let stats = Dispersion::compute(&[70.0, 80.0, 90.0]);
        assert!((stats.mean - 80.0).abs() < 1e-9);
        assert_eq!(stats.min, 70.0);
        assert_eq!(stats.max, 90.0);
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_std_dev_computation() {
        let stats = Dispersion::compute(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.std_dev - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_values() {
        let stats = Dispersion::compute(&[]);
        assert_eq!(stats, Dispersion::default());
        assert_eq!(stats.consistency_score(), 0.0);
    }

    #[test]
    fn test_single_value_is_fully_consistent() {
        assert_eq!(Dispersion::compute(&[83.0]).consistency_score(), 100.0);
    }

    #[test]
    fn test_std_dev_of_scale_halves_score() {
        // Population std dev of [70, 90] is 10
        let score = Dispersion::compute(&[70.0, 90.0]).consistency_score();
        assert!((score - 50.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_consistency_bounded(values in proptest::collection::vec(0.0f64..180.0, 1..50)) {
            let score = Dispersion::compute(&values).consistency_score();
            prop_assert!(score > 0.0 && score <= 100.0);
        }
    }
}
