/// Number of population standard deviations a value may sit from the mean
/// before it counts as an outlier.
pub const DEFAULT_STDDEV_FACTOR: f64 = 1.5;

/// Mean and spread based range check used by `--oddities`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierPolicy {
    pub factor: f64,
}

impl Default for OutlierPolicy {
    fn default() -> Self {
        Self {
            factor: DEFAULT_STDDEV_FACTOR,
        }
    }
}

/// Summary of the values seen by a scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub mean: f64,
    pub stddev: f64,
}

impl Spread {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len() as f64;
        let mean = values.iter().sum::<f64>() / count;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
        Some(Self {
            mean,
            stddev: variance.sqrt(),
        })
    }
}

impl OutlierPolicy {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    /// Inclusive range of values considered normal
    pub fn range(&self, spread: Spread) -> (f64, f64) {
        let band = self.factor * spread.stddev;
        (spread.mean - band, spread.mean + band)
    }

    /// Positions in `values` that fall strictly outside the normal range.
    pub fn scan(&self, values: &[f64]) -> Vec<usize> {
        let Some(spread) = Spread::of(values) else {
            return Vec::new();
        };
        if spread.stddev == 0.0 {
            return Vec::new();
        }
        let (low, high) = self.range(spread);
        log::debug!(
            "outlier range {:.2}..{:.2} (mean {:.2}, stddev {:.2})",
            low,
            high,
            spread.mean,
            spread.stddev
        );

        values
            .iter()
            .enumerate()
            .filter(|(_, value)| **value < low || **value > high)
            .map(|(position, _)| position)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_the_single_spike() {
        let values = [10.0, 10.0, 10.0, 10.0, 1000.0];
        assert_eq!(OutlierPolicy::default().scan(&values), vec![4]);
    }

    #[test]
    fn flags_low_values_too() {
        let values = [500.0, 510.0, 490.0, 505.0, 495.0, 0.0];
        assert_eq!(OutlierPolicy::default().scan(&values), vec![5]);
    }

    #[test]
    fn uniform_and_empty_columns_have_no_outliers() {
        assert!(OutlierPolicy::default().scan(&[3.0, 3.0, 3.0]).is_empty());
        assert!(OutlierPolicy::default().scan(&[]).is_empty());
    }

    #[test]
    fn boundary_value_is_in_range() {
        // mean 0, stddev 1: with factor 1.0 the values sit exactly on the edge
        let values = [-1.0, 1.0, -1.0, 1.0];
        assert!(OutlierPolicy::new(1.0).scan(&values).is_empty());
        assert_eq!(OutlierPolicy::new(0.5).scan(&values), vec![0, 1, 2, 3]);
    }
}
