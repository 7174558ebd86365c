use crate::{CompressionErr, Result};

/// The per-step transmission budget.
///
/// `k` is derived once from the model's total coordinate count and reused on
/// every step, it never depends on a batch's gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionBudget {
    ratio: f64,
    total: usize,
    k: usize,
}

impl CompressionBudget {
    /// Creates a new `CompressionBudget`.
    ///
    /// `k = max(1, floor(total * ratio))`, so at least one coordinate is sent
    /// on every step even under a degenerate ratio.
    ///
    /// # Arguments
    /// * `ratio` - Fraction of coordinates to send per step, in `[0, 1]`.
    /// * `total` - The model's total coordinate count.
    ///
    /// # Returns
    /// A new `CompressionBudget` or `InvalidRatio` when `ratio` is outside `[0, 1]` or NaN.
    pub fn new(ratio: f64, total: usize) -> Result<Self> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(CompressionErr::InvalidRatio(ratio));
        }

        let k = ((total as f64 * ratio).floor() as usize).max(1);
        Ok(Self { ratio, total, k })
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// The fraction of coordinates actually sent, `k / total`.
    ///
    /// A model without coordinates reports `1.0`.
    pub fn realized_ratio(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }

        (self.k as f64 / self.total as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_is_the_floor_of_the_ratio() {
        let budget = CompressionBudget::new(0.001, 25_450).unwrap();
        assert_eq!(budget.k(), 25);
        assert!((budget.realized_ratio() - 25.0 / 25_450.0).abs() < 1e-9);

        let budget = CompressionBudget::new(1.0, 7).unwrap();
        assert_eq!(budget.k(), 7);
        assert_eq!(budget.realized_ratio(), 1.0);
    }

    #[test]
    fn degenerate_budgets_clamp_to_one() {
        assert_eq!(CompressionBudget::new(0.0, 4).unwrap().k(), 1);
        assert_eq!(CompressionBudget::new(0.1, 4).unwrap().k(), 1);
        assert_eq!(CompressionBudget::new(0.5, 0).unwrap().k(), 1);
        assert_eq!(CompressionBudget::new(0.5, 0).unwrap().realized_ratio(), 1.0);
    }

    #[test]
    fn out_of_range_ratios_are_rejected() {
        for ratio in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                CompressionBudget::new(ratio, 10),
                Err(CompressionErr::InvalidRatio(_))
            ));
        }
    }
}
