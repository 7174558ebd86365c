use std::num::NonZeroUsize;

use serde::Deserialize;

fn default_factor() -> f32 {
    0.1
}

/// Step decay of the learning rate on a fixed epoch cadence.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LrDecay {
    pub period: NonZeroUsize,
    #[serde(default = "default_factor")]
    pub factor: f32,
}

impl LrDecay {
    pub fn new(period: NonZeroUsize, factor: f32) -> Self {
        Self { period, factor }
    }

    /// Returns true if the learning rate decays at the start of `epoch`.
    #[inline]
    pub fn applies(&self, epoch: usize) -> bool {
        (epoch + 1) % self.period.get() == 0
    }

    /// The learning rate for `epoch` given the one used so far.
    #[inline]
    pub fn next(&self, epoch: usize, lr: f32) -> f32 {
        if self.applies(epoch) {
            lr * self.factor
        } else {
            lr
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_schedule() {
        let d = LrDecay::new(NonZeroUsize::new(3).unwrap(), 0.5);
        assert!(!d.applies(0));
        assert!(!d.applies(1));
        assert!(d.applies(2));
        assert!(!d.applies(3));
        assert!(!d.applies(4));
        assert!(d.applies(5));

        assert_eq!(d.next(1, 0.4), 0.4);
        assert_eq!(d.next(2, 0.4), 0.2);
    }

    #[test]
    fn factor_defaults_to_a_tenth() {
        let d: LrDecay = serde_json::from_str(r#"{ "period": 2 }"#).unwrap();
        assert_eq!(d, LrDecay::new(NonZeroUsize::new(2).unwrap(), 0.1));
    }
}
