//! Exponential decay weights.
//!
//! Both imbalance calculators aggregate with a geometric weight vector sized
//! to their own problem. The generator sits behind [`WeightGenerator`] so the
//! calculators can be driven by any decay shape.

use skew_core::{WeightConfig, WeightScheme};

/// Produces an ordered vector of non-negative aggregation weights.
pub trait WeightGenerator {
    /// Weights for `n` positions.
    ///
    /// Without `reverse` the highest weight sits at index 0 and decays
    /// towards `n - 1`; with `reverse` the order is flipped.
    fn weights(&self, n: usize, reverse: bool) -> Vec<f64>;
}

impl<W: WeightGenerator + ?Sized> WeightGenerator for &W {
    fn weights(&self, n: usize, reverse: bool) -> Vec<f64> {
        (**self).weights(n, reverse)
    }
}

/// EMA-shaped weights: `alpha * (1 - alpha)^i`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmaWeights {
    /// Fixed decay factor, or `3 / (n + 1)` when unset.
    alpha: Option<f64>,
    scheme: WeightScheme,
}

impl EmaWeights {
    /// Create a generator from configuration.
    pub fn new(config: &WeightConfig) -> Self {
        Self {
            alpha: config.alpha,
            scheme: config.scheme,
        }
    }

    /// Raw decay terms with the length-derived alpha.
    pub fn legacy() -> Self {
        Self::default()
    }

    /// Decay terms rescaled to sum to one.
    pub fn normalized() -> Self {
        Self {
            alpha: None,
            scheme: WeightScheme::Normalized,
        }
    }

    /// Use a fixed decay factor regardless of vector length.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Decay factor used for a vector of length `n`.
    #[inline]
    pub fn alpha_for(&self, n: usize) -> f64 {
        self.alpha.unwrap_or(3.0 / (n as f64 + 1.0))
    }

    pub fn scheme(&self) -> WeightScheme {
        self.scheme
    }
}

impl WeightGenerator for EmaWeights {
    fn weights(&self, n: usize, reverse: bool) -> Vec<f64> {
        let alpha = self.alpha_for(n);
        let decay = 1.0 - alpha;

        let mut weights: Vec<f64> = (0..n).map(|i| alpha * decay.powi(i as i32)).collect();

        if self.scheme == WeightScheme::Normalized {
            let total: f64 = weights.iter().sum();
            if total > 0.0 {
                weights.iter_mut().for_each(|w| *w /= total);
            }
        }

        if reverse {
            weights.reverse();
        }
        weights
    }
}

/// Weights from the default generator.
pub fn ema_weights(length: usize, reverse: bool) -> Vec<f64> {
    EmaWeights::default().weights(length, reverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_legacy_values() {
        let w = ema_weights(5, false);
        assert_eq!(w, vec![0.5, 0.25, 0.125, 0.0625, 0.03125]);

        let r = ema_weights(5, true);
        assert_eq!(r, vec![0.03125, 0.0625, 0.125, 0.25, 0.5]);
    }

    #[test]
    fn test_legacy_sum() {
        // Raw terms sum to 1 - (1 - alpha)^n
        for n in [2usize, 5, 6, 50, 1000] {
            let generator = EmaWeights::legacy();
            let alpha = generator.alpha_for(n);
            let total: f64 = generator.weights(n, false).iter().sum();
            assert_relative_eq!(total, 1.0 - (1.0 - alpha).powi(n as i32), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_contract_non_negative() {
        for generator in [EmaWeights::legacy(), EmaWeights::normalized(), EmaWeights::normalized().with_alpha(0.1)] {
            for n in 1..64 {
                for reverse in [false, true] {
                    let w = generator.weights(n, reverse);
                    assert_eq!(w.len(), n);
                    assert!(w.iter().all(|x| *x >= 0.0 && x.is_finite()), "n={n}");
                }
            }
        }
    }

    #[test]
    fn test_contract_normalized_sums_to_one() {
        let generator = EmaWeights::normalized();
        for n in 1..=1000 {
            let total: f64 = generator.weights(n, n % 2 == 0).iter().sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_monotone_decay() {
        let w = EmaWeights::normalized().weights(20, false);
        assert!(w.windows(2).all(|p| p[0] >= p[1]));

        let r = EmaWeights::normalized().weights(20, true);
        assert!(r.windows(2).all(|p| p[0] <= p[1]));
        assert_eq!(r.last(), w.first());
    }

    #[test]
    fn test_fixed_alpha() {
        let generator = EmaWeights::legacy().with_alpha(0.2);
        assert_eq!(generator.alpha_for(3), 0.2);
        assert_eq!(generator.alpha_for(300), 0.2);

        let w = generator.weights(3, false);
        assert_relative_eq!(w[0], 0.2);
        assert_relative_eq!(w[1], 0.16);
        assert_relative_eq!(w[2], 0.128);
    }

    #[test]
    fn test_from_config() {
        let config = WeightConfig {
            alpha: Some(0.5),
            scheme: WeightScheme::Normalized,
        };
        let generator = EmaWeights::new(&config);
        assert_eq!(generator.scheme(), WeightScheme::Normalized);
        assert_eq!(generator, EmaWeights::normalized().with_alpha(0.5));
    }

    #[test]
    fn test_short_vectors() {
        assert!(ema_weights(0, false).is_empty());
        // alpha = 1.5 for a single position; the raw term is alpha itself
        assert_eq!(ema_weights(1, false), vec![1.5]);
        assert_eq!(ema_weights(2, true), vec![0.0, 1.0]);
        assert_eq!(EmaWeights::normalized().weights(1, false), vec![1.0]);
    }
}
