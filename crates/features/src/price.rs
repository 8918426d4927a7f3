//! Top-of-book and fair-price features.

use skew_core::{Bba, Error, Level, OrderBook, Result};

/// Normalised best bid/ask quantity imbalance in `[-1, 1]`.
///
/// Both quantities zero gives NaN.
#[inline]
pub fn bba_imbalance(bba: &Bba) -> f64 {
    (bba.bid.qty / (bba.ask.qty + bba.bid.qty) - 0.5) * 2.0
}

/// Plain mid price.
#[inline]
pub fn mid_price(bba: &Bba) -> f64 {
    (bba.bid.price + bba.ask.price) / 2.0
}

/// Mid price pulled towards the side with less resting quantity.
///
/// A heavy bid pushes the price towards the ask, where the next trade is
/// more likely to print.
#[inline]
pub fn weighted_mid_price(bba: &Bba) -> f64 {
    let imb = bba.bid.qty / (bba.bid.qty + bba.ask.qty);
    bba.ask.price * imb + bba.bid.price * (1.0 - imb)
}

/// Quantity-weighted average price of the best `depth` levels.
fn side_fair_price(levels: &[Level], depth: usize) -> f64 {
    let top = &levels[..depth.min(levels.len())];
    let total_qty: f64 = top.iter().map(|l| l.qty).sum();
    top.iter().map(|l| l.price * (l.qty / total_qty)).sum()
}

/// Volume-adjusted mid price over the best `depth` levels of each side.
pub fn vamp(book: &OrderBook, depth: usize) -> Result<f64> {
    if depth == 0 {
        return Err(Error::shape("vamp depth must be at least 1"));
    }
    if book.bids.is_empty() || book.asks.is_empty() {
        return Err(Error::shape("vamp needs both book sides populated"));
    }

    let bid_fair = side_fair_price(&book.bids, depth);
    let ask_fair = side_fair_price(&book.asks, depth);
    Ok((bid_fair + ask_fair) / 2.0)
}

/// Log difference between two prices, scaled by 100.
///
/// Positive when `follow` trades above `base`.
#[inline]
pub fn log_price_difference(follow: f64, base: f64) -> f64 {
    (follow / base).ln() * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn bba(bid: (f64, f64), ask: (f64, f64)) -> Bba {
        Bba::new(Level::from(bid), Level::from(ask))
    }

    #[test]
    fn test_bba_imbalance() {
        assert_eq!(bba_imbalance(&bba((100.0, 3.0), (101.0, 1.0))), 0.5);
        assert_eq!(bba_imbalance(&bba((100.0, 1.0), (101.0, 3.0))), -0.5);
        assert_eq!(bba_imbalance(&bba((100.0, 2.0), (101.0, 2.0))), 0.0);
        assert_eq!(bba_imbalance(&bba((100.0, 2.0), (101.0, 0.0))), 1.0);
        assert!(bba_imbalance(&bba((100.0, 0.0), (101.0, 0.0))).is_nan());
    }

    #[test]
    fn test_mid_and_wmid() {
        let quote = bba((100.0, 3.0), (101.0, 1.0));
        assert_eq!(mid_price(&quote), 100.5);
        // imb = 0.75 -> 101 * 0.75 + 100 * 0.25
        assert_relative_eq!(weighted_mid_price(&quote), 100.75);

        let balanced = bba((100.0, 5.0), (101.0, 5.0));
        assert_relative_eq!(weighted_mid_price(&balanced), mid_price(&balanced));
    }

    #[test]
    fn test_vamp() {
        let book = OrderBook::new(
            vec![Level::new(100.0, 1.0), Level::new(99.0, 3.0), Level::new(98.0, 100.0)],
            vec![Level::new(101.0, 2.0), Level::new(102.0, 2.0)],
        );

        // depth 2: bid fair 99.25, ask fair 101.5
        assert_relative_eq!(vamp(&book, 2).unwrap(), 100.375, epsilon = 1e-12);
        // depth 1 reduces to the plain mid
        assert_relative_eq!(vamp(&book, 1).unwrap(), 100.5, epsilon = 1e-12);
        // depth beyond the book uses what is there
        assert!(vamp(&book, 10).unwrap() < vamp(&book, 2).unwrap());
    }

    #[test]
    fn test_vamp_errors() {
        let book = OrderBook::new(vec![Level::new(100.0, 1.0)], Vec::new());
        assert!(vamp(&book, 10).unwrap_err().is_shape());
        assert!(vamp(&OrderBook::default(), 10).is_err());

        let book = OrderBook::new(vec![Level::new(100.0, 1.0)], vec![Level::new(101.0, 1.0)]);
        assert!(vamp(&book, 0).is_err());
    }

    #[test]
    fn test_log_price_difference() {
        assert_abs_diff_eq!(log_price_difference(49000.0, 48980.0), 0.04082465866049452, epsilon = 1e-12);
        assert_abs_diff_eq!(log_price_difference(48980.0, 49000.0), -0.04082465866049452, epsilon = 1e-12);
        assert_eq!(log_price_difference(100.0, 100.0), 0.0);
    }
}
