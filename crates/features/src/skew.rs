//! Skew composition.
//!
//! Combines the price and flow features of the traded venue, and optionally a
//! lead venue, into a single weighted skew. A positive skew means the
//! features point to a higher price.

use serde::{Deserialize, Serialize};
use skew_core::{Config, Error, FeedMode, OrderBook, Result, SkewConfig, TradeRecord};
use tracing::{debug, trace};

use crate::orderbook_imbalance::OrderBookImbalanceCalculator;
use crate::price::{bba_imbalance, log_price_difference, vamp, weighted_mid_price};
use crate::trade_flow::TradeFlowImbalanceCalculator;

/// Borrowed market state of one venue.
#[derive(Debug, Clone, Copy)]
pub struct VenueSnapshot<'a> {
    /// Book snapshot, best levels first.
    pub book: &'a OrderBook,
    /// Recent trades, oldest first.
    pub trades: &'a [TradeRecord],
    /// Mark price, where the venue publishes one.
    pub mark_price: Option<f64>,
}

impl<'a> VenueSnapshot<'a> {
    pub fn new(book: &'a OrderBook, trades: &'a [TradeRecord]) -> Self {
        Self {
            book,
            trades,
            mark_price: None,
        }
    }

    pub fn with_mark_price(mut self, mark_price: f64) -> Self {
        self.mark_price = Some(mark_price);
        self
    }
}

/// Features computed from a single venue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VenueFeatures {
    pub bba_imbalance: f64,
    pub wmid: f64,
    pub wmid_vamp_spread: f64,
    pub orderbook_imbalance: f64,
    pub trades_imbalance: f64,
}

/// Every feature that entered the skew, plus the weighted total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkewBreakdown {
    pub traded: VenueFeatures,
    /// Mark price against traded wmid; `None` when no mark was supplied and
    /// the feature carries no weight.
    pub mark_wmid_spread: Option<f64>,
    pub lead: Option<VenueFeatures>,
    /// Lead wmid against traded wmid.
    pub lead_traded_wmid_spread: Option<f64>,
    pub total: f64,
}

/// Skew composer.
#[derive(Debug, Clone)]
pub struct SkewComposer {
    config: SkewConfig,
    depths: Vec<f64>,
    window: usize,
    orderbook: OrderBookImbalanceCalculator,
    trade_flow: TradeFlowImbalanceCalculator,
}

impl Default for SkewComposer {
    fn default() -> Self {
        let config = Config::default();
        Self::from_valid(&config)
    }
}

impl SkewComposer {
    /// Create a composer from a full configuration.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: &Config) -> Self {
        Self {
            config: config.skew.clone(),
            depths: config.orderbook.depths_bps.clone(),
            window: config.trade_flow.window,
            orderbook: OrderBookImbalanceCalculator::new(&config.orderbook, &config.weights),
            trade_flow: TradeFlowImbalanceCalculator::new(&config.weights),
        }
    }

    pub fn config(&self) -> &SkewConfig {
        &self.config
    }

    fn venue_features(&self, venue: &VenueSnapshot<'_>) -> Result<VenueFeatures> {
        let bba = venue
            .book
            .bba()
            .ok_or_else(|| Error::shape("venue book needs both sides populated"))?;
        let wmid = weighted_mid_price(&bba);
        let fair = vamp(venue.book, self.config.vamp_depth)?;

        Ok(VenueFeatures {
            bba_imbalance: bba_imbalance(&bba),
            wmid,
            wmid_vamp_spread: log_price_difference(fair, wmid),
            orderbook_imbalance: self
                .orderbook
                .compute(&venue.book.bids, &venue.book.asks, &self.depths)?,
            trades_imbalance: self.trade_flow.compute(venue.trades, self.window)?,
        })
    }

    /// Compose the skew for the traded venue and an optional lead venue.
    ///
    /// In single mode any lead venue is ignored; dual mode requires one.
    pub fn compose(
        &self,
        traded: &VenueSnapshot<'_>,
        lead: Option<&VenueSnapshot<'_>>,
    ) -> Result<SkewBreakdown> {
        let lead = match (self.config.mode, lead) {
            (FeedMode::Single, Some(_)) => {
                trace!("single feed mode, lead venue ignored");
                None
            }
            (FeedMode::Single, None) => None,
            (FeedMode::Dual, Some(lead)) => Some(lead),
            (FeedMode::Dual, None) => {
                return Err(Error::config("dual feed mode requires a lead venue"));
            }
        };

        let weights = &self.config.weights;
        let traded_features = self.venue_features(traded)?;

        let mark_wmid_spread = match traded.mark_price {
            Some(mark) => Some(log_price_difference(mark, traded_features.wmid)),
            None if weights.traded_mark_wmid_spread != 0.0 => {
                return Err(Error::data("traded venue mark price missing"));
            }
            None => None,
        };

        let lead_features = lead.map(|l| self.venue_features(l)).transpose()?;
        let lead_traded_wmid_spread =
            lead_features.map(|l| log_price_difference(l.wmid, traded_features.wmid));

        let mut terms = vec![
            ("traded_bba_imbalance", weights.traded_bba_imbalance, traded_features.bba_imbalance),
            ("traded_wmid_vamp_spread", weights.traded_wmid_vamp_spread, traded_features.wmid_vamp_spread),
            ("traded_orderbook_imbalance", weights.traded_orderbook_imbalance, traded_features.orderbook_imbalance),
            ("traded_trades_imbalance", weights.traded_trades_imbalance, traded_features.trades_imbalance),
        ];
        if let Some(spread) = mark_wmid_spread {
            terms.push(("traded_mark_wmid_spread", weights.traded_mark_wmid_spread, spread));
        }
        if let (Some(l), Some(spread)) = (lead_features, lead_traded_wmid_spread) {
            terms.extend([
                ("lead_bba_imbalance", weights.lead_bba_imbalance, l.bba_imbalance),
                ("lead_traded_wmid_spread", weights.lead_traded_wmid_spread, spread),
                ("lead_wmid_vamp_spread", weights.lead_wmid_vamp_spread, l.wmid_vamp_spread),
                ("lead_orderbook_imbalance", weights.lead_orderbook_imbalance, l.orderbook_imbalance),
                ("lead_trades_imbalance", weights.lead_trades_imbalance, l.trades_imbalance),
            ]);
        }

        let mut total = 0.0;
        for (feature, weight, value) in terms {
            if !value.is_finite() {
                debug!(feature, value, "non-finite skew component");
            }
            total += weight * value;
        }

        trace!(total, dual = lead_features.is_some(), "skew composed");

        Ok(SkewBreakdown {
            traded: traded_features,
            mark_wmid_spread,
            lead: lead_features,
            lead_traded_wmid_spread,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use skew_core::{Level, SkewWeights, TradeSide};

    fn book(offset: f64) -> OrderBook {
        OrderBook::new(
            vec![Level::new(100.0 + offset, 3.0), Level::new(99.0 + offset, 1.0)],
            vec![Level::new(101.0 + offset, 1.0), Level::new(102.0 + offset, 3.0)],
        )
    }

    fn trades(side: TradeSide, n: usize) -> Vec<TradeRecord> {
        (0..n)
            .map(|i| TradeRecord::new(i as f64, side, 100.0, 0.5))
            .collect()
    }

    fn dual_config() -> Config {
        Config {
            skew: SkewConfig::dual(),
            ..Config::default()
        }
    }

    #[test]
    fn test_venue_features() {
        let book = book(0.0);
        let buys = trades(TradeSide::Buy, 4);
        let composer = SkewComposer::default();
        let features = composer.venue_features(&VenueSnapshot::new(&book, &buys)).unwrap();

        assert_eq!(features.bba_imbalance, 0.5);
        assert_abs_diff_eq!(features.wmid, 100.75, epsilon = 1e-12);
        // vamp over both levels equals the wmid for this book
        assert_abs_diff_eq!(features.wmid_vamp_spread, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(features.orderbook_imbalance, 0.0, epsilon = 1e-12);
        assert_eq!(features.trades_imbalance, 1.0);
    }

    #[test]
    fn test_single_venue() {
        let book = book(0.0);
        let buys = trades(TradeSide::Buy, 4);
        let traded = VenueSnapshot::new(&book, &buys).with_mark_price(100.75);

        let breakdown = SkewComposer::default().compose(&traded, None).unwrap();

        // 0.10 * 0.5 (bba) + 0.25 * 1.0 (trades); other features are flat
        assert_abs_diff_eq!(breakdown.total, 0.3, epsilon = 1e-9);
        assert_eq!(breakdown.mark_wmid_spread, Some(0.0));
        assert!(breakdown.lead.is_none());
    }

    #[test]
    fn test_single_mode_ignores_lead() {
        let book = book(0.0);
        let buys = trades(TradeSide::Buy, 4);
        let sells = trades(TradeSide::Sell, 4);
        let traded = VenueSnapshot::new(&book, &buys).with_mark_price(100.75);
        let lead = VenueSnapshot::new(&book, &sells);

        let composer = SkewComposer::default();
        let with_lead = composer.compose(&traded, Some(&lead)).unwrap();
        let without = composer.compose(&traded, None).unwrap();
        assert_eq!(with_lead, without);
    }

    #[test]
    fn test_dual_venue() {
        let traded_book = book(0.0);
        let lead_book = book(0.1);
        let buys = trades(TradeSide::Buy, 4);
        let sells = trades(TradeSide::Sell, 4);
        let traded = VenueSnapshot::new(&traded_book, &buys).with_mark_price(100.75);
        let lead = VenueSnapshot::new(&lead_book, &sells);

        let composer = SkewComposer::new(&dual_config()).unwrap();
        let breakdown = composer.compose(&traded, Some(&lead)).unwrap();

        let spread = (100.85f64 / 100.75).ln() * 100.0;
        assert_abs_diff_eq!(breakdown.lead_traded_wmid_spread.unwrap(), spread, epsilon = 1e-9);

        let expected = 0.025 * 0.5 + 0.1 * 1.0 + 0.025 * 0.5 + 0.075 * spread + 0.2 * -1.0;
        assert_abs_diff_eq!(breakdown.total, expected, epsilon = 1e-9);
        assert_eq!(breakdown.lead.unwrap().trades_imbalance, -1.0);
    }

    #[test]
    fn test_dual_requires_lead() {
        let book = book(0.0);
        let buys = trades(TradeSide::Buy, 4);
        let traded = VenueSnapshot::new(&book, &buys).with_mark_price(100.0);

        let composer = SkewComposer::new(&dual_config()).unwrap();
        let err = composer.compose(&traded, None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_mark_price() {
        let book = book(0.0);
        let buys = trades(TradeSide::Buy, 4);
        let traded = VenueSnapshot::new(&book, &buys);

        let err = SkewComposer::default().compose(&traded, None).unwrap_err();
        assert!(matches!(err, Error::Data(_)));

        // Not needed when the feature carries no weight
        let mut config = Config::default();
        config.skew.weights = SkewWeights {
            traded_mark_wmid_spread: 0.0,
            ..SkewWeights::single_venue()
        };
        let breakdown = SkewComposer::new(&config).unwrap().compose(&traded, None).unwrap();
        assert!(breakdown.mark_wmid_spread.is_none());
        assert_abs_diff_eq!(breakdown.total, 0.3, epsilon = 1e-9);
    }

    #[test]
    fn test_nan_component_propagates() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();

        let book = book(0.0);
        let traded = VenueSnapshot::new(&book, &[]).with_mark_price(100.75);

        let breakdown = SkewComposer::default().compose(&traded, None).unwrap();
        assert!(breakdown.traded.trades_imbalance.is_nan());
        assert!(breakdown.total.is_nan());
    }

    #[test]
    fn test_unweighted_nan_component_propagates() {
        let mut config = Config::default();
        config.skew.weights = SkewWeights {
            traded_trades_imbalance: 0.0,
            ..SkewWeights::single_venue()
        };

        let book = book(0.0);
        let traded = VenueSnapshot::new(&book, &[]).with_mark_price(100.75);
        let breakdown = SkewComposer::new(&config).unwrap().compose(&traded, None).unwrap();
        assert!(breakdown.traded.trades_imbalance.is_nan());
        assert!(breakdown.total.is_nan());
    }

    #[test]
    fn test_empty_book_side() {
        let book = OrderBook::new(vec![Level::new(100.0, 1.0)], Vec::new());
        let buys = trades(TradeSide::Buy, 2);
        let traded = VenueSnapshot::new(&book, &buys).with_mark_price(100.0);

        let err = SkewComposer::default().compose(&traded, None).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = Config::default();
        config.trade_flow.window = 0;
        assert!(SkewComposer::new(&config).is_err());
    }

    #[test]
    fn test_breakdown_serializes() {
        let book = book(0.0);
        let buys = trades(TradeSide::Buy, 4);
        let traded = VenueSnapshot::new(&book, &buys).with_mark_price(100.75);
        let breakdown = SkewComposer::default().compose(&traded, None).unwrap();

        let json = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(json["traded"]["trades_imbalance"], 1.0);
        assert!(json["lead"].is_null());
    }
}
