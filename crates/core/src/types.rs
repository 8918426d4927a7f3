//! Core data types: book levels, snapshots and trade records.

use serde::{Deserialize, Serialize};

/// Maximum levels kept per side when normalising a raw book.
pub const MAX_BOOK_LEVELS: usize = 500;

/// A single price level (price, quantity).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Level price.
    pub price: f64,
    /// Resting quantity at this price.
    pub qty: f64,
}

impl Level {
    #[inline]
    pub fn new(price: f64, qty: f64) -> Self {
        Self { price, qty }
    }
}

impl From<[f64; 2]> for Level {
    fn from(row: [f64; 2]) -> Self {
        Level::new(row[0], row[1])
    }
}

impl From<(f64, f64)> for Level {
    fn from((price, qty): (f64, f64)) -> Self {
        Level::new(price, qty)
    }
}

/// Which side of the book a level sequence belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookSide {
    Bid,
    Ask,
}

impl BookSide {
    /// Check that `levels` is ordered best-first for this side.
    ///
    /// Bids must be non-increasing in price, asks non-decreasing.
    pub fn is_sorted(self, levels: &[Level]) -> bool {
        levels.windows(2).all(|pair| match self {
            BookSide::Bid => pair[0].price >= pair[1].price,
            BookSide::Ask => pair[0].price <= pair[1].price,
        })
    }
}

/// Best bid and ask (top of book).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bba {
    /// Best bid level.
    pub bid: Level,
    /// Best ask level.
    pub ask: Level,
}

impl Bba {
    pub fn new(bid: Level, ask: Level) -> Self {
        Self { bid, ask }
    }

    /// Quoted spread.
    #[inline]
    pub fn spread(&self) -> f64 {
        self.ask.price - self.bid.price
    }
}

/// Order book snapshot, both sides ordered best price first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Bids, highest price first.
    pub bids: Vec<Level>,
    /// Asks, lowest price first.
    pub asks: Vec<Level>,
}

impl OrderBook {
    /// Create a book from sides that are already ordered best-first.
    pub fn new(bids: Vec<Level>, asks: Vec<Level>) -> Self {
        Self { bids, asks }
    }

    /// Create a book from raw levels in any order.
    ///
    /// Bids are sorted descending and asks ascending by price, then each side
    /// is cut to [`MAX_BOOK_LEVELS`].
    pub fn from_unsorted(mut bids: Vec<Level>, mut asks: Vec<Level>) -> Self {
        bids.sort_by(|a, b| b.price.total_cmp(&a.price));
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        bids.truncate(MAX_BOOK_LEVELS);
        asks.truncate(MAX_BOOK_LEVELS);
        Self { bids, asks }
    }

    /// Best bid level.
    pub fn best_bid(&self) -> Option<Level> {
        self.bids.first().copied()
    }

    /// Best ask level.
    pub fn best_ask(&self) -> Option<Level> {
        self.asks.first().copied()
    }

    /// Top of book, if both sides are populated.
    pub fn bba(&self) -> Option<Bba> {
        Some(Bba::new(self.best_bid()?, self.best_ask()?))
    }

    /// Check whether both sides are ordered best-first.
    pub fn is_sorted(&self) -> bool {
        BookSide::Bid.is_sorted(&self.bids) && BookSide::Ask.is_sorted(&self.asks)
    }
}

/// Aggressor side of a trade.
///
/// The discriminants match the numeric side flag of a raw tape row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TradeSide {
    /// Buyer-initiated.
    Buy = 0,
    /// Seller-initiated.
    Sell = 1,
}

impl TradeSide {
    /// Interpret a numeric side flag: `0.0` is a buy, anything else a sell.
    #[inline]
    pub fn from_flag(flag: f64) -> Self {
        if flag == 0.0 {
            TradeSide::Buy
        } else {
            TradeSide::Sell
        }
    }

    /// Numeric flag for this side.
    #[inline]
    pub fn flag(self) -> f64 {
        self as u8 as f64
    }

    /// +1 for buys, -1 for sells.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            TradeSide::Buy => 1.0,
            TradeSide::Sell => -1.0,
        }
    }

    /// The other side.
    pub fn opposite(self) -> Self {
        match self {
            TradeSide::Buy => TradeSide::Sell,
            TradeSide::Sell => TradeSide::Buy,
        }
    }
}

/// A single trade print.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Exchange timestamp, carried through but never used for ordering.
    pub timestamp: f64,
    /// Aggressor side.
    pub side: TradeSide,
    /// Trade price.
    pub price: f64,
    /// Trade size (non-negative).
    pub size: f64,
}

impl TradeRecord {
    pub fn new(timestamp: f64, side: TradeSide, price: f64, size: f64) -> Self {
        Self {
            timestamp,
            side,
            price,
            size,
        }
    }

    /// Build from a `[time, side, price, size]` tape row.
    pub fn from_row(row: [f64; 4]) -> Self {
        Self::new(row[0], TradeSide::from_flag(row[1]), row[2], row[3])
    }

    /// Inverse of [`TradeRecord::from_row`].
    pub fn to_row(&self) -> [f64; 4] {
        [self.timestamp, self.side.flag(), self.price, self.size]
    }
}

impl From<[f64; 4]> for TradeRecord {
    fn from(row: [f64; 4]) -> Self {
        TradeRecord::from_row(row)
    }
}
