//! PyO3 bindings for skew-signals Rust components.
//!
//! Exposes the signal functions to Python:
//! - Order book and trade flow imbalance
//! - EMA weight generation
//! - Top-of-book features
//! - Skew composition

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use skew_core::{
    Bba, Config as RustConfig, Error as RustError, Level, OrderBook, TradeRecord,
};
use skew_features::{
    self as features, SkewBreakdown as RustSkewBreakdown, SkewComposer,
    VenueFeatures as RustVenueFeatures, VenueSnapshot,
};

fn to_py_err(err: RustError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn to_levels(rows: Vec<[f64; 2]>) -> Vec<Level> {
    rows.into_iter().map(Level::from).collect()
}

fn to_trades(rows: Vec<[f64; 4]>) -> Vec<TradeRecord> {
    rows.into_iter().map(TradeRecord::from_row).collect()
}

// ============================================================================
// Functions
// ============================================================================

/// Depth-weighted order book imbalance.
///
/// `bids` and `asks` are `[price, qty]` rows, best first; `depths` in bps.
#[pyfunction]
fn orderbook_imbalance(bids: Vec<[f64; 2]>, asks: Vec<[f64; 2]>, depths: Vec<f64>) -> PyResult<f64> {
    features::orderbook_imbalance(&to_levels(bids), &to_levels(asks), &depths).map_err(to_py_err)
}

/// Recency-weighted trade flow imbalance over `[time, side, price, size]` rows.
#[pyfunction]
fn trades_imbalance(trades: Vec<[f64; 4]>, window: i64) -> PyResult<f64> {
    let window = usize::try_from(window)
        .map_err(|_| PyValueError::new_err(format!("window must be at least 1, got {window}")))?;
    features::trades_imbalance(&to_trades(trades), window).map_err(to_py_err)
}

/// EMA decay weights.
#[pyfunction]
#[pyo3(signature = (length, reverse=false))]
fn ema_weights(length: usize, reverse: bool) -> Vec<f64> {
    features::ema_weights(length, reverse)
}

/// Best bid/ask quantity imbalance from `[[bid_px, bid_qty], [ask_px, ask_qty]]`.
#[pyfunction]
fn bba_imbalance(bba: [[f64; 2]; 2]) -> f64 {
    features::bba_imbalance(&Bba::new(Level::from(bba[0]), Level::from(bba[1])))
}

/// Log price difference scaled by 100.
#[pyfunction]
fn log_price_difference(follow: f64, base: f64) -> f64 {
    features::log_price_difference(follow, base)
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// Market state of one venue.
#[pyclass]
#[derive(Clone)]
pub struct Venue {
    book: OrderBook,
    trades: Vec<TradeRecord>,
    #[pyo3(get, set)]
    pub mark_price: Option<f64>,
}

#[pymethods]
impl Venue {
    #[new]
    #[pyo3(signature = (bids, asks, trades, mark_price=None))]
    fn new(
        bids: Vec<[f64; 2]>,
        asks: Vec<[f64; 2]>,
        trades: Vec<[f64; 4]>,
        mark_price: Option<f64>,
    ) -> Self {
        Venue {
            book: OrderBook::new(to_levels(bids), to_levels(asks)),
            trades: to_trades(trades),
            mark_price,
        }
    }

    #[getter]
    fn depth(&self) -> (usize, usize) {
        (self.book.bids.len(), self.book.asks.len())
    }

    #[getter]
    fn trade_count(&self) -> usize {
        self.trades.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Venue(bids={}, asks={}, trades={}, mark_price={:?})",
            self.book.bids.len(),
            self.book.asks.len(),
            self.trades.len(),
            self.mark_price
        )
    }
}

impl Venue {
    fn snapshot(&self) -> VenueSnapshot<'_> {
        VenueSnapshot {
            book: &self.book,
            trades: &self.trades,
            mark_price: self.mark_price,
        }
    }
}

/// Features computed from a single venue.
#[pyclass]
#[derive(Clone)]
pub struct VenueFeatures {
    #[pyo3(get)]
    pub bba_imbalance: f64,
    #[pyo3(get)]
    pub wmid: f64,
    #[pyo3(get)]
    pub wmid_vamp_spread: f64,
    #[pyo3(get)]
    pub orderbook_imbalance: f64,
    #[pyo3(get)]
    pub trades_imbalance: f64,
}

impl From<RustVenueFeatures> for VenueFeatures {
    fn from(f: RustVenueFeatures) -> Self {
        VenueFeatures {
            bba_imbalance: f.bba_imbalance,
            wmid: f.wmid,
            wmid_vamp_spread: f.wmid_vamp_spread,
            orderbook_imbalance: f.orderbook_imbalance,
            trades_imbalance: f.trades_imbalance,
        }
    }
}

/// Composed skew with its components.
#[pyclass]
#[derive(Clone)]
pub struct SkewBreakdown {
    #[pyo3(get)]
    pub traded: VenueFeatures,
    #[pyo3(get)]
    pub mark_wmid_spread: Option<f64>,
    #[pyo3(get)]
    pub lead: Option<VenueFeatures>,
    #[pyo3(get)]
    pub lead_traded_wmid_spread: Option<f64>,
    #[pyo3(get)]
    pub total: f64,
}

#[pymethods]
impl SkewBreakdown {
    fn __repr__(&self) -> String {
        format!("SkewBreakdown(total={:.6}, dual={})", self.total, self.lead.is_some())
    }
}

impl From<RustSkewBreakdown> for SkewBreakdown {
    fn from(b: RustSkewBreakdown) -> Self {
        SkewBreakdown {
            traded: b.traded.into(),
            mark_wmid_spread: b.mark_wmid_spread,
            lead: b.lead.map(Into::into),
            lead_traded_wmid_spread: b.lead_traded_wmid_spread,
            total: b.total,
        }
    }
}

// ============================================================================
// Python-exposed Engine Classes
// ============================================================================

/// Skew composer configured from JSON.
#[pyclass]
pub struct PySkewComposer {
    config: RustConfig,
    inner: SkewComposer,
}

#[pymethods]
impl PySkewComposer {
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => RustConfig::from_json_str(json).map_err(to_py_err)?,
            None => RustConfig::default(),
        };
        let inner = SkewComposer::new(&config).map_err(to_py_err)?;
        Ok(PySkewComposer { config, inner })
    }

    /// Compose the skew for the traded venue and an optional lead venue.
    #[pyo3(signature = (traded, lead=None))]
    fn compose(&self, traded: &Venue, lead: Option<Venue>) -> PyResult<SkewBreakdown> {
        let lead_snapshot = lead.as_ref().map(Venue::snapshot);
        self.inner
            .compose(&traded.snapshot(), lead_snapshot.as_ref())
            .map(Into::into)
            .map_err(to_py_err)
    }

    /// Active configuration as JSON.
    fn config_json(&self) -> PyResult<String> {
        self.config.to_json_string().map_err(to_py_err)
    }
}

// ============================================================================
// Module Definition
// ============================================================================

/// Skew signals - order book and trade flow features for Python.
#[pymodule]
fn skew_signals(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Functions
    m.add_function(wrap_pyfunction!(orderbook_imbalance, m)?)?;
    m.add_function(wrap_pyfunction!(trades_imbalance, m)?)?;
    m.add_function(wrap_pyfunction!(ema_weights, m)?)?;
    m.add_function(wrap_pyfunction!(bba_imbalance, m)?)?;
    m.add_function(wrap_pyfunction!(log_price_difference, m)?)?;

    // Types
    m.add_class::<Venue>()?;
    m.add_class::<VenueFeatures>()?;
    m.add_class::<SkewBreakdown>()?;

    // Engine classes
    m.add_class::<PySkewComposer>()?;

    Ok(())
}
