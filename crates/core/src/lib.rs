//! Core types and configuration for the skew-signals workspace.
//!
//! This crate provides shared types used across all other crates:
//! - Order book and trade tape value types
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    Config, DepthUnits, FeedMode, OrderBookConfig, SkewConfig, SkewWeights, TradeFlowConfig,
    WeightConfig, WeightScheme,
};
pub use error::{Error, Result};
pub use types::*;
