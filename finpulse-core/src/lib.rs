//! FinPulse Core: market data extraction, return statistics, Parquet export.
//!
//! The crate is a three-stage pipeline:
//! - Extractor: fetch daily closes for an instrument set, align them on a
//!   common calendar, forward-fill gaps and drop incomplete leading rows
//! - Transformer: daily log-returns, base-100 relative performance,
//!   annualized volatility and the return correlation matrix
//! - Exporter: persist any of those tables as Parquet for later reuse
//!
//! Logging goes through `tracing`; installing a subscriber is the host's job.

pub mod analytics;
pub mod config;
pub mod data;
pub mod domain;
pub mod export;
pub mod pipeline;

pub use analytics::{transform, Analytics, TRADING_DAYS_PER_YEAR};
pub use config::{ConfigError, ExportTable, PipelineConfig, ProviderConfig};
pub use data::{DataError, Extractor, Lookback, PriceProvider, YahooProvider};
pub use domain::{
    CorrelationMatrix, DailyTable, InstrumentSet, PriceTable, ReturnTable, VolatilityVector,
};
pub use export::{ExportError, ParquetExporter};
pub use pipeline::{Pipeline, PipelineError, PipelineOutput};
