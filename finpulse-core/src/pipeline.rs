//! Extract → transform → export, run once per call.
//!
//! The pipeline holds no state between runs: every `run` fetches a fresh
//! price table and hands every intermediate back in `PipelineOutput`.

use crate::analytics::{self, Analytics};
use crate::config::{ExportTable, PipelineConfig};
use crate::data::{DataError, Extractor, PriceProvider};
use crate::domain::PriceTable;
use crate::export::{ExportError, ParquetExporter};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("extraction failed: {0}")]
    Data(#[from] DataError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub prices: PriceTable,
    pub analytics: Analytics,
    /// BLAKE3 hash of the price table, hex encoded.
    pub dataset_hash: String,
    /// Files written during this run, in export order.
    pub exported: Vec<(ExportTable, PathBuf)>,
}

pub struct Pipeline<'a> {
    provider: &'a dyn PriceProvider,
    config: PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(provider: &'a dyn PriceProvider, config: PipelineConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> Result<PipelineOutput, PipelineError> {
        let prices = Extractor::new(self.provider)
            .extract(&self.config.instruments, self.config.lookback)?;
        let dataset_hash = dataset_hash(&prices);
        tracing::debug!(%dataset_hash, "price table fingerprint");

        let analytics = analytics::transform(&prices);

        let exported = if self.config.export.tables.is_empty() {
            Vec::new()
        } else {
            let exporter = ParquetExporter::new(&self.config.export.output_dir);
            export_tables(&exporter, &self.config.export.tables, &prices, &analytics)?
        };

        Ok(PipelineOutput {
            prices,
            analytics,
            dataset_hash,
            exported,
        })
    }
}

/// Export the selected tables under their canonical names.
pub fn export_tables(
    exporter: &ParquetExporter,
    tables: &[ExportTable],
    prices: &PriceTable,
    analytics: &Analytics,
) -> Result<Vec<(ExportTable, PathBuf)>, ExportError> {
    tables
        .iter()
        .map(|&table| {
            let path = match table {
                ExportTable::Prices => exporter.export(prices, table.name())?,
                ExportTable::DailyReturns => exporter.export(&analytics.returns, table.name())?,
                ExportTable::Rebased => exporter.export(&analytics.rebased, table.name())?,
                ExportTable::Volatility => exporter.export(&analytics.volatility, table.name())?,
                ExportTable::Correlation => exporter.export(&analytics.correlation, table.name())?,
            };
            Ok((table, path))
        })
        .collect()
}

/// Content hash over dates, instrument names and raw value bits.
pub fn dataset_hash(prices: &PriceTable) -> String {
    let mut hasher = blake3::Hasher::new();
    for date in prices.dates() {
        hasher.update(date.to_string().as_bytes());
    }
    for (name, col) in prices.instruments().iter().zip(prices.columns()) {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
        for v in col {
            hasher.update(&v.to_bits().to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
