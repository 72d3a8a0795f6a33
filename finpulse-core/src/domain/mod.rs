//! Domain types: instrument sets, daily tables, derived statistics.

pub mod instruments;
pub mod stats;
pub mod table;

pub use instruments::InstrumentSet;
pub use stats::{CorrelationMatrix, VolatilityVector};
pub use table::{DailyTable, PriceTable, ReturnTable, TableError};
