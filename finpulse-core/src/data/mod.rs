//! Market data extraction: provider boundary, alignment, cleaning.

pub mod align;
pub mod clean;
pub mod extract;
pub mod provider;
pub mod yahoo;

pub use align::{align_symbols, PriceField};
pub use clean::{clean, drop_incomplete_rows, forward_fill};
pub use extract::Extractor;
pub use provider::{DataError, DataSource, FetchResult, Lookback, PriceProvider, RawBar};
pub use yahoo::YahooProvider;
