//! Instrument identifiers requested by the caller.

use serde::{Deserialize, Serialize};

/// Ordered, de-duplicated list of opaque instrument identifiers.
///
/// Identifiers are whatever the provider resolves (`AAPL`, `BTC-USD`, `GC=F`,
/// `IWDA.AS`); no format validation happens here. Order is kept for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct InstrumentSet(Vec<String>);

impl InstrumentSet {
    /// Build a set from any list of identifiers.
    ///
    /// Whitespace is trimmed, blanks are skipped and later duplicates are
    /// dropped in favor of the first occurrence.
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for symbol in symbols {
            let symbol = symbol.as_ref().trim();
            if symbol.is_empty() || out.iter().any(|s| s == symbol) {
                continue;
            }
            out.push(symbol.to_string());
        }
        Self(out)
    }

    /// Parse a comma-separated list such as `"AAPL, BTC-USD, GC=F"`.
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.iter().any(|s| s == symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for InstrumentSet {
    fn from(symbols: Vec<String>) -> Self {
        Self::new(symbols)
    }
}

impl From<InstrumentSet> for Vec<String> {
    fn from(set: InstrumentSet) -> Self {
        set.0
    }
}

impl std::fmt::Display for InstrumentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}
