//! Plain-text rendering of pipeline output.
//!
//! Everything returns a `String` so the layouts can be tested without
//! capturing stdout.

use finpulse_core::analytics::day_change_pct;
use finpulse_core::{CorrelationMatrix, DailyTable, PriceTable, VolatilityVector};
use std::fmt::Write;

fn name_width(names: &[String]) -> usize {
    names.iter().map(|s| s.len()).max().unwrap_or(0).max(10)
}

fn fmt_num(v: f64, decimals: usize) -> String {
    if v.is_finite() {
        format!("{v:.decimals$}")
    } else {
        "n/a".to_string()
    }
}

fn fmt_pct(v: f64) -> String {
    if v.is_finite() {
        format!("{:+.2}%", v)
    } else {
        "n/a".to_string()
    }
}

/// Last price and day-over-day change per instrument.
pub fn market_summary(prices: &PriceTable) -> String {
    let w = name_width(prices.instruments());
    let mut out = String::new();
    let _ = writeln!(out, "{:<w$} {:>14} {:>10}", "Instrument", "Last", "Change");
    let _ = writeln!(out, "{}", "-".repeat(w + 26));
    for (name, change) in day_change_pct(prices) {
        let last = prices.last(&name).unwrap_or(f64::NAN);
        let _ = writeln!(
            out,
            "{:<w$} {:>14} {:>10}",
            name,
            fmt_num(last, 2),
            fmt_pct(change)
        );
    }
    out
}

/// Latest base-100 level per instrument, i.e. growth since the first day.
pub fn performance_table(rebased: &DailyTable) -> String {
    let w = name_width(rebased.instruments());
    let last = rebased
        .last_row()
        .unwrap_or_else(|| vec![f64::NAN; rebased.width()]);
    let mut out = String::new();
    let _ = writeln!(out, "{:<w$} {:>10} {:>10}", "Instrument", "Base 100", "Growth");
    let _ = writeln!(out, "{}", "-".repeat(w + 22));
    for (name, level) in rebased.instruments().iter().zip(last) {
        let _ = writeln!(
            out,
            "{:<w$} {:>10} {:>10}",
            name,
            fmt_num(level, 2),
            fmt_pct(level - 100.0)
        );
    }
    out
}

/// Annualized volatility as percentages.
pub fn volatility_table(vol: &VolatilityVector) -> String {
    let w = name_width(vol.instruments());
    let mut out = String::new();
    let _ = writeln!(out, "{:<w$} {:>12}", "Instrument", "Volatility");
    let _ = writeln!(out, "{}", "-".repeat(w + 13));
    for (name, v) in vol.iter() {
        let shown = if v.is_finite() {
            format!("{:.2}%", v * 100.0)
        } else {
            "n/a".to_string()
        };
        let _ = writeln!(out, "{:<w$} {:>12}", name, shown);
    }
    out
}

/// Correlation matrix with instrument labels on both axes.
pub fn correlation_table(corr: &CorrelationMatrix) -> String {
    let w = name_width(corr.instruments());
    let cell = corr
        .instruments()
        .iter()
        .map(|s| s.len())
        .max()
        .unwrap_or(0)
        .max(7);
    let mut out = String::new();

    let _ = write!(out, "{:<w$}", "");
    for name in corr.instruments() {
        let _ = write!(out, " {:>cell$}", name);
    }
    out.push('\n');

    for (name, row) in corr.instruments().iter().zip(corr.rows()) {
        let _ = write!(out, "{:<w$}", name);
        for &v in row {
            let _ = write!(out, " {:>cell$}", fmt_num(v, 3));
        }
        out.push('\n');
    }
    out
}

/// Alert line naming the most volatile instrument, if any is defined.
pub fn volatility_alert(vol: &VolatilityVector) -> Option<String> {
    vol.most_volatile()
        .map(|(name, v)| format!("Most volatile: {name} ({:.2}% annualized)", v * 100.0))
}

/// Daily report: one line per instrument with a direction marker, then the
/// volatility alert.
pub fn daily_report(prices: &PriceTable, vol: &VolatilityVector) -> String {
    let mut out = String::new();
    let date = prices
        .dates()
        .last()
        .map(|d| d.to_string())
        .unwrap_or_default();
    let _ = writeln!(out, "Daily report {date}");
    let _ = writeln!(out);
    for (name, change) in day_change_pct(prices) {
        let marker = if change.is_nan() {
            "="
        } else if change >= 0.0 {
            "▲"
        } else {
            "▼"
        };
        let last = prices.last(&name).unwrap_or(f64::NAN);
        let _ = writeln!(out, "{marker} {name}: {} ({})", fmt_num(last, 2), fmt_pct(change));
    }
    if let Some(alert) = volatility_alert(vol) {
        let _ = writeln!(out);
        let _ = writeln!(out, "{alert}");
    }
    out
}

/// The last `rows` rows of a daily table.
pub fn table_tail(table: &DailyTable, rows: usize) -> String {
    let tail = table.tail(rows);
    let cell = tail
        .instruments()
        .iter()
        .map(|s| s.len())
        .max()
        .unwrap_or(0)
        .max(12);
    let mut out = String::new();

    let _ = write!(out, "{:<10}", "Date");
    for name in tail.instruments() {
        let _ = write!(out, " {:>cell$}", name);
    }
    out.push('\n');

    for (i, date) in tail.dates().iter().enumerate() {
        let _ = write!(out, "{date}");
        for col in tail.columns() {
            let _ = write!(out, " {:>cell$}", fmt_num(col[i], 6));
        }
        out.push('\n');
    }
    out
}
