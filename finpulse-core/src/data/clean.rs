//! Missing-data policy for aligned price tables.
//!
//! Applied in this order:
//! 1. forward-fill each column from its most recent valid value, which
//!    covers holidays that differ by exchange;
//! 2. drop every row still holding a missing value (the leading span a
//!    late-starting instrument leaves behind).
//!
//! Only NaN counts as missing. Non-positive prices pass through untouched.

use crate::domain::DailyTable;

/// Forward-fill NaN cells per column. Leading NaNs stay NaN.
pub fn forward_fill(table: &DailyTable) -> DailyTable {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            let mut last = f64::NAN;
            col.iter()
                .map(|&v| {
                    if v.is_nan() {
                        last
                    } else {
                        last = v;
                        v
                    }
                })
                .collect()
        })
        .collect();

    DailyTable::from_parts(
        table.dates().to_vec(),
        table.instruments().to_vec(),
        columns,
    )
}

/// Drop every row where any instrument is NaN.
pub fn drop_incomplete_rows(table: &DailyTable) -> DailyTable {
    let keep: Vec<usize> = (0..table.height())
        .filter(|&row| table.columns().iter().all(|col| !col[row].is_nan()))
        .collect();

    let dates = keep.iter().map(|&row| table.dates()[row]).collect();
    let columns = table
        .columns()
        .iter()
        .map(|col| keep.iter().map(|&row| col[row]).collect())
        .collect();

    DailyTable::from_parts(dates, table.instruments().to_vec(), columns)
}

/// Forward-fill, then drop rows that are still incomplete.
pub fn clean(table: &DailyTable) -> DailyTable {
    let filled = forward_fill(table);
    let cleaned = drop_incomplete_rows(&filled);
    let dropped = table.height() - cleaned.height();
    if dropped > 0 {
        tracing::debug!(dropped, remaining = cleaned.height(), "dropped incomplete leading rows");
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn table(columns: Vec<Vec<f64>>) -> DailyTable {
        let n = columns[0].len();
        let dates = (0..n).map(|i| d(2 + i as u32)).collect();
        let names = ["A", "B", "C"][..columns.len()]
            .iter()
            .map(|s| s.to_string())
            .collect();
        DailyTable::new(dates, names, columns).unwrap()
    }

    #[test]
    fn interior_gap_is_forward_filled_without_dropping_rows() {
        let nan = f64::NAN;
        let t = table(vec![
            vec![10.0, 11.0, 12.0, 13.0],
            vec![20.0, nan, 22.0, 23.0],
        ]);

        let cleaned = clean(&t);

        assert_eq!(cleaned.height(), 4);
        assert_eq!(cleaned.value(1, "B"), Some(20.0));
        assert!(cleaned.is_complete());
    }

    #[test]
    fn leading_gap_drops_rows_for_all_instruments() {
        let nan = f64::NAN;
        let t = table(vec![
            vec![10.0, 11.0, 12.0, 13.0, 14.0],
            vec![nan, nan, 22.0, 23.0, 24.0],
        ]);

        let cleaned = clean(&t);

        assert_eq!(cleaned.height(), 3);
        assert_eq!(cleaned.dates()[0], d(4));
        assert_eq!(cleaned.column("A"), Some(&[12.0, 13.0, 14.0][..]));
    }

    #[test]
    fn trailing_gap_carries_last_value() {
        let nan = f64::NAN;
        let t = table(vec![vec![1.0, 2.0, 3.0], vec![5.0, nan, nan]]);

        let cleaned = clean(&t);
        assert_eq!(cleaned.column("B"), Some(&[5.0, 5.0, 5.0][..]));
    }

    #[test]
    fn all_nan_column_empties_the_table() {
        let nan = f64::NAN;
        let t = table(vec![vec![1.0, 2.0], vec![nan, nan]]);

        let cleaned = clean(&t);
        assert!(cleaned.is_empty());
        assert_eq!(cleaned.width(), 2);
    }

    #[test]
    fn non_positive_prices_are_not_missing() {
        let t = table(vec![vec![1.0, 0.0, -2.0]]);
        let cleaned = clean(&t);
        assert_eq!(cleaned.column("A"), Some(&[1.0, 0.0, -2.0][..]));
    }
}
