//! Assertion helpers for translated tables.

use crate::table::{Row, Table};

/// Assert that two tables have the same header and the same rows in the same
/// order.
///
/// # Panics
///
/// Panics with the first differing row if the tables differ.
pub fn assert_tables_equal(actual: &Table, expected: &Table) {
    assert_eq!(
        actual.header(),
        expected.header(),
        "Header mismatch:\n  Expected: {:?}\n  Actual: {:?}",
        expected.header(),
        actual.header()
    );
    assert_row_slices_equal(actual.rows(), expected.rows());
}

/// Assert that `actual` rows equal `expected`, given as anything that views
/// as a slice of strings (arrays, vectors, slices).
///
/// # Panics
///
/// Panics on a length mismatch or with the first differing row.
///
/// # Example
///
/// ```
/// use tsvmap::testing::assert_rows_equal;
///
/// let rows = vec![vec!["R1".to_string(), "a".to_string()]];
/// assert_rows_equal(&rows, &[["R1", "a"]]);
/// ```
pub fn assert_rows_equal<R, S>(actual: &[Row], expected: &[R])
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let expected: Vec<Row> = expected
        .iter()
        .map(|row| row.as_ref().iter().map(|f| f.as_ref().to_string()).collect())
        .collect();
    assert_row_slices_equal(actual, &expected);
}

fn assert_row_slices_equal(actual: &[Row], expected: &[Row]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Row count mismatch:\n  Expected: {}\n  Actual: {}",
        expected.len(),
        actual.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(a, e, "Row mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}");
    }
}
