//! Malformed-row handling.
//!
//! A data row whose id is mapped but which carries fewer fields than the
//! inclusion flags require, or whose included fields are not valid UTF-8, is
//! *malformed*. What happens next is decided by a [`RowPolicy`]:
//!
//! | policy | row | parse |
//! |---|---|---|
//! | [`RowPolicy::FailFast`] (default) | - | fails with the row's [`TranslateError`] |
//! | [`RowPolicy::SkipInvalid`] | dropped, counted | continues |
//! | [`RowPolicy::LogAndContinue`] | dropped, counted, logged at `warn` | continues |
//!
//! Rows whose id is not in the row mapping are never checked: they are
//! dropped before projection.

use crate::error::TranslateError;
use serde::{Deserialize, Serialize};

/// Defines how to handle malformed data rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPolicy {
    /// Skip malformed rows silently and continue processing
    SkipInvalid,
    /// Log malformed rows and continue processing
    LogAndContinue,
    /// Fail the whole parse on the first malformed row
    #[default]
    FailFast,
}

/// What to do with one malformed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Verdict {
    Skip,
    Fail(TranslateError),
}

impl RowPolicy {
    pub(crate) fn judge(self, err: TranslateError) -> Verdict {
        match self {
            RowPolicy::SkipInvalid => Verdict::Skip,
            RowPolicy::LogAndContinue => {
                tracing::warn!(error = %err, "skipping malformed row");
                Verdict::Skip
            }
            RowPolicy::FailFast => Verdict::Fail(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_row() -> TranslateError {
        TranslateError::MalformedRow {
            offset: 10,
            expected: 3,
            found: 2,
        }
    }

    #[test]
    fn fail_fast_is_default() {
        assert_eq!(RowPolicy::default(), RowPolicy::FailFast);
        assert_eq!(RowPolicy::default().judge(short_row()), Verdict::Fail(short_row()));
    }

    #[test]
    fn lenient_policies_skip() {
        assert_eq!(RowPolicy::SkipInvalid.judge(short_row()), Verdict::Skip);
        assert_eq!(RowPolicy::LogAndContinue.judge(short_row()), Verdict::Skip);
    }

    #[test]
    fn policy_names_in_config() {
        let p: RowPolicy = serde_json::from_str("\"log_and_continue\"").unwrap();
        assert_eq!(p, RowPolicy::LogAndContinue);
    }
}
