//! Errors raised by the directory repositories

use sea_orm::DbErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The store rejected or failed the query
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A lookup that must match exactly one row matched none or several.
    /// This is a data-integrity violation, not a normal absence.
    #[error("Expected exactly one {what}, found {found}")]
    UnexpectedRowCount { what: String, found: usize },
}

/// Reduce `rows` to its single element or fail with `UnexpectedRowCount`
pub(crate) fn exactly_one<T>(mut rows: Vec<T>, what: &str) -> Result<T, RepositoryError> {
    if rows.len() == 1 {
        if let Some(row) = rows.pop() {
            return Ok(row);
        }
    }

    tracing::error!(found = rows.len(), "Expected exactly one {}", what);
    Err(RepositoryError::UnexpectedRowCount {
        what: what.to_owned(),
        found: rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_accepts_single_row() {
        assert_eq!(exactly_one(vec![7], "role").unwrap(), 7);
    }

    #[test]
    fn test_exactly_one_rejects_empty() {
        let err = exactly_one(Vec::<i32>::new(), "manager role").unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::UnexpectedRowCount { found: 0, .. }
        ));
        assert_eq!(err.to_string(), "Expected exactly one manager role, found 0");
    }

    #[test]
    fn test_exactly_one_rejects_multiple() {
        let err = exactly_one(vec![1, 2], "visitor role").unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::UnexpectedRowCount { found: 2, .. }
        ));
    }
}
