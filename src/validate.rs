// Request-shape checks, applied before any ledger access.
//
// Date ranges are deliberately NOT ordered-checked: an inverted range is
// accepted and yields an empty result set. Permissive by policy.

use crate::error::{EngineError, EngineResult};

/// Top-N limits must be strictly positive.
pub fn require_positive_limit(limit: i64) -> EngineResult<()> {
    if limit <= 0 {
        return Err(EngineError::InvalidArgument(
            "Limit must be greater than zero.".to_string(),
        ));
    }
    Ok(())
}

/// Entity identifiers must be strictly positive where validation applies.
/// `label` names the parameter in the rejection detail, e.g. "Item ID".
pub fn require_positive_id(id: i64, label: &str) -> EngineResult<()> {
    if id <= 0 {
        return Err(EngineError::InvalidArgument(format!(
            "{} must be greater than zero.",
            label
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_limit_accepted() {
        assert!(require_positive_limit(1).is_ok());
        assert!(require_positive_limit(100).is_ok());
    }

    #[test]
    fn test_non_positive_limit_rejected() {
        for limit in [0, -1, -50] {
            let err = require_positive_limit(limit).unwrap_err();
            assert_eq!(err.kind(), "InvalidArgument");
            assert!(err.to_string().contains("Limit must be greater than zero."));
        }
    }

    #[test]
    fn test_id_rejection_names_parameter() {
        let err = require_positive_id(0, "Item ID").unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");
        assert!(err.to_string().contains("Item ID must be greater than zero."));

        assert!(require_positive_id(7, "Item ID").is_ok());
    }
}
