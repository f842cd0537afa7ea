//! Validation helpers for DTOs.

use validator::ValidationError;

/// Maximum number of values a point pool may carry.
const MAX_POOL_SIZE: usize = 32;

/// Validates a pool definition: non-empty, strictly positive values, and no
/// duplicates (the pool is an ordered set).
pub fn validate_point_pool(pool: &[i64]) -> Result<(), ValidationError> {
    if pool.is_empty() {
        let mut err = ValidationError::new("point_pool_empty");
        err.message = Some("point pool must contain at least one value".into());
        return Err(err);
    }

    if pool.len() > MAX_POOL_SIZE {
        let mut err = ValidationError::new("point_pool_size");
        err.message =
            Some(format!("point pool may contain at most {MAX_POOL_SIZE} values").into());
        return Err(err);
    }

    if pool.iter().any(|value| *value <= 0) {
        let mut err = ValidationError::new("point_pool_value");
        err.message = Some("point pool values must be strictly positive".into());
        return Err(err);
    }

    for (index, value) in pool.iter().enumerate() {
        if pool[..index].contains(value) {
            let mut err = ValidationError::new("point_pool_duplicate");
            err.message = Some(format!("duplicate pool value {value}").into());
            return Err(err);
        }
    }

    Ok(())
}

/// Validates a display name: non-empty once trimmed.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_empty");
        err.message = Some("name must not be empty".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_pools_pass() {
        assert!(validate_point_pool(&[1, 3, 5]).is_ok());
        assert!(validate_point_pool(&[10]).is_ok());
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert!(validate_point_pool(&[]).is_err());
    }

    #[test]
    fn non_positive_values_are_rejected() {
        assert!(validate_point_pool(&[1, 0]).is_err());
        assert!(validate_point_pool(&[-2]).is_err());
    }

    #[test]
    fn duplicate_values_are_rejected() {
        assert!(validate_point_pool(&[1, 3, 3]).is_err());
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(validate_display_name("Quizzly Bears").is_ok());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name("").is_err());
    }
}
