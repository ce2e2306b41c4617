//! Checked arithmetic exposed as tools

use crate::types::{RapportError, Result};

pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

pub fn multiply(a: f64, b: f64) -> f64 {
    a * b
}

pub fn divide(a: f64, b: f64) -> Result<f64> {
    if b == 0.0 {
        return Err(RapportError::Validation(
            "Division par zéro interdite.".to_string(),
        ));
    }
    Ok(a / b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        assert_eq!(add(2200.0, 100.0), 2300.0);
        assert_eq!(multiply(0.5, 4.0), 2.0);
        assert_eq!(divide(2200.0, 28000.0).unwrap() * 100.0, 2200.0 / 280.0);
    }

    #[test]
    fn test_divide_by_zero_is_validation_error() {
        let err = divide(1.0, 0.0).unwrap_err();
        assert!(matches!(err, RapportError::Validation(_)));
        assert!(err.to_string().contains("Division par zéro interdite."));
        assert!(divide(1.0, -0.0).is_err());
    }
}
