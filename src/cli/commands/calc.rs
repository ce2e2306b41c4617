//! Calc Command
//!
//! Run one of the arithmetic tools from the command line.

use crate::tools::arithmetic;
use crate::types::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Multiply,
    Divide,
}

pub fn evaluate(op: Operation, a: f64, b: f64) -> Result<f64> {
    match op {
        Operation::Add => Ok(arithmetic::add(a, b)),
        Operation::Multiply => Ok(arithmetic::multiply(a, b)),
        Operation::Divide => arithmetic::divide(a, b),
    }
}

pub fn run(op: Operation, a: f64, b: f64) -> Result<()> {
    println!("{}", evaluate(op, a, b)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RapportError;

    #[test]
    fn test_evaluate() {
        assert_eq!(evaluate(Operation::Add, 1.5, 2.0).unwrap(), 3.5);
        assert_eq!(evaluate(Operation::Multiply, 3.0, 4.0).unwrap(), 12.0);
        assert_eq!(evaluate(Operation::Divide, 9.0, 3.0).unwrap(), 3.0);
        assert!(matches!(
            evaluate(Operation::Divide, 1.0, 0.0),
            Err(RapportError::Validation(_))
        ));
    }
}
