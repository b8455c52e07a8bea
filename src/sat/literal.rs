#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Literals over the variable universe `1..=n`.
//!
//! A literal keeps its DIMACS encoding: a positive integer `v` is the positive
//! occurrence of variable `v`, `-v` the negated one. Zero is the DIMACS clause
//! terminator and never a literal, so the value is stored as a `NonZeroI32`.

use crate::sat::error::FormulaError;
use core::num::NonZeroI32;
use core::ops::{Neg, Not};
use std::fmt::{Display, Formatter};

/// Index of a boolean variable. Index `0` is reserved and never refers to a variable.
pub type Variable = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal(NonZeroI32);

impl Literal {
    /// Builds the literal of `var` with the given polarity (`true` for the positive occurrence).
    ///
    /// # Panics
    ///
    /// If `var` is zero or does not fit into an `i32`.
    #[must_use]
    pub fn new(var: Variable, polarity: bool) -> Self {
        let v = i32::try_from(var).unwrap_or_else(|_| panic!("variable {var} exceeds i32 range"));
        let value = NonZeroI32::new(if polarity { v } else { -v })
            .unwrap_or_else(|| panic!("variable 0 has no literals"));
        Self(value)
    }

    #[must_use]
    pub const fn variable(self) -> Variable {
        self.0.get().unsigned_abs() as Variable
    }

    /// `true` for the positive occurrence of the variable.
    #[must_use]
    pub const fn polarity(self) -> bool {
        self.0.get() > 0
    }

    #[must_use]
    pub const fn is_negated(self) -> bool {
        !self.polarity()
    }

    #[must_use]
    pub const fn negated(self) -> Self {
        Self(self.0.wrapping_neg())
    }

    #[must_use]
    pub const fn to_i32(self) -> i32 {
        self.0.get()
    }

    /// The value the underlying variable must take for this literal to evaluate to `value`.
    #[must_use]
    pub const fn variable_value(self, value: bool) -> bool {
        if self.polarity() { value } else { !value }
    }
}

impl TryFrom<i32> for Literal {
    type Error = FormulaError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        NonZeroI32::new(value)
            .filter(|v| v.get() != i32::MIN)
            .map(Self)
            .ok_or(FormulaError::InvalidLiteral {
                literal: value,
                num_vars: 0,
            })
    }
}

impl From<Literal> for i32 {
    fn from(lit: Literal) -> Self {
        lit.to_i32()
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let pos = Literal::new(3, true);
        let neg = Literal::new(3, false);

        assert_eq!(pos.variable(), 3);
        assert_eq!(neg.variable(), 3);
        assert!(pos.polarity());
        assert!(neg.is_negated());
        assert_eq!(pos.to_i32(), 3);
        assert_eq!(neg.to_i32(), -3);
    }

    #[test]
    fn test_negation() {
        let lit = Literal::try_from(-7).unwrap();
        assert_eq!(lit.negated().to_i32(), 7);
        assert_eq!(-lit, !lit);
        assert_eq!(!!lit, lit);
    }

    #[test]
    fn test_zero_is_not_a_literal() {
        assert!(matches!(
            Literal::try_from(0),
            Err(FormulaError::InvalidLiteral { literal: 0, .. })
        ));
        assert!(Literal::try_from(i32::MIN).is_err());
    }

    #[test]
    fn test_variable_value() {
        let pos = Literal::new(1, true);
        let neg = Literal::new(1, false);

        assert!(pos.variable_value(true));
        assert!(!pos.variable_value(false));
        assert!(!neg.variable_value(true));
        assert!(neg.variable_value(false));
    }

    #[test]
    fn test_display() {
        assert_eq!(Literal::new(12, false).to_string(), "-12");
    }
}
