//! Error types for the formula model, the branching solver and the input readers.
//!
//! None of these describe a satisfiability outcome. A formula error always means a
//! broken invariant (a bad index, a literal outside the variable universe, a
//! missing assignment table) and is propagated untouched to the caller, which is
//! expected to abort the run.

use thiserror::Error;

/// Errors raised by the formula model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// A clause index outside `0..num_clauses`.
    #[error("clause index {index} is out of range for a formula with {len} clauses")]
    IndexOutOfRange {
        /// The offending clause index.
        index: usize,
        /// The number of clauses in the formula.
        len: usize,
    },

    /// A literal whose variable is zero or greater than the declared variable count.
    #[error("literal {literal} does not refer to a variable in 1..={num_vars}")]
    InvalidLiteral {
        /// The offending literal, in DIMACS notation.
        literal: i32,
        /// The declared variable count.
        num_vars: usize,
    },

    /// An assignment operation was attempted before the table was created.
    #[error("the assignment table has not been initialised")]
    UninitializedState,

    /// A branch prefix that reaches past the unassigned literals of a clause.
    #[error("prefix {prefix} is not below the {unassigned} unassigned literals of clause {clause}")]
    ExhaustedPrefix {
        /// The clause the prefix was applied to.
        clause: usize,
        /// The requested prefix length.
        prefix: usize,
        /// Unassigned literals left in the clause.
        unassigned: usize,
    },

    /// Branch clause selection was requested while no clause is undetermined.
    #[error("no undetermined clause is left to branch on")]
    NoActiveClause,
}

/// Errors returned by [`crate::sat::solver::Solver::solve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// The formula model reported a broken invariant.
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// The search was stopped through its cancellation token before reaching a verdict.
    #[error("search cancelled before a verdict was reached")]
    Cancelled,
}

/// Errors produced while reading DIMACS or plain-text CNF input.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The underlying reader failed.
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// A token that is not a 32-bit integer where a literal was expected.
    #[error("line {line}: failed to parse literal '{token}'")]
    InvalidToken {
        /// One-based line number.
        line: usize,
        /// The token as it appeared in the input.
        token: String,
    },

    /// A malformed `p cnf <vars> <clauses>` problem line.
    #[error("line {line}: malformed problem line '{content}'")]
    InvalidHeader {
        /// One-based line number.
        line: usize,
        /// The full line.
        content: String,
    },

    /// The parsed clauses do not form a valid formula.
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

/// Result alias for formula model operations.
pub type Result<T, E = FormulaError> = std::result::Result<T, E>;
