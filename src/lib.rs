//! This crate decides satisfiability of CNF formulas with the Monien–Speckenmeyer
//! branching algorithm for k-SAT.

/// The `sat` module holds the formula model, the branching solver and the DIMACS reader.
pub mod sat;
