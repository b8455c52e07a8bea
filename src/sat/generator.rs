//! Uniform random k-SAT instances.
//!
//! Each clause draws `k` distinct variables uniformly from `1..=n` and negates
//! each with probability 1/2. Generation is seeded, so an instance is fully
//! determined by `(n, m, k, seed)`.

use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::error::FormulaError;
use crate::sat::literal::Literal;
use itertools::Itertools;

/// Generates a random `k`-CNF with `num_vars` variables and `num_clauses` clauses.
///
/// `k` is capped at `num_vars`, since a clause cannot hold more distinct variables
/// than exist.
///
/// # Errors
///
/// [`FormulaError::InvalidLiteral`] if `num_vars` does not fit a DIMACS literal.
pub fn random_ksat(
    num_vars: usize,
    num_clauses: usize,
    k: usize,
    seed: u64,
) -> Result<Cnf, FormulaError> {
    if i32::try_from(num_vars).is_err() {
        return Err(FormulaError::InvalidLiteral {
            literal: i32::MAX,
            num_vars,
        });
    }

    let mut rng = fastrand::Rng::with_seed(seed);
    let k = k.min(num_vars);

    let clauses = (0..num_clauses)
        .map(|_| {
            let mut vars = Vec::with_capacity(k);
            while vars.len() < k {
                let v = rng.usize(1..=num_vars);
                if !vars.contains(&v) {
                    vars.push(v);
                }
            }
            vars.into_iter()
                .map(|v| Literal::new(v, rng.bool()))
                .collect::<Clause>()
        })
        .collect_vec();

    Cnf::new(num_vars, clauses)
}
