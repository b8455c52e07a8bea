//! The Monien–Speckenmeyer branching solver.
//!
//! The search is a depth-first recursion over partial assignments:
//!
//! 1.  If every clause is satisfied, the formula is satisfiable.
//! 2.  If some clause is falsified, this branch is a dead end.
//! 3.  Otherwise pick the undetermined clause with the fewest unassigned
//!     literals (lowest index on ties) and let `w` be that count.
//! 4.  For `i` in `0..w`, make the first `i` unassigned literals of the clause
//!     false and the next one true, then recurse. The `w` branches are disjoint
//!     and cover every way the clause can still be satisfied; the case where
//!     none of its literals is true is caught by step 2 further down.
//!
//! Each branch assigns at least one variable, so the recursion is at most `n`
//! levels deep. Branches work on a snapshot of the assignment that is restored
//! when the branch returns, whatever way it returns. The stack is grown on the
//! heap as the recursion deepens, so `n` is not limited by the thread's stack.

use crate::sat::assignment::Solutions;
use crate::sat::cnf::{Cnf, Formula};
use crate::sat::error::SolveError;
use crate::sat::solver::{CancellationToken, SolutionStats, Solver};
use tracing::debug;

/// Remaining stack below which a node moves onto a freshly allocated segment.
const STACK_RED_ZONE: usize = 64 * 1024;
/// Size of each segment allocated by [`stacker::maybe_grow`].
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Run-time options of the branching search.
#[derive(Debug, Clone, Default)]
pub struct BranchingOptions {
    /// Polled at every node and between branches.
    pub cancel: Option<CancellationToken>,
}

/// Per-run state threaded through the recursion.
#[derive(Debug, Default)]
struct Search<'o> {
    cancel: Option<&'o CancellationToken>,
    stats: SolutionStats,
    witness: Option<Solutions>,
}

impl Search<'_> {
    fn check_cancelled(&self) -> Result<(), SolveError> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(SolveError::Cancelled),
            _ => Ok(()),
        }
    }

    fn node(&mut self, formula: &mut Formula, depth: usize) -> Result<bool, SolveError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.node_inner(formula, depth)
        })
    }

    fn node_inner(&mut self, formula: &mut Formula, depth: usize) -> Result<bool, SolveError> {
        self.check_cancelled()?;
        self.stats.nodes += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        if formula.is_formula_true()? {
            self.witness = Some(formula.assignment()?.get_solutions());
            return Ok(true);
        }

        if formula.has_falsified_clause()? {
            self.stats.dead_ends += 1;
            return Ok(false);
        }

        let m = formula.select_branch_clause()?;
        let w = formula.clause_active_size(m)?;
        debug!(depth, clause = m, width = w, "branching");

        for i in 0..w {
            self.check_cancelled()?;

            let mut branch = formula.save()?;
            if !branch.zero_prefix_of_unassigned_literals(m, i)? {
                // Tautological clause: this and every later prefix is contradictory.
                break;
            }
            self.stats.branches += 1;
            if self.node(&mut branch, depth + 1)? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// Decides `formula` from its current partial assignment.
///
/// The assignment is the same on return as on entry. Use [`Branching`] to get the
/// satisfying model and search statistics.
///
/// # Errors
///
/// Any [`crate::sat::error::FormulaError`] raised by the model, wrapped in
/// [`SolveError::Formula`].
pub fn solve(formula: &mut Formula) -> Result<bool, SolveError> {
    Search::default().node(formula, 0)
}

/// A [`Solver`] running the branching search over an owned formula.
#[derive(Debug, Clone)]
pub struct Branching {
    formula: Formula,
    options: BranchingOptions,
    stats: SolutionStats,
    witness: Option<Solutions>,
}

impl Branching {
    #[must_use]
    pub fn with_options(cnf: Cnf, options: BranchingOptions) -> Self {
        Self {
            formula: Formula::new(cnf),
            options,
            stats: SolutionStats::default(),
            witness: None,
        }
    }

    #[must_use]
    pub const fn formula(&self) -> &Formula {
        &self.formula
    }
}

impl Solver for Branching {
    fn new(cnf: Cnf) -> Self {
        Self::with_options(cnf, BranchingOptions::default())
    }

    fn solve(&mut self) -> Result<Option<Solutions>, SolveError> {
        let mut search = Search {
            cancel: self.options.cancel.as_ref(),
            ..Search::default()
        };
        let result = search.node(&mut self.formula, 0);

        self.stats = search.stats;
        self.witness = search.witness;
        debug!(
            nodes = self.stats.nodes,
            branches = self.stats.branches,
            max_depth = self.stats.max_depth,
            "search finished"
        );

        if result? {
            Ok(self.witness.clone())
        } else {
            Ok(None)
        }
    }

    fn solutions(&self) -> Option<Solutions> {
        self.witness.clone()
    }

    fn stats(&self) -> SolutionStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::error::FormulaError;
    use crate::sat::literal::Literal;

    fn cnf(clauses: Vec<Vec<i32>>) -> Cnf {
        Cnf::from_dimacs(clauses).unwrap()
    }

    #[test]
    fn test_empty_formula_is_sat() {
        let mut solver = Branching::new(Cnf::default());
        let sol = solver.solve().unwrap();
        assert_eq!(sol, Some(Solutions::default()));
        assert_eq!(solver.stats().nodes, 1);
    }

    #[test]
    fn test_unit_contradiction_is_unsat() {
        let mut solver = Branching::new(cnf(vec![vec![1], vec![-1]]));
        assert_eq!(solver.solve().unwrap(), None);
        assert!(solver.stats().dead_ends > 0);
    }

    #[test]
    fn test_single_clause_is_sat() {
        let formula = cnf(vec![vec![1, -2]]);
        let mut solver = Branching::new(formula.clone());
        let sol = solver.solve().unwrap().unwrap();

        assert!(formula.verify(&sol));
        assert!(sol.check(Literal::new(1, true)));
    }

    #[test]
    fn test_empty_clause_is_unsat() {
        let formula = Cnf::new(1, vec![crate::sat::clause::Clause::default()]).unwrap();
        let mut solver = Branching::new(formula);
        assert_eq!(solver.solve().unwrap(), None);
    }

    #[test]
    fn test_pigeonhole_three_into_two_is_unsat() {
        // Variable p(i, j) = 2 * i + j + 1: pigeon i sits in hole j.
        let p = |i: i32, j: i32| 2 * i + j + 1;
        let mut clauses: Vec<Vec<i32>> = (0..3).map(|i| vec![p(i, 0), p(i, 1)]).collect();
        for j in 0..2 {
            for a in 0..3 {
                for b in (a + 1)..3 {
                    clauses.push(vec![-p(a, j), -p(b, j)]);
                }
            }
        }

        let mut solver = Branching::new(cnf(clauses));
        assert_eq!(solver.solve().unwrap(), None);
    }

    #[test]
    fn test_witness_satisfies_formula() {
        let formula = cnf(vec![
            vec![1, 2, 3],
            vec![-1, -2],
            vec![-2, -3],
            vec![-1, -3],
            vec![2, -3],
        ]);
        let mut solver = Branching::new(formula.clone());
        let sol = solver.solve().unwrap().unwrap();

        assert!(formula.verify(&sol));
        assert_eq!(solver.solutions(), Some(sol));
    }

    #[test]
    fn test_solve_restores_assignment() {
        let mut formula = Formula::new(cnf(vec![vec![1, 2], vec![-1, 3], vec![-3, -2]]));
        formula.assign(Literal::new(2, false), true).unwrap();
        let before = formula.snapshot_assignment().unwrap();

        assert!(solve(&mut formula).unwrap());
        assert_eq!(formula.snapshot_assignment().unwrap(), before);
    }

    #[test]
    fn test_solve_respects_existing_assignment() {
        let mut formula = Formula::new(cnf(vec![vec![1, 2]]));
        formula.assign(Literal::new(1, true), false).unwrap();
        formula.assign(Literal::new(2, true), false).unwrap();

        assert!(!solve(&mut formula).unwrap());
    }

    #[test]
    fn test_repeated_solve_is_idempotent() {
        let mut solver = Branching::new(cnf(vec![vec![1, 2], vec![-1, 2], vec![1, -2]]));
        let first = solver.solve().unwrap();
        let first_stats = solver.stats();
        let second = solver.solve().unwrap();

        assert_eq!(first, second);
        assert_eq!(first_stats, solver.stats());
        assert_eq!(solver.formula().assignment().unwrap().num_assigned(), 0);
    }

    #[test]
    fn test_uninitialized_formula_is_an_error_not_unsat() {
        let mut formula = Formula::uninitialized(cnf(vec![vec![1]]));
        assert_eq!(
            solve(&mut formula),
            Err(SolveError::Formula(FormulaError::UninitializedState))
        );
    }

    #[test]
    fn test_cancelled_search_reports_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let options = BranchingOptions {
            cancel: Some(token),
        };

        let mut solver = Branching::with_options(cnf(vec![vec![1, 2]]), options);
        assert_eq!(solver.solve(), Err(SolveError::Cancelled));
        assert_eq!(solver.solutions(), None);
    }

    #[test]
    fn test_depth_bounded_by_variable_count() {
        let clauses: Vec<Vec<i32>> = (1..=6)
            .map(|v| vec![v, -(v % 6 + 1)])
            .chain([vec![-1, -2]])
            .collect();
        let formula = cnf(clauses);
        let n = formula.num_vars();

        let mut solver = Branching::new(formula);
        solver.solve().unwrap();
        assert!(solver.stats().max_depth <= n);
    }

    #[test]
    fn test_tautological_clauses_are_sat() {
        let mut solver = Branching::new(cnf(vec![vec![1, -1, 2], vec![2, -2]]));
        let sol = solver.solve().unwrap().unwrap();
        assert!(cnf(vec![vec![1, -1, 2], vec![2, -2]]).verify(&sol));
    }

    #[test]
    fn test_tautology_with_conflicting_units_is_unsat() {
        let formula = cnf(vec![vec![1, -1, 2, -2, 3], vec![-3], vec![3, 4], vec![-4]]);
        let mut solver = Branching::new(formula);
        assert_eq!(solver.solve().unwrap(), None);
    }

    #[test]
    fn test_deep_unit_chain_does_not_overflow_stack() {
        // One search level per variable.
        let n: i32 = 4000;
        let clauses: Vec<Vec<i32>> = (1..=n).map(|v| vec![v]).collect();
        let mut solver = Branching::new(cnf(clauses));

        let sol = solver.solve().unwrap().unwrap();
        assert_eq!(sol.len(), 4000);
        assert_eq!(solver.stats().max_depth, 4000);
    }
}
