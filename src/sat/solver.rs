#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The solver interface shared by the library and the command line front end.

use crate::sat::assignment::Solutions;
use crate::sat::cnf::Cnf;
use crate::sat::error::SolveError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Counters collected during one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SolutionStats {
    /// Recursive calls made, the root included.
    pub nodes: usize,
    /// Branches entered, i.e. prefixes applied to a selected clause.
    pub branches: usize,
    /// Nodes that stopped on a falsified clause.
    pub dead_ends: usize,
    /// Deepest recursion level reached; the root is level 0.
    pub max_depth: usize,
}

pub trait Solver {
    fn new(cnf: Cnf) -> Self;

    /// Decides the formula.
    ///
    /// Returns `Ok(Some(model))` when satisfiable and `Ok(None)` when not.
    ///
    /// # Errors
    ///
    /// A [`SolveError`] means no verdict was reached and must not be read as UNSAT.
    fn solve(&mut self) -> Result<Option<Solutions>, SolveError>;

    /// The model found by the last successful [`Solver::solve`], if any.
    fn solutions(&self) -> Option<Solutions>;

    fn stats(&self) -> SolutionStats;
}

/// A flag shared between a running search and whoever may want to stop it.
///
/// Clones observe the same flag. The search polls it between steps, so setting it
/// from another thread stops the search at the next node or branch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
