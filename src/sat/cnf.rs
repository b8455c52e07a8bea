#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The formula model.
//!
//! [`Cnf`] is the immutable part: the clause list together with the size
//! parameters of the instance (`n` variables, `m` clauses, width `k`).
//! [`Formula`] pairs a `Cnf` with the live partial [`Assignment`] and exposes the
//! queries and mutations the branching solver is built from. Clause indices are
//! checked on every call; a bad index is an error, never a silent `false`.
//!
//! Backtracking is done by value: [`Formula::snapshot_assignment`] returns an
//! independent copy of the table and [`Formula::restore_assignment`] swaps it back
//! in. [`Formula::save`] wraps that pair in a guard that restores on drop, so a
//! branch cannot leak its assignments into a sibling on any exit path.

use crate::sat::assignment::{Assignment, Solutions};
use crate::sat::clause::Clause;
use crate::sat::error::{FormulaError, Result};
use crate::sat::literal::{Literal, Variable};
use core::ops::{Deref, DerefMut, Index};
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cnf {
    clauses: Vec<Clause>,
    num_vars: usize,
    width: usize,
}

impl Cnf {
    /// Builds a formula over `1..=num_vars`, rejecting literals outside that range.
    ///
    /// # Errors
    ///
    /// [`FormulaError::InvalidLiteral`] for the first literal whose variable exceeds `num_vars`.
    pub fn new(num_vars: usize, clauses: Vec<Clause>) -> Result<Self> {
        if let Some(bad) = clauses
            .iter()
            .flat_map(Clause::iter)
            .find(|l| l.variable() > num_vars)
        {
            return Err(FormulaError::InvalidLiteral {
                literal: bad.to_i32(),
                num_vars,
            });
        }

        let width = clauses.iter().map(Clause::len).max().unwrap_or(0);
        Ok(Self {
            clauses,
            num_vars,
            width,
        })
    }

    /// Builds a formula from DIMACS integers, taking `n` as the largest variable seen.
    ///
    /// # Errors
    ///
    /// [`FormulaError::InvalidLiteral`] if any clause contains `0`.
    pub fn from_dimacs(clauses: Vec<Vec<i32>>) -> Result<Self> {
        let clauses = clauses
            .into_iter()
            .map(|c| {
                c.into_iter()
                    .map(Literal::try_from)
                    .collect::<Result<Vec<_>>>()
                    .map(Clause::from)
            })
            .collect::<Result<Vec<_>>>()?;
        let num_vars = clauses
            .iter()
            .flat_map(Clause::iter)
            .map(|l| l.variable())
            .max()
            .unwrap_or(0);
        Self::new(num_vars, clauses)
    }

    /// Declared variable count `n`.
    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Clause width `k`: the length of the longest clause. Reported, never enforced.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Number of clauses `m`.
    #[must_use]
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn num_literals(&self) -> usize {
        self.clauses.iter().map(Clause::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// # Errors
    ///
    /// [`FormulaError::IndexOutOfRange`] if `idx` is not a clause index.
    pub fn clause(&self, idx: usize) -> Result<&Clause> {
        self.clauses.get(idx).ok_or(FormulaError::IndexOutOfRange {
            index: idx,
            len: self.clauses.len(),
        })
    }

    /// Checks that every clause has a literal that holds in `solutions`.
    #[must_use]
    pub fn verify(&self, solutions: &Solutions) -> bool {
        self.iter()
            .all(|clause| clause.iter().any(|&lit| solutions.check(lit)))
    }
}

impl Index<usize> for Cnf {
    type Output = Clause;

    fn index(&self, index: usize) -> &Self::Output {
        &self.clauses[index]
    }
}

/// DIMACS rendering, header included.
impl Display for Cnf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars, self.num_clauses())?;
        for clause in &self.clauses {
            writeln!(f, "{clause}")?;
        }
        Ok(())
    }
}

/// A CNF formula together with its current partial assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    cnf: Cnf,
    assignment: Option<Assignment>,
}

impl From<Cnf> for Formula {
    fn from(cnf: Cnf) -> Self {
        Self::new(cnf)
    }
}

impl Formula {
    /// Wraps `cnf` with an all-unassigned table.
    #[must_use]
    pub fn new(cnf: Cnf) -> Self {
        let assignment = Some(Assignment::new(cnf.num_vars));
        Self { cnf, assignment }
    }

    /// Wraps `cnf` without creating the assignment table; see [`Formula::init_assignment`].
    #[must_use]
    pub const fn uninitialized(cnf: Cnf) -> Self {
        Self {
            cnf,
            assignment: None,
        }
    }

    /// Replaces the table (if any) with a fresh all-unassigned one.
    pub fn init_assignment(&mut self) {
        self.assignment = Some(Assignment::new(self.cnf.num_vars));
    }

    #[must_use]
    pub const fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    #[must_use]
    pub const fn num_vars(&self) -> usize {
        self.cnf.num_vars
    }

    #[must_use]
    pub fn num_clauses(&self) -> usize {
        self.cnf.num_clauses()
    }

    /// # Errors
    ///
    /// [`FormulaError::UninitializedState`] when no table exists.
    pub fn assignment(&self) -> Result<&Assignment> {
        self.assignment
            .as_ref()
            .ok_or(FormulaError::UninitializedState)
    }

    fn assignment_mut(&mut self) -> Result<&mut Assignment> {
        self.assignment
            .as_mut()
            .ok_or(FormulaError::UninitializedState)
    }

    /// Clause `m` and the table it is evaluated against.
    fn clause_state(&self, m: usize) -> Result<(&Clause, &Assignment)> {
        let clause = self.cnf.clause(m)?;
        Ok((clause, self.assignment()?))
    }

    /// Current value of `var`; `None` if unassigned, out of range, or the table is missing.
    #[must_use]
    pub fn value(&self, var: Variable) -> Option<bool> {
        self.assignment.as_ref()?.var_value(var)
    }

    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.assignment.as_ref()?.literal_value(lit)
    }

    /// # Errors
    ///
    /// [`FormulaError::IndexOutOfRange`] or [`FormulaError::UninitializedState`].
    pub fn is_clause_satisfied(&self, m: usize) -> Result<bool> {
        let (clause, a) = self.clause_state(m)?;
        Ok(clause.is_satisfied(a))
    }

    /// # Errors
    ///
    /// [`FormulaError::IndexOutOfRange`] or [`FormulaError::UninitializedState`].
    pub fn is_clause_falsified(&self, m: usize) -> Result<bool> {
        let (clause, a) = self.clause_state(m)?;
        Ok(clause.is_falsified(a))
    }

    /// # Errors
    ///
    /// [`FormulaError::IndexOutOfRange`] or [`FormulaError::UninitializedState`].
    pub fn is_clause_partial(&self, m: usize) -> Result<bool> {
        let (clause, a) = self.clause_state(m)?;
        Ok(clause.is_partial(a))
    }

    /// Unassigned literals left in clause `m`; 0 once it is satisfied or falsified.
    ///
    /// # Errors
    ///
    /// [`FormulaError::IndexOutOfRange`] or [`FormulaError::UninitializedState`].
    pub fn clause_active_size(&self, m: usize) -> Result<usize> {
        let (clause, a) = self.clause_state(m)?;
        Ok(clause.active_size(a))
    }

    /// Makes `literal` evaluate to `value` by assigning its variable.
    ///
    /// # Errors
    ///
    /// [`FormulaError::InvalidLiteral`] if the variable is outside `1..=n`,
    /// [`FormulaError::UninitializedState`] if there is no table.
    pub fn assign(&mut self, literal: Literal, value: bool) -> Result<()> {
        let num_vars = self.cnf.num_vars;
        let var = literal.variable();
        if var == 0 || var > num_vars {
            return Err(FormulaError::InvalidLiteral {
                literal: literal.to_i32(),
                num_vars,
            });
        }
        self.assignment_mut()?
            .set(var, literal.variable_value(value));
        Ok(())
    }

    /// Every clause is satisfied. Holds trivially for a formula without clauses.
    ///
    /// # Errors
    ///
    /// [`FormulaError::UninitializedState`] when no table exists.
    pub fn is_formula_true(&self) -> Result<bool> {
        let a = self.assignment()?;
        Ok(self.cnf.iter().all(|c| c.is_satisfied(a)))
    }

    /// # Errors
    ///
    /// [`FormulaError::UninitializedState`] when no table exists.
    pub fn has_falsified_clause(&self) -> Result<bool> {
        let a = self.assignment()?;
        Ok(self.cnf.iter().any(|c| c.is_falsified(a)))
    }

    /// An independent copy of the current table.
    ///
    /// # Errors
    ///
    /// [`FormulaError::UninitializedState`] when no table exists.
    pub fn snapshot_assignment(&self) -> Result<Assignment> {
        self.assignment().cloned()
    }

    /// Installs `snapshot` as the current table, dropping the previous one.
    pub fn restore_assignment(&mut self, snapshot: Assignment) {
        debug_assert_eq!(snapshot.num_vars(), self.cnf.num_vars);
        self.assignment = Some(snapshot);
    }

    /// Snapshots the table and returns a guard that restores it when dropped.
    ///
    /// The guard dereferences to the formula, so a branch mutates and recurses
    /// through it.
    ///
    /// # Errors
    ///
    /// [`FormulaError::UninitializedState`] when no table exists.
    pub fn save(&mut self) -> Result<SavedAssignment<'_>> {
        let saved = self.snapshot_assignment()?;
        Ok(SavedAssignment {
            formula: self,
            saved: Some(saved),
        })
    }

    /// Index of an undetermined clause with the fewest unassigned literals.
    /// Ties go to the lowest index.
    ///
    /// # Errors
    ///
    /// [`FormulaError::NoActiveClause`] if every clause is satisfied or falsified,
    /// [`FormulaError::UninitializedState`] when no table exists.
    pub fn select_branch_clause(&self) -> Result<usize> {
        let a = self.assignment()?;
        self.cnf
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_partial(a))
            .map(|(i, c)| (i, c.active_size(a)))
            .min_by_key(|&(_, size)| size)
            .map(|(i, _)| i)
            .ok_or(FormulaError::NoActiveClause)
    }

    /// Among the unassigned literals of clause `m`, in listed order, makes the first
    /// `i` false and the next one true.
    ///
    /// Branch `i` covers exactly the assignments whose first true literal among
    /// those unassigned literals sits at position `i`. Returns `false`, leaving the
    /// table untouched, when that set is empty: in a tautological clause no prefix
    /// can hold both `x` and `-x` false. Every longer prefix is empty as well.
    ///
    /// # Errors
    ///
    /// [`FormulaError::ExhaustedPrefix`] if `i` is not below the number of unassigned
    /// literals, plus the errors of [`Formula::clause_active_size`].
    pub fn zero_prefix_of_unassigned_literals(&mut self, m: usize, i: usize) -> Result<bool> {
        let (clause, a) = self.clause_state(m)?;
        let free: SmallVec<[Literal; 8]> = clause.unassigned_literals(a).collect();

        let Some(&chosen) = free.get(i) else {
            return Err(FormulaError::ExhaustedPrefix {
                clause: m,
                prefix: i,
                unassigned: free.len(),
            });
        };

        let prefix = &free[..i];
        if prefix.iter().any(|l| prefix.contains(&l.negated())) {
            return Ok(false);
        }

        for &lit in prefix {
            self.assign(lit, false)?;
        }
        self.assign(chosen, true)?;
        Ok(true)
    }
}

/// Scoped snapshot of a formula's assignment, restored when the guard is dropped.
#[derive(Debug)]
pub struct SavedAssignment<'f> {
    formula: &'f mut Formula,
    saved: Option<Assignment>,
}

impl Deref for SavedAssignment<'_> {
    type Target = Formula;

    fn deref(&self) -> &Self::Target {
        self.formula
    }
}

impl DerefMut for SavedAssignment<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.formula
    }
}

impl Drop for SavedAssignment<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.formula.restore_assignment(saved);
        }
    }
}
