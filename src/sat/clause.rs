#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Clauses and their state under a partial assignment.
//!
//! A clause is an ordered disjunction of literals and never changes after it is
//! built. Whether it is satisfied, falsified or still undetermined is derived on
//! demand from an [`Assignment`].

use crate::sat::assignment::Assignment;
use crate::sat::literal::Literal;
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

pub type LiteralStorage = SmallVec<[Literal; 8]>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Clause {
    literals: LiteralStorage,
}

impl Clause {
    /// Builds a clause, dropping repeated copies of a literal but keeping listed order.
    #[must_use]
    pub fn new<I: IntoIterator<Item = Literal>>(literals: I) -> Self {
        Self {
            literals: literals.into_iter().unique().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Whether the clause contains a literal and its negation.
    #[must_use]
    pub fn is_tautology(&self) -> bool {
        self.literals
            .iter()
            .any(|l| self.literals.contains(&l.negated()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    /// At least one literal is true.
    #[must_use]
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        self.iter()
            .any(|&l| assignment.literal_value(l) == Some(true))
    }

    /// Every literal is assigned and none is true. The empty clause is falsified.
    #[must_use]
    pub fn is_falsified(&self, assignment: &Assignment) -> bool {
        self.iter()
            .all(|&l| assignment.literal_value(l) == Some(false))
    }

    /// Not satisfied, and at least one literal is still unassigned.
    #[must_use]
    pub fn is_partial(&self, assignment: &Assignment) -> bool {
        !self.is_satisfied(assignment) && self.unassigned_literals(assignment).next().is_some()
    }

    /// Number of unassigned literals, or 0 once the clause is satisfied or falsified.
    #[must_use]
    pub fn active_size(&self, assignment: &Assignment) -> usize {
        if self.is_satisfied(assignment) {
            return 0;
        }
        self.unassigned_literals(assignment).count()
    }

    /// The literals whose variable is unassigned, in listed order.
    pub fn unassigned_literals<'a>(
        &'a self,
        assignment: &'a Assignment,
    ) -> impl Iterator<Item = Literal> + 'a {
        self.iter()
            .copied()
            .filter(|&l| assignment.literal_value(l).is_none())
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<Literal>> for Clause {
    fn from(literals: Vec<Literal>) -> Self {
        Self::new(literals)
    }
}

/// DIMACS clause line, `0`-terminated.
impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for lit in &self.literals {
            write!(f, "{lit} ")?;
        }
        write!(f, "0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(lits: &[i32]) -> Clause {
        lits.iter()
            .map(|&l| Literal::try_from(l).unwrap())
            .collect()
    }

    #[test]
    fn test_new_drops_duplicates_keeps_order() {
        let c = clause(&[3, -1, 3, 2, -1]);
        let lits: Vec<i32> = c.iter().map(|l| l.to_i32()).collect();
        assert_eq!(lits, vec![3, -1, 2]);
    }

    #[test]
    fn test_tautology() {
        assert!(clause(&[1, 2, -1]).is_tautology());
        assert!(!clause(&[1, 2, 3]).is_tautology());
    }

    #[test]
    fn test_states_on_fresh_assignment() {
        let c = clause(&[1, -2, 3]);
        let a = Assignment::new(3);

        assert!(!c.is_satisfied(&a));
        assert!(!c.is_falsified(&a));
        assert!(c.is_partial(&a));
        assert_eq!(c.active_size(&a), 3);
    }

    #[test]
    fn test_satisfied_clause_has_no_active_size() {
        let c = clause(&[1, -2, 3]);
        let mut a = Assignment::new(3);
        a.set(2, false);

        assert!(c.is_satisfied(&a));
        assert!(!c.is_partial(&a));
        assert_eq!(c.active_size(&a), 0);
    }

    #[test]
    fn test_falsified_requires_every_literal_false() {
        let c = clause(&[1, -2]);
        let mut a = Assignment::new(2);
        a.set(1, false);
        assert!(!c.is_falsified(&a));
        assert!(c.is_partial(&a));
        assert_eq!(c.active_size(&a), 1);

        a.set(2, true);
        assert!(c.is_falsified(&a));
        assert!(!c.is_partial(&a));
        assert_eq!(c.active_size(&a), 0);
    }

    #[test]
    fn test_empty_clause_is_falsified() {
        let c = Clause::default();
        let a = Assignment::new(0);
        assert!(c.is_falsified(&a));
        assert!(!c.is_satisfied(&a));
        assert!(!c.is_partial(&a));
    }

    #[test]
    fn test_unassigned_literals_in_order() {
        let c = clause(&[4, -1, 2, -3]);
        let mut a = Assignment::new(4);
        a.set(1, true);

        let free: Vec<i32> = c.unassigned_literals(&a).map(|l| l.to_i32()).collect();
        assert_eq!(free, vec![4, 2, -3]);
    }

    #[test]
    fn test_display() {
        assert_eq!(clause(&[1, -2]).to_string(), "1 -2 0");
        assert_eq!(Clause::default().to_string(), "0");
    }
}
