#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The partial assignment table.
//!
//! An `Assignment` maps every variable in `1..=n` to a [`VarState`]. The table is
//! always `n + 1` entries long; slot `0` exists so variables index it directly and
//! is never assigned. It is a plain value: cloning it is the snapshot operation the
//! branching solver relies on.

use crate::sat::literal::{Literal, Variable};
use core::ops::Index;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(&self) -> bool {
        !self.is_assigned()
    }

    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::Assigned(true))
    }

    #[must_use]
    pub const fn is_false(&self) -> bool {
        matches!(self, Self::Assigned(false))
    }

    #[must_use]
    pub const fn value(&self) -> Option<bool> {
        match self {
            Self::Assigned(b) => Some(*b),
            Self::Unassigned => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Assignment(Vec<VarState>);

impl Index<Variable> for Assignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.0[index]
    }
}

impl Assignment {
    /// Creates an all-unassigned table for the variables `1..=num_vars`.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![VarState::Unassigned; num_vars + 1])
    }

    /// Number of variables the table covers, excluding the reserved slot `0`.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Sets `var` to `b`. Callers are responsible for keeping `var` in `1..=num_vars`.
    pub fn set(&mut self, var: Variable, b: bool) {
        self.0[var] = VarState::Assigned(b);
    }

    pub fn unassign(&mut self, var: Variable) {
        self.0[var] = VarState::Unassigned;
    }

    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        self.0.get(var).and_then(VarState::value)
    }

    /// The truth value of `lit`, or `None` while its variable is unassigned.
    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.var_value(lit.variable())
            .map(|b| if lit.polarity() { b } else { !b })
    }

    #[must_use]
    pub fn is_unassigned(&self, var: Variable) -> bool {
        self.var_value(var).is_none()
    }

    #[must_use]
    pub fn num_assigned(&self) -> usize {
        self.0.iter().skip(1).filter(|s| s.is_assigned()).count()
    }

    /// The assigned variables as DIMACS literals, in variable order.
    #[must_use]
    pub fn get_solutions(&self) -> Solutions {
        Solutions::new(
            self.0
                .iter()
                .enumerate()
                .skip(1)
                .filter_map(|(var, s)| s.value().map(|b| Literal::new(var, b)))
                .collect(),
        )
    }
}

/// A (possibly partial) model: one literal per assigned variable, sorted by variable.
///
/// Variables missing from a model are "don't care": every clause is already
/// satisfied by the listed literals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Solutions(Vec<Literal>);

impl Solutions {
    #[must_use]
    pub fn new(mut literals: Vec<Literal>) -> Self {
        literals.sort_by_key(|l| l.variable());
        Self(literals)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.0.iter()
    }

    /// Whether `lit` holds in this model.
    #[must_use]
    pub fn check(&self, lit: Literal) -> bool {
        self.0
            .binary_search_by_key(&lit.variable(), |l| l.variable())
            .is_ok_and(|i| self.0[i] == lit)
    }
}

impl Display for Solutions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(" "))
    }
}
