//! Terms: atoms, variables, and pairs (C1).
//!
//! A [`Term`] is a tagged sum type, not an inheritance hierarchy: [`Atom`],
//! [`Term::Var`], and [`Term::Pair`]. Lists are right-nested pairs terminated
//! by [`Atom::Nil`]. Variables are identified by a globally unique monotonic
//! [`VarId`]; two variables are equal iff their ids match, independent of any
//! debug name.
use crate::goal::Goal;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static VAR_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Globally unique, monotonically increasing variable identity.
///
/// The same counter mints ids for both relational (miniKanren) variables and
/// FD variables, so a variable introduced by `fresh()` can be handed straight
/// to the FD solver without a second id space to keep in sync.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Mint a fresh, process-wide unique id. Never collides across threads.
    pub fn fresh() -> VarId {
        VarId(VAR_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    pub fn as_usize(self) -> usize {
        self.0
    }

    /// Reset the global counter. Test-only: production code must never call
    /// this once any variable has escaped into shared state.
    #[doc(hidden)]
    pub fn reset_for_tests() {
        VAR_ID_COUNTER.store(0, Ordering::SeqCst);
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "_{}", self.0)
    }
}

/// An opaque, immutable, equality-comparable atomic value.
///
/// `Atom::Goal` lets a [`Goal`] be embedded as a first-class term value;
/// `CallGoal` inspects the wrapped value at runtime instead of relying on a
/// dedicated subtype.
#[derive(Clone)]
pub enum Atom {
    Nil,
    Bool(bool),
    Int(i64),
    Char(char),
    Str(Arc<str>),
    Goal(Goal),
}

impl PartialEq for Atom {
    fn eq(&self, other: &Atom) -> bool {
        match (self, other) {
            (Atom::Nil, Atom::Nil) => true,
            (Atom::Bool(a), Atom::Bool(b)) => a == b,
            (Atom::Int(a), Atom::Int(b)) => a == b,
            (Atom::Char(a), Atom::Char(b)) => a == b,
            (Atom::Str(a), Atom::Str(b)) => a == b,
            // Goals are opaque callables: only identical goals (same
            // allocation) compare equal, never structural lookalikes.
            (Atom::Goal(a), Atom::Goal(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}
impl Eq for Atom {}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Atom::Nil => write!(f, "()"),
            Atom::Bool(b) => write!(f, "{}", b),
            Atom::Int(n) => write!(f, "{}", n),
            Atom::Char(c) => write!(f, "{:?}", c),
            Atom::Str(s) => write!(f, "{:?}", s),
            Atom::Goal(_) => write!(f, "<goal>"),
        }
    }
}

/// A logic term: atom, variable, or cons pair.
#[derive(Clone, Debug)]
pub enum Term {
    Atom(Atom),
    Var(VarId, Option<&'static str>),
    Pair(Arc<Term>, Arc<Term>),
}

impl Term {
    pub fn nil() -> Term {
        Term::Atom(Atom::Nil)
    }

    pub fn bool(b: bool) -> Term {
        Term::Atom(Atom::Bool(b))
    }

    pub fn int(n: i64) -> Term {
        Term::Atom(Atom::Int(n))
    }

    pub fn char(c: char) -> Term {
        Term::Atom(Atom::Char(c))
    }

    pub fn str(s: impl Into<Arc<str>>) -> Term {
        Term::Atom(Atom::Str(s.into()))
    }

    pub fn goal(g: Goal) -> Term {
        Term::Atom(Atom::Goal(g))
    }

    pub fn var(id: VarId) -> Term {
        Term::Var(id, None)
    }

    pub fn named_var(id: VarId, name: &'static str) -> Term {
        Term::Var(id, Some(name))
    }

    pub fn cons(car: Term, cdr: Term) -> Term {
        Term::Pair(Arc::new(car), Arc::new(cdr))
    }

    /// Build a right-nested, `Nil`-terminated list from `items`.
    pub fn list(items: Vec<Term>) -> Term {
        let mut tail = Term::nil();
        for item in items.into_iter().rev() {
            tail = Term::cons(item, tail);
        }
        tail
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_, _))
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Term::Atom(_))
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Term::Pair(_, _))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Term::Atom(Atom::Nil))
    }

    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Term::Var(id, _) => Some(*id),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::Atom(Atom::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<(&Term, &Term)> {
        match self {
            Term::Pair(car, cdr) => Some((car, cdr)),
            _ => None,
        }
    }

    /// Collects a proper list into a `Vec<Term>`. Returns `None` if the term
    /// is not a `Nil`-terminated chain of pairs.
    pub fn to_vec(&self) -> Option<Vec<Term>> {
        let mut items = Vec::new();
        let mut cur = self;
        loop {
            match cur {
                Term::Atom(Atom::Nil) => return Some(items),
                Term::Pair(car, cdr) => {
                    items.push((**car).clone());
                    cur = cdr;
                }
                _ => return None,
            }
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Atom(a), Term::Atom(b)) => a == b,
            (Term::Var(a, _), Term::Var(b, _)) => a == b,
            (Term::Pair(a1, a2), Term::Pair(b1, b2)) => a1 == b1 && a2 == b2,
            _ => false,
        }
    }
}
impl Eq for Term {}

impl From<i64> for Term {
    fn from(n: i64) -> Term {
        Term::int(n)
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Term {
        Term::bool(b)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Term {
        Term::str(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn variables_equal_iff_ids_match() {
        let id = VarId::fresh();
        let v1 = Term::var(id);
        let v2 = Term::named_var(id, "x");
        assert_eq!(v1, v2);
        assert_ne!(v1, Term::var(VarId::fresh()));
    }

    #[test]
    fn list_round_trips() {
        let items = vec![Term::int(1), Term::int(2), Term::int(3)];
        let list = Term::list(items.clone());
        assert_eq!(list.to_vec(), Some(items));
    }

    #[test]
    fn atoms_compare_by_value_not_kind_mismatch() {
        assert_ne!(Term::bool(true), Term::int(1));
        assert_eq!(Term::int(1), Term::int(1));
        assert_ne!(Term::int(1), Term::int(2));
    }
}
