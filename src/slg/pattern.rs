//! Normalized tabled-call patterns and their stable hashes.
use crate::term::{Term, VarId};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// One argument position of a normalized call: either a ground shape (the
/// term with every variable replaced by its position-local placeholder) or
/// a bare placeholder for an unbound argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArgShape {
    Placeholder(usize),
    Ground(String),
}

/// A normalized representation of a tabled call: the predicate identifier
/// plus a vector of argument shapes where every free variable is replaced
/// by a position-specific placeholder, so that two calls differing only in
/// variable identity normalize to the same pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallPattern {
    pub predicate: String,
    pub args: Vec<ArgShape>,
}

impl CallPattern {
    pub fn new(predicate: impl Into<String>, args: Vec<Term>) -> CallPattern {
        let mut next_placeholder = 0usize;
        let mut seen = std::collections::HashMap::new();
        let shapes = args
            .iter()
            .map(|t| normalize_arg(t, &mut seen, &mut next_placeholder))
            .collect();
        CallPattern {
            predicate: predicate.into(),
            args: shapes,
        }
    }

    /// A reproducible 64-bit hash using `DefaultHasher`'s fixed (non-random)
    /// seed, so the same pattern hashes identically across a run and across
    /// runs, unlike `std::collections::HashMap`'s default `RandomState`.
    pub fn stable_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

fn normalize_arg(
    t: &Term,
    seen: &mut std::collections::HashMap<VarId, usize>,
    next: &mut usize,
) -> ArgShape {
    match t.as_var() {
        Some(id) => {
            let placeholder = *seen.entry(id).or_insert_with(|| {
                let p = *next;
                *next += 1;
                p
            });
            ArgShape::Placeholder(placeholder)
        }
        None => ArgShape::Ground(format!("{:?}", t)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::term::Term;

    #[test]
    fn patterns_with_different_variable_identity_normalize_equal() {
        let v1 = Term::var(VarId::fresh());
        let v2 = Term::var(VarId::fresh());
        let p1 = CallPattern::new("path", vec![v1, Term::int(1)]);
        let p2 = CallPattern::new("path", vec![v2, Term::int(1)]);
        assert_eq!(p1, p2);
        assert_eq!(p1.stable_hash(), p2.stable_hash());
    }

    #[test]
    fn patterns_with_different_ground_args_differ() {
        let p1 = CallPattern::new("path", vec![Term::int(1)]);
        let p2 = CallPattern::new("path", vec![Term::int(2)]);
        assert_ne!(p1, p2);
    }

    #[test]
    fn hash_is_stable_across_recomputation() {
        let p = CallPattern::new("path", vec![Term::int(1)]);
        assert_eq!(p.stable_hash(), p.stable_hash());
    }
}
