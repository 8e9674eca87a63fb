//! Substitution maps and unification (C1).
use crate::term::{Atom, Term, VarId};
use std::sync::Arc;

/// A mapping from variable id to term ("the binding table").
///
/// Persistent (`im::HashMap`) so that forked search/goal branches can clone
/// in O(1) and extend independently without seeing each other's bindings.
/// Growth is append-only within one substitution value: `extend` always
/// returns a new `Substitution` rather than mutating in place.
#[derive(Clone, Debug, Default)]
pub struct Substitution(im::HashMap<VarId, Term>);

impl Substitution {
    pub fn new() -> Substitution {
        Substitution(im::HashMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a new substitution extended with `id -> term`. No occurs
    /// check is performed: well-formed goals never produce a cycle, and
    /// constructing one is the caller's responsibility (see Design Notes).
    pub fn extend(&self, id: VarId, term: Term) -> Substitution {
        let mut map = self.0.clone();
        map.insert(id, term);
        Substitution(map)
    }

    /// Chase a variable chain to its representative: another variable, or a
    /// non-variable term. Idempotent: `walk(walk(t)) == walk(t)`.
    pub fn walk(&self, t: &Term) -> Term {
        let mut cur = t.clone();
        loop {
            match &cur {
                Term::Var(id, _) => match self.0.get(id) {
                    Some(next) => cur = next.clone(),
                    None => return cur,
                },
                _ => return cur,
            }
        }
    }

    /// Like `walk`, but recurses into pairs so every leaf is walked too.
    /// Used for reification at the top of `run`.
    pub fn deep_walk(&self, t: &Term) -> Term {
        let walked = self.walk(t);
        match walked {
            Term::Pair(car, cdr) => {
                Term::Pair(Arc::new(self.deep_walk(&car)), Arc::new(self.deep_walk(&cdr)))
            }
            other => other,
        }
    }
}

/// Standard first-order unification. Returns the extended substitution, or
/// `None` on failure. Walks both sides first; same variable unifies
/// trivially; a variable side binds; atoms compare by value; pairs unify
/// car then cdr, failing fast on the car.
pub fn unify(a: &Term, b: &Term, sub: &Substitution) -> Option<Substitution> {
    let aw = sub.walk(a);
    let bw = sub.walk(b);
    match (&aw, &bw) {
        (Term::Var(ia, _), Term::Var(ib, _)) if ia == ib => Some(sub.clone()),
        (Term::Var(id, _), _) => Some(sub.extend(*id, bw)),
        (_, Term::Var(id, _)) => Some(sub.extend(*id, aw)),
        (Term::Atom(x), Term::Atom(y)) => {
            if x == y {
                Some(sub.clone())
            } else {
                None
            }
        }
        (Term::Pair(a1, a2), Term::Pair(b1, b2)) => {
            let s1 = unify(a1, b1, sub)?;
            unify(a2, b2, &s1)
        }
        _ => None,
    }
}

#[allow(dead_code)]
fn is_nil(t: &Term) -> bool {
    matches!(t, Term::Atom(Atom::Nil))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn walk_is_idempotent() {
        let sub = Substitution::new();
        let v = Term::var(VarId::fresh());
        assert_eq!(sub.walk(&sub.walk(&v)), sub.walk(&v));
    }

    #[test]
    fn unify_binds_variable_to_value() {
        let sub = Substitution::new();
        let v = VarId::fresh();
        let result = unify(&Term::var(v), &Term::int(42), &sub).unwrap();
        assert_eq!(result.walk(&Term::var(v)), Term::int(42));
    }

    #[test]
    fn unify_same_variable_is_noop() {
        let sub = Substitution::new();
        let v = Term::var(VarId::fresh());
        let result = unify(&v, &v, &sub).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn unify_pairs_recurses_car_then_cdr() {
        let sub = Substitution::new();
        let va = VarId::fresh();
        let vb = VarId::fresh();
        let a = Term::cons(Term::var(va), Term::cons(Term::var(vb), Term::nil()));
        let b = Term::cons(Term::int(1), Term::cons(Term::int(2), Term::nil()));
        let result = unify(&a, &b, &sub).unwrap();
        assert_eq!(result.walk(&Term::var(va)), Term::int(1));
        assert_eq!(result.walk(&Term::var(vb)), Term::int(2));
    }

    #[test]
    fn unify_fails_on_atom_mismatch() {
        let sub = Substitution::new();
        assert!(unify(&Term::int(1), &Term::int(2), &sub).is_none());
    }

    #[test]
    fn deep_walk_resolves_nested_bindings() {
        let sub = Substitution::new();
        let va = VarId::fresh();
        let vb = VarId::fresh();
        let sub = sub.extend(va, Term::var(vb));
        let sub = sub.extend(vb, Term::int(7));
        let t = Term::cons(Term::var(va), Term::nil());
        assert_eq!(sub.deep_walk(&t), Term::cons(Term::int(7), Term::nil()));
    }
}
