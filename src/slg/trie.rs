//! A deduplicating, append-only collection of tabled answers.
use crate::term::{Term, VarId};
use parking_lot::Mutex;
use std::collections::HashMap;

/// One answer: a binding from variable id to its resolved term, as observed
/// at the moment the answer was produced.
pub type Answer = HashMap<VarId, Term>;

fn answers_equal(a: &Answer, b: &Answer) -> bool {
    a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
}

#[derive(Default)]
struct Inner {
    answers: Vec<Answer>,
}

/// Append-only and deduplicating: `insert` is a no-op (returns `false`) when
/// a structurally-equal answer already exists. Readers get either a
/// snapshot (`iter`) or a resumable cursor (`iter_from`).
pub struct AnswerTrie {
    inner: Mutex<Inner>,
}

impl Default for AnswerTrie {
    fn default() -> AnswerTrie {
        AnswerTrie::new()
    }
}

impl AnswerTrie {
    pub fn new() -> AnswerTrie {
        AnswerTrie {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Inserts `answer` unless an equal one is already present. Returns
    /// whether it was newly inserted.
    pub fn insert(&self, answer: Answer) -> bool {
        self.insert_indexed(answer).is_some()
    }

    /// As [`insert`](Self::insert), but returns the index the answer landed
    /// at (`None` on a duplicate) so a caller can attach a delay set to it.
    pub fn insert_indexed(&self, answer: Answer) -> Option<usize> {
        let mut inner = self.inner.lock();
        if inner.answers.iter().any(|a| answers_equal(a, &answer)) {
            return None;
        }
        let index = inner.answers.len();
        inner.answers.push(answer);
        Some(index)
    }

    pub fn count(&self) -> usize {
        self.inner.lock().answers.len()
    }

    /// A snapshot of every answer currently stored.
    pub fn iter(&self) -> Vec<Answer> {
        self.inner.lock().answers.clone()
    }

    /// Every answer from index `from` onward, as of this call.
    pub fn iter_from(&self, from: usize) -> Vec<Answer> {
        let inner = self.inner.lock();
        if from >= inner.answers.len() {
            Vec::new()
        } else {
            inner.answers[from..].to_vec()
        }
    }

    /// The answer at `index`, if it's landed yet.
    pub fn get(&self, index: usize) -> Option<Answer> {
        self.inner.lock().answers.get(index).cloned()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::term::Term;

    fn answer(id: VarId, t: Term) -> Answer {
        let mut m = HashMap::new();
        m.insert(id, t);
        m
    }

    #[test]
    fn duplicate_answers_are_not_reinserted() {
        let trie = AnswerTrie::new();
        let v = VarId::fresh();
        assert!(trie.insert(answer(v, Term::int(1))));
        assert!(!trie.insert(answer(v, Term::int(1))));
        assert_eq!(trie.count(), 1);
    }

    #[test]
    fn iter_from_returns_only_new_answers() {
        let trie = AnswerTrie::new();
        let v = VarId::fresh();
        trie.insert(answer(v, Term::int(1)));
        let before = trie.count();
        trie.insert(answer(v, Term::int(2)));
        let fresh = trie.iter_from(before);
        assert_eq!(fresh.len(), 1);
    }
}
