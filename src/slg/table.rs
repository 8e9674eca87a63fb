//! Per-pattern tabling records and the concurrent subgoal table.
use crate::slg::pattern::CallPattern;
use crate::slg::trie::{Answer, AnswerTrie};
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubgoalStatus {
    Evaluating,
    Complete,
    Failed,
}

/// Tabling record for one normalized call pattern: status, its answer
/// trie, the dependency set of child patterns it has called, retracted
/// answer indices, per-answer delay sets (for well-founded negation), a
/// stored evaluator closure, a condvar signalled on new answers, and an
/// event sequence counter consumers can use to detect progress.
pub struct SubgoalEntry {
    pub pattern: CallPattern,
    pub pattern_hash: u64,
    status: Mutex<SubgoalStatus>,
    pub trie: AnswerTrie,
    dependencies: Mutex<HashSet<u64>>,
    retracted: Mutex<HashSet<usize>>,
    delay_sets: Mutex<HashMap<usize, HashSet<u64>>>,
    evaluator: Mutex<Option<Arc<dyn Fn() -> Result<(), crate::error::Error> + Send + Sync>>>,
    condvar: Condvar,
    condvar_lock: Mutex<()>,
    event_seq: AtomicU64,
    failure: Mutex<Option<crate::error::Error>>,
}

impl SubgoalEntry {
    fn new(pattern: CallPattern) -> SubgoalEntry {
        let pattern_hash = pattern.stable_hash();
        SubgoalEntry {
            pattern,
            pattern_hash,
            status: Mutex::new(SubgoalStatus::Evaluating),
            trie: AnswerTrie::new(),
            dependencies: Mutex::new(HashSet::new()),
            retracted: Mutex::new(HashSet::new()),
            delay_sets: Mutex::new(HashMap::new()),
            evaluator: Mutex::new(None),
            condvar: Condvar::new(),
            condvar_lock: Mutex::new(()),
            event_seq: AtomicU64::new(0),
            failure: Mutex::new(None),
        }
    }

    pub fn set_failure(&self, error: crate::error::Error) {
        *self.failure.lock() = Some(error);
    }

    pub fn take_failure(&self) -> Option<crate::error::Error> {
        self.failure.lock().clone()
    }

    pub fn status(&self) -> SubgoalStatus {
        *self.status.lock()
    }

    pub fn set_status(&self, status: SubgoalStatus) {
        *self.status.lock() = status;
    }

    pub fn set_evaluator(
        &self,
        evaluator: Arc<dyn Fn() -> Result<(), crate::error::Error> + Send + Sync>,
    ) {
        *self.evaluator.lock() = Some(evaluator);
    }

    pub fn evaluator(&self) -> Option<Arc<dyn Fn() -> Result<(), crate::error::Error> + Send + Sync>> {
        self.evaluator.lock().clone()
    }

    pub fn add_dependency(&self, child_hash: u64) {
        self.dependencies.lock().insert(child_hash);
    }

    pub fn dependencies(&self) -> HashSet<u64> {
        self.dependencies.lock().clone()
    }

    pub fn retract(&self, index: usize) {
        self.retracted.lock().insert(index);
    }

    pub fn is_retracted(&self, index: usize) -> bool {
        self.retracted.lock().contains(&index)
    }

    /// Inserts `answer`; if `delay_on` names a subgoal this answer is only
    /// valid while that subgoal stays absent, records the delay set too.
    /// Notifies waiting consumers on a successful insert. Returns whether
    /// the answer was newly inserted.
    pub fn insert_answer(&self, answer: Answer, delay_on: Option<u64>) -> bool {
        match self.trie.insert_indexed(answer) {
            Some(index) => {
                if let Some(child_hash) = delay_on {
                    let mut set = HashSet::new();
                    set.insert(child_hash);
                    self.set_delay_set(index, set);
                }
                self.notify();
                true
            }
            None => false,
        }
    }

    pub fn set_delay_set(&self, answer_index: usize, children: HashSet<u64>) {
        if children.is_empty() {
            self.delay_sets.lock().remove(&answer_index);
        } else {
            self.delay_sets.lock().insert(answer_index, children);
        }
    }

    pub fn delay_set(&self, answer_index: usize) -> Option<HashSet<u64>> {
        self.delay_sets.lock().get(&answer_index).cloned()
    }

    /// Removes `child_hash` from every delay set; a set that becomes empty
    /// means its answer is now unconditional.
    pub fn clear_child_from_delay_sets(&self, child_hash: u64) {
        let mut sets = self.delay_sets.lock();
        sets.retain(|_, s| {
            s.remove(&child_hash);
            !s.is_empty()
        });
    }

    /// Retracts every answer whose delay set references `child_hash`: the
    /// child turned out to have answers, so any parent answer that was
    /// conditional on its absence no longer holds.
    pub fn retract_answers_depending_on(&self, child_hash: u64) {
        let indices: Vec<usize> = self
            .delay_sets
            .lock()
            .iter()
            .filter(|(_, s)| s.contains(&child_hash))
            .map(|(i, _)| *i)
            .collect();
        for i in indices {
            self.retract(i);
        }
    }

    /// Signals waiting consumers that a new answer (or a status change)
    /// occurred.
    pub fn notify(&self) {
        self.event_seq.fetch_add(1, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    pub fn event_seq(&self) -> u64 {
        self.event_seq.load(Ordering::SeqCst)
    }

    /// Blocks until `event_seq()` advances past `since`, or the entry
    /// completes/fails.
    pub fn wait_for_progress(&self, since: u64) {
        if self.status() != SubgoalStatus::Evaluating || self.event_seq() != since {
            return;
        }
        let mut guard = self.condvar_lock.lock();
        if self.status() == SubgoalStatus::Evaluating && self.event_seq() == since {
            self.condvar.wait(&mut guard);
        }
    }
}

/// Concurrent map from pattern hash to [`SubgoalEntry`], plus a
/// predicate -> hashes index used by `clear_predicate`.
pub struct SubgoalTable {
    entries: DashMap<u64, Arc<SubgoalEntry>>,
    by_predicate: Mutex<HashMap<String, HashSet<u64>>>,
}

impl Default for SubgoalTable {
    fn default() -> SubgoalTable {
        SubgoalTable::new()
    }
}

impl SubgoalTable {
    pub fn new() -> SubgoalTable {
        SubgoalTable {
            entries: DashMap::new(),
            by_predicate: Mutex::new(HashMap::new()),
        }
    }

    /// Atomically returns the existing entry for `pattern`, or creates and
    /// registers a new one. The `bool` is `true` iff a new entry was
    /// created (a cache miss).
    pub fn get_or_create(&self, pattern: &CallPattern) -> (Arc<SubgoalEntry>, bool) {
        let hash = pattern.stable_hash();
        if let Some(existing) = self.entries.get(&hash) {
            return (Arc::clone(&existing), false);
        }
        let entry = Arc::new(SubgoalEntry::new(pattern.clone()));
        let mut created = false;
        let result = self
            .entries
            .entry(hash)
            .or_insert_with(|| {
                created = true;
                Arc::clone(&entry)
            })
            .clone();
        if created {
            self.by_predicate
                .lock()
                .entry(pattern.predicate.clone())
                .or_default()
                .insert(hash);
        }
        (result, created)
    }

    pub fn get_by_hash(&self, hash: u64) -> Option<Arc<SubgoalEntry>> {
        self.entries.get(&hash).map(|e| Arc::clone(&e))
    }

    pub fn delete(&self, hash: u64) {
        self.entries.remove(&hash);
    }

    pub fn total_subgoals(&self) -> usize {
        self.entries.len()
    }

    pub fn all_entries(&self) -> Vec<Arc<SubgoalEntry>> {
        self.entries.iter().map(|e| Arc::clone(e.value())).collect()
    }

    /// Removes every entry created for `predicate`. Returns the count
    /// removed.
    pub fn clear_predicate(&self, predicate: &str) -> usize {
        let hashes = self
            .by_predicate
            .lock()
            .remove(predicate)
            .unwrap_or_default();
        for hash in &hashes {
            self.entries.remove(hash);
        }
        hashes.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.by_predicate.lock().clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent_for_same_pattern() {
        let table = SubgoalTable::new();
        let pattern = CallPattern::new("p", vec![]);
        let (e1, created1) = table.get_or_create(&pattern);
        let (e2, created2) = table.get_or_create(&pattern);
        assert!(created1);
        assert!(!created2);
        assert_eq!(e1.pattern_hash, e2.pattern_hash);
    }

    #[test]
    fn clear_predicate_removes_only_that_predicates_entries() {
        let table = SubgoalTable::new();
        table.get_or_create(&CallPattern::new("p", vec![]));
        table.get_or_create(&CallPattern::new("q", vec![]));
        let removed = table.clear_predicate("p");
        assert_eq!(removed, 1);
        assert_eq!(table.total_subgoals(), 1);
    }
}
