//! The SLG tabling engine: ties together the subgoal table, the
//! dependency graph, and stratified negation into the `evaluate` surface
//! described by the distilled spec, plus a lazily-constructed process-wide
//! singleton.
use crate::context::Context;
use crate::error::Error;
use crate::slg::graph::DependencyGraph;
use crate::slg::negation::Strata;
use crate::slg::pattern::CallPattern;
use crate::slg::table::{SubgoalEntry, SubgoalStatus, SubgoalTable};
use crate::slg::trie::Answer;
use crossbeam_channel::{unbounded, Receiver};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Outcome of probing a negated subgoal (`SlgEngine::evaluate_negated`):
/// already failed (the negation succeeds), already has an answer (the
/// negation fails), or still evaluating -- the caller proceeds
/// optimistically and should record a delay set naming `Pending`'s hash on
/// whatever answer it produces under that assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegationOutcome {
    Succeeded,
    Failed,
    Pending(u64),
}

#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub max_table_size: usize,
    pub max_answers_per_subgoal: usize,
    pub max_fixpoint_iterations: u32,
    pub enforce_stratification: bool,
    pub enable_subsumption: bool,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            max_table_size: 100_000,
            max_answers_per_subgoal: 100_000,
            max_fixpoint_iterations: 1000,
            enforce_stratification: false,
            enable_subsumption: false,
        }
    }
}

/// A stored evaluator: given the context (carrying this subgoal as
/// parent, for dependency tracking) and its own entry, runs one pass of
/// resolution and inserts every answer it produces into the entry's trie,
/// returning `Err` if resolution itself failed (distinct from simply
/// producing zero answers).
pub type Evaluator = Arc<dyn Fn(&Context, &Arc<SubgoalEntry>) -> Result<(), Error> + Send + Sync>;

pub struct SlgEngine {
    table: Arc<SubgoalTable>,
    graph: Arc<DependencyGraph>,
    strata: Mutex<Strata>,
    config: Mutex<EngineConfig>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl Default for SlgEngine {
    fn default() -> SlgEngine {
        SlgEngine::new(EngineConfig::default())
    }
}

impl SlgEngine {
    pub fn new(config: EngineConfig) -> SlgEngine {
        SlgEngine {
            table: Arc::new(SubgoalTable::new()),
            graph: Arc::new(DependencyGraph::new()),
            strata: Mutex::new(Strata::new()),
            config: Mutex::new(config),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn total_evaluations(&self) -> u64 {
        self.cache_hits() + self.cache_misses()
    }

    pub fn total_answers(&self) -> usize {
        self.table.all_entries().iter().map(|e| e.trie.count()).sum()
    }

    pub fn hit_ratio(&self) -> f64 {
        let total = self.total_evaluations();
        if total == 0 {
            0.0
        } else {
            self.cache_hits() as f64 / total as f64
        }
    }

    pub fn set_strata(&self, levels: std::collections::HashMap<String, u32>) {
        self.strata.lock().set(levels);
    }

    /// Evaluates `pattern`, tabling its answers. Returns a channel that
    /// streams answers as they're produced and closes once the subgoal
    /// completes or fails. A direct self-recursive call instead returns a
    /// snapshot of whatever this subgoal has already proven -- repeated
    /// calls to its own stored evaluator (driven by `compute_fixpoint` once
    /// the recursion is recognized as a cycle) see a growing snapshot each
    /// pass, which is how the least-fixpoint iteration makes progress.
    pub fn evaluate(
        &self,
        ctx: &Context,
        pattern: CallPattern,
        evaluator: Evaluator,
    ) -> Receiver<Answer> {
        let (entry, created) = self.table.get_or_create(&pattern);
        let hash = entry.pattern_hash;

        if let Some(parent) = &ctx.parent_subgoal {
            self.graph.add_edge(parent.pattern_hash, hash, false);
            parent.add_dependency(hash);
            if parent.pattern_hash == hash {
                let (sender, receiver) = unbounded();
                for answer in entry.trie.iter() {
                    let _ = sender.send(answer);
                }
                return receiver;
            }
        }

        if !created {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            log::trace!("slg: cache hit for {}", pattern.predicate);
            return self.spawn_consumer(entry);
        }

        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        log::trace!("slg: cache miss for {}, spawning producer", pattern.predicate);
        entry.set_evaluator(Arc::new({
            let entry = Arc::clone(&entry);
            let ctx = ctx.with_parent_subgoal(Arc::clone(&entry));
            let evaluator = Arc::clone(&evaluator);
            move || evaluator(&ctx, &entry)
        }));

        self.spawn_producer(Arc::clone(&entry));
        self.spawn_consumer(entry)
    }

    /// Probes a negated subgoal without exposing its answers: records a
    /// negative edge (rejecting it when stratification is enforced and the
    /// caller's stratum can't negate `pattern`'s), spawns its producer on a
    /// cache miss the same way `evaluate` does, and reports whether it has
    /// already failed (negation succeeds), already has an answer (negation
    /// fails), or is still being evaluated (the caller must proceed under
    /// WFS delay, recording `Pending`'s hash as a delay-set entry on
    /// whatever answer it derives).
    pub fn evaluate_negated(
        &self,
        ctx: &Context,
        pattern: CallPattern,
        evaluator: Evaluator,
    ) -> Result<NegationOutcome, Error> {
        if let Some(parent) = &ctx.parent_subgoal {
            if self.config.lock().enforce_stratification
                && !self
                    .strata
                    .lock()
                    .may_negate(&parent.pattern.predicate, &pattern.predicate)
            {
                return Err(Error::InvalidArgument(format!(
                    "stratification violation: {} may not negate {}",
                    parent.pattern.predicate, pattern.predicate
                )));
            }
        }

        let (entry, created) = self.table.get_or_create(&pattern);
        let hash = entry.pattern_hash;

        if let Some(parent) = &ctx.parent_subgoal {
            self.graph.add_edge(parent.pattern_hash, hash, true);
            parent.add_dependency(hash);
        }

        if created {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
            log::trace!("slg: cache miss for negated call to {}", pattern.predicate);
            entry.set_evaluator(Arc::new({
                let entry = Arc::clone(&entry);
                let ctx = ctx.with_parent_subgoal(Arc::clone(&entry));
                let evaluator = Arc::clone(&evaluator);
                move || evaluator(&ctx, &entry)
            }));
            self.spawn_producer(Arc::clone(&entry));
        } else {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }

        match entry.status() {
            SubgoalStatus::Evaluating => Ok(NegationOutcome::Pending(hash)),
            SubgoalStatus::Complete if entry.trie.count() == 0 => Ok(NegationOutcome::Succeeded),
            SubgoalStatus::Complete => Ok(NegationOutcome::Failed),
            SubgoalStatus::Failed => Err(entry.take_failure().unwrap_or(Error::Cancelled)),
        }
    }

    /// Runs the evaluator, then settles the subgoal: an errored evaluator
    /// fails it outright; a subgoal caught in a cycle is handed to
    /// `detect_cycles_and_settle` for least-fixpoint iteration instead of
    /// being completed after a single pass; otherwise it completes directly.
    /// Either way, the terminal callbacks the spec's negation machinery
    /// depends on (`on_child_has_answers`/`on_child_completed_no_answers`)
    /// fire once the subgoal reaches `Complete`.
    fn spawn_producer(&self, entry: Arc<SubgoalEntry>) {
        let table = Arc::clone(&self.table);
        let graph = Arc::clone(&self.graph);
        let max_iterations = self.config.lock().max_fixpoint_iterations;
        rayon::spawn(move || {
            if let Some(run) = entry.evaluator() {
                if let Err(error) = run() {
                    entry.set_failure(error);
                    entry.set_status(SubgoalStatus::Failed);
                    entry.notify();
                    return;
                }
            }

            if graph.is_cyclic(entry.pattern_hash) {
                let _ = detect_cycles_and_settle_over(&table, &graph, max_iterations);
                if entry.status() == SubgoalStatus::Evaluating {
                    entry.set_status(SubgoalStatus::Complete);
                    entry.notify();
                }
            } else {
                entry.set_status(SubgoalStatus::Complete);
                entry.notify();
            }

            if entry.status() == SubgoalStatus::Complete {
                if entry.trie.count() == 0 {
                    simplify_delay_sets_on_no_answers(&table, &graph, entry.pattern_hash);
                } else {
                    retract_answers_on_new_answers(&table, &graph, entry.pattern_hash);
                }
            }
        });
    }

    /// Streams answers as they land in the trie. An answer whose delay set
    /// names a child still being evaluated is held back (re-checked on the
    /// next wakeup) rather than guessed at; one that names a child now
    /// proven non-empty is retracted instead of delivered; delivery never
    /// exceeds `config.max_answers_per_subgoal`.
    fn spawn_consumer(&self, entry: Arc<SubgoalEntry>) -> Receiver<Answer> {
        let (sender, receiver) = unbounded();
        let table = Arc::clone(&self.table);
        let max_answers = self.config.lock().max_answers_per_subgoal;
        rayon::spawn(move || {
            let mut next_index = 0usize;
            let mut delivered = 0usize;
            let mut held_back: Vec<usize> = Vec::new();
            loop {
                if delivered >= max_answers {
                    return;
                }
                let since = entry.event_seq();
                let new_len = entry.trie.iter_from(next_index).len();
                let mut indices: Vec<usize> = held_back.drain(..).collect();
                indices.extend(next_index..next_index + new_len);
                next_index += new_len;

                for index in indices {
                    if delivered >= max_answers {
                        return;
                    }
                    if entry.is_retracted(index) {
                        continue;
                    }
                    if let Some(delay) = entry.delay_set(index) {
                        let mut proven_present = false;
                        let mut still_pending = false;
                        for child_hash in &delay {
                            if let Some(child) = table.get_by_hash(*child_hash) {
                                match child.status() {
                                    SubgoalStatus::Evaluating => still_pending = true,
                                    SubgoalStatus::Complete if child.trie.count() > 0 => {
                                        proven_present = true;
                                    }
                                    _ => {}
                                }
                            }
                        }
                        if proven_present {
                            entry.retract(index);
                            continue;
                        }
                        if still_pending {
                            held_back.push(index);
                            continue;
                        }
                    }
                    if let Some(answer) = entry.trie.get(index) {
                        if sender.send(answer).is_err() {
                            return;
                        }
                        delivered += 1;
                    }
                }

                if entry.status() != SubgoalStatus::Evaluating {
                    if held_back.is_empty() && entry.trie.iter_from(next_index).is_empty() {
                        return;
                    }
                    // This subgoal is done producing, but a held-back answer
                    // is waiting on a child that's evaluating under a
                    // different (already-settled) parent; poll instead of
                    // blocking on a condvar nothing will signal again.
                    std::thread::sleep(std::time::Duration::from_millis(1));
                    continue;
                }
                entry.wait_for_progress(since);
            }
        });
        receiver
    }

    /// Runs the least-fixpoint iteration for a cyclic SCC: re-invokes
    /// every member's stored evaluator until a full pass adds no new
    /// answers across the whole SCC, or `max_fixpoint_iterations` is
    /// exceeded.
    pub fn compute_fixpoint(&self, scc_hashes: &[u64]) -> Result<(), Error> {
        let max_iterations = self.config.lock().max_fixpoint_iterations;
        compute_fixpoint_over(&self.table, scc_hashes, max_iterations)
    }

    /// Runs Tarjan SCC over the dependency graph and, for every cyclic
    /// component, runs `compute_fixpoint`. Driven automatically from
    /// `spawn_producer` whenever a subgoal's own pattern hash turns out to
    /// be part of a cycle, so a recursive tabled predicate converges
    /// without the caller having to notice or trigger it explicitly.
    pub fn detect_cycles_and_settle(&self) -> Result<(), Error> {
        let max_iterations = self.config.lock().max_fixpoint_iterations;
        detect_cycles_and_settle_over(&self.table, &self.graph, max_iterations)
    }

    pub fn clear_predicate(&self, predicate: &str) -> usize {
        self.table.clear_predicate(predicate)
    }

    pub fn clear(&self) {
        self.table.clear();
        self.strata.lock().clear();
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
    }

    pub fn total_subgoals(&self) -> usize {
        self.table.total_subgoals()
    }
}

/// `onChildHasAnswers`: a child just proved it has an answer, so every
/// parent that negated it can no longer stand on that absence. Retracts
/// the parent answers whose delay set names this child.
fn retract_answers_on_new_answers(table: &SubgoalTable, graph: &DependencyGraph, child_hash: u64) {
    for parent_hash in graph.negative_parents_of(child_hash) {
        if let Some(parent) = table.get_by_hash(parent_hash) {
            parent.retract_answers_depending_on(child_hash);
            parent.notify();
        }
    }
}

/// `onChildCompletedNoAnswers`: a child finished with zero answers, so it's
/// proven absent. Removes it from every parent's delay sets; a set that
/// empties out means that parent's answer is no longer conditional on
/// anything.
fn simplify_delay_sets_on_no_answers(table: &SubgoalTable, graph: &DependencyGraph, child_hash: u64) {
    for parent_hash in graph.negative_parents_of(child_hash) {
        if let Some(parent) = table.get_by_hash(parent_hash) {
            parent.clear_child_from_delay_sets(child_hash);
            parent.notify();
        }
    }
}

fn compute_fixpoint_over(
    table: &SubgoalTable,
    scc_hashes: &[u64],
    max_iterations: u32,
) -> Result<(), Error> {
    let entries: Vec<Arc<SubgoalEntry>> = scc_hashes
        .iter()
        .filter_map(|h| table.get_by_hash(*h))
        .collect();

    let mut previous_total: usize = entries.iter().map(|e| e.trie.count()).sum();
    for _ in 0..max_iterations {
        for entry in &entries {
            if let Some(run) = entry.evaluator() {
                if let Err(error) = run() {
                    for entry in &entries {
                        entry.set_failure(error.clone());
                        entry.set_status(SubgoalStatus::Failed);
                        entry.notify();
                    }
                    return Err(error);
                }
            }
        }
        let total: usize = entries.iter().map(|e| e.trie.count()).sum();
        if total == previous_total {
            for entry in &entries {
                entry.set_status(SubgoalStatus::Complete);
                entry.notify();
            }
            return Ok(());
        }
        previous_total = total;
    }
    log::error!(
        "SLG fixpoint over {} subgoal(s) did not converge within {} iterations",
        entries.len(),
        max_iterations
    );
    for entry in &entries {
        entry.set_failure(Error::FixpointDiverged(max_iterations));
        entry.set_status(SubgoalStatus::Failed);
        entry.notify();
    }
    Err(Error::FixpointDiverged(max_iterations))
}

fn detect_cycles_and_settle_over(
    table: &SubgoalTable,
    graph: &DependencyGraph,
    max_iterations: u32,
) -> Result<(), Error> {
    for scc in graph.sccs() {
        let is_cyclic =
            scc.len() > 1 || scc.first().map(|&h| graph.is_cyclic(h)).unwrap_or(false);
        if is_cyclic {
            compute_fixpoint_over(table, &scc, max_iterations)?;
        }
    }
    Ok(())
}

static GLOBAL_ENGINE: OnceCell<Mutex<Arc<SlgEngine>>> = OnceCell::new();

/// The process-wide singleton engine, lazily constructed on first use.
pub fn global() -> Arc<SlgEngine> {
    GLOBAL_ENGINE
        .get_or_init(|| Mutex::new(Arc::new(SlgEngine::default())))
        .lock()
        .clone()
}

/// Test/embedding hook: replaces the global engine with a fresh one (or a
/// caller-supplied configuration), for isolating test cases from each
/// other's tables.
pub fn reset_global(config: EngineConfig) {
    let slot = GLOBAL_ENGINE.get_or_init(|| Mutex::new(Arc::new(SlgEngine::default())));
    *slot.lock() = Arc::new(SlgEngine::new(config));
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::term::Term;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    #[test]
    fn repeated_evaluate_of_same_pattern_is_a_cache_hit() {
        let engine = SlgEngine::default();
        let pattern = CallPattern::new("fact", vec![Term::int(1)]);
        let ctx = Context::new();
        let evaluator: Evaluator = Arc::new(|_ctx, entry| {
            let mut a = Answer::new();
            a.insert(crate::term::VarId::fresh(), Term::int(1));
            entry.trie.insert(a);
            entry.notify();
            Ok(())
        });

        let rx1 = engine.evaluate(&ctx, pattern.clone(), Arc::clone(&evaluator));
        let first = rx1.recv_timeout(Duration::from_secs(2));
        assert!(first.is_ok());

        let rx2 = engine.evaluate(&ctx, pattern, evaluator);
        let _ = rx2.recv_timeout(Duration::from_millis(200));
        assert_eq!(engine.cache_misses(), 1);
        assert_eq!(engine.cache_hits(), 1);
        assert_eq!(engine.total_evaluations(), 2);
        assert_eq!(engine.total_answers(), 1);
        assert!((engine.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn self_recursive_call_returns_a_closed_channel() {
        let engine = SlgEngine::default();
        let pattern = CallPattern::new("loopy", vec![]);
        let called = Arc::new(AtomicBool::new(false));
        let called2 = Arc::clone(&called);
        let evaluator: Evaluator = Arc::new(move |ctx, entry| {
            called2.store(true, Ordering::SeqCst);
            // Re-entering with the same pattern while this subgoal is its
            // own parent must short-circuit rather than recurse forever.
            let nested = CallPattern::new("loopy", vec![]);
            let child_evaluator: Evaluator = Arc::new(|_, _| Ok(()));
            let rx = crate::slg::engine::SlgEngine::default().evaluate(ctx, nested, child_evaluator);
            assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
            entry.set_status(SubgoalStatus::Complete);
            Ok(())
        });
        let ctx = Context::new();
        let _rx = engine.evaluate(&ctx, pattern, evaluator);
        std::thread::sleep(Duration::from_millis(100));
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn evaluate_negated_reports_succeeded_once_the_child_settles_empty() {
        let engine = SlgEngine::default();
        let ctx = Context::new();
        let pattern = CallPattern::new("absent", vec![]);
        let evaluator: Evaluator = Arc::new(|_ctx, _entry| {
            std::thread::sleep(Duration::from_millis(50));
            Ok(())
        });

        let first = engine
            .evaluate_negated(&ctx, pattern.clone(), Arc::clone(&evaluator))
            .unwrap();
        assert_eq!(first, NegationOutcome::Pending(pattern.stable_hash()));

        std::thread::sleep(Duration::from_millis(150));
        let settled = engine.evaluate_negated(&ctx, pattern, evaluator).unwrap();
        assert_eq!(settled, NegationOutcome::Succeeded);
    }

    #[test]
    fn evaluate_negated_reports_failed_once_the_child_gains_an_answer() {
        let engine = SlgEngine::default();
        let ctx = Context::new();
        let pattern = CallPattern::new("present", vec![]);
        let evaluator: Evaluator = Arc::new(|_ctx, entry| {
            let mut a = Answer::new();
            a.insert(crate::term::VarId::fresh(), Term::int(1));
            entry.trie.insert(a);
            entry.notify();
            Ok(())
        });

        let _ = engine
            .evaluate_negated(&ctx, pattern.clone(), Arc::clone(&evaluator))
            .unwrap();
        std::thread::sleep(Duration::from_millis(100));
        let settled = engine.evaluate_negated(&ctx, pattern, evaluator).unwrap();
        assert_eq!(settled, NegationOutcome::Failed);
    }

    #[test]
    fn evaluate_negated_rejects_a_lower_stratum_negating_a_higher_one() {
        let engine = Arc::new(SlgEngine::new(EngineConfig {
            enforce_stratification: true,
            ..EngineConfig::default()
        }));
        let mut levels = std::collections::HashMap::new();
        levels.insert("even".to_string(), 1);
        levels.insert("odd_via_even".to_string(), 0);
        engine.set_strata(levels);

        let violation_seen = Arc::new(AtomicBool::new(false));
        let violation_seen2 = Arc::clone(&violation_seen);
        let engine_for_parent = Arc::clone(&engine);
        let parent_evaluator: Evaluator = Arc::new(move |ctx, _entry| {
            let child_evaluator: Evaluator = Arc::new(|_, _| Ok(()));
            let result =
                engine_for_parent.evaluate_negated(ctx, CallPattern::new("even", vec![]), child_evaluator);
            violation_seen2.store(result.is_err(), Ordering::SeqCst);
            Ok(())
        });

        let ctx = Context::new();
        let _rx = engine.evaluate(&ctx, CallPattern::new("odd_via_even", vec![]), parent_evaluator);
        std::thread::sleep(Duration::from_millis(100));
        assert!(violation_seen.load(Ordering::SeqCst));
    }

    #[test]
    fn negated_answer_is_retracted_once_the_child_gains_an_answer() {
        let engine = Arc::new(SlgEngine::default());
        let ctx = Context::new();

        let child_evaluator: Evaluator = Arc::new(|_ctx, entry| {
            std::thread::sleep(Duration::from_millis(80));
            let mut a = Answer::new();
            a.insert(crate::term::VarId::fresh(), Term::int(1));
            entry.trie.insert(a);
            entry.notify();
            Ok(())
        });

        let engine_for_parent = Arc::clone(&engine);
        let child_evaluator_for_parent = Arc::clone(&child_evaluator);
        let parent_evaluator: Evaluator = Arc::new(move |ctx, entry| {
            let outcome = engine_for_parent
                .evaluate_negated(
                    ctx,
                    CallPattern::new("q", vec![]),
                    Arc::clone(&child_evaluator_for_parent),
                )
                .unwrap();
            let delay_on = match outcome {
                NegationOutcome::Pending(hash) => Some(hash),
                NegationOutcome::Succeeded => None,
                NegationOutcome::Failed => return Ok(()),
            };
            let mut a = Answer::new();
            a.insert(crate::term::VarId::fresh(), Term::int(42));
            entry.insert_answer(a, delay_on);
            Ok(())
        });

        let rx = engine.evaluate(&ctx, CallPattern::new("p", vec![]), parent_evaluator);
        let mut received = 0;
        while rx.recv_timeout(Duration::from_millis(500)).is_ok() {
            received += 1;
        }
        assert_eq!(received, 0);
    }
}
