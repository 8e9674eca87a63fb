//! The parent -> child subgoal dependency graph, recomputed after every
//! new negative edge so cyclic, negation-involving SCCs can be found.
use parking_lot::RwLock;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

#[derive(Debug)]
struct Inner {
    graph: DiGraph<u64, bool>,
    nodes: HashMap<u64, NodeIndex>,
    negative_sccs: Vec<Vec<u64>>,
}

/// Tracks positive/negative call edges between subgoal pattern hashes.
/// Guarded by a single `RwLock`: reads (`is_cyclic`, `in_negative_scc`)
/// take a shared lock, writes (`add_edge`) take exclusive and recompute
/// SCC membership inline.
pub struct DependencyGraph {
    inner: RwLock<Inner>,
}

impl Default for DependencyGraph {
    fn default() -> DependencyGraph {
        DependencyGraph::new()
    }
}

impl DependencyGraph {
    pub fn new() -> DependencyGraph {
        DependencyGraph {
            inner: RwLock::new(Inner {
                graph: DiGraph::new(),
                nodes: HashMap::new(),
                negative_sccs: Vec::new(),
            }),
        }
    }

    fn node_for(inner: &mut Inner, hash: u64) -> NodeIndex {
        *inner
            .nodes
            .entry(hash)
            .or_insert_with(|| inner.graph.add_node(hash))
    }

    pub fn add_edge(&self, parent: u64, child: u64, negative: bool) {
        let mut inner = self.inner.write();
        let p = Self::node_for(&mut inner, parent);
        let c = Self::node_for(&mut inner, child);
        inner.graph.update_edge(p, c, negative);
        if negative {
            self.recompute_sccs(&mut inner);
        }
    }

    fn recompute_sccs(&self, inner: &mut Inner) {
        let sccs = tarjan_scc(&inner.graph);
        let mut negative_sccs = Vec::new();
        for scc in &sccs {
            let has_negative_edge = scc.iter().any(|&n| {
                inner
                    .graph
                    .edges(n)
                    .any(|e| *e.weight() && scc.contains(&e.target()))
            });
            let is_cyclic = scc.len() > 1
                || scc
                    .first()
                    .map(|&n| inner.graph.find_edge(n, n).is_some())
                    .unwrap_or(false);
            if has_negative_edge && is_cyclic {
                negative_sccs.push(scc.iter().map(|&n| inner.graph[n]).collect());
            }
        }
        inner.negative_sccs = negative_sccs;
    }

    /// All strongly connected components as pattern-hash vectors, ordered
    /// by `petgraph`'s reverse-topological convention.
    pub fn sccs(&self) -> Vec<Vec<u64>> {
        let inner = self.inner.read();
        tarjan_scc(&inner.graph)
            .into_iter()
            .map(|scc| scc.into_iter().map(|n| inner.graph[n]).collect())
            .collect()
    }

    pub fn is_cyclic(&self, hash: u64) -> bool {
        let inner = self.inner.read();
        let node = match inner.nodes.get(&hash) {
            Some(n) => *n,
            None => return false,
        };
        tarjan_scc(&inner.graph).into_iter().any(|scc| {
            scc.contains(&node) && (scc.len() > 1 || inner.graph.find_edge(node, node).is_some())
        })
    }

    /// Whether `hash` belongs to a cyclic SCC containing a negative edge,
    /// i.e. is "WFS-undefined" until the cycle resolves.
    pub fn in_negative_scc(&self, hash: u64) -> bool {
        self.inner
            .read()
            .negative_sccs
            .iter()
            .any(|scc| scc.contains(&hash))
    }

    /// Every subgoal that negated `child`, i.e. every source of an
    /// incoming negative edge. Used to retarget the delay-set hooks
    /// (`onChildHasAnswers`/`onChildCompletedNoAnswers`) at exactly the
    /// parents that depend on `child`'s absence.
    pub fn negative_parents_of(&self, child: u64) -> Vec<u64> {
        let inner = self.inner.read();
        let node = match inner.nodes.get(&child) {
            Some(n) => *n,
            None => return Vec::new(),
        };
        inner
            .graph
            .edges_directed(node, petgraph::Direction::Incoming)
            .filter(|e| *e.weight())
            .map(|e| inner.graph[e.source()])
            .collect()
    }
}
