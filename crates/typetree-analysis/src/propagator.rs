//! Worklist fixpoint propagation
//!
//! Every value starts with its descriptor-seeded (or empty) tree. A value
//! taken off the worklist re-derives its tree by merging the trees of all
//! its dependency neighbors — def-use pairs inside a function, and
//! actual/formal plus result/return bindings across call sites. A changed
//! tree requeues the neighbors; an unchanged one leaves the value stable.
//! Tags only move up a height-3 lattice and the path set is bounded by
//! the builder's depth cutoff, so the worklist drains.

use crate::call_graph::CallGraph;
use crate::module::{AnalysisModule, ValueId};
use anyhow::Context;
use indexmap::IndexMap;
use std::collections::VecDeque;
use tracing::{debug, trace, warn};
use typetree_core::{AnalysisConfig, TreeBuilder, TypeTree, TypeTreeError};

/// Per-value propagation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueState {
    Unvisited,
    Queued,
    Stable,
}

/// Frozen result of a propagation run: read-only trees by value identity,
/// for the differentiation transform to consume.
#[derive(Debug, Clone)]
pub struct TypeAnalysis {
    trees: IndexMap<ValueId, TypeTree>,
    /// Worklist steps taken to reach the fixpoint.
    pub iterations: usize,
    /// False only if the iteration guard fired before the worklist
    /// drained.
    pub converged: bool,
}

impl TypeAnalysis {
    pub fn tree(&self, value: ValueId) -> Option<&TypeTree> {
        self.trees.get(&value)
    }

    /// The layout reachable by dereferencing `value` at byte `base`.
    pub fn pointee(&self, value: ValueId, base: u64) -> Option<TypeTree> {
        self.tree(value).map(|t| t.offset_subtree(base))
    }

    /// Whether any byte reachable from `value` is floating-point.
    pub fn has_float(&self, value: ValueId) -> bool {
        self.tree(value).is_some_and(TypeTree::has_float)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValueId, &TypeTree)> {
        self.trees.iter().map(|(&v, t)| (v, t))
    }
}

/// The worklist state machine over one module.
#[derive(Debug)]
pub struct Propagator<'a> {
    module: &'a AnalysisModule,
    config: &'a AnalysisConfig,
    trees: Vec<TypeTree>,
    states: Vec<ValueState>,
    /// Symmetric adjacency: dependency edges plus call-site bindings.
    neighbors: Vec<Vec<ValueId>>,
    worklist: VecDeque<ValueId>,
}

impl<'a> Propagator<'a> {
    /// Seed every value's tree from its descriptor and wire up the
    /// dependency adjacency. Fails only on a malformed descriptor or a
    /// fatally-configured recursion bound.
    pub fn new(module: &'a AnalysisModule, config: &'a AnalysisConfig) -> Result<Self, TypeTreeError> {
        let builder = TreeBuilder::new(&module.descriptors, config);
        let mut trees = Vec::with_capacity(module.value_count());
        for (_, info) in module.values() {
            let tree = match info.seed {
                Some(desc) => builder.build(desc)?,
                None => TypeTree::new(),
            };
            trees.push(tree);
        }

        let mut neighbors: Vec<Vec<ValueId>> = vec![Vec::new(); module.value_count()];
        let mut link = |a: ValueId, b: ValueId| {
            neighbors[a.0 as usize].push(b);
            neighbors[b.0 as usize].push(a);
        };
        for &(a, b) in module.dependencies() {
            link(a, b);
        }
        for call in module.calls() {
            let callee = module.function(call.callee);
            if call.args.len() != callee.params.len() {
                warn!(
                    callee = %callee.name,
                    actuals = call.args.len(),
                    formals = callee.params.len(),
                    "call-site argument count differs from callee signature"
                );
            }
            for (&actual, &formal) in call.args.iter().zip(&callee.params) {
                link(actual, formal);
            }
            if let (Some(result), Some(ret)) = (call.result, callee.ret) {
                link(result, ret);
            }
        }

        let mut propagator = Self {
            module,
            config,
            trees,
            states: vec![ValueState::Unvisited; module.value_count()],
            neighbors,
            worklist: VecDeque::new(),
        };
        propagator.seed_worklist();
        Ok(propagator)
    }

    /// Queue every value, callees before callers so summaries tend to be
    /// ready when their call sites are processed.
    fn seed_worklist(&mut self) {
        let mut by_function: Vec<Vec<ValueId>> = vec![Vec::new(); self.module.function_count()];
        for (id, info) in self.module.values() {
            by_function[info.function.0 as usize].push(id);
        }
        let call_graph = CallGraph::build(self.module);
        for function in call_graph.bottom_up_order() {
            for &value in &by_function[function.0 as usize] {
                self.enqueue(value);
            }
        }
    }

    fn enqueue(&mut self, value: ValueId) {
        let state = &mut self.states[value.0 as usize];
        if *state != ValueState::Queued {
            *state = ValueState::Queued;
            self.worklist.push_back(value);
        }
    }

    pub fn state(&self, value: ValueId) -> ValueState {
        self.states[value.0 as usize]
    }

    /// Drain the worklist to fixpoint and freeze the result.
    pub fn run(mut self) -> TypeAnalysis {
        let mut iterations = 0usize;
        let mut converged = true;

        while let Some(value) = self.worklist.pop_front() {
            iterations += 1;
            if iterations > self.config.max_iterations {
                warn!(
                    limit = self.config.max_iterations,
                    pending = self.worklist.len() + 1,
                    "iteration guard fired before the worklist drained"
                );
                converged = false;
                break;
            }

            self.states[value.0 as usize] = ValueState::Stable;

            let mut tree = std::mem::take(&mut self.trees[value.0 as usize]);
            let mut changed = false;
            for &neighbor in &self.neighbors[value.0 as usize] {
                changed |= tree.merge_from(&self.trees[neighbor.0 as usize]);
            }
            self.trees[value.0 as usize] = tree;

            if changed {
                trace!(
                    value = value.0,
                    label = %self.module.value(value).label,
                    "tree changed, requeueing dependents"
                );
                for neighbor in self.neighbors[value.0 as usize].clone() {
                    self.enqueue(neighbor);
                }
            }
        }

        debug!(iterations, converged, "fixpoint propagation finished");
        let trees = self
            .module
            .values()
            .map(|(id, _)| id)
            .zip(self.trees)
            .collect();
        TypeAnalysis {
            trees,
            iterations,
            converged,
        }
    }
}

/// Seed trees from descriptors, propagate to fixpoint, and freeze.
///
/// The convenience entry point for drivers; use [`Propagator`] directly
/// to inspect intermediate state.
pub fn analyze_module(module: &AnalysisModule, config: &AnalysisConfig) -> anyhow::Result<TypeAnalysis> {
    let propagator =
        Propagator::new(module, config).context("seeding type trees from layout descriptors")?;
    Ok(propagator.run())
}
