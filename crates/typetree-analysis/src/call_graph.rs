//! Function call graph
//!
//! Tracks who calls whom and derives the bottom-up processing order the
//! propagator uses to seed its worklist: callees before callers, with
//! recursion cycles grouped by strongly-connected component. The order
//! only affects how quickly the fixpoint is reached, never what it is.

use crate::module::{AnalysisModule, FunctionId};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

#[derive(Debug)]
pub struct CallGraph {
    graph: DiGraph<FunctionId, ()>,
    nodes: Vec<NodeIndex>,
}

impl CallGraph {
    pub fn build(module: &AnalysisModule) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = module.functions().map(|(id, _)| graph.add_node(id)).collect();
        for call in module.calls() {
            let caller = nodes[call.caller.0 as usize];
            let callee = nodes[call.callee.0 as usize];
            graph.update_edge(caller, callee, ());
        }
        Self { graph, nodes }
    }

    /// Functions that `function` calls directly.
    pub fn callees(&self, function: FunctionId) -> Vec<FunctionId> {
        self.graph
            .neighbors_directed(self.nodes[function.0 as usize], Direction::Outgoing)
            .map(|n| self.graph[n])
            .collect()
    }

    /// Functions that call `function` directly.
    pub fn callers(&self, function: FunctionId) -> Vec<FunctionId> {
        self.graph
            .neighbors_directed(self.nodes[function.0 as usize], Direction::Incoming)
            .map(|n| self.graph[n])
            .collect()
    }

    /// All functions, callees before their callers. Members of a
    /// recursion cycle come out adjacent, in no particular order.
    pub fn bottom_up_order(&self) -> Vec<FunctionId> {
        // tarjan_scc yields components in reverse topological order of
        // the condensation, which for caller->callee edges is bottom-up.
        tarjan_scc(&self.graph)
            .into_iter()
            .flatten()
            .map(|n| self.graph[n])
            .collect()
    }
}
