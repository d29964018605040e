//! The analyzable-module model
//!
//! The IR-lowering collaborator hands the propagator a flat module:
//! functions with interned values (arguments, instruction results),
//! optional layout-descriptor seeds per value, intra-function dependency
//! edges whose endpoints must agree on type information, and call sites
//! binding actual arguments and the call result to a callee. How the host
//! IR was walked to produce this is not the core's concern.

use smallvec::SmallVec;
use typetree_core::builder::{DescriptorArena, DescriptorId};

/// Identifier of an analyzed value, dense across the whole module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

/// Identifier of a function, dense across the whole module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

/// One analyzed value.
#[derive(Debug, Clone)]
pub struct ValueInfo {
    pub function: FunctionId,
    /// Diagnostic label, e.g. the IR register name.
    pub label: String,
    /// Structural layout known up front, if any.
    pub seed: Option<DescriptorId>,
}

/// One function's analysis record: its argument values and return value.
/// The trees of these values double as the function's summary shared with
/// every call site.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: String,
    pub params: Vec<ValueId>,
    pub ret: Option<ValueId>,
}

/// A call instruction binding caller values to a callee.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub caller: FunctionId,
    pub callee: FunctionId,
    pub args: SmallVec<[ValueId; 4]>,
    pub result: Option<ValueId>,
}

/// Everything the propagator needs to know about one compilation unit.
#[derive(Debug, Default)]
pub struct AnalysisModule {
    /// Layout descriptors referenced by value seeds.
    pub descriptors: DescriptorArena,
    functions: Vec<FunctionInfo>,
    values: Vec<ValueInfo>,
    dependencies: Vec<(ValueId, ValueId)>,
    calls: Vec<CallSite>,
}

impl AnalysisModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, name: impl Into<String>) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(FunctionInfo {
            name: name.into(),
            params: Vec::new(),
            ret: None,
        });
        id
    }

    /// Intern a value owned by `function`.
    pub fn add_value(
        &mut self,
        function: FunctionId,
        label: impl Into<String>,
        seed: Option<DescriptorId>,
    ) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(ValueInfo {
            function,
            label: label.into(),
            seed,
        });
        id
    }

    /// Intern a value and register it as the function's next argument.
    pub fn add_param(
        &mut self,
        function: FunctionId,
        label: impl Into<String>,
        seed: Option<DescriptorId>,
    ) -> ValueId {
        let id = self.add_value(function, label, seed);
        self.functions[function.0 as usize].params.push(id);
        id
    }

    pub fn set_return(&mut self, function: FunctionId, value: ValueId) {
        self.functions[function.0 as usize].ret = Some(value);
    }

    /// Record a def-use pair whose type information must agree. Edges are
    /// symmetric: knowledge at either endpoint refines the other.
    pub fn add_dependency(&mut self, a: ValueId, b: ValueId) {
        self.dependencies.push((a, b));
    }

    pub fn add_call(
        &mut self,
        caller: FunctionId,
        callee: FunctionId,
        args: impl IntoIterator<Item = ValueId>,
        result: Option<ValueId>,
    ) {
        self.calls.push(CallSite {
            caller,
            callee,
            args: args.into_iter().collect(),
            result,
        });
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn value(&self, id: ValueId) -> &ValueInfo {
        &self.values[id.0 as usize]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionInfo {
        &self.functions[id.0 as usize]
    }

    pub fn values(&self) -> impl Iterator<Item = (ValueId, &ValueInfo)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, info)| (ValueId(i as u32), info))
    }

    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &FunctionInfo)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, info)| (FunctionId(i as u32), info))
    }

    pub fn dependencies(&self) -> &[(ValueId, ValueId)] {
        &self.dependencies
    }

    pub fn calls(&self) -> &[CallSite] {
        &self.calls
    }
}
