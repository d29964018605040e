//! # typetree-analysis
//!
//! Interprocedural fixpoint propagation of byte-level type trees.
//!
//! The IR-lowering collaborator describes a compilation unit as an
//! [`AnalysisModule`]: values with optional layout-descriptor seeds,
//! def-use dependency edges, and call sites. [`analyze_module`] seeds
//! every value's tree, propagates type information across dependency and
//! call edges until nothing changes, and freezes the result into a
//! read-only [`TypeAnalysis`] for the differentiation transform.
//!
//! ## Modules
//!
//! - **[`module`]** - The analyzable-module handoff format
//! - **[`call_graph`]** - Caller/callee queries and bottom-up ordering
//! - **[`propagator`]** - The worklist state machine and frozen results
//!
//! ## Quick start
//!
//! ```rust
//! use typetree_analysis::{analyze_module, AnalysisModule};
//! use typetree_core::{AnalysisConfig, ConcreteType, FloatWidth};
//!
//! let mut module = AnalysisModule::new();
//! let main = module.add_function("main");
//! let scale = module.add_function("scale");
//!
//! let f64_ = module.descriptors.scalar(ConcreteType::Float(FloatWidth::Double));
//! let ptr = module.descriptors.pointer_to(f64_);
//! let buffer = module.add_value(main, "buffer", Some(ptr));
//! let arg = module.add_param(scale, "arg0", None);
//! module.add_call(main, scale, [buffer], None);
//!
//! let analysis = analyze_module(&module, &AnalysisConfig::default()).unwrap();
//! assert_eq!(
//!     analysis.tree(arg).unwrap().to_string(),
//!     "{[-1]:Pointer, [-1,0]:Float@double}"
//! );
//! ```

pub mod call_graph;
pub mod module;
pub mod propagator;

pub use call_graph::CallGraph;
pub use module::{AnalysisModule, CallSite, FunctionId, FunctionInfo, ValueId, ValueInfo};
pub use propagator::{analyze_module, Propagator, TypeAnalysis, ValueState};
