//! # typetree-core
//!
//! Byte-level type-tree substrate for automatic-differentiation
//! transforms: for every value an analysis touches, which reachable bytes
//! are pointers, which are floating-point (and at what width), which are
//! plain integers, and which are opaque.
//!
//! ## Modules
//!
//! - **[`path`]** - Addresses through pointer dereferences and byte offsets
//! - **[`lattice`]** - The concrete-type tags and their join
//! - **[`tree`]** - Per-value path-to-tag storage, merge, and re-rooting
//! - **[`builder`]** - Expansion of structural layout descriptors
//! - **[`codec`]** - The canonical bracketed textual notation
//! - **[`config`]** - Explicit knobs for depth bounds and iteration caps
//!
//! ## Quick start
//!
//! ```rust
//! use typetree_core::{AnalysisConfig, ConcreteType, DescriptorArena, FloatWidth, TreeBuilder};
//!
//! let mut arena = DescriptorArena::new();
//! let f32_ = arena.scalar(ConcreteType::Float(FloatWidth::Float));
//! let pair = arena.struct_of([(0, f32_), (4, f32_)]);
//! let ptr = arena.pointer_to(pair);
//!
//! let config = AnalysisConfig::default();
//! let tree = TreeBuilder::new(&arena, &config).build(ptr).unwrap();
//! assert_eq!(
//!     tree.to_string(),
//!     "{[-1]:Pointer, [-1,0]:Float@float, [-1,4]:Float@float}"
//! );
//! ```

pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod lattice;
pub mod path;
pub mod tree;

pub use builder::{DescriptorArena, DescriptorId, Field, TreeBuilder, TypeDescriptor};
pub use codec::ParseError;
pub use config::AnalysisConfig;
pub use error::TypeTreeError;
pub use lattice::{ConcreteType, FloatWidth};
pub use path::{TypePath, DEREF};
pub use tree::TypeTree;
