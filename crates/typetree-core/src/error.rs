//! Error taxonomy for the type-tree core

use thiserror::Error;

/// Fatal failures of the core.
///
/// Type *conflicts* are never errors: the lattice resolves them to
/// `Anything`. What remains are contract violations (a malformed path
/// handed in by a caller) and the recursion bound when it is configured
/// as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeTreeError {
    /// A hop sequence that does not address memory: a dereference where a
    /// byte offset was required, or vice versa. Indicates a bug in the
    /// caller, not recoverable data.
    #[error("malformed path {hops:?}: dereference and offset hops must alternate")]
    MalformedPath { hops: Vec<i64> },

    /// A descriptor's pointer chain exceeded the configured depth bound
    /// while `fatal_recursion_limit` was set. In the default configuration
    /// the builder truncates with `Anything` instead of raising this.
    #[error("pointer chain exceeds the configured depth bound of {limit}")]
    RecursionLimitExceeded { limit: usize },
}
