//! Analysis configuration

use serde::{Deserialize, Serialize};

/// Tunables for descriptor expansion and fixpoint propagation.
///
/// Passed explicitly into the builder and the propagator — there is no
/// global registry of behavior flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Maximum pointer dereference depth expanded from a descriptor.
    /// Self-referential descriptors are truncated here with `Anything`;
    /// this bound is what makes expansion of cyclic layouts terminate.
    pub max_pointer_depth: usize,

    /// Raise [`RecursionLimitExceeded`](crate::TypeTreeError::RecursionLimitExceeded)
    /// at the depth bound instead of truncating with `Anything`.
    pub fatal_recursion_limit: bool,

    /// Upper bound on fixpoint worklist steps. The lattice guarantees
    /// termination; this converts a monotonicity regression into a
    /// visible non-convergence report rather than a hang.
    pub max_iterations: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_pointer_depth: 6,
            fatal_recursion_limit: false,
            max_iterations: 10_000,
        }
    }
}
