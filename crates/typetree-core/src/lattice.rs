//! The concrete-type lattice
//!
//! Tags form a three-level lattice: absence (bottom, no information), the
//! concrete kinds, and `Anything` (top, irreconcilable). A tree never
//! stores bottom — an untagged path *is* bottom — so every stored tag can
//! only move upward, which is what bounds the fixpoint in
//! `typetree-analysis`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a floating-point scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatWidth {
    Half,
    Float,
    Double,
    Fp128,
}

impl FloatWidth {
    pub fn bytes(self) -> u64 {
        match self {
            FloatWidth::Half => 2,
            FloatWidth::Float => 4,
            FloatWidth::Double => 8,
            FloatWidth::Fp128 => 16,
        }
    }

    /// Canonical lowercase name used by the textual notation.
    pub fn name(self) -> &'static str {
        match self {
            FloatWidth::Half => "half",
            FloatWidth::Float => "float",
            FloatWidth::Double => "double",
            FloatWidth::Fp128 => "fp128",
        }
    }
}

/// The tag describing what kind of primitive data occupies the bytes at a
/// path.
///
/// A closed sum with an exhaustive [`merge`](ConcreteType::merge): the
/// lattice height is fixed at compile time, not discovered at runtime.
/// `Anything` marks irreconcilable or opaque data, which the downstream
/// differentiation transform treats as non-differentiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConcreteType {
    Integer,
    Float(FloatWidth),
    Pointer,
    Anything,
}

impl ConcreteType {
    /// Least upper bound of two tags.
    ///
    /// Equal tags are kept; everything else — including two floats of
    /// different width — collapses to `Anything`. The analysis does not
    /// guess between conflicting precisions.
    pub fn merge(self, other: ConcreteType) -> ConcreteType {
        use ConcreteType::*;
        match (self, other) {
            (Anything, _) | (_, Anything) => Anything,
            (Integer, Integer) => Integer,
            (Pointer, Pointer) => Pointer,
            (Float(a), Float(b)) => {
                if a == b {
                    Float(a)
                } else {
                    Anything
                }
            }
            (Integer, _) | (Pointer, _) | (Float(_), _) => Anything,
        }
    }

    /// [`merge`](ConcreteType::merge) lifted over absence, which supplies
    /// the bottom row of the lattice: `merge(bottom, x) = x`.
    pub fn merge_opt(a: Option<ConcreteType>, b: Option<ConcreteType>) -> Option<ConcreteType> {
        match (a, b) {
            (None, x) | (x, None) => x,
            (Some(a), Some(b)) => Some(a.merge(b)),
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, ConcreteType::Float(_))
    }

    pub fn is_pointer(self) -> bool {
        matches!(self, ConcreteType::Pointer)
    }
}

impl fmt::Display for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcreteType::Integer => write!(f, "Integer"),
            ConcreteType::Float(w) => write!(f, "Float@{}", w.name()),
            ConcreteType::Pointer => write!(f, "Pointer"),
            ConcreteType::Anything => write!(f, "Anything"),
        }
    }
}
