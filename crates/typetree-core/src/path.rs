//! Byte-addressed paths through pointer indirections
//!
//! A path names one location reachable from a root value. A `-1` hop
//! dereferences a pointer; a non-negative hop is a byte offset relative to
//! the most recent dereference (or to the value itself, for by-value
//! aggregates). `[-1]` is "the value is a pointer", `[-1,8]` is "byte 8 of
//! what it points to", `[-1,8,-1]` is "the pointer stored at that byte".

use crate::error::TypeTreeError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Hop value marking a pointer dereference.
pub const DEREF: i64 = -1;

/// An address expressed as an ordered sequence of dereference/offset hops
/// from a root value.
///
/// Well-formed shape: an optional leading byte offset, then alternating
/// dereference/offset pairs, optionally ending with a bare dereference
/// (the pointer hop itself, before its pointee is addressed). Two
/// consecutive offsets or two consecutive dereferences do not address
/// memory and are rejected.
///
/// Paths are immutable; [`deref`](TypePath::deref) and
/// [`at_offset`](TypePath::at_offset) build children. The derived ordering
/// is lexicographic over the hop sequence, so ancestors sort before their
/// descendants — the order the canonical rendering uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypePath {
    hops: SmallVec<[i64; 8]>,
}

impl TypePath {
    /// The root value itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// The bare dereference hop `[-1]`: "the value itself is a pointer".
    pub fn pointer() -> Self {
        Self {
            hops: smallvec::smallvec![DEREF],
        }
    }

    pub fn is_root(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn hops(&self) -> &[i64] {
        &self.hops
    }

    /// Number of dereference hops on this path.
    pub fn pointer_depth(&self) -> usize {
        self.hops.iter().filter(|&&h| h == DEREF).count()
    }

    /// Validate an externally-supplied hop sequence.
    pub fn try_from_hops(hops: &[i64]) -> Result<Self, TypeTreeError> {
        let malformed = || TypeTreeError::MalformedPath { hops: hops.to_vec() };
        if hops.iter().any(|&h| h < DEREF) {
            return Err(malformed());
        }
        for pair in hops.windows(2) {
            let doubled_deref = pair[0] == DEREF && pair[1] == DEREF;
            let doubled_offset = pair[0] >= 0 && pair[1] >= 0;
            if doubled_deref || doubled_offset {
                return Err(malformed());
            }
        }
        Ok(Self {
            hops: SmallVec::from_slice(hops),
        })
    }

    /// Append a dereference hop.
    ///
    /// Dereferencing a path that already ends in a dereference is a
    /// contract violation: the previous dereference must address an
    /// explicit pointee offset first.
    pub fn deref(&self) -> Result<Self, TypeTreeError> {
        if self.hops.last() == Some(&DEREF) {
            let mut hops = self.hops.to_vec();
            hops.push(DEREF);
            return Err(TypeTreeError::MalformedPath { hops });
        }
        let mut hops = self.hops.clone();
        hops.push(DEREF);
        Ok(Self { hops })
    }

    /// Descend `n` bytes into the region addressed by this path.
    ///
    /// Descending into a struct field folds into the working offset
    /// (`[-1,4]` plus 8 is `[-1,12]`, not `[-1,4,8]`); after a dereference
    /// a fresh offset hop is started.
    pub fn at_offset(&self, n: u64) -> Self {
        debug_assert!(n <= i64::MAX as u64, "offset {n} overflows a hop");
        let mut hops = self.hops.clone();
        match hops.last_mut() {
            Some(last) if *last >= 0 => *last += n as i64,
            _ => hops.push(n as i64),
        }
        Self { hops }
    }

    /// Re-address this path as seen through one more pointer indirection.
    ///
    /// The path gains a leading dereference; a path that did not start
    /// with its own offset lands at byte 0 of the new pointee.
    pub fn prepend_deref(&self) -> Self {
        let mut hops = SmallVec::new();
        hops.push(DEREF);
        match self.hops.first() {
            Some(&first) if first >= 0 => hops.extend_from_slice(&self.hops),
            _ => {
                hops.push(0);
                hops.extend_from_slice(&self.hops);
            }
        }
        Self { hops }
    }

    /// True if `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &TypePath) -> bool {
        other.hops.len() >= self.hops.len() && other.hops[..self.hops.len()] == self.hops[..]
    }

    /// The remainder of `self` after a leading `[-1, base]`, if it starts
    /// with exactly that dereference-and-offset pair.
    pub fn strip_pointee_prefix(&self, base: u64) -> Option<TypePath> {
        if self.hops.len() >= 2 && self.hops[0] == DEREF && self.hops[1] == base as i64 {
            Some(Self {
                hops: SmallVec::from_slice(&self.hops[2..]),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, hop) in self.hops.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{hop}")?;
        }
        write!(f, "]")
    }
}
