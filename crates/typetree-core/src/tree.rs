//! Type-tree storage, merge, and re-rooting queries
//!
//! A [`TypeTree`] maps paths to concrete tags for one analyzed value.
//! Storage is a sorted map so iteration, the canonical rendering, and
//! equality checks are deterministic. Absence of a path is bottom; the
//! merge is a per-path lattice join over the union of both path sets and
//! therefore never fails.

use crate::lattice::ConcreteType;
use crate::path::TypePath;
use std::collections::BTreeMap;

/// The full path-to-tag mapping describing a value's reachable memory
/// layout.
///
/// Invariant: a path tagged with a scalar kind has no tagged descendants.
/// A `Pointer`-tagged path may — its descendants describe the pointee,
/// one dereference deeper, not the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTree {
    entries: BTreeMap<TypePath, ConcreteType>,
}

impl TypeTree {
    /// An empty tree: bottom at every path.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Tag at an exact path; `None` is bottom.
    pub fn get(&self, path: &TypePath) -> Option<ConcreteType> {
        self.entries.get(path).copied()
    }

    /// Record a tag, joining with whatever the path already carries.
    pub fn insert(&mut self, path: TypePath, tag: ConcreteType) {
        self.entries
            .entry(path)
            .and_modify(|existing| *existing = existing.merge(tag))
            .or_insert(tag);
    }

    /// Merge every entry of `other` into `self`.
    ///
    /// Returns whether anything changed — the propagator's dirtiness
    /// signal. Each stored tag only ever moves up the lattice, so repeated
    /// merging converges.
    pub fn merge_from(&mut self, other: &TypeTree) -> bool {
        let mut changed = false;
        for (path, &tag) in &other.entries {
            match self.entries.get_mut(path) {
                Some(existing) => {
                    let joined = existing.merge(tag);
                    if joined != *existing {
                        *existing = joined;
                        changed = true;
                    }
                }
                None => {
                    self.entries.insert(path.clone(), tag);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Binary merge, leaving both inputs untouched.
    pub fn merge(a: &TypeTree, b: &TypeTree) -> TypeTree {
        let mut out = a.clone();
        out.merge_from(b);
        out
    }

    /// The layout reachable by dereferencing this value at byte `base`:
    /// every path starting with exactly `[-1, base]` re-rooted by
    /// stripping that prefix. Entries not behind that dereference —
    /// including the pointer hop itself — are dropped.
    pub fn offset_subtree(&self, base: u64) -> TypeTree {
        let mut out = TypeTree::new();
        for (path, &tag) in &self.entries {
            if let Some(stripped) = path.strip_pointee_prefix(base) {
                out.insert(stripped, tag);
            }
        }
        out
    }

    /// This tree's layout as seen from a value that points to it: every
    /// path gains a leading dereference and the new pointer hop is tagged.
    pub fn behind_pointer(&self) -> TypeTree {
        let mut out = TypeTree::new();
        out.insert(TypePath::pointer(), ConcreteType::Pointer);
        for (path, &tag) in &self.entries {
            out.insert(path.prepend_deref(), tag);
        }
        out
    }

    /// Whether any reachable byte is floating-point — the consumer's
    /// "does this value need derivative shadow storage" query.
    pub fn has_float(&self) -> bool {
        self.entries.values().any(|tag| tag.is_float())
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&TypePath, ConcreteType)> {
        self.entries.iter().map(|(p, &t)| (p, t))
    }

    /// Check the scalar-leaf invariant: no scalar-tagged path is a strict
    /// prefix of another tagged path.
    pub fn is_consistent(&self) -> bool {
        // Sorted order puts a path's descendants directly after it, so one
        // lookahead per scalar entry suffices.
        let entries: Vec<(&TypePath, ConcreteType)> = self.iter().collect();
        for (i, (p, tag)) in entries.iter().enumerate() {
            if tag.is_pointer() || *tag == ConcreteType::Anything {
                continue;
            }
            if let Some((next, _)) = entries.get(i + 1) {
                if p.is_prefix_of(next) {
                    return false;
                }
            }
        }
        true
    }
}

impl FromIterator<(TypePath, ConcreteType)> for TypeTree {
    fn from_iter<I: IntoIterator<Item = (TypePath, ConcreteType)>>(iter: I) -> Self {
        let mut tree = TypeTree::new();
        for (path, tag) in iter {
            tree.insert(path, tag);
        }
        tree
    }
}
