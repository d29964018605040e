//! Expansion of structural layout descriptors into type trees
//!
//! The source-type-extraction side hands over a recursive layout
//! descriptor (struct fields with byte offsets, array element strides,
//! pointer indirections). Descriptors live in an arena and reference each
//! other by id, so a struct that contains a pointer back to itself is
//! expressible — and the expansion walk bounds dereference depth
//! explicitly instead of trusting the call stack.

use crate::config::AnalysisConfig;
use crate::error::TypeTreeError;
use crate::lattice::ConcreteType;
use crate::path::TypePath;
use crate::tree::TypeTree;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Index of a descriptor node in a [`DescriptorArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DescriptorId(pub u32);

/// One struct field: explicit byte offset plus the field's own layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub offset: u64,
    pub layout: DescriptorId,
}

/// Recursive structural layout descriptor.
///
/// The core makes no assumption about how a descriptor was derived; it
/// may come from a frontend's type metadata or from conservative
/// reconstruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeDescriptor {
    Scalar(ConcreteType),
    Struct(Vec<Field>),
    Array {
        element: DescriptorId,
        stride: u64,
        count: u64,
    },
    PointerTo(DescriptorId),
}

/// Arena of descriptor nodes.
///
/// Id-based references let layouts form cycles (a list node pointing to
/// itself) that owned boxes cannot express.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorArena {
    nodes: Vec<TypeDescriptor>,
}

impl DescriptorArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, desc: TypeDescriptor) -> DescriptorId {
        let id = DescriptorId(self.nodes.len() as u32);
        self.nodes.push(desc);
        id
    }

    /// Allocate a node to be filled in later, for building cyclic layouts.
    /// Until [`replace`](DescriptorArena::replace) is called it reads as
    /// an opaque scalar.
    pub fn push_placeholder(&mut self) -> DescriptorId {
        self.push(TypeDescriptor::Scalar(ConcreteType::Anything))
    }

    pub fn replace(&mut self, id: DescriptorId, desc: TypeDescriptor) {
        self.nodes[id.0 as usize] = desc;
    }

    pub fn get(&self, id: DescriptorId) -> &TypeDescriptor {
        &self.nodes[id.0 as usize]
    }

    pub fn scalar(&mut self, tag: ConcreteType) -> DescriptorId {
        self.push(TypeDescriptor::Scalar(tag))
    }

    pub fn pointer_to(&mut self, pointee: DescriptorId) -> DescriptorId {
        self.push(TypeDescriptor::PointerTo(pointee))
    }

    pub fn struct_of(&mut self, fields: impl IntoIterator<Item = (u64, DescriptorId)>) -> DescriptorId {
        let fields = fields
            .into_iter()
            .map(|(offset, layout)| Field { offset, layout })
            .collect();
        self.push(TypeDescriptor::Struct(fields))
    }

    pub fn array_of(&mut self, element: DescriptorId, stride: u64, count: u64) -> DescriptorId {
        self.push(TypeDescriptor::Array {
            element,
            stride,
            count,
        })
    }
}

/// Expands descriptors from an arena into [`TypeTree`]s under a
/// configured dereference-depth bound.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    arena: &'a DescriptorArena,
    config: &'a AnalysisConfig,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(arena: &'a DescriptorArena, config: &'a AnalysisConfig) -> Self {
        Self { arena, config }
    }

    /// Expand one descriptor into the type tree of a value with that
    /// layout.
    pub fn build(&self, root: DescriptorId) -> Result<TypeTree, TypeTreeError> {
        let mut tree = TypeTree::new();
        self.expand(root, &TypePath::root(), 0, &mut tree)?;
        Ok(tree)
    }

    fn expand(
        &self,
        id: DescriptorId,
        path: &TypePath,
        depth: usize,
        out: &mut TypeTree,
    ) -> Result<(), TypeTreeError> {
        match self.arena.get(id) {
            TypeDescriptor::Scalar(tag) => {
                out.insert(path.clone(), *tag);
            }
            TypeDescriptor::Struct(fields) => {
                for field in fields {
                    self.expand(field.layout, &path.at_offset(field.offset), depth, out)?;
                }
            }
            TypeDescriptor::Array { element, count, .. } => {
                // Paths encode byte offsets, not indices: an array is
                // represented by its first element's layout, which every
                // further element repeats structurally.
                if *count > 0 {
                    self.expand(*element, path, depth, out)?;
                }
            }
            TypeDescriptor::PointerTo(pointee) => {
                if depth >= self.config.max_pointer_depth {
                    if self.config.fatal_recursion_limit {
                        return Err(TypeTreeError::RecursionLimitExceeded {
                            limit: self.config.max_pointer_depth,
                        });
                    }
                    warn!(
                        limit = self.config.max_pointer_depth,
                        path = %path,
                        "pointer chain hit the depth bound, truncating with Anything"
                    );
                    out.insert(path.deref()?, ConcreteType::Anything);
                    return Ok(());
                }
                let hop = path.deref()?;
                out.insert(hop.clone(), ConcreteType::Pointer);
                self.expand(*pointee, &hop.at_offset(0), depth + 1, out)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::FloatWidth;

    fn build(arena: &DescriptorArena, root: DescriptorId) -> TypeTree {
        TreeBuilder::new(arena, &AnalysisConfig::default())
            .build(root)
            .unwrap()
    }

    #[test]
    fn test_pointer_to_pair_of_floats() {
        let mut arena = DescriptorArena::new();
        let f32_ = arena.scalar(ConcreteType::Float(FloatWidth::Float));
        let pair = arena.struct_of([(0, f32_), (4, f32_)]);
        let ptr = arena.pointer_to(pair);

        let tree = build(&arena, ptr);
        assert_eq!(
            tree.to_string(),
            "{[-1]:Pointer, [-1,0]:Float@float, [-1,4]:Float@float}"
        );
    }

    #[test]
    fn test_widened_first_field_shifts_second() {
        let mut arena = DescriptorArena::new();
        let f64_ = arena.scalar(ConcreteType::Float(FloatWidth::Double));
        let f32_ = arena.scalar(ConcreteType::Float(FloatWidth::Float));
        let pair = arena.struct_of([(0, f64_), (8, f32_)]);
        let ptr = arena.pointer_to(pair);

        let tree = build(&arena, ptr);
        assert_eq!(
            tree.to_string(),
            "{[-1]:Pointer, [-1,0]:Float@double, [-1,8]:Float@float}"
        );
    }

    #[test]
    fn test_pointer_to_scalar() {
        let mut arena = DescriptorArena::new();
        let f64_ = arena.scalar(ConcreteType::Float(FloatWidth::Double));
        let ptr = arena.pointer_to(f64_);

        let tree = build(&arena, ptr);
        assert_eq!(tree.to_string(), "{[-1]:Pointer, [-1,0]:Float@double}");
    }

    #[test]
    fn test_by_value_struct() {
        let mut arena = DescriptorArena::new();
        let int = arena.scalar(ConcreteType::Integer);
        let f32_ = arena.scalar(ConcreteType::Float(FloatWidth::Float));
        let s = arena.struct_of([(0, int), (8, f32_)]);

        let tree = build(&arena, s);
        assert_eq!(tree.to_string(), "{[0]:Integer, [8]:Float@float}");
    }

    #[test]
    fn test_array_uses_representative_element() {
        let mut arena = DescriptorArena::new();
        let f32_ = arena.scalar(ConcreteType::Float(FloatWidth::Float));
        let pair = arena.struct_of([(0, f32_), (4, f32_)]);
        let arr = arena.array_of(pair, 8, 16);
        let ptr = arena.pointer_to(arr);

        let tree = build(&arena, ptr);
        assert_eq!(
            tree.to_string(),
            "{[-1]:Pointer, [-1,0]:Float@float, [-1,4]:Float@float}"
        );
    }

    #[test]
    fn test_empty_array_contributes_nothing() {
        let mut arena = DescriptorArena::new();
        let f64_ = arena.scalar(ConcreteType::Float(FloatWidth::Double));
        let arr = arena.array_of(f64_, 8, 0);

        let tree = build(&arena, arr);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_nested_struct_offsets_fold() {
        // struct Outer { inner: Inner @8 }  with  Inner { x: f64 @0, y: f64 @8 }
        let mut arena = DescriptorArena::new();
        let f64_ = arena.scalar(ConcreteType::Float(FloatWidth::Double));
        let inner = arena.struct_of([(0, f64_), (8, f64_)]);
        let outer = arena.struct_of([(8, inner)]);
        let ptr = arena.pointer_to(outer);

        let tree = build(&arena, ptr);
        assert_eq!(
            tree.to_string(),
            "{[-1]:Pointer, [-1,8]:Float@double, [-1,16]:Float@double}"
        );
    }

    #[test]
    fn test_self_referential_descriptor_terminates() {
        // struct Node { next: *Node @0, value: f64 @8 }
        let mut arena = DescriptorArena::new();
        let node = arena.push_placeholder();
        let next = arena.pointer_to(node);
        let f64_ = arena.scalar(ConcreteType::Float(FloatWidth::Double));
        let layout = TypeDescriptor::Struct(vec![
            Field { offset: 0, layout: next },
            Field { offset: 8, layout: f64_ },
        ]);
        arena.replace(node, layout);
        let ptr = arena.pointer_to(node);

        let config = AnalysisConfig {
            max_pointer_depth: 3,
            ..AnalysisConfig::default()
        };
        let tree = TreeBuilder::new(&arena, &config).build(ptr).unwrap();

        // Three levels of Node are expanded; the fourth pointer hop is
        // truncated to Anything.
        let float = ConcreteType::Float(FloatWidth::Double);
        let p = |hops: &[i64]| TypePath::try_from_hops(hops).unwrap();
        assert_eq!(tree.get(&p(&[-1])), Some(ConcreteType::Pointer));
        assert_eq!(tree.get(&p(&[-1, 8])), Some(float));
        assert_eq!(tree.get(&p(&[-1, 0, -1])), Some(ConcreteType::Pointer));
        assert_eq!(tree.get(&p(&[-1, 0, -1, 8])), Some(float));
        assert_eq!(tree.get(&p(&[-1, 0, -1, 0, -1])), Some(ConcreteType::Pointer));
        assert_eq!(tree.get(&p(&[-1, 0, -1, 0, -1, 8])), Some(float));
        assert_eq!(
            tree.get(&p(&[-1, 0, -1, 0, -1, 0, -1])),
            Some(ConcreteType::Anything)
        );
        assert!(tree.is_consistent());
    }

    #[test]
    fn test_fatal_recursion_limit() {
        let mut arena = DescriptorArena::new();
        let node = arena.push_placeholder();
        let next = arena.pointer_to(node);
        arena.replace(node, TypeDescriptor::Struct(vec![Field { offset: 0, layout: next }]));
        let ptr = arena.pointer_to(node);

        let config = AnalysisConfig {
            max_pointer_depth: 2,
            fatal_recursion_limit: true,
            ..AnalysisConfig::default()
        };
        let err = TreeBuilder::new(&arena, &config).build(ptr).unwrap_err();
        assert_eq!(err, TypeTreeError::RecursionLimitExceeded { limit: 2 });
    }

    #[test]
    fn test_pointer_behind_struct_field() {
        // struct { flag: i at 0, data: *f64 at 8 }
        let mut arena = DescriptorArena::new();
        let int = arena.scalar(ConcreteType::Integer);
        let f64_ = arena.scalar(ConcreteType::Float(FloatWidth::Double));
        let data = arena.pointer_to(f64_);
        let s = arena.struct_of([(0, int), (8, data)]);
        let ptr = arena.pointer_to(s);

        let tree = build(&arena, ptr);
        assert_eq!(
            tree.to_string(),
            "{[-1]:Pointer, [-1,0]:Integer, [-1,8,-1]:Pointer, [-1,8,-1,0]:Float@double}"
        );
    }
}
