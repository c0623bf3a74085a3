//! Interned type descriptors.
//!
//! Every [`Type`] is a cheap handle to an immutable [`TypeDesc`] owned by a
//! [`TypeRegistry`]. The registry deduplicates descriptors by structural
//! equality (hash-consing), so two handles from the same registry are
//! pointer-identical iff their descriptors are structurally equal. Equality
//! therefore reduces to a pointer comparison, with a structural fallback
//! for handles that originate from different registries.
//!
//! Descriptors are never freed: they live as long as their registry, the
//! same way a symbol table does.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Numeric kind of a scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Byte,
}

impl ScalarKind {
    /// Lowercase name, used in diagnostics and formatting.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Bool => "bool",
            ScalarKind::Byte => "byte",
        }
    }

    /// Whether this kind is a floating point kind.
    pub fn is_float(self) -> bool {
        matches!(self, ScalarKind::F32 | ScalarKind::F64)
    }
}

/// Coarse category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Scalar,
    String,
    Struct,
    Tuple,
    Vector,
    Array,
    Set,
    Enum,
    Path,
    Custom,
    Strong,
}

impl AggregateKind {
    /// Lowercase name, used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            AggregateKind::Scalar => "scalar",
            AggregateKind::String => "string",
            AggregateKind::Struct => "struct",
            AggregateKind::Tuple => "tuple",
            AggregateKind::Vector => "vector",
            AggregateKind::Array => "array",
            AggregateKind::Set => "set",
            AggregateKind::Enum => "enum",
            AggregateKind::Path => "path",
            AggregateKind::Custom => "custom",
            AggregateKind::Strong => "strong",
        }
    }
}

/// A named struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

/// Structural description of a type.
///
/// The closed set of aggregate kinds the reflection system understands.
/// Composite variants embed sub-[`Type`] handles, so a descriptor is a DAG
/// of interned nodes.
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// Numeric, boolean or byte scalar.
    Scalar(ScalarKind),
    /// Owned string.
    Str,
    /// Ordered named fields. Field names participate in equality: two
    /// structs with the same field types but different names are distinct.
    Struct { fields: Vec<Field> },
    /// Ordered anonymous elements.
    Tuple(Vec<Type>),
    /// Homogeneous dynamic sequence.
    Vector(Type),
    /// Homogeneous fixed-size sequence.
    Array { elem: Type, len: usize },
    /// Key type with membership semantics, insertion-ordered.
    Set(Type),
    /// Named alternatives; `flags` marks sets of enum keys.
    Enum {
        alternatives: Vec<String>,
        flags: bool,
    },
    /// A navigable key sequence.
    Path,
    /// Opaque payload the reflection system cannot decompose.
    Custom { id: u32, name: String },
    /// Single-field wrapper carrying a weak representation (newtype).
    Strong { name: String, weak: Type },
}

impl TypeDesc {
    /// The coarse category of this descriptor.
    pub fn aggregate_kind(&self) -> AggregateKind {
        match self {
            TypeDesc::Scalar(_) => AggregateKind::Scalar,
            TypeDesc::Str => AggregateKind::String,
            TypeDesc::Struct { .. } => AggregateKind::Struct,
            TypeDesc::Tuple(_) => AggregateKind::Tuple,
            TypeDesc::Vector(_) => AggregateKind::Vector,
            TypeDesc::Array { .. } => AggregateKind::Array,
            TypeDesc::Set(_) => AggregateKind::Set,
            TypeDesc::Enum { .. } => AggregateKind::Enum,
            TypeDesc::Path => AggregateKind::Path,
            TypeDesc::Custom { .. } => AggregateKind::Custom,
            TypeDesc::Strong { .. } => AggregateKind::Strong,
        }
    }
}

/// Handle to an interned type descriptor.
#[derive(Debug, Clone)]
pub struct Type(Arc<TypeDesc>);

impl Type {
    /// The underlying descriptor.
    pub fn desc(&self) -> &TypeDesc {
        &self.0
    }

    /// The coarse category of this type.
    pub fn aggregate_kind(&self) -> AggregateKind {
        self.0.aggregate_kind()
    }

    /// True if both handles point at the same interned descriptor.
    pub fn same(&self, other: &Type) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        // Same-registry handles compare by pointer; the structural fallback
        // only runs for handles from different registries.
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.desc() {
            TypeDesc::Scalar(kind) => write!(f, "{}", kind.name()),
            TypeDesc::Str => write!(f, "string"),
            TypeDesc::Struct { fields } => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.ty)?;
                }
                write!(f, "}}")
            }
            TypeDesc::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
            TypeDesc::Vector(elem) => write!(f, "[{elem}]"),
            TypeDesc::Array { elem, len } => write!(f, "[{elem}; {len}]"),
            TypeDesc::Set(key) => write!(f, "set<{key}>"),
            TypeDesc::Enum { alternatives, flags } => {
                if *flags {
                    write!(f, "flags(")?;
                } else {
                    write!(f, "enum(")?;
                }
                write!(f, "{})", alternatives.join("|"))
            }
            TypeDesc::Path => write!(f, "path"),
            TypeDesc::Custom { name, .. } => write!(f, "{name}"),
            TypeDesc::Strong { name, .. } => write!(f, "{name}"),
        }
    }
}

/// Interning table for type descriptors.
///
/// Constructed once and passed explicitly wherever types are built; there
/// is no hidden global registry. Multiple independent registries are
/// allowed (hermetic tests), at the cost of structural comparison when
/// their handles meet.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    interned: RefCell<HashSet<Arc<TypeDesc>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a descriptor, returning the canonical handle.
    ///
    /// Structurally equal descriptors always return the identical handle.
    pub fn intern(&self, desc: TypeDesc) -> Type {
        let mut interned = self.interned.borrow_mut();
        if let Some(existing) = interned.get(&desc) {
            return Type(Arc::clone(existing));
        }
        let arc = Arc::new(desc);
        interned.insert(Arc::clone(&arc));
        Type(arc)
    }

    /// Number of distinct descriptors interned so far.
    pub fn len(&self) -> usize {
        self.interned.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.interned.borrow().is_empty()
    }

    pub fn scalar(&self, kind: ScalarKind) -> Type {
        self.intern(TypeDesc::Scalar(kind))
    }

    pub fn string(&self) -> Type {
        self.intern(TypeDesc::Str)
    }

    pub fn structure(&self, fields: Vec<(&str, Type)>) -> Type {
        self.intern(TypeDesc::Struct {
            fields: fields
                .into_iter()
                .map(|(name, ty)| Field {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
        })
    }

    pub fn tuple(&self, elems: Vec<Type>) -> Type {
        self.intern(TypeDesc::Tuple(elems))
    }

    pub fn vector(&self, elem: Type) -> Type {
        self.intern(TypeDesc::Vector(elem))
    }

    pub fn array(&self, elem: Type, len: usize) -> Type {
        self.intern(TypeDesc::Array { elem, len })
    }

    pub fn set(&self, key: Type) -> Type {
        self.intern(TypeDesc::Set(key))
    }

    pub fn enumeration(&self, alternatives: &[&str], flags: bool) -> Type {
        self.intern(TypeDesc::Enum {
            alternatives: alternatives.iter().map(|a| a.to_string()).collect(),
            flags,
        })
    }

    pub fn path(&self) -> Type {
        self.intern(TypeDesc::Path)
    }

    pub fn custom(&self, id: u32, name: &str) -> Type {
        self.intern(TypeDesc::Custom {
            id,
            name: name.to_string(),
        })
    }

    pub fn strong(&self, name: &str, weak: Type) -> Type {
        self.intern(TypeDesc::Strong {
            name: name.to_string(),
            weak,
        })
    }

    /// Canonical descriptor for a statically-known Rust type.
    pub fn of<T: crate::Reflect>(&self) -> Type {
        T::reflect(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_dedupes() {
        let reg = TypeRegistry::new();
        let a = reg.scalar(ScalarKind::F64);
        let b = reg.scalar(ScalarKind::F64);
        assert!(a.same(&b));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_distinct_types_distinct_handles() {
        let reg = TypeRegistry::new();
        let a = reg.scalar(ScalarKind::F64);
        let b = reg.scalar(ScalarKind::F32);
        assert!(!a.same(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_composite_interning() {
        let reg = TypeRegistry::new();
        let a = reg.vector(reg.scalar(ScalarKind::I32));
        let b = reg.vector(reg.scalar(ScalarKind::I32));
        assert!(a.same(&b));
    }

    #[test]
    fn test_struct_field_names_matter() {
        let reg = TypeRegistry::new();
        let f64_ty = reg.scalar(ScalarKind::F64);
        let a = reg.structure(vec![("x", f64_ty.clone()), ("y", f64_ty.clone())]);
        let b = reg.structure(vec![("u", f64_ty.clone()), ("v", f64_ty)]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_cross_registry_structural_equality() {
        let reg_a = TypeRegistry::new();
        let reg_b = TypeRegistry::new();
        let a = reg_a.tuple(vec![reg_a.scalar(ScalarKind::I32), reg_a.string()]);
        let b = reg_b.tuple(vec![reg_b.scalar(ScalarKind::I32), reg_b.string()]);
        assert!(!a.same(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_display() {
        let reg = TypeRegistry::new();
        let ty = reg.structure(vec![
            ("pos", reg.tuple(vec![reg.scalar(ScalarKind::F64); 2])),
            ("tags", reg.vector(reg.string())),
        ]);
        assert_eq!(ty.to_string(), "{pos: (f64, f64), tags: [string]}");
    }
}
