//! Runtime-typed values.
//!
//! A [`Value`] pairs an interned [`Type`] with a payload and flows between
//! graph nodes without any compile-time knowledge of its shape. Code that
//! does know the shape uses [`Value::of`]/[`Value::as_native`] (strict) or
//! [`Value::convert_to`] (lenient numeric/string conversion); reflective
//! code navigates with [`PathItem`]s through `get`/`set`/`size`/`keys` and
//! friends, dispatched on the value's aggregate kind.

use std::fmt;

use crate::error::{Error, Result};
use crate::path::{Path, PathItem};
use crate::ty::{AggregateKind, ScalarKind, Type, TypeDesc, TypeRegistry};

/// A scalar payload, one variant per [`ScalarKind`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Byte(u8),
}

impl Scalar {
    pub fn kind(self) -> ScalarKind {
        match self {
            Scalar::I8(_) => ScalarKind::I8,
            Scalar::I16(_) => ScalarKind::I16,
            Scalar::I32(_) => ScalarKind::I32,
            Scalar::I64(_) => ScalarKind::I64,
            Scalar::U8(_) => ScalarKind::U8,
            Scalar::U16(_) => ScalarKind::U16,
            Scalar::U32(_) => ScalarKind::U32,
            Scalar::U64(_) => ScalarKind::U64,
            Scalar::F32(_) => ScalarKind::F32,
            Scalar::F64(_) => ScalarKind::F64,
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Byte(_) => ScalarKind::Byte,
        }
    }

    /// Zero value for a scalar kind.
    pub fn zero(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::I8 => Scalar::I8(0),
            ScalarKind::I16 => Scalar::I16(0),
            ScalarKind::I32 => Scalar::I32(0),
            ScalarKind::I64 => Scalar::I64(0),
            ScalarKind::U8 => Scalar::U8(0),
            ScalarKind::U16 => Scalar::U16(0),
            ScalarKind::U32 => Scalar::U32(0),
            ScalarKind::U64 => Scalar::U64(0),
            ScalarKind::F32 => Scalar::F32(0.0),
            ScalarKind::F64 => Scalar::F64(0.0),
            ScalarKind::Bool => Scalar::Bool(false),
            ScalarKind::Byte => Scalar::Byte(0),
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Scalar::I8(v) => v as f64,
            Scalar::I16(v) => v as f64,
            Scalar::I32(v) => v as f64,
            Scalar::I64(v) => v as f64,
            Scalar::U8(v) | Scalar::Byte(v) => v as f64,
            Scalar::U16(v) => v as f64,
            Scalar::U32(v) => v as f64,
            Scalar::U64(v) => v as f64,
            Scalar::F32(v) => v as f64,
            Scalar::F64(v) => v,
            Scalar::Bool(v) => v as u8 as f64,
        }
    }

    pub fn to_i64(self) -> i64 {
        match self {
            Scalar::I8(v) => v as i64,
            Scalar::I16(v) => v as i64,
            Scalar::I32(v) => v as i64,
            Scalar::I64(v) => v,
            Scalar::U8(v) | Scalar::Byte(v) => v as i64,
            Scalar::U16(v) => v as i64,
            Scalar::U32(v) => v as i64,
            Scalar::U64(v) => v as i64,
            Scalar::F32(v) => v as i64,
            Scalar::F64(v) => v as i64,
            Scalar::Bool(v) => v as i64,
        }
    }

    pub fn to_u64(self) -> u64 {
        match self {
            Scalar::I8(v) => v as u64,
            Scalar::I16(v) => v as u64,
            Scalar::I32(v) => v as u64,
            Scalar::I64(v) => v as u64,
            Scalar::U8(v) | Scalar::Byte(v) => v as u64,
            Scalar::U16(v) => v as u64,
            Scalar::U32(v) => v as u64,
            Scalar::U64(v) => v,
            Scalar::F32(v) => v as u64,
            Scalar::F64(v) => v as u64,
            Scalar::Bool(v) => v as u64,
        }
    }

    pub fn to_bool(self) -> bool {
        match self {
            Scalar::Bool(v) => v,
            other => other.to_f64() != 0.0,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::I8(v) => write!(f, "{v}"),
            Scalar::I16(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::U8(v) | Scalar::Byte(v) => write!(f, "{v}"),
            Scalar::U16(v) => write!(f, "{v}"),
            Scalar::U32(v) => write!(f, "{v}"),
            Scalar::U64(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
            Scalar::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Distinct byte scalar (the `Byte` kind, as opposed to `U8`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Byte(pub u8);

/// Type-erased payload of a value.
///
/// `Seq` backs every positional aggregate (struct, tuple, vector, array);
/// the owning [`Type`] disambiguates. `Set` members are insertion-ordered
/// and unique under structural equality.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Scalar(Scalar),
    Str(String),
    Seq(Vec<Value>),
    Set(Vec<Value>),
    /// Selected alternative indices; plain enums hold exactly one.
    Enum(Vec<usize>),
    Path(Path),
    Custom(Vec<u8>),
    Strong(Box<Value>),
}

/// A runtime-typed value: an interned type handle plus a payload.
///
/// A default-constructed value is empty (no type); once constructed with a
/// payload its type is stable until reassignment. Copies are deep.
#[derive(Debug, Clone, Default)]
pub struct Value {
    inner: Option<(Type, Payload)>,
}

impl Value {
    /// The empty value.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Construct from an explicit type and payload.
    ///
    /// Callers are responsible for the payload matching the type; the
    /// typed constructors ([`Value::of`], [`Value::make`]) are preferred.
    pub fn with(ty: Type, payload: Payload) -> Self {
        Self {
            inner: Some((ty, payload)),
        }
    }

    /// Construct from a statically-known native value, inferring its type.
    pub fn of<T: Reflect>(reg: &TypeRegistry, native: T) -> Self {
        native.to_value(reg)
    }

    /// Default/zero value of an explicit type (dynamic value building).
    pub fn make(ty: &Type) -> Self {
        let payload = match ty.desc() {
            TypeDesc::Scalar(kind) => Payload::Scalar(Scalar::zero(*kind)),
            TypeDesc::Str => Payload::Str(String::new()),
            TypeDesc::Struct { fields } => {
                Payload::Seq(fields.iter().map(|f| Value::make(&f.ty)).collect())
            }
            TypeDesc::Tuple(elems) => Payload::Seq(elems.iter().map(Value::make).collect()),
            TypeDesc::Vector(_) => Payload::Seq(Vec::new()),
            TypeDesc::Array { elem, len } => Payload::Seq(vec![Value::make(elem); *len]),
            TypeDesc::Set(_) => Payload::Set(Vec::new()),
            TypeDesc::Enum { alternatives, flags } => {
                if *flags || alternatives.is_empty() {
                    Payload::Enum(Vec::new())
                } else {
                    Payload::Enum(vec![0])
                }
            }
            TypeDesc::Path => Payload::Path(Path::new()),
            TypeDesc::Custom { .. } => Payload::Custom(Vec::new()),
            TypeDesc::Strong { weak, .. } => Payload::Strong(Box::new(Value::make(weak))),
        };
        Self::with(ty.clone(), payload)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// The value's type, `None` when empty.
    pub fn ty(&self) -> Option<&Type> {
        self.inner.as_ref().map(|(ty, _)| ty)
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.inner.as_ref().map(|(_, payload)| payload)
    }

    fn parts(&self) -> Result<(&Type, &Payload)> {
        self.inner
            .as_ref()
            .map(|(ty, payload)| (ty, payload))
            .ok_or(Error::Empty)
    }

    fn parts_mut(&mut self) -> Result<(&Type, &mut Payload)> {
        self.inner
            .as_mut()
            .map(|(ty, payload)| (&*ty, payload))
            .ok_or(Error::Empty)
    }

    fn kind(&self) -> Result<AggregateKind> {
        Ok(self.parts()?.0.aggregate_kind())
    }

    /// Strict extraction of a statically-known native value.
    pub fn as_native<T: Reflect>(&self) -> Result<T> {
        T::from_value(self)
    }

    /// Lenient numeric/string conversion. Fails when the aggregate kind
    /// does not match the requested static category.
    pub fn convert_to<T: Convert>(&self) -> Result<T> {
        T::convert(self)
    }

    // ---- reflective access -------------------------------------------------

    /// Navigate one path item down.
    pub fn get(&self, item: &PathItem) -> Result<&Value> {
        let (ty, payload) = self.parts()?;
        match (ty.desc(), payload) {
            (TypeDesc::Strong { .. }, Payload::Strong(inner)) => inner.get(item),
            (TypeDesc::Struct { fields }, Payload::Seq(elems)) => match item {
                PathItem::Field(name) => {
                    let pos = fields
                        .iter()
                        .position(|f| f.name == *name)
                        .ok_or_else(|| Error::UnknownField(name.clone()))?;
                    Ok(&elems[pos])
                }
                PathItem::Index(index) => seq_get(elems, *index),
                PathItem::Key(_) => Err(self.bad_item(item)),
            },
            (
                TypeDesc::Tuple(_) | TypeDesc::Vector(_) | TypeDesc::Array { .. },
                Payload::Seq(elems),
            ) => match item {
                PathItem::Index(index) => seq_get(elems, *index),
                _ => Err(self.bad_item(item)),
            },
            (TypeDesc::Set(_), Payload::Set(members)) => match item {
                PathItem::Key(key) => members
                    .iter()
                    .find(|m| *m == key.as_ref())
                    .ok_or_else(|| Error::UnknownKey(key.to_string())),
                _ => Err(self.bad_item(item)),
            },
            _ => Err(self.bad_item(item)),
        }
    }

    /// Navigate one path item down, mutably.
    pub fn get_mut(&mut self, item: &PathItem) -> Result<&mut Value> {
        let bad = self.bad_item(item);
        let (ty, payload) = self.parts_mut()?;
        match (ty.desc(), payload) {
            (TypeDesc::Strong { .. }, Payload::Strong(inner)) => inner.get_mut(item),
            (TypeDesc::Struct { fields }, Payload::Seq(elems)) => match item {
                PathItem::Field(name) => {
                    let pos = fields
                        .iter()
                        .position(|f| f.name == *name)
                        .ok_or_else(|| Error::UnknownField(name.clone()))?;
                    Ok(&mut elems[pos])
                }
                PathItem::Index(index) => seq_get_mut(elems, *index),
                PathItem::Key(_) => Err(bad),
            },
            (
                TypeDesc::Tuple(_) | TypeDesc::Vector(_) | TypeDesc::Array { .. },
                Payload::Seq(elems),
            ) => match item {
                PathItem::Index(index) => seq_get_mut(elems, *index),
                _ => Err(bad),
            },
            (TypeDesc::Set(_), Payload::Set(members)) => match item {
                PathItem::Key(key) => members
                    .iter_mut()
                    .find(|m| **m == *key.as_ref())
                    .ok_or_else(|| Error::UnknownKey(key.to_string())),
                _ => Err(bad),
            },
            _ => Err(bad),
        }
    }

    /// Navigate a whole path down.
    pub fn get_path(&self, path: &Path) -> Result<&Value> {
        path.iter().try_fold(self, |value, item| value.get(item))
    }

    /// Replace the component addressed by one path item.
    ///
    /// The incoming value's type must equal the component's declared type.
    pub fn set(&mut self, item: &PathItem, value: Value) -> Result<()> {
        let expected = self.component_type(item)?;
        match value.ty() {
            None => return Err(Error::Empty),
            Some(found) if *found != expected => {
                return Err(Error::ComponentType {
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
            Some(_) => {}
        }
        *self.get_mut(item)? = value;
        Ok(())
    }

    /// Replace the component addressed by a path. An empty path replaces
    /// the whole value.
    pub fn set_path(&mut self, path: &Path, value: Value) -> Result<()> {
        match path.items().split_last() {
            None => {
                *self = value;
                Ok(())
            }
            Some((last, parents)) => {
                let parent = parents
                    .iter()
                    .try_fold(self, |v, item| v.get_mut(item))?;
                parent.set(last, value)
            }
        }
    }

    /// Declared type of the component one path item down.
    pub fn component_type(&self, item: &PathItem) -> Result<Type> {
        let (ty, payload) = self.parts()?;
        match (ty.desc(), payload) {
            (TypeDesc::Strong { .. }, Payload::Strong(inner)) => inner.component_type(item),
            (TypeDesc::Struct { fields }, _) => match item {
                PathItem::Field(name) => fields
                    .iter()
                    .find(|f| f.name == *name)
                    .map(|f| f.ty.clone())
                    .ok_or_else(|| Error::UnknownField(name.clone())),
                PathItem::Index(index) => fields
                    .get(*index)
                    .map(|f| f.ty.clone())
                    .ok_or(Error::OutOfRange {
                        index: *index,
                        size: fields.len(),
                    }),
                PathItem::Key(_) => Err(self.bad_item(item)),
            },
            (TypeDesc::Tuple(elems), _) => match item {
                PathItem::Index(index) => {
                    elems.get(*index).cloned().ok_or(Error::OutOfRange {
                        index: *index,
                        size: elems.len(),
                    })
                }
                _ => Err(self.bad_item(item)),
            },
            (TypeDesc::Vector(elem), _) | (TypeDesc::Array { elem, .. }, _) => match item {
                PathItem::Index(_) => Ok(elem.clone()),
                _ => Err(self.bad_item(item)),
            },
            (TypeDesc::Set(key), _) => match item {
                PathItem::Key(_) => Ok(key.clone()),
                _ => Err(self.bad_item(item)),
            },
            _ => Err(self.bad_item(item)),
        }
    }

    /// Component count: struct/tuple field count, sequence/set length,
    /// string character count, enum selected-alternative count.
    pub fn size(&self) -> Result<usize> {
        let (ty, payload) = self.parts()?;
        match (ty.desc(), payload) {
            (TypeDesc::Strong { .. }, Payload::Strong(inner)) => inner.size(),
            (_, Payload::Seq(elems)) => Ok(elems.len()),
            (_, Payload::Set(members)) => Ok(members.len()),
            (_, Payload::Str(s)) => Ok(s.chars().count()),
            (_, Payload::Enum(selected)) => Ok(selected.len()),
            (_, Payload::Path(path)) => Ok(path.len()),
            _ => Err(Error::Unsupported {
                op: "size",
                kind: ty.aggregate_kind(),
            }),
        }
    }

    /// Resize a vector, filling new slots with the element default.
    pub fn resize(&mut self, new_len: usize) -> Result<()> {
        let (ty, payload) = self.parts_mut()?;
        match (ty.desc(), payload) {
            (TypeDesc::Strong { .. }, Payload::Strong(inner)) => inner.resize(new_len),
            (TypeDesc::Vector(elem), Payload::Seq(elems)) => {
                elems.resize(new_len, Value::make(elem));
                Ok(())
            }
            _ => Err(Error::Unsupported {
                op: "resize",
                kind: ty.aggregate_kind(),
            }),
        }
    }

    /// Path items valid for [`Value::get`] on this value.
    pub fn path_item_keys(&self) -> Result<Vec<PathItem>> {
        let (ty, payload) = self.parts()?;
        match (ty.desc(), payload) {
            (TypeDesc::Strong { .. }, Payload::Strong(inner)) => inner.path_item_keys(),
            (TypeDesc::Struct { fields }, _) => Ok(fields
                .iter()
                .map(|f| PathItem::Field(f.name.clone()))
                .collect()),
            (_, Payload::Seq(elems)) => Ok((0..elems.len()).map(PathItem::Index).collect()),
            (_, Payload::Set(members)) => Ok(members
                .iter()
                .map(|m| PathItem::Key(Box::new(m.clone())))
                .collect()),
            _ => Err(Error::Unsupported {
                op: "path_item_keys",
                kind: ty.aggregate_kind(),
            }),
        }
    }

    /// Member keys: set members, selected enum alternatives (as strings),
    /// struct field names (as strings).
    pub fn keys(&self, reg: &TypeRegistry) -> Result<Vec<Value>> {
        let (ty, payload) = self.parts()?;
        match (ty.desc(), payload) {
            (TypeDesc::Strong { .. }, Payload::Strong(inner)) => inner.keys(reg),
            (_, Payload::Set(members)) => Ok(members.clone()),
            (TypeDesc::Enum { alternatives, .. }, Payload::Enum(selected)) => Ok(selected
                .iter()
                .map(|&i| alternatives[i].to_value(reg))
                .collect()),
            (TypeDesc::Struct { fields }, _) => {
                Ok(fields.iter().map(|f| f.name.to_value(reg)).collect())
            }
            _ => Err(Error::Unsupported {
                op: "keys",
                kind: ty.aggregate_kind(),
            }),
        }
    }

    /// Membership test for sets and enum flag values.
    pub fn contains(&self, member: &Value) -> Result<bool> {
        let (ty, payload) = self.parts()?;
        match (ty.desc(), payload) {
            (TypeDesc::Strong { .. }, Payload::Strong(inner)) => inner.contains(member),
            (_, Payload::Set(members)) => Ok(members.contains(member)),
            (TypeDesc::Enum { alternatives, .. }, Payload::Enum(selected)) => {
                let index = alternative_index(alternatives, member)?;
                Ok(selected.contains(&index))
            }
            _ => Err(Error::Unsupported {
                op: "contains",
                kind: ty.aggregate_kind(),
            }),
        }
    }

    /// Membership insert for sets and enum flag values. Returns `false`
    /// when the member was already present.
    pub fn insert(&mut self, member: Value) -> Result<bool> {
        let (ty, payload) = self.parts_mut()?;
        match (ty.desc(), payload) {
            (TypeDesc::Strong { .. }, Payload::Strong(inner)) => inner.insert(member),
            (TypeDesc::Set(key), Payload::Set(members)) => {
                match member.ty() {
                    None => return Err(Error::Empty),
                    Some(found) if *found != *key => {
                        return Err(Error::ComponentType {
                            expected: key.to_string(),
                            found: found.to_string(),
                        });
                    }
                    Some(_) => {}
                }
                if members.contains(&member) {
                    Ok(false)
                } else {
                    members.push(member);
                    Ok(true)
                }
            }
            (TypeDesc::Enum { alternatives, flags: true }, Payload::Enum(selected)) => {
                let index = alternative_index(alternatives, &member)?;
                if selected.contains(&index) {
                    Ok(false)
                } else {
                    selected.push(index);
                    Ok(true)
                }
            }
            _ => Err(Error::Unsupported {
                op: "insert",
                kind: ty.aggregate_kind(),
            }),
        }
    }

    /// Membership remove for sets and enum flag values. Returns `false`
    /// when the member was not present.
    pub fn remove(&mut self, member: &Value) -> Result<bool> {
        let (ty, payload) = self.parts_mut()?;
        match (ty.desc(), payload) {
            (TypeDesc::Strong { .. }, Payload::Strong(inner)) => inner.remove(member),
            (_, Payload::Set(members)) => {
                let before = members.len();
                members.retain(|m| m != member);
                Ok(members.len() != before)
            }
            (TypeDesc::Enum { alternatives, flags: true }, Payload::Enum(selected)) => {
                let index = alternative_index(alternatives, member)?;
                let before = selected.len();
                selected.retain(|&i| i != index);
                Ok(selected.len() != before)
            }
            _ => Err(Error::Unsupported {
                op: "remove",
                kind: ty.aggregate_kind(),
            }),
        }
    }

    /// Positional element insert for vectors.
    pub fn insert_at(&mut self, index: usize, value: Value) -> Result<()> {
        let (ty, payload) = self.parts_mut()?;
        match (ty.desc(), payload) {
            (TypeDesc::Strong { .. }, Payload::Strong(inner)) => inner.insert_at(index, value),
            (TypeDesc::Vector(elem), Payload::Seq(elems)) => {
                if index > elems.len() {
                    return Err(Error::OutOfRange {
                        index,
                        size: elems.len(),
                    });
                }
                match value.ty() {
                    None => return Err(Error::Empty),
                    Some(found) if *found != *elem => {
                        return Err(Error::ComponentType {
                            expected: elem.to_string(),
                            found: found.to_string(),
                        });
                    }
                    Some(_) => {}
                }
                elems.insert(index, value);
                Ok(())
            }
            _ => Err(Error::Unsupported {
                op: "insert_at",
                kind: ty.aggregate_kind(),
            }),
        }
    }

    /// Positional element remove for vectors.
    pub fn remove_at(&mut self, index: usize) -> Result<Value> {
        let (ty, payload) = self.parts_mut()?;
        match (ty.desc(), payload) {
            (TypeDesc::Strong { .. }, Payload::Strong(inner)) => inner.remove_at(index),
            (TypeDesc::Vector(_), Payload::Seq(elems)) => {
                if index >= elems.len() {
                    return Err(Error::OutOfRange {
                        index,
                        size: elems.len(),
                    });
                }
                Ok(elems.remove(index))
            }
            _ => Err(Error::Unsupported {
                op: "remove_at",
                kind: ty.aggregate_kind(),
            }),
        }
    }

    fn bad_item(&self, item: &PathItem) -> Error {
        match self.kind() {
            Ok(kind) => Error::BadPathItem {
                item: item.to_string(),
                kind,
            },
            Err(e) => e,
        }
    }
}

/// Structural equality: types equal and payloads equal; empty equals empty.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (None, None) => true,
            (Some((ta, pa)), Some((tb, pb))) => ta == tb && pa == pb,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((ty, payload)) = &self.inner else {
            return write!(f, "∅");
        };
        match (ty.desc(), payload) {
            (_, Payload::Scalar(s)) => write!(f, "{s}"),
            (_, Payload::Str(s)) => write!(f, "{s}"),
            (TypeDesc::Struct { fields }, Payload::Seq(elems)) => {
                write!(f, "{{")?;
                for (i, (field, elem)) in fields.iter().zip(elems).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={elem}", field.name)?;
                }
                write!(f, "}}")
            }
            (TypeDesc::Tuple(_), Payload::Seq(elems)) => {
                write!(f, "{{")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, "}}")
            }
            (_, Payload::Seq(elems)) => {
                write!(f, "[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, "]")
            }
            (_, Payload::Set(members)) => {
                write!(f, "[")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{member}")?;
                }
                write!(f, "]")
            }
            (TypeDesc::Enum { alternatives, flags }, Payload::Enum(selected)) => {
                if *flags {
                    write!(f, "[")?;
                    for (i, &alt) in selected.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", alternatives[alt])?;
                    }
                    write!(f, "]")
                } else {
                    match selected.first() {
                        Some(&alt) => write!(f, "{}", alternatives[alt]),
                        None => write!(f, "∅"),
                    }
                }
            }
            (_, Payload::Path(path)) => write!(f, "{path}"),
            (TypeDesc::Custom { name, .. }, Payload::Custom(_)) => write!(f, "<{name}>"),
            (_, Payload::Strong(inner)) => write!(f, "{inner}"),
            // Type/payload disagreement is unreachable through the typed
            // constructors; render the payload side.
            (_, Payload::Enum(_)) => write!(f, "<enum>"),
            (_, Payload::Custom(_)) => write!(f, "<custom>"),
        }
    }
}

fn seq_get(elems: &[Value], index: usize) -> Result<&Value> {
    elems.get(index).ok_or(Error::OutOfRange {
        index,
        size: elems.len(),
    })
}

fn seq_get_mut(elems: &mut [Value], index: usize) -> Result<&mut Value> {
    let size = elems.len();
    elems
        .get_mut(index)
        .ok_or(Error::OutOfRange { index, size })
}

fn alternative_index(alternatives: &[String], member: &Value) -> Result<usize> {
    let name: String = member.convert_to()?;
    alternatives
        .iter()
        .position(|a| *a == name)
        .ok_or(Error::UnknownAlternative(name))
}

// ---- static reflection -----------------------------------------------------

/// Statically-known types that can describe themselves to a registry and
/// round-trip through [`Value`].
pub trait Reflect: Sized {
    fn reflect(reg: &TypeRegistry) -> Type;
    fn to_value(&self, reg: &TypeRegistry) -> Value;
    fn from_value(value: &Value) -> Result<Self>;
}

macro_rules! reflect_scalar {
    ($native:ty, $kind:ident) => {
        impl Reflect for $native {
            fn reflect(reg: &TypeRegistry) -> Type {
                reg.scalar(ScalarKind::$kind)
            }

            fn to_value(&self, reg: &TypeRegistry) -> Value {
                Value::with(
                    reg.scalar(ScalarKind::$kind),
                    Payload::Scalar(Scalar::$kind(*self)),
                )
            }

            fn from_value(value: &Value) -> Result<Self> {
                match value.payload() {
                    Some(Payload::Scalar(Scalar::$kind(v))) => Ok(*v),
                    Some(_) => Err(Error::KindMismatch {
                        expected: ScalarKind::$kind.name(),
                        found: value
                            .ty()
                            .map(|t| t.aggregate_kind().name())
                            .unwrap_or("empty"),
                    }),
                    None => Err(Error::Empty),
                }
            }
        }
    };
}

reflect_scalar!(i8, I8);
reflect_scalar!(i16, I16);
reflect_scalar!(i32, I32);
reflect_scalar!(i64, I64);
reflect_scalar!(u8, U8);
reflect_scalar!(u16, U16);
reflect_scalar!(u32, U32);
reflect_scalar!(u64, U64);
reflect_scalar!(f32, F32);
reflect_scalar!(f64, F64);
reflect_scalar!(bool, Bool);

impl Reflect for Byte {
    fn reflect(reg: &TypeRegistry) -> Type {
        reg.scalar(ScalarKind::Byte)
    }

    fn to_value(&self, reg: &TypeRegistry) -> Value {
        Value::with(
            reg.scalar(ScalarKind::Byte),
            Payload::Scalar(Scalar::Byte(self.0)),
        )
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value.payload() {
            Some(Payload::Scalar(Scalar::Byte(v))) => Ok(Byte(*v)),
            Some(_) => Err(Error::KindMismatch {
                expected: "byte",
                found: value
                    .ty()
                    .map(|t| t.aggregate_kind().name())
                    .unwrap_or("empty"),
            }),
            None => Err(Error::Empty),
        }
    }
}

impl Reflect for String {
    fn reflect(reg: &TypeRegistry) -> Type {
        reg.string()
    }

    fn to_value(&self, reg: &TypeRegistry) -> Value {
        Value::with(reg.string(), Payload::Str(self.clone()))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value.payload() {
            Some(Payload::Str(s)) => Ok(s.clone()),
            Some(_) => Err(Error::KindMismatch {
                expected: "string",
                found: value
                    .ty()
                    .map(|t| t.aggregate_kind().name())
                    .unwrap_or("empty"),
            }),
            None => Err(Error::Empty),
        }
    }
}

impl Reflect for Path {
    fn reflect(reg: &TypeRegistry) -> Type {
        reg.path()
    }

    fn to_value(&self, reg: &TypeRegistry) -> Value {
        Value::with(reg.path(), Payload::Path(self.clone()))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value.payload() {
            Some(Payload::Path(p)) => Ok(p.clone()),
            Some(_) => Err(Error::KindMismatch {
                expected: "path",
                found: value
                    .ty()
                    .map(|t| t.aggregate_kind().name())
                    .unwrap_or("empty"),
            }),
            None => Err(Error::Empty),
        }
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect(reg: &TypeRegistry) -> Type {
        reg.vector(T::reflect(reg))
    }

    fn to_value(&self, reg: &TypeRegistry) -> Value {
        Value::with(
            Self::reflect(reg),
            Payload::Seq(self.iter().map(|e| e.to_value(reg)).collect()),
        )
    }

    fn from_value(value: &Value) -> Result<Self> {
        match (value.ty().map(Type::aggregate_kind), value.payload()) {
            (Some(AggregateKind::Vector), Some(Payload::Seq(elems))) => {
                elems.iter().map(T::from_value).collect()
            }
            (Some(kind), _) => Err(Error::KindMismatch {
                expected: "vector",
                found: kind.name(),
            }),
            (None, _) => Err(Error::Empty),
        }
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn reflect(reg: &TypeRegistry) -> Type {
        reg.array(T::reflect(reg), N)
    }

    fn to_value(&self, reg: &TypeRegistry) -> Value {
        Value::with(
            Self::reflect(reg),
            Payload::Seq(self.iter().map(|e| e.to_value(reg)).collect()),
        )
    }

    fn from_value(value: &Value) -> Result<Self> {
        match (value.ty().map(Type::aggregate_kind), value.payload()) {
            (Some(AggregateKind::Array), Some(Payload::Seq(elems))) => {
                if elems.len() != N {
                    return Err(Error::OutOfRange {
                        index: N,
                        size: elems.len(),
                    });
                }
                let natives: Vec<T> = elems.iter().map(T::from_value).collect::<Result<_>>()?;
                natives.try_into().map_err(|_| Error::OutOfRange {
                    index: N,
                    size: N,
                })
            }
            (Some(kind), _) => Err(Error::KindMismatch {
                expected: "array",
                found: kind.name(),
            }),
            (None, _) => Err(Error::Empty),
        }
    }
}

macro_rules! reflect_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Reflect),+> Reflect for ($($name,)+) {
            fn reflect(reg: &TypeRegistry) -> Type {
                reg.tuple(vec![$($name::reflect(reg)),+])
            }

            fn to_value(&self, reg: &TypeRegistry) -> Value {
                Value::with(
                    Self::reflect(reg),
                    Payload::Seq(vec![$(self.$idx.to_value(reg)),+]),
                )
            }

            fn from_value(value: &Value) -> Result<Self> {
                match (value.ty().map(Type::aggregate_kind), value.payload()) {
                    (Some(AggregateKind::Tuple), Some(Payload::Seq(elems))) => {
                        Ok(($($name::from_value(elems.get($idx).ok_or(
                            Error::OutOfRange { index: $idx, size: elems.len() },
                        )?)?,)+))
                    }
                    (Some(kind), _) => Err(Error::KindMismatch {
                        expected: "tuple",
                        found: kind.name(),
                    }),
                    (None, _) => Err(Error::Empty),
                }
            }
        }
    };
}

reflect_tuple!(A: 0, B: 1);
reflect_tuple!(A: 0, B: 1, C: 2);
reflect_tuple!(A: 0, B: 1, C: 2, D: 3);

// ---- lenient conversion ----------------------------------------------------

/// Targets of [`Value::convert_to`]. Numeric targets accept any scalar
/// payload; the string target accepts only string payloads.
pub trait Convert: Sized {
    fn convert(value: &Value) -> Result<Self>;
}

fn scalar_of(value: &Value) -> Result<Scalar> {
    match value.payload() {
        Some(Payload::Scalar(s)) => Ok(*s),
        Some(Payload::Strong(inner)) => scalar_of(inner),
        Some(_) => Err(Error::KindMismatch {
            expected: "scalar",
            found: value
                .ty()
                .map(|t| t.aggregate_kind().name())
                .unwrap_or("empty"),
        }),
        None => Err(Error::Empty),
    }
}

macro_rules! convert_via {
    ($native:ty, $method:ident) => {
        impl Convert for $native {
            fn convert(value: &Value) -> Result<Self> {
                Ok(scalar_of(value)?.$method() as $native)
            }
        }
    };
}

convert_via!(i8, to_i64);
convert_via!(i16, to_i64);
convert_via!(i32, to_i64);
convert_via!(i64, to_i64);
convert_via!(u8, to_u64);
convert_via!(u16, to_u64);
convert_via!(u32, to_u64);
convert_via!(u64, to_u64);
convert_via!(f32, to_f64);
convert_via!(f64, to_f64);

impl Convert for bool {
    fn convert(value: &Value) -> Result<Self> {
        Ok(scalar_of(value)?.to_bool())
    }
}

impl Convert for String {
    fn convert(value: &Value) -> Result<Self> {
        match value.payload() {
            Some(Payload::Str(s)) => Ok(s.clone()),
            Some(Payload::Strong(inner)) => String::convert(inner),
            Some(_) => Err(Error::KindMismatch {
                expected: "string",
                found: value
                    .ty()
                    .map(|t| t.aggregate_kind().name())
                    .unwrap_or("empty"),
            }),
            None => Err(Error::Empty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg() -> TypeRegistry {
        TypeRegistry::new()
    }

    #[test]
    fn test_empty_value() {
        let v = Value::empty();
        assert!(v.is_empty());
        assert!(v.ty().is_none());
        assert_eq!(v.to_string(), "∅");
        assert_eq!(v, Value::empty());
    }

    #[test]
    fn test_scalar_round_trip() {
        let reg = reg();
        let v = Value::of(&reg, 42_i32);
        assert_eq!(v.as_native::<i32>().unwrap(), 42);
        assert!(v.as_native::<i64>().is_err());
        assert_eq!(v.convert_to::<i64>().unwrap(), 42);
        assert_eq!(v.convert_to::<f64>().unwrap(), 42.0);
    }

    #[test]
    fn test_convert_wrong_category() {
        let reg = reg();
        let v = Value::of(&reg, vec![1.0_f64, 2.0]);
        assert!(matches!(
            v.convert_to::<f64>(),
            Err(Error::KindMismatch { .. })
        ));
        assert!(matches!(
            v.convert_to::<String>(),
            Err(Error::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_vector_navigation() {
        let reg = reg();
        let mut v = Value::of(&reg, vec![1_i32, 2, 3]);
        assert_eq!(v.size().unwrap(), 3);
        assert_eq!(
            v.get(&PathItem::index(1)).unwrap().as_native::<i32>().unwrap(),
            2
        );
        v.set(&PathItem::index(1), Value::of(&reg, 9_i32)).unwrap();
        assert_eq!(v.as_native::<Vec<i32>>().unwrap(), vec![1, 9, 3]);
        assert!(matches!(
            v.get(&PathItem::index(3)),
            Err(Error::OutOfRange { index: 3, size: 3 })
        ));
    }

    #[test]
    fn test_struct_round_trip() {
        let reg = reg();
        let ty = reg.structure(vec![
            ("width", reg.scalar(ScalarKind::U32)),
            ("label", reg.string()),
        ]);
        let mut v = Value::make(&ty);
        assert_eq!(v.size().unwrap(), 2);
        v.set(&PathItem::field("width"), Value::of(&reg, 800_u32))
            .unwrap();
        v.set(&PathItem::field("label"), Value::of(&reg, "main".to_string()))
            .unwrap();
        assert_eq!(
            v.get(&PathItem::field("width"))
                .unwrap()
                .as_native::<u32>()
                .unwrap(),
            800
        );
        assert_eq!(v.to_string(), "{width=800, label=main}");
        assert!(matches!(
            v.get(&PathItem::field("height")),
            Err(Error::UnknownField(_))
        ));
    }

    #[test]
    fn test_set_membership() {
        let reg = reg();
        let ty = reg.set(reg.scalar(ScalarKind::I32));
        let mut v = Value::make(&ty);
        assert!(v.insert(Value::of(&reg, 5_i32)).unwrap());
        assert!(!v.insert(Value::of(&reg, 5_i32)).unwrap());
        assert!(v.insert(Value::of(&reg, 7_i32)).unwrap());
        assert!(v.contains(&Value::of(&reg, 7_i32)).unwrap());
        assert!(v.remove(&Value::of(&reg, 5_i32)).unwrap());
        assert!(!v.contains(&Value::of(&reg, 5_i32)).unwrap());
        assert_eq!(v.size().unwrap(), 1);
    }

    #[test]
    fn test_enum_flags() {
        let reg = reg();
        let ty = reg.enumeration(&["dirty", "pinned", "hidden"], true);
        let mut v = Value::make(&ty);
        assert_eq!(v.size().unwrap(), 0);
        v.insert(Value::of(&reg, "pinned".to_string())).unwrap();
        v.insert(Value::of(&reg, "dirty".to_string())).unwrap();
        assert!(v.contains(&Value::of(&reg, "dirty".to_string())).unwrap());
        assert_eq!(v.to_string(), "[pinned, dirty]");
        assert!(matches!(
            v.insert(Value::of(&reg, "bogus".to_string())),
            Err(Error::UnknownAlternative(_))
        ));
    }

    #[test]
    fn test_plain_enum_default() {
        let reg = reg();
        let ty = reg.enumeration(&["idle", "running"], false);
        let v = Value::make(&ty);
        assert_eq!(v.to_string(), "idle");
    }

    #[test]
    fn test_strong_wrapper_unwraps() {
        let reg = reg();
        let ty = reg.strong("NodeIndex", reg.scalar(ScalarKind::U64));
        let mut v = Value::make(&ty);
        assert_eq!(v.to_string(), "0");
        assert_eq!(v.convert_to::<u64>().unwrap(), 0);
        v.resize(1).unwrap_err();
        assert_eq!(v.size().unwrap_err(), Error::Unsupported {
            op: "size",
            kind: AggregateKind::Scalar,
        });
    }

    #[test]
    fn test_nested_path_round_trip() {
        let reg = reg();
        let cell = reg.structure(vec![("state", reg.scalar(ScalarKind::U8))]);
        let ty = reg.structure(vec![("cells", reg.vector(cell.clone()))]);
        let mut v = Value::make(&ty);
        v.get_mut(&PathItem::field("cells")).unwrap().resize(2).unwrap();

        let path: Path = vec![
            PathItem::field("cells"),
            PathItem::index(1),
            PathItem::field("state"),
        ]
        .into();
        v.set_path(&path, Value::of(&reg, 3_u8)).unwrap();
        assert_eq!(
            v.get_path(&path).unwrap().as_native::<u8>().unwrap(),
            3
        );
        assert_eq!(v.to_string(), "{cells=[{state=0}, {state=3}]}");
    }

    #[test]
    fn test_array_fixed_size() {
        let reg = reg();
        let v = Value::of(&reg, [1.5_f64, 2.5, 3.5]);
        assert_eq!(v.size().unwrap(), 3);
        assert_eq!(v.as_native::<[f64; 3]>().unwrap(), [1.5, 2.5, 3.5]);
        assert!(v.as_native::<[f64; 2]>().is_err());
    }

    #[test]
    fn test_tuple_round_trip() {
        let reg = reg();
        let v = Value::of(&reg, (3_i32, 5_i32));
        assert_eq!(v.as_native::<(i32, i32)>().unwrap(), (3, 5));
        assert_eq!(v.to_string(), "{3, 5}");
    }

    #[test]
    fn test_component_type_check_on_set() {
        let reg = reg();
        let mut v = Value::of(&reg, vec![1_i32, 2]);
        assert!(matches!(
            v.set(&PathItem::index(0), Value::of(&reg, 1.0_f64)),
            Err(Error::ComponentType { .. })
        ));
    }

    #[test]
    fn test_make_defaults() {
        let reg = reg();
        let ty = reg.tuple(vec![
            reg.scalar(ScalarKind::F64),
            reg.string(),
            reg.vector(reg.scalar(ScalarKind::I32)),
        ]);
        let v = Value::make(&ty);
        assert_eq!(v.to_string(), "{0, , []}");
    }

    #[test]
    fn test_path_item_keys() {
        let reg = reg();
        let ty = reg.structure(vec![
            ("a", reg.scalar(ScalarKind::I32)),
            ("b", reg.scalar(ScalarKind::I32)),
        ]);
        let v = Value::make(&ty);
        let keys = v.path_item_keys().unwrap();
        assert_eq!(keys, vec![PathItem::field("a"), PathItem::field("b")]);
    }
}
