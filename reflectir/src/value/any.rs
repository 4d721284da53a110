//! Dynamic value substrate.
//!
//! [`Any`] is a tagged value holding either a small POD payload (compared
//! bitwise) or a shared reference to a heap object. Object identity is the
//! allocation address, which is what the equality engine and the node
//! indexer key on.

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::array::ArrayObj;
use super::device::Device;
use super::dtype::DataType;
use super::map::MapObj;
use super::ndarray::NdArrayObj;
use super::object::ObjectRef;
use super::shape::ShapeObj;

/// Type index space shared by POD payloads, built-in object types and
/// registered reflective types.
pub mod type_index {
    pub const NONE: i32 = 0;
    pub const INT: i32 = 1;
    pub const BOOL: i32 = 2;
    pub const FLOAT: i32 = 3;
    pub const OPAQUE_PTR: i32 = 4;
    pub const DATA_TYPE: i32 = 5;
    pub const DEVICE: i32 = 6;

    /// Everything at or above this index is a heap object.
    pub const STATIC_OBJECT_BEGIN: i32 = 64;
    pub const STR: i32 = 64;
    pub const BYTES: i32 = 65;
    pub const ARRAY: i32 = 66;
    pub const MAP: i32 = 67;
    pub const SHAPE: i32 = 68;
    pub const NDARRAY: i32 = 69;

    /// Registered reflective types are assigned indices from here upward.
    pub const DYNAMIC_OBJECT_BEGIN: i32 = 70;

    /// Static field type meaning "any value"; never a runtime index.
    pub const ANY: i32 = -1;
}

#[derive(Debug, Clone)]
pub enum Any {
    None,
    Int(i64),
    Bool(bool),
    Float(f64),
    OpaquePtr(usize),
    DataType(DataType),
    Device(Device),
    Str(Rc<str>),
    Bytes(Rc<[u8]>),
    Array(Rc<ArrayObj>),
    Map(Rc<MapObj>),
    Shape(Rc<ShapeObj>),
    NdArray(Rc<NdArrayObj>),
    Object(ObjectRef),
}

impl Any {
    pub fn type_index(&self) -> i32 {
        match self {
            Any::None => type_index::NONE,
            Any::Int(_) => type_index::INT,
            Any::Bool(_) => type_index::BOOL,
            Any::Float(_) => type_index::FLOAT,
            Any::OpaquePtr(_) => type_index::OPAQUE_PTR,
            Any::DataType(_) => type_index::DATA_TYPE,
            Any::Device(_) => type_index::DEVICE,
            Any::Str(_) => type_index::STR,
            Any::Bytes(_) => type_index::BYTES,
            Any::Array(_) => type_index::ARRAY,
            Any::Map(_) => type_index::MAP,
            Any::Shape(_) => type_index::SHAPE,
            Any::NdArray(_) => type_index::NDARRAY,
            Any::Object(obj) => obj.type_index(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Any::None)
    }

    /// Allocation address for object variants, `None` for PODs.
    pub fn object_addr(&self) -> Option<usize> {
        match self {
            Any::Str(s) => Some(Rc::as_ptr(s) as *const u8 as usize),
            Any::Bytes(b) => Some(Rc::as_ptr(b) as *const u8 as usize),
            Any::Array(a) => Some(Rc::as_ptr(a) as usize),
            Any::Map(m) => Some(Rc::as_ptr(m) as usize),
            Any::Shape(s) => Some(Rc::as_ptr(s) as usize),
            Any::NdArray(t) => Some(Rc::as_ptr(t) as usize),
            Any::Object(o) => Some(o.addr()),
            _ => None,
        }
    }

    /// Identity: same POD payload or same heap allocation.
    pub fn same_as(&self, other: &Any) -> bool {
        match (self.object_addr(), other.object_addr()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => AnyKey(self.clone()) == AnyKey(other.clone()),
            _ => false,
        }
    }

    pub fn str(value: impl AsRef<str>) -> Any {
        Any::Str(Rc::from(value.as_ref()))
    }

    pub fn bytes(value: impl AsRef<[u8]>) -> Any {
        Any::Bytes(Rc::from(value.as_ref()))
    }

    pub fn array(items: impl IntoIterator<Item = Any>) -> Any {
        Any::Array(Rc::new(ArrayObj::from_iter(items)))
    }

    pub fn map(pairs: impl IntoIterator<Item = (Any, Any)>) -> Any {
        Any::Map(Rc::new(MapObj::from_pairs(pairs)))
    }

    pub fn shape(dims: impl IntoIterator<Item = i64>) -> Any {
        Any::Shape(Rc::new(ShapeObj::new(dims.into_iter().collect())))
    }
}

impl From<i64> for Any {
    fn from(value: i64) -> Self {
        Any::Int(value)
    }
}

impl From<bool> for Any {
    fn from(value: bool) -> Self {
        Any::Bool(value)
    }
}

impl From<f64> for Any {
    fn from(value: f64) -> Self {
        Any::Float(value)
    }
}

impl From<DataType> for Any {
    fn from(value: DataType) -> Self {
        Any::DataType(value)
    }
}

impl From<Device> for Any {
    fn from(value: Device) -> Self {
        Any::Device(value)
    }
}

impl From<&str> for Any {
    fn from(value: &str) -> Self {
        Any::str(value)
    }
}

impl From<ObjectRef> for Any {
    fn from(value: ObjectRef) -> Self {
        Any::Object(value)
    }
}

impl std::fmt::Display for Any {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Any::None => write!(f, "None"),
            Any::Int(v) => write!(f, "{}", v),
            Any::Bool(v) => write!(f, "{}", v),
            Any::Float(v) => write!(f, "{}", v),
            Any::OpaquePtr(p) => write!(f, "ptr(0x{:x})", p),
            Any::DataType(dt) => write!(f, "{}", dt),
            Any::Device(dev) => write!(f, "{}", dev),
            Any::Str(s) => write!(f, "{:?}", s),
            Any::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            Any::Array(a) => write!(f, "Array[{}]", a.len()),
            Any::Map(m) => write!(f, "Map[{}]", m.len()),
            Any::Shape(s) => write!(f, "Shape{:?}", s.dims()),
            Any::NdArray(t) => write!(f, "NDArray{:?}", t.shape()),
            Any::Object(o) => write!(f, "{}@0x{:x}", o.type_index(), o.addr()),
        }
    }
}

/// Hashable key wrapper over [`Any`].
///
/// PODs hash and compare by payload bits, Str/Bytes by content, every other
/// object by allocation address. This is the key semantics of both map
/// containers and the serializer's node-interning table.
#[derive(Debug, Clone)]
pub struct AnyKey(pub Any);

impl AnyKey {
    pub fn value(&self) -> &Any {
        &self.0
    }

    pub fn into_value(self) -> Any {
        self.0
    }
}

impl From<Any> for AnyKey {
    fn from(value: Any) -> Self {
        AnyKey(value)
    }
}

impl PartialEq for AnyKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Any::None, Any::None) => true,
            (Any::Int(a), Any::Int(b)) => a == b,
            (Any::Bool(a), Any::Bool(b)) => a == b,
            (Any::Float(a), Any::Float(b)) => a.to_bits() == b.to_bits(),
            (Any::OpaquePtr(a), Any::OpaquePtr(b)) => a == b,
            (Any::DataType(a), Any::DataType(b)) => a == b,
            (Any::Device(a), Any::Device(b)) => a == b,
            (Any::Str(a), Any::Str(b)) => a == b,
            (Any::Bytes(a), Any::Bytes(b)) => a == b,
            (lhs, rhs) => match (lhs.object_addr(), rhs.object_addr()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl Eq for AnyKey {}

impl Hash for AnyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.0).hash(state);
        match &self.0 {
            Any::None => {}
            Any::Int(v) => v.hash(state),
            Any::Bool(v) => v.hash(state),
            Any::Float(v) => v.to_bits().hash(state),
            Any::OpaquePtr(p) => p.hash(state),
            Any::DataType(dt) => dt.hash(state),
            Any::Device(dev) => dev.hash(state),
            Any::Str(s) => s.hash(state),
            Any::Bytes(b) => b.hash(state),
            other => other.object_addr().hash(state),
        }
    }
}
