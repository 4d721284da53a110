mod json;
#[doc(hidden)]
pub mod logging;
mod reflection;
mod value;

pub use json::{deserialize, serialize, JsonGraph, JsonNode};
pub use reflection::{
    equal, field_flags, first_mismatch, registry, AccessPath, AccessStep, EqHashKind, FieldInfo,
    ReprCreateFn, ReprGetFn, ReprHooks, TypeExtraInfo, TypeInfo, TypeRegistration,
};
pub use value::{
    type_index, Any, AnyKey, ArrayObj, DTypeCode, DataType, Device, DeviceType, MapObj, NdArrayObj,
    ObjectRef, ShapeObj,
};
