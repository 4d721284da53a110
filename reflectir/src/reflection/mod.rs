mod equal;
mod info;
mod path;
pub mod registry;

pub use equal::{equal, first_mismatch};
pub use info::{
    field_flags, EqHashKind, FieldInfo, ReprCreateFn, ReprGetFn, ReprHooks, TypeExtraInfo, TypeInfo,
};
pub use path::{AccessPath, AccessStep};
pub use registry::TypeRegistration;
