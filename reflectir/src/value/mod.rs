mod any;
mod array;
mod device;
mod dtype;
mod map;
mod ndarray;
mod object;
mod shape;

pub use any::{type_index, Any, AnyKey};
pub use array::ArrayObj;
pub use device::{Device, DeviceType};
pub use dtype::{DTypeCode, DataType};
pub use map::MapObj;
#[allow(unused_imports)]
pub use ndarray::{compute_strides, numel};
pub use ndarray::NdArrayObj;
pub use object::ObjectRef;
pub use shape::ShapeObj;
