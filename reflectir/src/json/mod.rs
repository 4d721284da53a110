mod graph;
mod load;
mod save;

pub use graph::{JsonGraph, JsonNode};
pub use load::deserialize;
pub use save::serialize;

/// Wire-format type keys of the built-in value kinds.
pub(crate) mod type_keys {
    pub const NONE: &str = "";
    pub const BOOL: &str = "Bool";
    pub const INT: &str = "Int";
    pub const FLOAT: &str = "Float";
    pub const DATA_TYPE: &str = "DataType";
    pub const DEVICE: &str = "Device";
    pub const STR: &str = "Str";
    pub const BYTES: &str = "Bytes";
    pub const ARRAY: &str = "Array";
    pub const MAP: &str = "Map";
    pub const SHAPE: &str = "Shape";
    pub const NDARRAY: &str = "NDArray";
}

/// Whether a field of this static type stores a node id (as opposed to a
/// textual attribute value).
pub(crate) fn is_node_typed(static_type_index: i32) -> bool {
    use crate::value::type_index;
    static_type_index == type_index::ANY
        || (static_type_index >= type_index::STATIC_OBJECT_BEGIN
            && static_type_index != type_index::STR)
}

pub(crate) mod text {
    use anyhow::{anyhow, Result};

    /// 17 significant digits round-trip an IEEE-754 binary64 exactly.
    pub fn fmt_double(value: f64) -> String {
        if value.is_nan() {
            "nan".to_string()
        } else if value == f64::INFINITY {
            "inf".to_string()
        } else if value == f64::NEG_INFINITY {
            "-inf".to_string()
        } else {
            format!("{:.16e}", value)
        }
    }

    pub fn parse_double(text: &str) -> Result<f64> {
        match text {
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            "nan" => Ok(f64::NAN),
            _ => text
                .parse()
                .map_err(|_| anyhow!("wrong double format `{}`", text)),
        }
    }

    pub fn parse_int(text: &str) -> Result<i64> {
        text.parse()
            .map_err(|_| anyhow!("wrong integer format `{}`", text))
    }
}
