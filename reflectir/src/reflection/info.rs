use anyhow::Result;

use crate::value::ObjectRef;

/// How a registered type participates in structural equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqHashKind {
    /// Never structurally compared; identity only.
    Unsupported,
    /// Every instance is distinct; identity only.
    UniqueInstance,
    /// Tree constant: identity short-circuits, content decides otherwise.
    ConstTreeNode,
    /// Shared subgraphs must map consistently across the two sides.
    DagNode,
    /// Binding site: identity when unbound, mapping when in a definition scope.
    FreeVar,
}

/// Field flags.
pub mod field_flags {
    /// Field is invisible to structural equality.
    pub const EQ_HASH_IGNORE: u32 = 1 << 0;
    /// Field subtree introduces definitions; free vars inside may map.
    pub const EQ_HASH_DEF: u32 = 1 << 1;
}

/// Per-field reflection record. Fields are positional: the n-th registered
/// field occupies the n-th slot of every instance.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub static_type_index: i32,
    pub flags: u32,
}

pub type ReprGetFn = Box<dyn Fn(&ObjectRef) -> Result<Vec<u8>> + Send + Sync>;
pub type ReprCreateFn = Box<dyn Fn(&[u8]) -> Result<ObjectRef> + Send + Sync>;

/// Opaque byte serialization hooks. When present they replace field-by-field
/// reflection for save and load.
pub struct ReprHooks {
    pub get: ReprGetFn,
    pub create: ReprCreateFn,
}

impl std::fmt::Debug for ReprHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReprHooks")
    }
}

/// Reflection metadata of a registered type. Absent on types that opted out
/// of reflection; such types compare by identity and refuse serialization.
#[derive(Debug)]
pub struct TypeExtraInfo {
    pub eq_hash_kind: EqHashKind,
    pub fields: Vec<FieldInfo>,
    pub repr: Option<ReprHooks>,
}

#[derive(Debug)]
pub struct TypeInfo {
    pub type_index: i32,
    pub type_key: String,
    pub extra: Option<TypeExtraInfo>,
}
