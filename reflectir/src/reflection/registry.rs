//! Process-wide type registry.
//!
//! Registration happens at startup, before any equality or serialization
//! call; afterwards the table is effectively immutable.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, bail, Result};
use once_cell::sync::Lazy;

use crate::value::{type_index, Any, ObjectRef};
use crate::{trace, warning};

use super::info::{EqHashKind, FieldInfo, ReprCreateFn, ReprGetFn, ReprHooks, TypeExtraInfo, TypeInfo};

struct TypeTable {
    infos: Vec<Arc<TypeInfo>>,
    by_key: HashMap<String, i32>,
}

impl TypeTable {
    fn next_index(&self) -> i32 {
        type_index::DYNAMIC_OBJECT_BEGIN + self.infos.len() as i32
    }
}

static TYPES: Lazy<RwLock<TypeTable>> = Lazy::new(|| {
    RwLock::new(TypeTable {
        infos: Vec::new(),
        by_key: HashMap::new(),
    })
});

/// Look up a registered type by index.
pub fn type_info(index: i32) -> Result<Arc<TypeInfo>> {
    let table = TYPES.read().expect("type table poisoned");
    let slot = (index - type_index::DYNAMIC_OBJECT_BEGIN) as usize;
    if index < type_index::DYNAMIC_OBJECT_BEGIN || slot >= table.infos.len() {
        bail!("unregistered type index {}", index);
    }
    Ok(Arc::clone(&table.infos[slot]))
}

/// Look up a registered type by key.
pub fn type_info_by_key(type_key: &str) -> Result<Arc<TypeInfo>> {
    let table = TYPES.read().expect("type table poisoned");
    let index = *table
        .by_key
        .get(type_key)
        .ok_or_else(|| anyhow!("unregistered type key `{}`", type_key))?;
    let slot = (index - type_index::DYNAMIC_OBJECT_BEGIN) as usize;
    Ok(Arc::clone(&table.infos[slot]))
}

/// Builder for registering a reflective type.
pub struct TypeRegistration {
    type_key: String,
    eq_hash_kind: EqHashKind,
    fields: Vec<FieldInfo>,
    repr: Option<ReprHooks>,
    reflective: bool,
}

impl TypeRegistration {
    pub fn new(type_key: impl Into<String>) -> Self {
        Self {
            type_key: type_key.into(),
            eq_hash_kind: EqHashKind::Unsupported,
            fields: Vec::new(),
            repr: None,
            reflective: true,
        }
    }

    pub fn eq_hash_kind(mut self, kind: EqHashKind) -> Self {
        self.eq_hash_kind = kind;
        self
    }

    pub fn field(mut self, name: impl Into<String>, static_type_index: i32, flags: u32) -> Self {
        self.fields.push(FieldInfo {
            name: name.into(),
            static_type_index,
            flags,
        });
        self
    }

    pub fn repr_hooks(mut self, get: ReprGetFn, create: ReprCreateFn) -> Self {
        self.repr = Some(ReprHooks { get, create });
        self
    }

    /// Register without reflection metadata: the type compares by identity
    /// and cannot be serialized.
    pub fn without_reflection(mut self) -> Self {
        self.reflective = false;
        self
    }

    /// Install the type and return its index. Re-registering an existing key
    /// returns the already-assigned index.
    pub fn register(self) -> Result<i32> {
        let mut table = TYPES.write().expect("type table poisoned");
        if let Some(existing) = table.by_key.get(&self.type_key) {
            warning!("type `{}` is already registered", self.type_key);
            return Ok(*existing);
        }
        let index = table.next_index();
        let extra = if self.reflective {
            Some(TypeExtraInfo {
                eq_hash_kind: self.eq_hash_kind,
                fields: self.fields,
                repr: self.repr,
            })
        } else {
            None
        };
        let info = TypeInfo {
            type_index: index,
            type_key: self.type_key.clone(),
            extra,
        };
        table.by_key.insert(self.type_key.clone(), index);
        table.infos.push(Arc::new(info));
        trace!("registered type `{}` as index {}", self.type_key, index);
        Ok(index)
    }
}

/// Build an instance of a registered type with arity-checked field values.
pub fn make_object(type_key: &str, fields: Vec<Any>) -> Result<ObjectRef> {
    let info = type_info_by_key(type_key)?;
    let extra = info
        .extra
        .as_ref()
        .ok_or_else(|| anyhow!("type `{}` has no reflection metadata", type_key))?;
    if fields.len() != extra.fields.len() {
        bail!(
            "type `{}` has {} fields, got {} values",
            type_key,
            extra.fields.len(),
            fields.len()
        );
    }
    Ok(ObjectRef::from_parts(info.type_index, fields))
}

/// Build a fresh default-initialized instance, or reconstruct one from repr
/// bytes when the node carried them.
pub fn create_init_object(type_key: &str, repr_bytes: Option<&[u8]>) -> Result<ObjectRef> {
    let info = type_info_by_key(type_key)?;
    let extra = info.extra.as_ref().ok_or_else(|| {
        anyhow!(
            "Object `{}` misses reflection registration and does not support deserialization",
            type_key
        )
    })?;
    if let Some(bytes) = repr_bytes {
        let hooks = extra
            .repr
            .as_ref()
            .ok_or_else(|| anyhow!("type `{}` does not accept repr bytes", type_key))?;
        return (hooks.create)(bytes);
    }
    let fields = vec![Any::None; extra.fields.len()];
    Ok(ObjectRef::from_parts(info.type_index, fields))
}

/// Opaque repr of an object, when its type provides one.
pub fn get_repr_bytes(obj: &ObjectRef) -> Result<Option<Vec<u8>>> {
    let info = type_info(obj.type_index())?;
    match info.extra.as_ref().and_then(|extra| extra.repr.as_ref()) {
        Some(hooks) => Ok(Some((hooks.get)(obj)?)),
        None => Ok(None),
    }
}
