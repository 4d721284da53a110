use anyhow::bail;
use reflectir::{
    field_flags, registry, type_index, Any, EqHashKind, TypeRegistration,
};

/// Register the reflective types the tests build graphs from. Safe to call
/// from every test; registration is idempotent.
pub fn register_types() {
    TypeRegistration::new("test.Symbol")
        .eq_hash_kind(EqHashKind::FreeVar)
        .field("name", type_index::STR, field_flags::EQ_HASH_IGNORE)
        .register()
        .expect("register test.Symbol");

    TypeRegistration::new("test.Let")
        .eq_hash_kind(EqHashKind::DagNode)
        .field("var", type_index::ANY, field_flags::EQ_HASH_DEF)
        .field("value", type_index::ANY, 0)
        .field("body", type_index::ANY, 0)
        .register()
        .expect("register test.Let");

    TypeRegistration::new("test.Pair")
        .eq_hash_kind(EqHashKind::ConstTreeNode)
        .field("first", type_index::ANY, 0)
        .field("second", type_index::ANY, 0)
        .field("note", type_index::STR, field_flags::EQ_HASH_IGNORE)
        .register()
        .expect("register test.Pair");

    TypeRegistration::new("test.Scalars")
        .eq_hash_kind(EqHashKind::ConstTreeNode)
        .field("flag", type_index::BOOL, 0)
        .field("count", type_index::INT, 0)
        .field("ratio", type_index::FLOAT, 0)
        .field("dtype", type_index::DATA_TYPE, 0)
        .field("label", type_index::STR, 0)
        .register()
        .expect("register test.Scalars");

    TypeRegistration::new("test.TensorHolder")
        .eq_hash_kind(EqHashKind::ConstTreeNode)
        .field("name", type_index::STR, 0)
        .field("data", type_index::NDARRAY, 0)
        .register()
        .expect("register test.TensorHolder");

    TypeRegistration::new("test.Token")
        .eq_hash_kind(EqHashKind::UniqueInstance)
        .register()
        .expect("register test.Token");

    TypeRegistration::new("test.Blob")
        .eq_hash_kind(EqHashKind::ConstTreeNode)
        .field("payload", type_index::BYTES, 0)
        .repr_hooks(
            Box::new(|obj| match obj.field(0) {
                Any::Bytes(bytes) => Ok(bytes.to_vec()),
                other => bail!("blob payload holds {}", other),
            }),
            Box::new(|bytes| registry::make_object("test.Blob", vec![Any::bytes(bytes)])),
        )
        .register()
        .expect("register test.Blob");
}

pub fn symbol(name: &str) -> Any {
    register_types();
    Any::Object(registry::make_object("test.Symbol", vec![Any::str(name)]).expect("make symbol"))
}

pub fn let_bind(var: Any, value: Any, body: Any) -> Any {
    register_types();
    Any::Object(registry::make_object("test.Let", vec![var, value, body]).expect("make let"))
}

pub fn pair(first: Any, second: Any) -> Any {
    pair_with_note(first, second, "")
}

pub fn pair_with_note(first: Any, second: Any, note: &str) -> Any {
    register_types();
    Any::Object(
        registry::make_object("test.Pair", vec![first, second, Any::str(note)])
            .expect("make pair"),
    )
}

pub fn scalars(flag: bool, count: i64, ratio: f64, dtype: reflectir::DataType, label: &str) -> Any {
    register_types();
    Any::Object(
        registry::make_object(
            "test.Scalars",
            vec![
                Any::Bool(flag),
                Any::Int(count),
                Any::Float(ratio),
                Any::DataType(dtype),
                Any::str(label),
            ],
        )
        .expect("make scalars"),
    )
}

pub fn token() -> Any {
    register_types();
    Any::Object(registry::make_object("test.Token", vec![]).expect("make token"))
}

pub fn blob(payload: &[u8]) -> Any {
    register_types();
    Any::Object(
        registry::make_object("test.Blob", vec![Any::bytes(payload)]).expect("make blob"),
    )
}
