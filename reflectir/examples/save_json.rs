use reflectir::{field_flags, registry, serialize, type_index, Any, EqHashKind, TypeRegistration};

fn main() -> anyhow::Result<()> {
    TypeRegistration::new("demo.Dense")
        .eq_hash_kind(EqHashKind::ConstTreeNode)
        .field("name", type_index::STR, 0)
        .field("units", type_index::INT, 0)
        .field("input", type_index::ANY, field_flags::EQ_HASH_DEF)
        .register()?;

    let input = Any::map([
        (Any::str("dtype"), Any::DataType(reflectir::DataType::float(32))),
        (Any::str("shape"), Any::shape([1, 784])),
    ]);
    let layer = registry::make_object(
        "demo.Dense",
        vec![Any::str("hidden"), Any::Int(128), input],
    )?;
    let root = Any::array([Any::Object(layer.clone()), Any::Object(layer)]);

    let json = serialize(&root)?;
    println!("{}", json);
    Ok(())
}
