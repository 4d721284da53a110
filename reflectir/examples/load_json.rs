use std::io::Read;

use reflectir::{deserialize, equal, field_flags, type_index, Any, EqHashKind, TypeRegistration};

fn main() -> anyhow::Result<()> {
    TypeRegistration::new("demo.Dense")
        .eq_hash_kind(EqHashKind::ConstTreeNode)
        .field("name", type_index::STR, 0)
        .field("units", type_index::INT, 0)
        .field("input", type_index::ANY, field_flags::EQ_HASH_DEF)
        .register()?;

    let mut json = String::new();
    std::io::stdin().read_to_string(&mut json)?;

    let root = deserialize(&json)?;
    println!("loaded root: {}", root);
    if let Any::Array(array) = &root {
        println!("elements: {}", array.len());
        if array.len() >= 2 {
            println!("shared: {}", array[0].same_as(&array[1]));
        }
    }
    println!("reflexive: {}", equal(&root, &root.clone(), false, false)?);
    Ok(())
}
