//! Graph reconstruction in four passes: skeletons, field dependencies,
//! topological order, attribute assignment.

use std::rc::Rc;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::reflection::registry;
use crate::value::{
    type_index, Any, ArrayObj, DataType, Device, DeviceType, MapObj, NdArrayObj, ShapeObj,
};
use crate::{error, trace};

use super::graph::{JsonGraph, JsonNode};
use super::is_node_typed;
use super::text::{parse_double, parse_int};
use super::type_keys;

/// Rebuild a value graph from its JSON string form.
pub fn deserialize(json: &str) -> Result<Any> {
    match load_graph(json) {
        Ok(root) => Ok(root),
        Err(err) => {
            error!("failed to load graph: {:#}", err);
            Err(err)
        }
    }
}

fn load_graph(json: &str) -> Result<Any> {
    let mut graph: JsonGraph =
        serde_json::from_str(json).context("failed to parse serialized graph")?;

    let tensors = graph
        .b64ndarrays
        .iter()
        .map(|blob| decode_tensor(blob))
        .collect::<Result<Vec<_>>>()?;

    // Pass 1: build a skeleton for every node so later passes can reference it.
    let n_nodes = graph.nodes.len();
    let mut nodes = Vec::with_capacity(n_nodes);
    for jnode in &graph.nodes {
        nodes.push(create_init_any(jnode, &tensors)?);
    }

    // Pass 2: collect the node ids referenced from reflective-object attrs.
    for i in 0..n_nodes {
        let node = nodes[i].clone();
        find_field_deps(&node, &mut graph.nodes[i])?;
    }

    // Pass 3: leaves-first order; rejects cycles.
    let topo_order = graph.topo_sort()?;

    // Pass 4: populate containers and object fields. Children come earlier in
    // the order, so every referenced node is already complete.
    for &i in &topo_order {
        set_attrs(&mut nodes, i, &graph.nodes[i])?;
    }

    trace!("loaded graph with {} nodes, root {}", n_nodes, graph.root);
    nodes
        .get(graph.root)
        .cloned()
        .ok_or_else(|| anyhow!("root node id {} outside the node table", graph.root))
}

fn decode_tensor(blob: &str) -> Result<Any> {
    let bytes = STANDARD
        .decode(blob)
        .map_err(|err| anyhow!("invalid tensor base64: {}", err))?;
    Ok(Any::NdArray(Rc::new(NdArrayObj::load_bytes(&bytes)?)))
}

fn attr<'a>(jnode: &'a JsonNode, key: &str) -> Result<&'a str> {
    jnode
        .attrs
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("cannot find field `{}`", key))
}

fn parse_optional_int(jnode: &JsonNode, key: &str) -> Result<Option<i64>> {
    let text = attr(jnode, key)?;
    if text == "null" {
        Ok(None)
    } else {
        parse_int(text).map(Some)
    }
}

fn parse_node_id(jnode: &JsonNode, key: &str) -> Result<Option<usize>> {
    match parse_optional_int(jnode, key)? {
        None => Ok(None),
        Some(id) if id >= 0 => Ok(Some(id as usize)),
        Some(id) => bail!("negative node id {} in field `{}`", id, key),
    }
}

/// Build an empty value of the right variety for one node record. Opaque
/// repr types and tensor blobs are fully reconstructed here.
fn create_init_any(jnode: &JsonNode, tensors: &[Any]) -> Result<Any> {
    let repr = jnode.repr_bytes()?;
    let value = match jnode.type_key.as_str() {
        type_keys::NONE | "None" => Any::None,
        type_keys::BOOL => Any::Bool(parse_int(attr(jnode, "v_int64")?)? != 0),
        type_keys::INT => Any::Int(parse_int(attr(jnode, "v_int64")?)?),
        type_keys::FLOAT => Any::Float(parse_double(attr(jnode, "v_float64")?)?),
        type_keys::DATA_TYPE => Any::DataType(DataType::parse(attr(jnode, "v_type")?)?),
        type_keys::DEVICE => {
            let device_type = DeviceType::from_i32(
                parse_int(attr(jnode, "v_device_type")?)?
                    .try_into()
                    .map_err(|_| anyhow!("device type out of range"))?,
            )?;
            let device_id = parse_int(attr(jnode, "v_device_id")?)?
                .try_into()
                .map_err(|_| anyhow!("device id out of range"))?;
            Any::Device(Device::new(device_type, device_id))
        }
        type_keys::STR => {
            let bytes = repr.unwrap_or_default();
            let text =
                String::from_utf8(bytes).map_err(|_| anyhow!("string node is not valid UTF-8"))?;
            Any::Str(Rc::from(text.as_str()))
        }
        type_keys::BYTES => Any::bytes(repr.unwrap_or_default()),
        type_keys::SHAPE => Any::Shape(Rc::new(ShapeObj::from_repr_bytes(
            &repr.unwrap_or_default(),
        )?)),
        type_keys::NDARRAY => {
            let index: usize = parse_int(attr(jnode, "ndarray_index")?)?
                .try_into()
                .map_err(|_| anyhow!("negative tensor blob index"))?;
            tensors
                .get(index)
                .cloned()
                .ok_or_else(|| anyhow!("tensor blob index {} outside b64ndarrays", index))?
        }
        type_keys::ARRAY => Any::Array(Rc::new(ArrayObj::default())),
        type_keys::MAP => Any::Map(Rc::new(MapObj::default())),
        key => Any::Object(registry::create_init_object(key, repr.as_deref())?),
    };
    Ok(value)
}

/// Scan a reflective node's attrs for node-typed fields and record their
/// referenced ids; these become the second edge set of the topo sort.
fn find_field_deps(node: &Any, jnode: &mut JsonNode) -> Result<()> {
    let Any::Object(obj) = node else {
        return Ok(());
    };
    if jnode.repr_str.is_some() || jnode.repr_b64.is_some() {
        return Ok(());
    }
    let info = registry::type_info(obj.type_index())?;
    let Some(extra) = info.extra.as_ref() else {
        return Ok(());
    };
    if extra.repr.is_some() {
        return Ok(());
    }
    for field in &extra.fields {
        if is_node_typed(field.static_type_index) {
            if let Some(id) = parse_node_id(jnode, &field.name)? {
                jnode.fields.push(id);
            }
        }
    }
    Ok(())
}

fn lookup(nodes: &[Any], id: usize) -> Result<Any> {
    nodes
        .get(id)
        .cloned()
        .ok_or_else(|| anyhow!("reference to node id {} outside the node table", id))
}

/// Populate one node from its record. Containers are rebuilt whole and
/// replace their slot; reflective objects have their fields assigned in
/// place; everything else is already complete after the skeleton pass.
fn set_attrs(nodes: &mut Vec<Any>, index: usize, jnode: &JsonNode) -> Result<()> {
    match jnode.type_key.as_str() {
        type_keys::ARRAY => {
            let mut items = Vec::with_capacity(jnode.data.len());
            for &id in &jnode.data {
                items.push(lookup(nodes, id)?);
            }
            nodes[index] = Any::Array(Rc::new(ArrayObj::new(items)));
        }
        type_keys::MAP => {
            let mut pairs = Vec::new();
            if jnode.keys.is_empty() {
                if jnode.data.len() % 2 != 0 {
                    bail!("map node has an odd number of data entries");
                }
                for chunk in jnode.data.chunks_exact(2) {
                    pairs.push((lookup(nodes, chunk[0])?, lookup(nodes, chunk[1])?));
                }
            } else {
                if jnode.keys.len() != jnode.data.len() {
                    bail!("map node keys and data lengths differ");
                }
                for (key, &id) in jnode.keys.iter().zip(jnode.data.iter()) {
                    pairs.push((Any::str(key), lookup(nodes, id)?));
                }
            }
            nodes[index] = Any::map(pairs);
        }
        _ => {
            let Any::Object(obj) = &nodes[index] else {
                return Ok(());
            };
            let obj = obj.clone();
            if jnode.repr_str.is_some() || jnode.repr_b64.is_some() {
                return Ok(());
            }
            let info = registry::type_info(obj.type_index())?;
            let Some(extra) = info.extra.as_ref() else {
                return Ok(());
            };
            if extra.repr.is_some() {
                return Ok(());
            }
            for (slot, field) in extra.fields.iter().enumerate() {
                let value = match field.static_type_index {
                    type_index::BOOL => match parse_optional_int(jnode, &field.name)? {
                        None => Any::None,
                        Some(v) => Any::Bool(v != 0),
                    },
                    type_index::INT => match parse_optional_int(jnode, &field.name)? {
                        None => Any::None,
                        Some(v) => Any::Int(v),
                    },
                    type_index::FLOAT => {
                        let text = attr(jnode, &field.name)?;
                        if text == "null" {
                            Any::None
                        } else {
                            Any::Float(parse_double(text)?)
                        }
                    }
                    type_index::DATA_TYPE => {
                        let text = attr(jnode, &field.name)?;
                        if text == "null" {
                            Any::None
                        } else {
                            Any::DataType(DataType::parse(text)?)
                        }
                    }
                    type_index::STR => {
                        let text = attr(jnode, &field.name)?;
                        if text == "null" {
                            Any::None
                        } else {
                            Any::str(text)
                        }
                    }
                    type_index::DEVICE => bail!(
                        "field `{}` of `{}`: device-typed fields are not deserializable",
                        field.name,
                        info.type_key
                    ),
                    _ => match parse_node_id(jnode, &field.name)? {
                        None => Any::None,
                        Some(id) => lookup(nodes, id)?,
                    },
                };
                obj.set_field(slot, value);
            }
        }
    }
    Ok(())
}
