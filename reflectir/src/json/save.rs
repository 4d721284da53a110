//! Graph serialization: intern every reachable node, then emit one record
//! per node.

use std::collections::{BTreeMap, HashMap};

use anyhow::{anyhow, bail, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::reflection::registry;
use crate::value::{type_index, Any, AnyKey, ObjectRef};
use crate::{error, trace};

use super::graph::{JsonGraph, JsonNode};
use super::is_node_typed;
use super::text::fmt_double;
use super::type_keys;

/// Serialize a value graph to its JSON string form.
pub fn serialize(root: &Any) -> Result<String> {
    let graph = match build_graph(root) {
        Ok(graph) => graph,
        Err(err) => {
            error!("failed to serialize graph: {:#}", err);
            return Err(err);
        }
    };
    trace!("serialized graph with {} nodes", graph.nodes.len());
    Ok(serde_json::to_string(&graph)?)
}

fn build_graph(root: &Any) -> Result<JsonGraph> {
    let mut indexer = NodeIndexer::new();
    indexer.make_index(root)?;
    let mut b64ndarrays = Vec::new();
    let mut nodes = Vec::with_capacity(indexer.node_list.len());
    {
        let mut getter = JsonAttrGetter {
            node_index: &indexer.node_index,
            b64ndarrays: &mut b64ndarrays,
        };
        for node in &indexer.node_list {
            let mut jnode = JsonNode::default();
            getter.get(node, &mut jnode)?;
            nodes.push(jnode);
        }
    }
    let mut attrs = BTreeMap::new();
    attrs.insert(
        "tvm_version".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    let root = indexer.index_of(root)?;
    Ok(JsonGraph {
        root,
        nodes,
        b64ndarrays,
        attrs,
    })
}

/// Walks the live graph and assigns a stable id to every unique node. The
/// null sentinel occupies id 0.
struct NodeIndexer {
    node_index: HashMap<AnyKey, usize>,
    node_list: Vec<Any>,
}

impl NodeIndexer {
    fn new() -> Self {
        let mut node_index = HashMap::new();
        node_index.insert(AnyKey(Any::None), 0);
        Self {
            node_index,
            node_list: vec![Any::None],
        }
    }

    fn index_of(&self, node: &Any) -> Result<usize> {
        self.node_index
            .get(&AnyKey(node.clone()))
            .copied()
            .ok_or_else(|| anyhow!("node was not indexed"))
    }

    fn make_node_index(&mut self, node: &Any) {
        if node.is_none() {
            return;
        }
        let key = AnyKey(node.clone());
        if self.node_index.contains_key(&key) {
            return;
        }
        self.node_index.insert(key, self.node_list.len());
        self.node_list.push(node.clone());
    }

    fn make_index(&mut self, node: &Any) -> Result<()> {
        if node.is_none() || self.node_index.contains_key(&AnyKey(node.clone())) {
            return Ok(());
        }
        // assign the id before descending so self-references resolve
        self.make_node_index(node);
        match node {
            Any::Array(array) => {
                for item in array.iter() {
                    self.make_index(item)?;
                }
            }
            Any::Map(map) => {
                if map.all_string_keys() {
                    for (_, value) in map.iter() {
                        self.make_index(value)?;
                    }
                } else {
                    for (key, value) in map.iter() {
                        self.make_index(key)?;
                        self.make_index(value)?;
                    }
                }
            }
            Any::Object(obj) => {
                // opaque repr types carry no child nodes
                if registry::get_repr_bytes(obj)?.is_none() {
                    self.visit_object_fields(obj)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn visit_object_fields(&mut self, obj: &ObjectRef) -> Result<()> {
        let info = registry::type_info(obj.type_index())?;
        let extra = info.extra.as_ref().ok_or_else(|| {
            anyhow!(
                "Object `{}` misses reflection registration and does not support serialization",
                info.type_key
            )
        })?;
        for (slot, field) in extra.fields.iter().enumerate() {
            if is_node_typed(field.static_type_index) {
                self.make_index(&obj.field(slot))?;
            }
        }
        Ok(())
    }
}

/// Fills one [`JsonNode`] record per live node using the indexer's table.
struct JsonAttrGetter<'a> {
    node_index: &'a HashMap<AnyKey, usize>,
    b64ndarrays: &'a mut Vec<String>,
}

impl JsonAttrGetter<'_> {
    fn node_id(&self, node: &Any) -> Result<usize> {
        self.node_index
            .get(&AnyKey(node.clone()))
            .copied()
            .ok_or_else(|| anyhow!("referenced node was not indexed"))
    }

    fn get(&mut self, node: &Any, jnode: &mut JsonNode) -> Result<()> {
        match node {
            Any::None => {
                jnode.type_key.clear();
            }
            Any::Array(array) => {
                jnode.type_key = type_keys::ARRAY.to_string();
                for item in array.iter() {
                    jnode.data.push(self.node_id(item)?);
                }
            }
            Any::Map(map) => {
                jnode.type_key = type_keys::MAP.to_string();
                if map.all_string_keys() {
                    for (key, value) in map.iter() {
                        let Any::Str(text) = key else { unreachable!() };
                        jnode.keys.push(text.to_string());
                        jnode.data.push(self.node_id(value)?);
                    }
                } else {
                    for (key, value) in map.iter() {
                        jnode.data.push(self.node_id(key)?);
                        jnode.data.push(self.node_id(value)?);
                    }
                }
            }
            Any::Str(text) => {
                jnode.type_key = type_keys::STR.to_string();
                jnode.set_repr_bytes(text.as_bytes());
            }
            Any::Bytes(bytes) => {
                jnode.type_key = type_keys::BYTES.to_string();
                jnode.set_repr_bytes(bytes);
            }
            Any::Shape(shape) => {
                jnode.type_key = type_keys::SHAPE.to_string();
                jnode.set_repr_bytes(&shape.to_repr_bytes());
            }
            Any::NdArray(tensor) => {
                jnode.type_key = type_keys::NDARRAY.to_string();
                jnode
                    .attrs
                    .insert("ndarray_index".to_string(), self.b64ndarrays.len().to_string());
                self.b64ndarrays.push(STANDARD.encode(tensor.save_bytes()?));
            }
            Any::Object(obj) => {
                let info = registry::type_info(obj.type_index())?;
                jnode.type_key = info.type_key.clone();
                match registry::get_repr_bytes(obj)? {
                    Some(bytes) => jnode.set_repr_bytes(&bytes),
                    None => self.visit_object_fields(obj, jnode)?,
                }
            }
            Any::Bool(value) => {
                jnode.type_key = type_keys::BOOL.to_string();
                jnode
                    .attrs
                    .insert("v_int64".to_string(), (*value as i64).to_string());
            }
            Any::Int(value) => {
                jnode.type_key = type_keys::INT.to_string();
                jnode.attrs.insert("v_int64".to_string(), value.to_string());
            }
            Any::Float(value) => {
                jnode.type_key = type_keys::FLOAT.to_string();
                jnode
                    .attrs
                    .insert("v_float64".to_string(), fmt_double(*value));
            }
            Any::DataType(dtype) => {
                jnode.type_key = type_keys::DATA_TYPE.to_string();
                jnode.attrs.insert("v_type".to_string(), dtype.to_string());
            }
            Any::Device(device) => {
                jnode.type_key = type_keys::DEVICE.to_string();
                jnode.attrs.insert(
                    "v_device_type".to_string(),
                    device.device_type.as_i32().to_string(),
                );
                jnode
                    .attrs
                    .insert("v_device_id".to_string(), device.device_id.to_string());
            }
            Any::OpaquePtr(_) => bail!("not allowed to serialize a pointer"),
        }
        Ok(())
    }

    fn visit_object_fields(&mut self, obj: &ObjectRef, jnode: &mut JsonNode) -> Result<()> {
        let info = registry::type_info(obj.type_index())?;
        let extra = info.extra.as_ref().ok_or_else(|| {
            anyhow!(
                "Object `{}` misses reflection registration and does not support serialization",
                info.type_key
            )
        })?;
        for (slot, field) in extra.fields.iter().enumerate() {
            let value = obj.field(slot);
            let text = match field.static_type_index {
                type_index::BOOL | type_index::INT => match value {
                    Any::None => "null".to_string(),
                    Any::Bool(v) => (v as i64).to_string(),
                    Any::Int(v) => v.to_string(),
                    other => bail!(
                        "field `{}` of `{}` expected an integer, found {}",
                        field.name,
                        info.type_key,
                        other
                    ),
                },
                type_index::FLOAT => match value {
                    Any::None => "null".to_string(),
                    Any::Float(v) => fmt_double(v),
                    other => bail!(
                        "field `{}` of `{}` expected a float, found {}",
                        field.name,
                        info.type_key,
                        other
                    ),
                },
                type_index::DATA_TYPE => match value {
                    Any::None => "null".to_string(),
                    Any::DataType(dtype) => dtype.to_string(),
                    other => bail!(
                        "field `{}` of `{}` expected a dtype, found {}",
                        field.name,
                        info.type_key,
                        other
                    ),
                },
                type_index::STR => match value {
                    Any::None => "null".to_string(),
                    Any::Str(text) => text.to_string(),
                    other => bail!(
                        "field `{}` of `{}` expected a string, found {}",
                        field.name,
                        info.type_key,
                        other
                    ),
                },
                type_index::DEVICE => bail!(
                    "field `{}` of `{}`: device-typed fields are not serializable",
                    field.name,
                    info.type_key
                ),
                type_index::OPAQUE_PTR => bail!("not allowed to serialize a pointer"),
                _ => match value {
                    Any::None => "null".to_string(),
                    Any::OpaquePtr(_) => bail!("not allowed to serialize a pointer"),
                    other => self.node_id(&other)?.to_string(),
                },
            };
            jnode.attrs.insert(field.name.clone(), text);
        }
        Ok(())
    }
}
