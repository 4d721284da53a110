use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// One serialized node record.
///
/// `data` holds node ids whose meaning depends on the container type; `keys`
/// is populated for maps whose keys are all strings. `fields` collects the
/// ids referenced from `attrs` during loading and is never written out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonNode {
    #[serde(default)]
    pub type_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repr_str: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repr_b64: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<usize>,
    #[serde(skip)]
    pub fields: Vec<usize>,
}

impl JsonNode {
    /// Record an opaque repr, choosing the printable or base64 encoding.
    pub fn set_repr_bytes(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            self.repr_str = Some(String::from_utf8(bytes.to_vec()).expect("printable ascii"));
        } else {
            self.repr_b64 = Some(STANDARD.encode(bytes));
        }
    }

    /// Decode the opaque repr, if the record carries one.
    pub fn repr_bytes(&self) -> Result<Option<Vec<u8>>> {
        match (&self.repr_str, &self.repr_b64) {
            (Some(_), Some(_)) => bail!("node carries both repr_str and repr_b64"),
            (Some(text), None) => Ok(Some(text.clone().into_bytes())),
            (None, Some(b64)) => Ok(Some(
                STANDARD
                    .decode(b64)
                    .map_err(|err| anyhow!("invalid repr_b64: {}", err))?,
            )),
            (None, None) => Ok(None),
        }
    }
}

/// The serialized graph: interned nodes, the root id, base64 tensor blobs
/// and free-form string attributes. Node id 0 is the null sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonGraph {
    pub root: usize,
    pub nodes: Vec<JsonNode>,
    #[serde(default)]
    pub b64ndarrays: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

impl JsonGraph {
    /// Kahn topological order over the `data` and `fields` edges, reversed so
    /// that leaves come first and every node is visited after its references.
    pub fn topo_sort(&self) -> Result<Vec<usize>> {
        let n_nodes = self.nodes.len();
        let mut in_degree = vec![0usize; n_nodes];
        for jnode in &self.nodes {
            for &id in jnode.data.iter().chain(jnode.fields.iter()) {
                if id >= n_nodes {
                    bail!("reference to node id {} outside the node table", id);
                }
                in_degree[id] += 1;
            }
        }
        let mut topo_order: Vec<usize> = (0..n_nodes).filter(|&i| in_degree[i] == 0).collect();
        let mut cursor = 0;
        while cursor < topo_order.len() {
            let jnode = &self.nodes[topo_order[cursor]];
            cursor += 1;
            for &id in jnode.data.iter().chain(jnode.fields.iter()) {
                in_degree[id] -= 1;
                if in_degree[id] == 0 {
                    topo_order.push(id);
                }
            }
        }
        if topo_order.len() != n_nodes {
            bail!("Cyclic reference detected in JSON file");
        }
        topo_order.reverse();
        Ok(topo_order)
    }
}
