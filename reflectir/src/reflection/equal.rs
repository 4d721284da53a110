//! Structural equality over the dynamic value graph.
//!
//! DAG nodes must map consistently between the two sides, free variables
//! alpha-map inside definition scopes, and an optional trace records the
//! access paths of the first mismatch. Inequality is an ordinary `Ok(false)`;
//! `Err` is reserved for contract violations such as comparing the contents
//! of non-CPU tensors.

use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{bail, Result};

use crate::value::{Any, ArrayObj, MapObj, NdArrayObj, ObjectRef};

use super::info::{field_flags, EqHashKind};
use super::path::{AccessPath, AccessStep};
use super::registry;

/// Compare two values structurally.
///
/// `map_free_vars` lets unbound free variables match by position rather than
/// identity. `skip_ndarray_content` reduces tensor comparison to the header.
pub fn equal(
    lhs: &Any,
    rhs: &Any,
    map_free_vars: bool,
    skip_ndarray_content: bool,
) -> Result<bool> {
    let mut handler = EqualHandler::new(skip_ndarray_content, false);
    handler.compare_any(lhs, rhs, map_free_vars)
}

/// Like [`equal`], but on mismatch returns the pair of root-to-leaf access
/// paths locating the first differing sub-values.
pub fn first_mismatch(
    lhs: &Any,
    rhs: &Any,
    map_free_vars: bool,
    skip_ndarray_content: bool,
) -> Result<Option<(AccessPath, AccessPath)>> {
    let mut handler = EqualHandler::new(skip_ndarray_content, true);
    if handler.compare_any(lhs, rhs, map_free_vars)? {
        return Ok(None);
    }
    let trace = handler.trace.expect("trace was enabled");
    Ok(Some((
        AccessPath::from_reverse(trace.lhs_reverse),
        AccessPath::from_reverse(trace.rhs_reverse),
    )))
}

#[derive(Default)]
struct MismatchTrace {
    lhs_reverse: Vec<AccessStep>,
    rhs_reverse: Vec<AccessStep>,
}

struct EqualHandler {
    skip_ndarray_content: bool,
    trace: Option<MismatchTrace>,
    // lhs address -> rhs object and the reverse direction, recorded only for
    // DagNode/FreeVar kinds.
    equal_map_lhs: HashMap<usize, ObjectRef>,
    equal_map_rhs: HashMap<usize, ObjectRef>,
}

impl EqualHandler {
    fn new(skip_ndarray_content: bool, with_trace: bool) -> Self {
        Self {
            skip_ndarray_content,
            trace: with_trace.then(MismatchTrace::default),
            equal_map_lhs: HashMap::new(),
            equal_map_rhs: HashMap::new(),
        }
    }

    fn tracing(&self) -> bool {
        self.trace.is_some()
    }

    fn push_steps(&mut self, lhs_step: AccessStep, rhs_step: AccessStep) {
        if let Some(trace) = &mut self.trace {
            trace.lhs_reverse.push(lhs_step);
            trace.rhs_reverse.push(rhs_step);
        }
    }

    fn compare_any(&mut self, lhs: &Any, rhs: &Any, map_free_vars: bool) -> Result<bool> {
        if lhs.type_index() != rhs.type_index() {
            return Ok(false);
        }
        match (lhs, rhs) {
            (Any::None, Any::None) => Ok(true),
            (Any::Int(a), Any::Int(b)) => Ok(a == b),
            (Any::Bool(a), Any::Bool(b)) => Ok(a == b),
            (Any::Float(a), Any::Float(b)) => Ok(a.to_bits() == b.to_bits()),
            (Any::OpaquePtr(a), Any::OpaquePtr(b)) => Ok(a == b),
            (Any::DataType(a), Any::DataType(b)) => Ok(a == b),
            (Any::Device(a), Any::Device(b)) => Ok(a == b),
            (Any::Str(a), Any::Str(b)) => Ok(a.len() == b.len() && a.as_bytes() == b.as_bytes()),
            (Any::Bytes(a), Any::Bytes(b)) => Ok(a.len() == b.len() && a == b),
            (Any::Shape(a), Any::Shape(b)) => Ok(a.dims() == b.dims()),
            (Any::Array(a), Any::Array(b)) => self.compare_array(a, b, map_free_vars),
            (Any::Map(a), Any::Map(b)) => self.compare_map(a, b, map_free_vars),
            (Any::NdArray(a), Any::NdArray(b)) => self.compare_ndarray(a, b),
            (Any::Object(a), Any::Object(b)) => self.compare_object(a, b, map_free_vars),
            _ => Ok(false),
        }
    }

    fn compare_object(
        &mut self,
        lhs: &ObjectRef,
        rhs: &ObjectRef,
        map_free_vars: bool,
    ) -> Result<bool> {
        // invariant: both sides already share the type index
        let info = registry::type_info(lhs.type_index())?;
        let Some(extra) = info.extra.as_ref() else {
            return Ok(lhs.same_as(rhs));
        };
        let kind = extra.eq_hash_kind;
        if matches!(kind, EqHashKind::Unsupported | EqHashKind::UniqueInstance) {
            return Ok(lhs.same_as(rhs));
        }
        if kind == EqHashKind::ConstTreeNode && lhs.same_as(rhs) {
            return Ok(true);
        }
        if matches!(kind, EqHashKind::DagNode | EqHashKind::FreeVar) {
            // a previously recorded mapping decides; a counterpart already
            // claimed on the rhs side means lhs cannot bind to it
            if let Some(mapped) = self.equal_map_lhs.get(&lhs.addr()) {
                return Ok(mapped.same_as(rhs));
            }
            if self.equal_map_rhs.contains_key(&rhs.addr()) {
                return Ok(false);
            }
        }

        let mut success = true;
        if kind == EqHashKind::FreeVar {
            // unmapped free var: match only under map_free_vars or identity,
            // never by descending into fields
            if !lhs.same_as(rhs) && !map_free_vars {
                success = false;
            }
        } else {
            for (slot, field) in extra.fields.iter().enumerate() {
                if field.flags & field_flags::EQ_HASH_IGNORE != 0 {
                    continue;
                }
                let lhs_value = lhs.field(slot);
                let rhs_value = rhs.field(slot);
                let child_map_free_vars = if field.flags & field_flags::EQ_HASH_DEF != 0 {
                    true
                } else {
                    map_free_vars
                };
                success = self.compare_any(&lhs_value, &rhs_value, child_map_free_vars)?;
                if !success {
                    self.push_steps(
                        AccessStep::ObjectField(field.name.clone()),
                        AccessStep::ObjectField(field.name.clone()),
                    );
                    break;
                }
            }
        }
        if success {
            if matches!(kind, EqHashKind::DagNode | EqHashKind::FreeVar) {
                self.equal_map_lhs.insert(lhs.addr(), rhs.clone());
                self.equal_map_rhs.insert(rhs.addr(), lhs.clone());
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn compare_array(
        &mut self,
        lhs: &Rc<ArrayObj>,
        rhs: &Rc<ArrayObj>,
        map_free_vars: bool,
    ) -> Result<bool> {
        if lhs.len() != rhs.len() && !self.tracing() {
            return Ok(false);
        }
        for i in 0..lhs.len().min(rhs.len()) {
            if !self.compare_any(&lhs[i], &rhs[i], map_free_vars)? {
                self.push_steps(AccessStep::ArrayIndex(i), AccessStep::ArrayIndex(i));
                return Ok(false);
            }
        }
        if lhs.len() == rhs.len() {
            return Ok(true);
        }
        if lhs.len() > rhs.len() {
            self.push_steps(
                AccessStep::ArrayIndex(rhs.len()),
                AccessStep::ArrayIndexMissing(rhs.len()),
            );
        } else {
            self.push_steps(
                AccessStep::ArrayIndexMissing(lhs.len()),
                AccessStep::ArrayIndex(lhs.len()),
            );
        }
        Ok(false)
    }

    fn compare_map(
        &mut self,
        lhs: &Rc<MapObj>,
        rhs: &Rc<MapObj>,
        map_free_vars: bool,
    ) -> Result<bool> {
        if lhs.len() != rhs.len() && !self.tracing() {
            return Ok(false);
        }
        for (key, lhs_value) in lhs.iter() {
            let rhs_key = self.map_lhs_to_rhs(key);
            let Some(rhs_value) = rhs.get(&rhs_key).cloned() else {
                self.push_steps(
                    AccessStep::MapKey(key.clone()),
                    AccessStep::MapKeyMissing(rhs_key),
                );
                return Ok(false);
            };
            if !self.compare_any(lhs_value, &rhs_value, map_free_vars)? {
                self.push_steps(AccessStep::MapKey(key.clone()), AccessStep::MapKey(rhs_key));
                return Ok(false);
            }
        }
        if lhs.len() == rhs.len() {
            return Ok(true);
        }
        // sizes differ with every lhs entry matched: cross-check rhs keys to
        // name the missing one
        for (key, _) in rhs.iter() {
            let lhs_key = self.map_rhs_to_lhs(key);
            if lhs.get(&lhs_key).is_none() {
                self.push_steps(
                    AccessStep::MapKeyMissing(lhs_key),
                    AccessStep::MapKey(key.clone()),
                );
                return Ok(false);
            }
        }
        Ok(false)
    }

    fn compare_ndarray(&mut self, lhs: &Rc<NdArrayObj>, rhs: &Rc<NdArrayObj>) -> Result<bool> {
        if Rc::ptr_eq(lhs, rhs) {
            return Ok(true);
        }
        if lhs.ndim() != rhs.ndim() || lhs.shape() != rhs.shape() {
            return Ok(false);
        }
        if lhs.dtype() != rhs.dtype() {
            return Ok(false);
        }
        if self.skip_ndarray_content {
            return Ok(true);
        }
        if !lhs.is_cpu() || !rhs.is_cpu() {
            bail!("can only compare CPU tensor contents");
        }
        if !lhs.is_contiguous() || !rhs.is_contiguous() {
            bail!("can only compare contiguous tensor contents");
        }
        let data_size = lhs.byte_size();
        Ok(lhs.data()[..data_size] == rhs.data()[..data_size])
    }

    fn map_lhs_to_rhs(&self, key: &Any) -> Any {
        if let Any::Object(obj) = key {
            if let Some(mapped) = self.equal_map_lhs.get(&obj.addr()) {
                return Any::Object(mapped.clone());
            }
        }
        key.clone()
    }

    fn map_rhs_to_lhs(&self, key: &Any) -> Any {
        if let Any::Object(obj) = key {
            if let Some(mapped) = self.equal_map_rhs.get(&obj.addr()) {
                return Any::Object(mapped.clone());
            }
        }
        key.clone()
    }
}
