use std::cell::RefCell;
use std::rc::Rc;

use super::any::Any;

/// Backing storage of a reflective object: its registered type index and
/// positional field slots.
#[derive(Debug)]
pub struct ObjectData {
    type_index: i32,
    fields: RefCell<Vec<Any>>,
}

/// Shared handle to a reflective object. Cloning shares the allocation;
/// identity is the allocation address.
#[derive(Debug, Clone)]
pub struct ObjectRef(Rc<ObjectData>);

impl ObjectRef {
    /// Build an instance directly from a type index and field values.
    ///
    /// Callers normally go through the registry, which validates the field
    /// arity against the registered type.
    pub fn from_parts(type_index: i32, fields: Vec<Any>) -> Self {
        Self(Rc::new(ObjectData {
            type_index,
            fields: RefCell::new(fields),
        }))
    }

    pub fn type_index(&self) -> i32 {
        self.0.type_index
    }

    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn same_as(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn num_fields(&self) -> usize {
        self.0.fields.borrow().len()
    }

    pub fn field(&self, index: usize) -> Any {
        self.0.fields.borrow()[index].clone()
    }

    pub fn set_field(&self, index: usize, value: Any) {
        self.0.fields.borrow_mut()[index] = value;
    }
}
