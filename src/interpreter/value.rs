use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::errors::RuntimeError;
use crate::library::library::{SymbolId, TypeId};

/// A storage location. Cells are shared handles, so a pointer taken to a
/// variable stays valid however the surrounding containers move.
pub type Cell = Rc<RefCell<Value>>;

/// What a pointer value actually points at.
#[derive(Debug, Clone)]
pub enum Pointer {
    Null,
    /// A position inside a shared byte buffer (string literals). Supports
    /// arithmetic, indexing, and reads; the buffer is immutable.
    Bytes { buffer: Rc<Vec<u8>>, offset: usize },
    /// A handle to a variable's storage cell (`&` results).
    Cell(Cell),
}

impl Pointer {
    pub fn is_null(&self) -> bool {
        matches!(self, Pointer::Null)
    }
}

#[derive(Debug, Clone)]
pub enum ValueData {
    /// The result of a void call, and the default for class-typed and
    /// function-typed storage that was never assigned.
    Void,
    Integer(i32),
    Float(f32),
    Boolean(bool),
    Byte(u8),
    Pointer(Pointer),
    /// A first-class reference to a declared function.
    Function(SymbolId),
}

/// One runtime value: the payload, the static type it was computed with,
/// and (when it was read out of storage) the cell it came from so
/// assignment and `&` can reach back to the location.
#[derive(Debug, Clone)]
pub struct Value {
    pub type_id: TypeId,
    pub data: ValueData,
    pub origin: Option<Cell>,
}

impl Value {
    pub fn new(type_id: TypeId, data: ValueData) -> Self {
        Value {
            type_id,
            data,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: Cell) -> Self {
        self.origin = Some(origin);
        self
    }

    /// A copy suitable for storing: the origin back-reference is dropped so
    /// a cell never points at itself.
    pub fn detached(&self) -> Self {
        Value {
            type_id: self.type_id,
            data: self.data.clone(),
            origin: None,
        }
    }

    /// Condition truthiness: booleans read the flag, pointers read
    /// non-nullness, anything else faults.
    pub fn truthy(&self) -> Result<bool, RuntimeError> {
        match &self.data {
            ValueData::Boolean(value) => Ok(*value),
            ValueData::Pointer(pointer) => Ok(!pointer.is_null()),
            _ => Err(RuntimeError::InvalidCondition),
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self.data {
            ValueData::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self.data {
            ValueData::Float(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self.data {
            ValueData::Boolean(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> Option<u8> {
        match self.data {
            ValueData::Byte(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&Pointer> {
        match &self.data {
            ValueData::Pointer(pointer) => Some(pointer),
            _ => None,
        }
    }
}
