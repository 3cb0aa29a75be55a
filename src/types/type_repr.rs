//! Type descriptors for CPRL, sized for the CPRL virtual machine.

use std::fmt;
use std::rc::Rc;

use crate::bytecode::constants::{
    BYTES_PER_ADDRESS, BYTES_PER_BOOLEAN, BYTES_PER_CHAR, BYTES_PER_INTEGER,
};

/// A CPRL type.
///
/// Scalar types compare by name. Array types compare by the name they were
/// declared under.
#[derive(Debug, Clone)]
pub enum Type {
    Integer,
    Boolean,
    Char,
    /// Type of string literals. Only usable as an output argument.
    String,
    /// An address on the target machine.
    Address,
    Array(Rc<ArrayType>),
    /// Unknown type (error recovery)
    Unknown,
    /// Absence of a type, e.g. for procedures.
    None,
}

/// A named fixed-size array type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    pub name: String,
    pub num_elements: i32,
    pub element_type: Type,
}

impl ArrayType {
    pub fn new(name: impl Into<String>, num_elements: i32, element_type: Type) -> Self {
        Self {
            name: name.into(),
            num_elements,
            element_type,
        }
    }

    pub fn size(&self) -> i32 {
        self.num_elements * self.element_type.size()
    }
}

impl Type {
    /// Number of bytes occupied by a value of this type.
    pub fn size(&self) -> i32 {
        match self {
            Type::Integer => BYTES_PER_INTEGER,
            Type::Boolean => BYTES_PER_BOOLEAN,
            Type::Char => BYTES_PER_CHAR,
            Type::Address => BYTES_PER_ADDRESS,
            Type::Array(array) => array.size(),
            Type::String | Type::Unknown | Type::None => 0,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Type::Integer => "Integer",
            Type::Boolean => "Boolean",
            Type::Char => "Char",
            Type::String => "String",
            Type::Address => "Address",
            Type::Array(array) => &array.name,
            Type::Unknown => "UNKNOWN",
            Type::None => "none",
        }
    }

    /// The scalar types in CPRL are Integer, Boolean, and Char.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Integer | Type::Boolean | Type::Char)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(array) => Some(&array.element_type),
            _ => None,
        }
    }

    /// Assignment compatibility. `Unknown` matches anything so that one
    /// error does not cascade.
    pub fn matches(&self, other: &Type) -> bool {
        matches!(self, Type::Unknown) || matches!(other, Type::Unknown) || self == other
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Type {}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
