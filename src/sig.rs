//! # Type Descriptors
//!
//! This module describes the types of mirror fields. Native struct fields
//! declare a [`Signature`], which is resolved into a [`Descriptor`] when a
//! field cache is populated. Descriptors use the JNI field descriptor
//! grammar (`I`, `[B`, `Lpkg/Name;`), restricted to the forms a native struct
//! can be marshalled from.

use crate::config::PointerRepr;
use crate::error::{Error, Result};

/// ## Primitive Types
///
/// The primitive value types of the host runtime. Each has a fixed width and
/// a single-letter descriptor code.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

/// ## Value Kinds
///
/// The kind of value a mirror field holds, as far as field access on the
/// host is concerned. Arrays and objects are both accessed as references.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    Primitive(Primitive),
    Object,
}

/// ## Field Signatures
///
/// The static type information a native struct field declares for its
/// mirror field. `Pointer` is not a host type of its own: it is resolved to
/// an integer of suitable width based on [`PointerRepr`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Signature {
    Primitive(Primitive),
    Array(Primitive),
    Object(&'static str),
    Pointer,
}

/// ## Resolved Descriptors
///
/// A field descriptor as understood by the host runtime. This is what field
/// handles are looked up with.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Descriptor {
    Primitive(Primitive),
    Array(Primitive),
    Object(String),
}

impl Primitive {
    /// Size of the primitive in bytes.
    pub const fn size(self) -> usize {
        match self {
            Primitive::Boolean | Primitive::Byte => 1,
            Primitive::Char | Primitive::Short => 2,
            Primitive::Int | Primitive::Float => 4,
            Primitive::Long | Primitive::Double => 8,
        }
    }

    /// Descriptor code of the primitive.
    pub const fn code(self) -> char {
        match self {
            Primitive::Boolean => 'Z',
            Primitive::Byte => 'B',
            Primitive::Char => 'C',
            Primitive::Short => 'S',
            Primitive::Int => 'I',
            Primitive::Long => 'J',
            Primitive::Float => 'F',
            Primitive::Double => 'D',
        }
    }

    /// Primitive for a descriptor code, if any.
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'Z' => Some(Primitive::Boolean),
            'B' => Some(Primitive::Byte),
            'C' => Some(Primitive::Char),
            'S' => Some(Primitive::Short),
            'I' => Some(Primitive::Int),
            'J' => Some(Primitive::Long),
            'F' => Some(Primitive::Float),
            'D' => Some(Primitive::Double),
            _ => None,
        }
    }

    /// Name of the primitive as spelled in the host language.
    pub const fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }
}

impl core::fmt::Display for Kind {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Kind::Primitive(v) => fmt.write_str(v.name()),
            Kind::Object => fmt.write_str("object"),
        }
    }
}

impl Signature {
    /// ## Resolve to Descriptor
    ///
    /// Turn the signature into the descriptor used to look up the mirror
    /// field. Pointers become `I` or `J` depending on `pointer`.
    pub fn descriptor(self, pointer: PointerRepr) -> Descriptor {
        match self {
            Signature::Primitive(v) => Descriptor::Primitive(v),
            Signature::Array(v) => Descriptor::Array(v),
            Signature::Object(v) => Descriptor::Object(v.into()),
            Signature::Pointer => Descriptor::Primitive(pointer.primitive()),
        }
    }
}

impl Descriptor {
    /// Kind of value a field of this descriptor holds.
    pub fn kind(&self) -> Kind {
        match self {
            Descriptor::Primitive(v) => Kind::Primitive(*v),
            Descriptor::Array(_) | Descriptor::Object(_) => Kind::Object,
        }
    }

    /// ## Parse Descriptor
    ///
    /// Parse a field descriptor. Only primitives, one-dimensional primitive
    /// arrays, and class references are accepted, since nothing else can be
    /// embedded in a native struct.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidDescriptor(input.into());
        let mut chars = input.chars();

        let v = match chars.next().ok_or_else(invalid)? {
            '[' => {
                let code = chars.next().ok_or_else(invalid)?;
                Descriptor::Array(Primitive::from_code(code).ok_or_else(invalid)?)
            },
            'L' => {
                let rest = chars.as_str();
                let class = rest.strip_suffix(';').ok_or_else(invalid)?;
                if class.is_empty() || class.contains(';') || class.contains('[') {
                    return Err(invalid());
                }
                return Ok(Descriptor::Object(class.into()));
            },
            code => Descriptor::Primitive(Primitive::from_code(code).ok_or_else(invalid)?),
        };

        if chars.next().is_some() {
            return Err(invalid());
        }

        Ok(v)
    }
}

impl core::str::FromStr for Descriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl core::fmt::Display for Descriptor {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Descriptor::Primitive(v) => write!(fmt, "{}", v.code()),
            Descriptor::Array(v) => write!(fmt, "[{}", v.code()),
            Descriptor::Object(v) => write!(fmt, "L{};", v),
        }
    }
}
