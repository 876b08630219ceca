//! # Host Runtime Interface
//!
//! The host runtime owns the mirror objects. This module defines the narrow
//! interface the marshaller needs from it: finding classes by name, checking
//! the class of an object, looking up field handles, reading and writing
//! fields, and copying regions of primitive arrays.
//!
//! Two implementations are provided. [`jni::JniHost`] drives a Java VM
//! through its native interface. [`memory::MemoryHost`] is a self-contained
//! object store, suitable for tests and for embedders without a VM.

use crate::error::Result;
use crate::field::Element;
use crate::sig::{Descriptor, Kind, Primitive};

pub mod jni;
pub mod memory;

/// ## Field Values
///
/// A single value read from or written to a mirror field. Object references
/// are nullable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value<O> {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Object(Option<O>),
}

/// ## Host Runtime
///
/// A managed runtime that holds mirror objects. Handles are plain copyable
/// values. Classes and field handles must stay valid for as long as the
/// runtime lives, and they must be usable from any thread, since they are
/// cached in process-wide state.
pub trait Host {
    /// Reference to a managed object or array.
    type Object: Copy;
    /// Reference to a managed class.
    type Class: Copy + Send + Sync + 'static;
    /// Handle identifying a field of a managed class.
    type FieldId: Copy + Send + Sync + 'static;

    /// Class named `name`, e.g., `org/example/Point`, or `None` if the host
    /// does not know such a class.
    fn find_class(&self, name: &str) -> Result<Option<Self::Class>>;

    /// Whether `object` is an instance of `class`.
    fn is_instance_of(&self, object: Self::Object, class: Self::Class) -> Result<bool>;

    /// Handle of the field `name` with type `descriptor` in `class`, or
    /// `None` if the class does not declare such a field. Any other failure
    /// of the lookup is reported as error.
    fn field_id(
        &self,
        class: Self::Class,
        name: &str,
        descriptor: &Descriptor,
    ) -> Result<Option<Self::FieldId>>;

    /// Read a field of `object`. `kind` is the kind the field was resolved
    /// with.
    fn get_field(
        &self,
        object: Self::Object,
        field: Self::FieldId,
        kind: Kind,
    ) -> Result<Value<Self::Object>>;

    /// Write a field of `object`.
    fn set_field(
        &self,
        object: Self::Object,
        field: Self::FieldId,
        value: Value<Self::Object>,
    ) -> Result<()>;

    /// Number of elements of a primitive array.
    fn array_length(&self, array: Self::Object) -> Result<usize>;

    /// Copy `dst.len()` elements of `array`, starting at `start`, into `dst`.
    fn get_array_region<T: Element>(
        &self,
        array: Self::Object,
        start: usize,
        dst: &mut [T],
    ) -> Result<()>;

    /// Copy `src` into `array`, starting at element `start`.
    fn set_array_region<T: Element>(
        &self,
        array: Self::Object,
        start: usize,
        src: &[T],
    ) -> Result<()>;

    /// Drop a reference obtained through [`Host::get_field()`] once the
    /// marshaller no longer needs it.
    fn delete_local(&self, _object: Self::Object) {
    }

    /// Drop a class obtained through [`Host::find_class()`] that is not
    /// going to be cached.
    fn release_class(&self, _class: Self::Class) {
    }
}

impl<O> Value<O> {
    /// Kind of the value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Boolean(_) => Kind::Primitive(Primitive::Boolean),
            Value::Byte(_) => Kind::Primitive(Primitive::Byte),
            Value::Char(_) => Kind::Primitive(Primitive::Char),
            Value::Short(_) => Kind::Primitive(Primitive::Short),
            Value::Int(_) => Kind::Primitive(Primitive::Int),
            Value::Long(_) => Kind::Primitive(Primitive::Long),
            Value::Float(_) => Kind::Primitive(Primitive::Float),
            Value::Double(_) => Kind::Primitive(Primitive::Double),
            Value::Object(_) => Kind::Object,
        }
    }

    /// Zero value of the given kind, as fields are initialized by the host.
    pub fn zero(kind: Kind) -> Self {
        match kind {
            Kind::Primitive(Primitive::Boolean) => Value::Boolean(false),
            Kind::Primitive(Primitive::Byte) => Value::Byte(0),
            Kind::Primitive(Primitive::Char) => Value::Char(0),
            Kind::Primitive(Primitive::Short) => Value::Short(0),
            Kind::Primitive(Primitive::Int) => Value::Int(0),
            Kind::Primitive(Primitive::Long) => Value::Long(0),
            Kind::Primitive(Primitive::Float) => Value::Float(0.0),
            Kind::Primitive(Primitive::Double) => Value::Double(0.0),
            Kind::Object => Value::Object(None),
        }
    }
}
