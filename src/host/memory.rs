//! # In-Memory Host
//!
//! A self-contained host runtime that keeps classes, objects, and primitive
//! arrays in process memory. It follows the field semantics of a real VM:
//! fields are looked up by name and descriptor, new objects start out with
//! zero values, and array accesses are bounds- and type-checked.
//!
//! The host counts field lookups, which makes the caching behavior of the
//! marshaller observable.

use core::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::field::Element;
use crate::host::{Host, Value};
use crate::sig::{Descriptor, Primitive};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ClassId(usize);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FieldId {
    class: ClassId,
    index: usize,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ObjectRef(usize);

struct ClassDef {
    name: String,
    fields: Vec<(String, Descriptor)>,
}

enum Slot {
    Instance {
        class: ClassId,
        values: Vec<Value<ObjectRef>>,
    },
    Array {
        primitive: Primitive,
        bits: Vec<u64>,
    },
}

/// ## Memory Host
///
/// Classes and objects are never freed. Locks are always taken in the order
/// classes before heap.
pub struct MemoryHost {
    classes: RwLock<Vec<ClassDef>>,
    heap: RwLock<Vec<Slot>>,
    lookups: AtomicUsize,
}

fn fault(msg: impl core::fmt::Display) -> Error {
    Error::Host(msg.to_string())
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(Vec::new()),
            heap: RwLock::new(Vec::new()),
            lookups: AtomicUsize::new(0),
        }
    }

    /// ## Define Class
    ///
    /// Define a class named `name` with the given `(name, descriptor)` field
    /// pairs.
    pub fn define_class(&self, name: &str, fields: &[(&str, &str)]) -> Result<ClassId> {
        let fields = fields
            .iter()
            .map(|(n, d)| Ok((n.to_string(), Descriptor::parse(d)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut classes = self.classes.write();
        classes.push(ClassDef {
            name: name.into(),
            fields: fields,
        });
        Ok(ClassId(classes.len() - 1))
    }

    /// Name of a defined class.
    pub fn class_name(&self, class: ClassId) -> Option<String> {
        self.classes.read().get(class.0).map(|v| v.name.clone())
    }

    /// Create an instance of `class` with all fields zeroed.
    ///
    /// Panics if `class` was not defined by this host.
    pub fn new_object(&self, class: ClassId) -> ObjectRef {
        let values = self.classes.read()[class.0]
            .fields
            .iter()
            .map(|(_, d)| Value::zero(d.kind()))
            .collect();

        self.alloc(Slot::Instance {
            class: class,
            values: values,
        })
    }

    /// Create a primitive array holding a copy of `values`.
    pub fn new_array<T: Element>(&self, values: &[T]) -> ObjectRef {
        self.alloc(Slot::Array {
            primitive: T::PRIMITIVE,
            bits: values.iter().map(|v| v.to_bits()).collect(),
        })
    }

    fn alloc(&self, slot: Slot) -> ObjectRef {
        let mut heap = self.heap.write();
        heap.push(slot);
        ObjectRef(heap.len() - 1)
    }

    fn index_of(&self, object: ObjectRef, name: &str) -> Result<usize> {
        let classes = self.classes.read();
        let heap = self.heap.read();

        match heap.get(object.0) {
            Some(Slot::Instance { class, .. }) => classes[class.0]
                .fields
                .iter()
                .position(|(n, _)| n == name)
                .ok_or_else(|| fault(format_args!("no field `{}` in {}", name, classes[class.0].name))),
            _ => Err(fault(format_args!("{:?} is not an instance", object))),
        }
    }

    /// Read the field `name` of `object`.
    pub fn get(&self, object: ObjectRef, name: &str) -> Result<Value<ObjectRef>> {
        let index = self.index_of(object, name)?;
        match self.heap.read().get(object.0) {
            Some(Slot::Instance { values, .. }) => Ok(values[index]),
            _ => Err(fault(format_args!("{:?} is not an instance", object))),
        }
    }

    /// Write the field `name` of `object`. The value must be of the kind
    /// the field was declared with.
    pub fn put(&self, object: ObjectRef, name: &str, value: Value<ObjectRef>) -> Result<()> {
        let index = self.index_of(object, name)?;
        self.store(object, index, value)
    }

    fn store(&self, object: ObjectRef, index: usize, value: Value<ObjectRef>) -> Result<()> {
        match self.heap.write().get_mut(object.0) {
            Some(Slot::Instance { values, .. }) => {
                let slot = values
                    .get_mut(index)
                    .ok_or_else(|| fault(format_args!("invalid field index {}", index)))?;
                if slot.kind() != value.kind() {
                    return Err(fault(format_args!(
                        "cannot store {} into {} field",
                        value.kind(),
                        slot.kind(),
                    )));
                }
                *slot = value;
                Ok(())
            },
            _ => Err(fault(format_args!("{:?} is not an instance", object))),
        }
    }

    /// Class of `object`, or `None` for arrays and invalid references.
    pub fn object_class(&self, object: ObjectRef) -> Option<ClassId> {
        match self.heap.read().get(object.0)? {
            Slot::Instance { class, .. } => Some(*class),
            Slot::Array { .. } => None,
        }
    }

    /// Copy of the elements of a primitive array.
    pub fn array<T: Element>(&self, array: ObjectRef) -> Result<Vec<T>> {
        let mut v = vec![T::default(); self.array_length(array)?];
        self.get_array_region(array, 0, &mut v)?;
        Ok(v)
    }

    /// Number of field lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

fn region(len: usize, start: usize, count: usize) -> Result<core::ops::Range<usize>> {
    match start.checked_add(count) {
        Some(end) if end <= len => Ok(start..end),
        _ => Err(fault(format_args!(
            "region {}+{} out of bounds of array with {} elements",
            start, count, len,
        ))),
    }
}

impl Host for MemoryHost {
    type Object = ObjectRef;
    type Class = ClassId;
    type FieldId = FieldId;

    fn find_class(&self, name: &str) -> Result<Option<ClassId>> {
        let classes = self.classes.read();
        Ok(classes.iter().position(|v| v.name == name).map(ClassId))
    }

    fn is_instance_of(&self, object: ObjectRef, class: ClassId) -> Result<bool> {
        match self.heap.read().get(object.0) {
            Some(Slot::Instance { class: v, .. }) => Ok(*v == class),
            Some(Slot::Array { .. }) => Ok(false),
            None => Err(fault(format_args!("{:?} is not a valid reference", object))),
        }
    }

    fn field_id(
        &self,
        class: ClassId,
        name: &str,
        descriptor: &Descriptor,
    ) -> Result<Option<FieldId>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let classes = self.classes.read();
        let def = classes
            .get(class.0)
            .ok_or_else(|| fault(format_args!("{:?} is not a defined class", class)))?;

        Ok(def
            .fields
            .iter()
            .position(|(n, d)| n == name && d == descriptor)
            .map(|index| FieldId {
                class: class,
                index: index,
            }))
    }

    fn get_field(
        &self,
        object: ObjectRef,
        field: FieldId,
        kind: crate::sig::Kind,
    ) -> Result<Value<ObjectRef>> {
        match self.heap.read().get(object.0) {
            Some(Slot::Instance { class, values }) if *class == field.class => {
                let v = *values
                    .get(field.index)
                    .ok_or_else(|| fault(format_args!("invalid field index {}", field.index)))?;
                if v.kind() != kind {
                    return Err(fault(format_args!("{} field read as {}", v.kind(), kind)));
                }
                Ok(v)
            },
            Some(Slot::Instance { .. }) => Err(fault(format_args!(
                "field of another class read from {:?}",
                object,
            ))),
            _ => Err(fault(format_args!("{:?} is not an instance", object))),
        }
    }

    fn set_field(
        &self,
        object: ObjectRef,
        field: FieldId,
        value: Value<ObjectRef>,
    ) -> Result<()> {
        if self.object_class(object) != Some(field.class) {
            return Err(fault(format_args!(
                "field of another class written to {:?}",
                object,
            )));
        }
        self.store(object, field.index, value)
    }

    fn array_length(&self, array: ObjectRef) -> Result<usize> {
        match self.heap.read().get(array.0) {
            Some(Slot::Array { bits, .. }) => Ok(bits.len()),
            _ => Err(fault(format_args!("{:?} is not an array", array))),
        }
    }

    fn get_array_region<T: Element>(
        &self,
        array: ObjectRef,
        start: usize,
        dst: &mut [T],
    ) -> Result<()> {
        match self.heap.read().get(array.0) {
            Some(Slot::Array { primitive, bits }) if *primitive == T::PRIMITIVE => {
                let range = region(bits.len(), start, dst.len())?;
                for (d, s) in dst.iter_mut().zip(&bits[range]) {
                    *d = T::from_bits(*s);
                }
                Ok(())
            },
            Some(Slot::Array { primitive, .. }) => Err(fault(format_args!(
                "{} array accessed as {}",
                primitive.name(),
                T::PRIMITIVE.name(),
            ))),
            _ => Err(fault(format_args!("{:?} is not an array", array))),
        }
    }

    fn set_array_region<T: Element>(
        &self,
        array: ObjectRef,
        start: usize,
        src: &[T],
    ) -> Result<()> {
        match self.heap.write().get_mut(array.0) {
            Some(Slot::Array { primitive, bits }) if *primitive == T::PRIMITIVE => {
                let range = region(bits.len(), start, src.len())?;
                for (d, s) in bits[range].iter_mut().zip(src) {
                    *d = s.to_bits();
                }
                Ok(())
            },
            Some(Slot::Array { primitive, .. }) => Err(fault(format_args!(
                "{} array accessed as {}",
                primitive.name(),
                T::PRIMITIVE.name(),
            ))),
            _ => Err(fault(format_args!("{:?} is not an array", array))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sig::Kind;

    // New objects are zeroed and fields are only found by name and
    // descriptor together.
    #[test]
    fn object_fields() {
        let host = MemoryHost::new();
        let class = host.define_class("osi/test/Point", &[("x", "I"), ("next", "Losi/test/Point;")]).unwrap();
        let object = host.new_object(class);

        assert_eq!(host.object_class(object), Some(class));
        assert_eq!(host.class_name(class).as_deref(), Some("osi/test/Point"));
        assert_eq!(host.get(object, "x").unwrap(), Value::Int(0));
        assert_eq!(host.get(object, "next").unwrap(), Value::Object(None));

        let x = host.field_id(class, "x", &Descriptor::Primitive(Primitive::Int)).unwrap().unwrap();
        assert!(host.field_id(class, "x", &Descriptor::Primitive(Primitive::Long)).unwrap().is_none());
        assert!(host.field_id(class, "y", &Descriptor::Primitive(Primitive::Int)).unwrap().is_none());
        assert_eq!(host.lookups(), 3);

        host.set_field(object, x, Value::Int(-4)).unwrap();
        assert_eq!(host.get_field(object, x, Kind::Primitive(Primitive::Int)).unwrap(), Value::Int(-4));
        assert!(host.set_field(object, x, Value::Long(1)).is_err());
        assert!(host.put(object, "next", Value::Object(Some(object))).is_ok());
    }

    // Classes are found by name, and instances only match their own class.
    #[test]
    fn class_lookup() {
        let host = MemoryHost::new();
        let point = host.define_class("osi/test/Point", &[("x", "I")]).unwrap();
        let other = host.define_class("osi/test/Other", &[("x", "I")]).unwrap();
        let object = host.new_object(point);
        let array = host.new_array::<u8>(&[0]);

        assert_eq!(host.find_class("osi/test/Point").unwrap(), Some(point));
        assert_eq!(host.find_class("osi/test/Other").unwrap(), Some(other));
        assert_eq!(host.find_class("osi/test/Missing").unwrap(), None);

        assert!(host.is_instance_of(object, point).unwrap());
        assert!(!host.is_instance_of(object, other).unwrap());
        assert!(!host.is_instance_of(array, point).unwrap());
        assert!(host.is_instance_of(ObjectRef(99), point).is_err());
        assert!(host.field_id(ClassId(99), "x", &Descriptor::Primitive(Primitive::Int)).is_err());
    }

    // Array regions are checked for element type and bounds.
    #[test]
    fn array_regions() {
        let host = MemoryHost::new();
        let array = host.new_array::<i32>(&[1, 2, 3, 4]);
        let mut v = [0i32; 2];

        assert_eq!(host.array_length(array).unwrap(), 4);
        host.get_array_region(array, 2, &mut v).unwrap();
        assert_eq!(v, [3, 4]);

        host.set_array_region(array, 1, &[9i32]).unwrap();
        assert_eq!(host.array::<i32>(array).unwrap(), vec![1, 9, 3, 4]);

        assert!(host.get_array_region(array, 3, &mut v).is_err());
        assert!(host.get_array_region(array, usize::MAX, &mut v).is_err());
        assert!(host.set_array_region(array, 0, &[1u8]).is_err());
        assert!(host.object_class(array).is_none());
    }

    // Malformed class definitions are rejected.
    #[test]
    fn class_invalid() {
        let host = MemoryHost::new();

        assert!(matches!(
            host.define_class("osi/test/Bad", &[("x", "Q")]),
            Err(Error::InvalidDescriptor(_)),
        ));
    }
}
