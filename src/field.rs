//! # Native Field Kinds
//!
//! This module maps the types a native struct can embed to their mirror
//! field representation. Every type that can appear as a field of a
//! marshalled struct implements [`NativeField`]:
//!
//!  * Primitive integers, floats, and `bool` map to the host primitive of the
//!    same width. Unsigned types share the mirror kind of their signed
//!    counterpart and are reinterpreted bit-for-bit, except `u16`, which maps
//!    to the unsigned `char`.
//!
//!  * Pointers map to an integer field, whose width is picked by
//!    [`crate::config::PointerRepr`]. The marshaller reinterprets the address
//!    and nothing else. Pointee lifetime is entirely up to the caller.
//!
//!  * Fixed-size arrays of primitives map to a primitive array field of
//!    exactly the same length. Any other length is rejected.
//!
//!  * Structs deriving [`crate::Marshal`] map to an object field, and are
//!    marshalled through their own field cache.

use core::ptr::NonNull;

use crate::cache::Marshal;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::host::{Host, Value};
use crate::sig::{Kind, Primitive, Signature};

/// ## Array Elements
///
/// Primitive types that can be copied in and out of host arrays in bulk.
///
/// ### Safety
///
/// The implementing type must have the exact size, alignment, and validity
/// of the host type named by `PRIMITIVE`. Hosts may copy host array memory
/// directly into slices of the implementing type.
pub unsafe trait Element: Copy + Default + Send + 'static {
    /// Host primitive this type is stored as.
    const PRIMITIVE: Primitive;

    /// Raw bits of the value, zero-extended.
    fn to_bits(self) -> u64;

    /// Value from raw bits, truncated to the width of the type.
    fn from_bits(bits: u64) -> Self;
}

/// ## Resolved Field
///
/// A field of a mirror class, resolved against the host. This is what a
/// populated field cache holds for every declared field.
pub struct Field<H: Host> {
    /// Mirror field name.
    pub name: &'static str,
    /// Host field handle.
    pub id: H::FieldId,
    /// Kind of value the field holds.
    pub kind: Kind,
}

/// ## Native Field
///
/// A type that can be embedded in a marshalled native struct. Implementors
/// copy a single mirror field into a native value and back.
pub trait NativeField: Sized {
    /// Type of the mirror field.
    const SIGNATURE: Signature;

    /// Read the mirror field `field` of `object` into `dst`.
    fn get<H: Host>(
        env: &Env<'_, H>,
        object: H::Object,
        field: &Field<H>,
        dst: &mut Self,
    ) -> Result<()>;

    /// Write `self` into the mirror field `field` of `object`.
    fn set<H: Host>(
        &self,
        env: &Env<'_, H>,
        object: H::Object,
        field: &Field<H>,
    ) -> Result<()>;

    /// Verify that `set()` would accept `self` for the mirror field `field`
    /// of `object`, without modifying the mirror. Values that fit every
    /// mirror of their kind need not override this.
    fn check<H: Host>(
        &self,
        _env: &Env<'_, H>,
        _object: H::Object,
        _field: &Field<H>,
    ) -> Result<()> {
        Ok(())
    }
}

// Reference obtained from a field read, handed back to the host on drop.
struct Local<'a, H: Host> {
    host: &'a H,
    object: H::Object,
}

impl<H: Host> Clone for Field<H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H: Host> Copy for Field<H> {
}

impl<H: Host> Field<H> {
    /// Error for a host value of an unexpected kind.
    pub fn mismatch<O>(&self, found: &Value<O>) -> Error {
        Error::ValueKind {
            field: self.name,
            expected: self.kind,
            found: found.kind(),
        }
    }

    // Read a reference field, rejecting null.
    fn object<'a>(
        &self,
        host: &'a H,
        object: H::Object,
    ) -> Result<Local<'a, H>> {
        match host.get_field(object, self.id, self.kind)? {
            Value::Object(Some(v)) => Ok(Local { host: host, object: v }),
            Value::Object(None) => Err(Error::NullObject { field: self.name }),
            v => Err(self.mismatch(&v)),
        }
    }
}

impl<'a, H: Host> Drop for Local<'a, H> {
    fn drop(&mut self) {
        self.host.delete_local(self.object);
    }
}

macro_rules! implement_element {
    ( $ty:ty, $prim:ident, $bits:ty ) => {
        unsafe impl Element for $ty {
            const PRIMITIVE: Primitive = Primitive::$prim;

            fn to_bits(self) -> u64 {
                <$bits>::from_ne_bytes(self.to_ne_bytes()) as u64
            }

            fn from_bits(bits: u64) -> Self {
                <$ty>::from_ne_bytes((bits as $bits).to_ne_bytes())
            }
        }
    }
}

implement_element!(i8, Byte, u8);
implement_element!(u8, Byte, u8);
implement_element!(u16, Char, u16);
implement_element!(i16, Short, u16);
implement_element!(i32, Int, u32);
implement_element!(u32, Int, u32);
implement_element!(i64, Long, u64);
implement_element!(u64, Long, u64);
implement_element!(f32, Float, u32);
implement_element!(f64, Double, u64);

macro_rules! implement_primitive {
    ( $ty:ty, $prim:ident, $variant:ident, $mirror:ty ) => {
        #[allow(clippy::unnecessary_cast)]
        impl NativeField for $ty {
            const SIGNATURE: Signature = Signature::Primitive(Primitive::$prim);

            fn get<H: Host>(
                env: &Env<'_, H>,
                object: H::Object,
                field: &Field<H>,
                dst: &mut Self,
            ) -> Result<()> {
                match env.host().get_field(object, field.id, field.kind)? {
                    Value::$variant(v) => {
                        *dst = v as $ty;
                        Ok(())
                    },
                    v => Err(field.mismatch(&v)),
                }
            }

            fn set<H: Host>(
                &self,
                env: &Env<'_, H>,
                object: H::Object,
                field: &Field<H>,
            ) -> Result<()> {
                env.host().set_field(object, field.id, Value::$variant(*self as $mirror))
            }
        }
    }
}

implement_primitive!(bool, Boolean, Boolean, bool);
implement_primitive!(i8, Byte, Byte, i8);
implement_primitive!(u8, Byte, Byte, i8);
implement_primitive!(u16, Char, Char, u16);
implement_primitive!(i16, Short, Short, i16);
implement_primitive!(i32, Int, Int, i32);
implement_primitive!(u32, Int, Int, i32);
implement_primitive!(i64, Long, Long, i64);
implement_primitive!(u64, Long, Long, i64);
implement_primitive!(f32, Float, Float, f32);
implement_primitive!(f64, Double, Double, f64);

/// ## Read Pointer Field
///
/// Read an address from a pointer field. 32-bit mirrors are zero-extended.
pub fn get_address<H: Host>(
    env: &Env<'_, H>,
    object: H::Object,
    field: &Field<H>,
) -> Result<usize> {
    match env.host().get_field(object, field.id, field.kind)? {
        Value::Int(v) => Ok(v as u32 as usize),
        Value::Long(v) => usize::try_from(v as u64).map_err(|_| Error::Narrowing {
            field: field.name,
            value: v as u64,
        }),
        v => Err(field.mismatch(&v)),
    }
}

// Mirror value of an address. Addresses that do not fit a 32-bit mirror
// are rejected rather than truncated.
fn mirror_address<H: Host>(field: &Field<H>, address: usize) -> Result<Value<H::Object>> {
    match field.kind {
        Kind::Primitive(Primitive::Int) => {
            let v = u32::try_from(address).map_err(|_| Error::Narrowing {
                field: field.name,
                value: address as u64,
            })?;
            Ok(Value::Int(v as i32))
        },
        Kind::Primitive(Primitive::Long) => Ok(Value::Long(address as u64 as i64)),
        kind => Err(Error::ValueKind {
            field: field.name,
            expected: kind,
            found: Kind::Primitive(Primitive::Long),
        }),
    }
}

/// ## Write Pointer Field
///
/// Write an address into a pointer field. Addresses that do not fit a
/// 32-bit mirror are rejected rather than truncated.
pub fn set_address<H: Host>(
    env: &Env<'_, H>,
    object: H::Object,
    field: &Field<H>,
    address: usize,
) -> Result<()> {
    let value = mirror_address(field, address)?;
    env.host().set_field(object, field.id, value)
}

impl<T> NativeField for *mut T {
    const SIGNATURE: Signature = Signature::Pointer;

    fn get<H: Host>(
        env: &Env<'_, H>,
        object: H::Object,
        field: &Field<H>,
        dst: &mut Self,
    ) -> Result<()> {
        *dst = get_address(env, object, field)? as *mut T;
        Ok(())
    }

    fn set<H: Host>(
        &self,
        env: &Env<'_, H>,
        object: H::Object,
        field: &Field<H>,
    ) -> Result<()> {
        set_address(env, object, field, *self as usize)
    }
    fn check<H: Host>(
        &self,
        _env: &Env<'_, H>,
        _object: H::Object,
        field: &Field<H>,
    ) -> Result<()> {
        mirror_address(field, *self as usize)?;
        Ok(())
    }
}

impl<T> NativeField for *const T {
    const SIGNATURE: Signature = Signature::Pointer;

    fn get<H: Host>(
        env: &Env<'_, H>,
        object: H::Object,
        field: &Field<H>,
        dst: &mut Self,
    ) -> Result<()> {
        *dst = get_address(env, object, field)? as *const T;
        Ok(())
    }

    fn set<H: Host>(
        &self,
        env: &Env<'_, H>,
        object: H::Object,
        field: &Field<H>,
    ) -> Result<()> {
        set_address(env, object, field, *self as usize)
    }
    fn check<H: Host>(
        &self,
        _env: &Env<'_, H>,
        _object: H::Object,
        field: &Field<H>,
    ) -> Result<()> {
        mirror_address(field, *self as usize)?;
        Ok(())
    }
}

impl<T> NativeField for Option<NonNull<T>> {
    const SIGNATURE: Signature = Signature::Pointer;

    fn get<H: Host>(
        env: &Env<'_, H>,
        object: H::Object,
        field: &Field<H>,
        dst: &mut Self,
    ) -> Result<()> {
        *dst = NonNull::new(get_address(env, object, field)? as *mut T);
        Ok(())
    }

    fn set<H: Host>(
        &self,
        env: &Env<'_, H>,
        object: H::Object,
        field: &Field<H>,
    ) -> Result<()> {
        let address = self.map_or(0, |v| v.as_ptr() as usize);
        set_address(env, object, field, address)
    }
    fn check<H: Host>(
        &self,
        _env: &Env<'_, H>,
        _object: H::Object,
        field: &Field<H>,
    ) -> Result<()> {
        mirror_address(field, self.map_or(0, |v| v.as_ptr() as usize))?;
        Ok(())
    }
}

impl<T: Element, const N: usize> NativeField for [T; N] {
    const SIGNATURE: Signature = Signature::Array(T::PRIMITIVE);

    fn get<H: Host>(
        env: &Env<'_, H>,
        object: H::Object,
        field: &Field<H>,
        dst: &mut Self,
    ) -> Result<()> {
        let array = field.object(env.host(), object)?;
        check_length(env.host(), array.object, field, N)?;
        env.host().get_array_region(array.object, 0, &mut dst[..])
    }

    fn set<H: Host>(
        &self,
        env: &Env<'_, H>,
        object: H::Object,
        field: &Field<H>,
    ) -> Result<()> {
        let array = field.object(env.host(), object)?;
        check_length(env.host(), array.object, field, N)?;
        env.host().set_array_region(array.object, 0, &self[..])
    }

    fn check<H: Host>(
        &self,
        env: &Env<'_, H>,
        object: H::Object,
        field: &Field<H>,
    ) -> Result<()> {
        let array = field.object(env.host(), object)?;
        check_length(env.host(), array.object, field, N)
    }
}

fn check_length<H: Host>(
    host: &H,
    array: H::Object,
    field: &Field<H>,
    expected: usize,
) -> Result<()> {
    let actual = host.array_length(array)?;
    if actual != expected {
        return Err(Error::LengthMismatch {
            field: field.name,
            expected: expected,
            actual: actual,
        });
    }
    Ok(())
}

/// ## Read Nested Struct
///
/// Read the object referenced by `field` into `dst`, using the field cache
/// of `T`. This backs the [`NativeField`] implementation of every type that
/// derives [`crate::Marshal`].
pub fn get_nested<H: Host, T: Marshal>(
    env: &Env<'_, H>,
    object: H::Object,
    field: &Field<H>,
    dst: &mut T,
) -> Result<()> {
    let nested = field.object(env.host(), object)?;
    env.get_fields(nested.object, dst)?;
    Ok(())
}

/// ## Write Nested Struct
///
/// Write `src` into the object referenced by `field`. The mirror object
/// must already exist; it is updated in place. The caller is expected to
/// have run [`check_nested()`] first.
pub fn set_nested<H: Host, T: Marshal>(
    env: &Env<'_, H>,
    object: H::Object,
    field: &Field<H>,
    src: &T,
) -> Result<()> {
    let nested = field.object(env.host(), object)?;
    env.write_fields(nested.object, src)
}

/// ## Check Nested Struct
///
/// Verify that `src` can be written into the object referenced by `field`.
pub fn check_nested<H: Host, T: Marshal>(
    env: &Env<'_, H>,
    object: H::Object,
    field: &Field<H>,
    src: &T,
) -> Result<()> {
    let nested = field.object(env.host(), object)?;
    env.check_fields(nested.object, src)
}
