//! # JNI Host
//!
//! [`JniHost`] implements the host interface on top of a raw `JNIEnv`
//! pointer, as passed to every native method by a Java VM.
//!
//! Classes handed out by this host are global references, since they end up
//! in field caches shared by all threads. Field handles are valid for as
//! long as their class is loaded, which the global reference guarantees.
//!
//! Every call into the VM is followed by an exception check. A pending
//! exception is cleared and reported as [`Error::Host`], so the caller can
//! decide whether to rethrow. The exceptions the VM raises for a missing
//! class or field are the one exception to this: they are cleared and the
//! lookup yields `None`.

use core::ptr::NonNull;
use std::ffi::{CStr, CString};

use crate::error::{Error, Result};
use crate::ffi::jni;
use crate::field::Element;
use crate::host::{Host, Value};
use crate::sig::{Descriptor, Kind, Primitive};

/// ## JNI Host
///
/// A host bound to the `JNIEnv` of the current thread. The environment is
/// only valid on the thread it was passed to, hence this type is neither
/// `Send` nor `Sync`.
pub struct JniHost {
    env: jni::EnvRef,
}

/// ## Global Class Reference
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct GlobalClass(NonNull<jni::AnonymousObject>);

/// ## Field Handle
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FieldHandle(NonNull<jni::AnonymousFieldId>);

// SAFETY: Global references and field IDs are valid on every thread of the
//         VM that created them.
unsafe impl Send for GlobalClass {}
unsafe impl Sync for GlobalClass {}
unsafe impl Send for FieldHandle {}
unsafe impl Sync for FieldHandle {}

macro_rules! jni_call {
    ( $self:ident, $entry:ident ( $( $arg:expr ),* $(,)? ) ) => {
        match $self.table() {
            Ok(t) => match t.$entry {
                Some(f) => Ok(f($self.env $(, $arg)*)),
                None => Err(Error::Host(
                    concat!("JNI function `", stringify!($entry), "` unavailable").into(),
                )),
            },
            Err(e) => Err(e),
        }
    }
}

impl GlobalClass {
    pub fn as_object(self) -> jni::Object {
        Some(self.0)
    }
}

impl JniHost {
    /// ## Bind to Environment
    ///
    /// ### Safety
    ///
    /// `env` must be a valid `JNIEnv` of the calling thread, and must remain
    /// valid for the lifetime of the host.
    pub unsafe fn from_raw(env: jni::EnvRef) -> Self {
        Self {
            env: env,
        }
    }

    /// Raw environment the host is bound to.
    pub fn env(&self) -> jni::EnvRef {
        self.env
    }

    fn table(&self) -> Result<&jni::NativeInterface> {
        // SAFETY: `from_raw()` guarantees a valid environment, whose table
        //         pointer is set by the VM and outlives the environment.
        unsafe {
            match *self.env.as_ptr() {
                Some(v) => Ok(&*v.as_ptr()),
                None => Err(Error::Host("null JNI function table".into())),
            }
        }
    }

    /// JNI version of the VM.
    pub fn version(&self) -> Result<jni::Int> {
        unsafe { jni_call!(self, get_version()) }
    }

    // Clear a pending exception and report it as error.
    fn check(&self, what: &str) -> Result<()> {
        let pending = unsafe { jni_call!(self, exception_check())? };
        if pending == jni::FALSE {
            return Ok(());
        }

        unsafe { jni_call!(self, exception_clear())? };
        tracing::debug!(call = what, "cleared pending java exception");
        Err(Error::Host(format!("java exception raised by {}", what)))
    }

    // Clear a pending exception, which is only acceptable if it is an
    // instance of `expected`. Anything else is reported as error.
    fn clear_expected(&self, what: &str, expected: &CStr) -> Result<()> {
        let pending = unsafe { jni_call!(self, exception_check())? };
        if pending == jni::FALSE {
            return Ok(());
        }

        let throwable = unsafe { jni_call!(self, exception_occurred())? };
        unsafe { jni_call!(self, exception_clear())? };

        let matches = match throwable {
            Some(v) => {
                let r = self.instance_of_name(v, expected);
                self.delete_local(v);
                r?
            },
            None => false,
        };

        if matches {
            tracing::trace!(call = what, "cleared expected java exception");
            Ok(())
        } else {
            tracing::debug!(call = what, "cleared pending java exception");
            Err(Error::Host(format!("java exception raised by {}", what)))
        }
    }

    // Whether `object` is an instance of the class named `name`.
    fn instance_of_name(&self, object: NonNull<jni::AnonymousObject>, name: &CStr) -> Result<bool> {
        let class = unsafe { jni_call!(self, find_class(NonNull::new(name.as_ptr() as *mut u8)))? };
        self.check("FindClass")?;
        let Some(class) = class else {
            return Ok(false);
        };

        let v = unsafe { jni_call!(self, is_instance_of(Some(object), Some(class))) };
        self.delete_local(class);
        self.check("IsInstanceOf")?;
        Ok(v? != jni::FALSE)
    }

    fn c_string(value: &str) -> Result<CString> {
        CString::new(value).map_err(|_| Error::Host(format!("`{}` contains a nul byte", value.escape_debug())))
    }

    fn int(value: usize) -> Result<jni::Size> {
        jni::Size::try_from(value).map_err(|_| Error::Host(format!("index {} exceeds jsize", value)))
    }

    fn region<T: Element>(
        &self,
        array: jni::Object,
        start: usize,
        len: usize,
        buf: NonNull<T>,
        write: bool,
    ) -> Result<()> {
        let (start, len) = (Self::int(start)?, Self::int(len)?);

        // SAFETY: `Element` guarantees `T` shares the layout of the primitive
        //         it names, so the casts below match the JNI signatures.
        unsafe {
            match (T::PRIMITIVE, write) {
                (Primitive::Boolean, false) => jni_call!(self, get_boolean_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Byte, false) => jni_call!(self, get_byte_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Char, false) => jni_call!(self, get_char_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Short, false) => jni_call!(self, get_short_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Int, false) => jni_call!(self, get_int_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Long, false) => jni_call!(self, get_long_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Float, false) => jni_call!(self, get_float_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Double, false) => jni_call!(self, get_double_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Boolean, true) => jni_call!(self, set_boolean_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Byte, true) => jni_call!(self, set_byte_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Char, true) => jni_call!(self, set_char_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Short, true) => jni_call!(self, set_short_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Int, true) => jni_call!(self, set_int_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Long, true) => jni_call!(self, set_long_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Float, true) => jni_call!(self, set_float_array_region(array, start, len, Some(buf.cast())))?,
                (Primitive::Double, true) => jni_call!(self, set_double_array_region(array, start, len, Some(buf.cast())))?,
            }
        }

        self.check("array region access")
    }
}

impl Host for JniHost {
    type Object = NonNull<jni::AnonymousObject>;
    type Class = GlobalClass;
    type FieldId = FieldHandle;

    fn find_class(&self, name: &str) -> Result<Option<GlobalClass>> {
        let name = Self::c_string(name)?;

        let local = unsafe { jni_call!(self, find_class(NonNull::new(name.as_ptr() as *mut u8)))? };
        let Some(local) = local else {
            // An unknown class raises `NoClassDefFoundError`, which must not leak.
            self.clear_expected("FindClass", c"java/lang/NoClassDefFoundError")?;
            return Ok(None);
        };
        self.check("FindClass")?;

        let global = unsafe { jni_call!(self, new_global_ref(Some(local))) };
        self.delete_local(local);
        match global? {
            Some(v) => Ok(Some(GlobalClass(v))),
            None => Err(Error::Host("NewGlobalRef failed for class reference".into())),
        }
    }

    fn is_instance_of(&self, object: Self::Object, class: GlobalClass) -> Result<bool> {
        let v = unsafe { jni_call!(self, is_instance_of(Some(object), class.as_object()))? };
        self.check("IsInstanceOf")?;
        Ok(v != jni::FALSE)
    }

    fn field_id(
        &self,
        class: GlobalClass,
        name: &str,
        descriptor: &Descriptor,
    ) -> Result<Option<FieldHandle>> {
        let name = Self::c_string(name)?;
        let signature = Self::c_string(&descriptor.to_string())?;

        let id = unsafe {
            jni_call!(
                self,
                get_field_id(
                    class.as_object(),
                    NonNull::new(name.as_ptr() as *mut u8),
                    NonNull::new(signature.as_ptr() as *mut u8),
                )
            )?
        };

        match id {
            Some(v) => {
                self.check("GetFieldID")?;
                Ok(Some(FieldHandle(v)))
            },
            None => {
                // A missing field raises `NoSuchFieldError`, which must not leak.
                self.clear_expected("GetFieldID", c"java/lang/NoSuchFieldError")?;
                Ok(None)
            },
        }
    }

    fn get_field(
        &self,
        object: Self::Object,
        field: FieldHandle,
        kind: Kind,
    ) -> Result<Value<Self::Object>> {
        let (o, f) = (Some(object), Some(field.0));

        let v = unsafe {
            match kind {
                Kind::Object => Value::Object(jni_call!(self, get_object_field(o, f))?),
                Kind::Primitive(Primitive::Boolean) => {
                    Value::Boolean(jni_call!(self, get_boolean_field(o, f))? != jni::FALSE)
                },
                Kind::Primitive(Primitive::Byte) => Value::Byte(jni_call!(self, get_byte_field(o, f))?),
                Kind::Primitive(Primitive::Char) => Value::Char(jni_call!(self, get_char_field(o, f))?),
                Kind::Primitive(Primitive::Short) => Value::Short(jni_call!(self, get_short_field(o, f))?),
                Kind::Primitive(Primitive::Int) => Value::Int(jni_call!(self, get_int_field(o, f))?),
                Kind::Primitive(Primitive::Long) => Value::Long(jni_call!(self, get_long_field(o, f))?),
                Kind::Primitive(Primitive::Float) => Value::Float(jni_call!(self, get_float_field(o, f))?),
                Kind::Primitive(Primitive::Double) => Value::Double(jni_call!(self, get_double_field(o, f))?),
            }
        };

        self.check("field read")?;
        Ok(v)
    }

    fn set_field(
        &self,
        object: Self::Object,
        field: FieldHandle,
        value: Value<Self::Object>,
    ) -> Result<()> {
        let (o, f) = (Some(object), Some(field.0));

        unsafe {
            match value {
                Value::Object(v) => jni_call!(self, set_object_field(o, f, v))?,
                Value::Boolean(v) => {
                    let v = if v { jni::TRUE } else { jni::FALSE };
                    jni_call!(self, set_boolean_field(o, f, v))?
                },
                Value::Byte(v) => jni_call!(self, set_byte_field(o, f, v))?,
                Value::Char(v) => jni_call!(self, set_char_field(o, f, v))?,
                Value::Short(v) => jni_call!(self, set_short_field(o, f, v))?,
                Value::Int(v) => jni_call!(self, set_int_field(o, f, v))?,
                Value::Long(v) => jni_call!(self, set_long_field(o, f, v))?,
                Value::Float(v) => jni_call!(self, set_float_field(o, f, v))?,
                Value::Double(v) => jni_call!(self, set_double_field(o, f, v))?,
            }
        }

        self.check("field write")
    }

    fn array_length(&self, array: Self::Object) -> Result<usize> {
        let v = unsafe { jni_call!(self, get_array_length(Some(array)))? };
        self.check("GetArrayLength")?;
        usize::try_from(v).map_err(|_| Error::Host(format!("negative array length {}", v)))
    }

    fn get_array_region<T: Element>(
        &self,
        array: Self::Object,
        start: usize,
        dst: &mut [T],
    ) -> Result<()> {
        let buf = NonNull::from(&mut *dst).cast::<T>();
        self.region(Some(array), start, dst.len(), buf, false)
    }

    fn set_array_region<T: Element>(
        &self,
        array: Self::Object,
        start: usize,
        src: &[T],
    ) -> Result<()> {
        // The VM only reads from the buffer of a set-region call.
        let buf = NonNull::from(src).cast::<T>();
        self.region(Some(array), start, src.len(), buf, true)
    }

    fn delete_local(&self, object: Self::Object) {
        if let Err(e) = unsafe { jni_call!(self, delete_local_ref(Some(object))) } {
            tracing::warn!(error = %e, "leaking local reference");
        }
    }

    fn release_class(&self, class: GlobalClass) {
        if let Err(e) = unsafe { jni_call!(self, delete_global_ref(class.as_object())) } {
            tracing::warn!(error = %e, "leaking global class reference");
        }
    }
}
