//! Java Native Interface
//!
//! This Rust module exposes the JNI namespace of the compilation target,
//! transposed to Rust following the rules outlined in the [`crate::ffi`]
//! module.
//!
//! Only the native interface (i.e., the function table behind `JNIEnv`) is
//! provided. Entries used for field access, reference management, primitive
//! array regions, and exception handling carry their full function type.
//! All other entries are opaque.
//!
//! Extensions
//! ----------
//!
//! While this module attempts to be a direct mapping of the JNI specification,
//! slight extensions were made to account for the difference in language:
//!
//!  * `EnvRef` is provided to wrap references to an `Env`. This is so common
//!    that it makes the code a lot easier to read with the amount of
//!    `Option<NonNull<...>>` wrapping required in Rust.
//!
//! Version
//! -------
//!
//! The function table covers JNI up to version 21. Entries added after
//! JNI-1.6 are only valid if the runtime reports a suitable version.

use core::ffi::c_void;
use core::ptr::NonNull;

/// Anonymous Objects
///
/// This is the anonymous structure behind `jni::Object`.
///
/// The JNI uses pointer types for a wide range of Java types. Yet, it
/// avoids exposing the type of the pointee for compatibility reasons. But
/// to guarantee type-safety for the pointers, an anonymous structure is
/// defined for each Java type that is represented as a pointer type.
#[repr(C)]
pub struct AnonymousObject {
    _opaque: [u8; 0],
}

/// Anonymous Field IDs
///
/// The anonymous structure behind `jni::FieldId`. See `AnonymousObject` for
/// background information.
#[repr(C)]
pub struct AnonymousFieldId {
    _opaque: [u8; 0],
}

// Basic Types

pub type Boolean = u8;
pub type Byte = i8;
pub type Char = u16;
pub type Short = i16;
pub type Int = i32;
pub type Long = i64;
pub type Float = f32;
pub type Double = f64;

// Objects

pub type Object = Option<NonNull<AnonymousObject>>;
pub type FieldId = Option<NonNull<AnonymousFieldId>>;

// Aliases

pub type Size = Int;

pub type Array = Object;
pub type Class = Object;

// Opaque table entries

pub type Opaque = Option<NonNull<c_void>>;

// Constants

pub const FALSE: Boolean = 0;
pub const TRUE: Boolean = 1;

pub const OK: Int = 0;
pub const ERR: Int = -1;
pub const EDETACHED: Int = -2;
pub const EVERSION: Int = -3;
pub const ENOMEM: Int = -4;
pub const EEXIST: Int = -5;
pub const EINVAL: Int = -6;

pub const VERSION_1_1: Int = 0x00010001;
pub const VERSION_1_2: Int = 0x00010002;
pub const VERSION_1_4: Int = 0x00010004;
pub const VERSION_1_6: Int = 0x00010006;
pub const VERSION_1_8: Int = 0x00010008;
pub const VERSION_9: Int = 0x00090000;
pub const VERSION_10: Int = 0x000a0000;
pub const VERSION_19: Int = 0x00130000;
pub const VERSION_20: Int = 0x00140000;
pub const VERSION_21: Int = 0x00150000;

pub const COMMIT: Int = 1;
pub const ABORT: Int = 2;

// Native Interface

pub type Env = Option<NonNull<NativeInterface>>;
pub type EnvRef = NonNull<Env>;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct NativeInterface {
    pub reserved0: Opaque,
    pub reserved1: Opaque,
    pub reserved2: Opaque,
    pub reserved3: Opaque,

    pub get_version: Option<
        unsafe extern "system" fn (
            env: EnvRef,
        ) -> Int,
    >,

    pub define_class: Opaque,
    pub find_class: Option<
        unsafe extern "system" fn (
            env: EnvRef,
            name: Option<NonNull<u8>>,
        ) -> Class,
    >,

    pub from_reflected_method: Opaque,
    pub from_reflected_field: Opaque,
    pub to_reflected_method: Opaque,

    pub get_superclass: Opaque,
    pub is_assignable_from: Opaque,

    pub to_reflected_field: Opaque,

    pub throw: Opaque,
    pub throw_new: Opaque,
    pub exception_occurred: Option<
        unsafe extern "system" fn (
            env: EnvRef,
        ) -> Object,
    >,
    pub exception_describe: Opaque,

    pub exception_clear: Option<
        unsafe extern "system" fn (
            env: EnvRef,
        ),
    >,

    pub fatal_error: Opaque,

    pub push_local_frame: Opaque,
    pub pop_local_frame: Opaque,

    pub new_global_ref: Option<
        unsafe extern "system" fn (
            env: EnvRef,
            object: Object,
        ) -> Object,
    >,

    pub delete_global_ref: Option<
        unsafe extern "system" fn (
            env: EnvRef,
            object: Object,
        ),
    >,

    pub delete_local_ref: Option<
        unsafe extern "system" fn (
            env: EnvRef,
            object: Object,
        ),
    >,

    pub is_same_object: Opaque,
    pub new_local_ref: Opaque,
    pub ensure_local_capacity: Opaque,

    pub alloc_object: Opaque,
    pub new_object: Opaque,
    pub new_object_v: Opaque,
    pub new_object_a: Opaque,

    pub get_object_class: Opaque,

    pub is_instance_of: Option<
        unsafe extern "system" fn (
            env: EnvRef,
            object: Object,
            class: Class,
        ) -> Boolean,
    >,

    pub get_method_id: Opaque,

    pub call_method: [Opaque; 30],
    pub call_nonvirtual_method: [Opaque; 30],

    pub get_field_id: Option<
        unsafe extern "system" fn (
            env: EnvRef,
            class: Class,
            name: Option<NonNull<u8>>,
            signature: Option<NonNull<u8>>,
        ) -> FieldId,
    >,

    pub get_object_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId) -> Object>,
    pub get_boolean_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId) -> Boolean>,
    pub get_byte_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId) -> Byte>,
    pub get_char_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId) -> Char>,
    pub get_short_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId) -> Short>,
    pub get_int_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId) -> Int>,
    pub get_long_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId) -> Long>,
    pub get_float_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId) -> Float>,
    pub get_double_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId) -> Double>,

    pub set_object_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId, value: Object)>,
    pub set_boolean_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId, value: Boolean)>,
    pub set_byte_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId, value: Byte)>,
    pub set_char_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId, value: Char)>,
    pub set_short_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId, value: Short)>,
    pub set_int_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId, value: Int)>,
    pub set_long_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId, value: Long)>,
    pub set_float_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId, value: Float)>,
    pub set_double_field: Option<unsafe extern "system" fn (env: EnvRef, object: Object, field: FieldId, value: Double)>,

    pub get_static_method_id: Opaque,

    pub call_static_method: [Opaque; 30],

    pub get_static_field_id: Opaque,

    pub get_static_field: [Opaque; 9],
    pub set_static_field: [Opaque; 9],

    pub new_string: Opaque,

    pub get_string_length: Opaque,
    pub get_string_chars: Opaque,
    pub release_string_chars: Opaque,

    pub new_string_utf: Opaque,
    pub get_string_utf_length: Opaque,
    pub get_string_utf_chars: Opaque,
    pub release_string_utf_chars: Opaque,

    pub get_array_length: Option<
        unsafe extern "system" fn (
            env: EnvRef,
            array: Array,
        ) -> Size,
    >,

    pub new_object_array: Opaque,
    pub get_object_array_element: Opaque,
    pub set_object_array_element: Opaque,

    pub new_array: [Opaque; 8],
    pub get_array_elements: [Opaque; 8],
    pub release_array_elements: [Opaque; 8],

    pub get_boolean_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Boolean>>)>,
    pub get_byte_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Byte>>)>,
    pub get_char_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Char>>)>,
    pub get_short_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Short>>)>,
    pub get_int_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Int>>)>,
    pub get_long_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Long>>)>,
    pub get_float_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Float>>)>,
    pub get_double_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Double>>)>,

    pub set_boolean_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Boolean>>)>,
    pub set_byte_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Byte>>)>,
    pub set_char_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Char>>)>,
    pub set_short_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Short>>)>,
    pub set_int_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Int>>)>,
    pub set_long_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Long>>)>,
    pub set_float_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Float>>)>,
    pub set_double_array_region: Option<unsafe extern "system" fn (env: EnvRef, array: Array, start: Size, len: Size, buf: Option<NonNull<Double>>)>,

    pub register_natives: Opaque,
    pub unregister_natives: Opaque,

    pub monitor_enter: Opaque,
    pub monitor_exit: Opaque,

    pub get_java_vm: Opaque,

    pub get_string_region: Opaque,
    pub get_string_utf_region: Opaque,

    pub get_primitive_array_critical: Opaque,
    pub release_primitive_array_critical: Opaque,

    pub get_string_critical: Opaque,
    pub release_string_critical: Opaque,

    pub new_weak_global_ref: Opaque,
    pub delete_weak_global_ref: Opaque,

    pub exception_check: Option<
        unsafe extern "system" fn (
            env: EnvRef,
        ) -> Boolean,
    >,

    pub new_direct_byte_buffer: Opaque,
    pub get_direct_buffer_address: Opaque,
    pub get_direct_buffer_capacity: Opaque,

    pub get_object_ref_type: Opaque,

    pub get_module: Opaque,

    pub is_virtual_thread: Opaque,
}

impl NativeInterface {
    /// A table with all entries unset.
    pub const fn empty() -> Self {
        Self {
            reserved0: None,
            reserved1: None,
            reserved2: None,
            reserved3: None,
            get_version: None,
            define_class: None,
            find_class: None,
            from_reflected_method: None,
            from_reflected_field: None,
            to_reflected_method: None,
            get_superclass: None,
            is_assignable_from: None,
            to_reflected_field: None,
            throw: None,
            throw_new: None,
            exception_occurred: None,
            exception_describe: None,
            exception_clear: None,
            fatal_error: None,
            push_local_frame: None,
            pop_local_frame: None,
            new_global_ref: None,
            delete_global_ref: None,
            delete_local_ref: None,
            is_same_object: None,
            new_local_ref: None,
            ensure_local_capacity: None,
            alloc_object: None,
            new_object: None,
            new_object_v: None,
            new_object_a: None,
            get_object_class: None,
            is_instance_of: None,
            get_method_id: None,
            call_method: [None; 30],
            call_nonvirtual_method: [None; 30],
            get_field_id: None,
            get_object_field: None,
            get_boolean_field: None,
            get_byte_field: None,
            get_char_field: None,
            get_short_field: None,
            get_int_field: None,
            get_long_field: None,
            get_float_field: None,
            get_double_field: None,
            set_object_field: None,
            set_boolean_field: None,
            set_byte_field: None,
            set_char_field: None,
            set_short_field: None,
            set_int_field: None,
            set_long_field: None,
            set_float_field: None,
            set_double_field: None,
            get_static_method_id: None,
            call_static_method: [None; 30],
            get_static_field_id: None,
            get_static_field: [None; 9],
            set_static_field: [None; 9],
            new_string: None,
            get_string_length: None,
            get_string_chars: None,
            release_string_chars: None,
            new_string_utf: None,
            get_string_utf_length: None,
            get_string_utf_chars: None,
            release_string_utf_chars: None,
            get_array_length: None,
            new_object_array: None,
            get_object_array_element: None,
            set_object_array_element: None,
            new_array: [None; 8],
            get_array_elements: [None; 8],
            release_array_elements: [None; 8],
            get_boolean_array_region: None,
            get_byte_array_region: None,
            get_char_array_region: None,
            get_short_array_region: None,
            get_int_array_region: None,
            get_long_array_region: None,
            get_float_array_region: None,
            get_double_array_region: None,
            set_boolean_array_region: None,
            set_byte_array_region: None,
            set_char_array_region: None,
            set_short_array_region: None,
            set_int_array_region: None,
            set_long_array_region: None,
            set_float_array_region: None,
            set_double_array_region: None,
            register_natives: None,
            unregister_natives: None,
            monitor_enter: None,
            monitor_exit: None,
            get_java_vm: None,
            get_string_region: None,
            get_string_utf_region: None,
            get_primitive_array_critical: None,
            release_primitive_array_critical: None,
            get_string_critical: None,
            release_string_critical: None,
            new_weak_global_ref: None,
            delete_weak_global_ref: None,
            exception_check: None,
            new_direct_byte_buffer: None,
            get_direct_buffer_address: None,
            get_direct_buffer_capacity: None,
            get_object_ref_type: None,
            get_module: None,
            is_virtual_thread: None,
        }
    }
}
