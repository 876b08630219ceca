//! # Error Handling
//!
//! This module provides the error type shared by all marshalling and globals
//! operations. Every error is local in origin and describes a violated
//! contract between the native struct layout, the mirror class, and the
//! library initialization order. None of them are transient, so callers are
//! expected to abort the current wrapper call and surface the error.

use crate::globals::LibraryId;
use crate::sig::Kind;

/// ## Marshalling Errors
///
/// Enumeration of all errors that can occur when resolving field caches,
/// copying fields between mirror objects and native structs, or accessing
/// per-library globals.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The mirror class could not be found in the host runtime.
    #[error("mirror class `{class}` could not be resolved")]
    ClassNotFound {
        class: &'static str,
    },
    /// A mirror object is not an instance of the mirror class of the struct
    /// it is marshalled with.
    #[error("object is not an instance of mirror class `{class}`")]
    ClassMismatch {
        class: &'static str,
    },
    /// A declared field is absent from the mirror class.
    #[error("field `{name}` with descriptor `{descriptor}` not found in mirror class `{class}`")]
    FieldNotFound {
        class: &'static str,
        name: &'static str,
        descriptor: String,
    },
    /// Globals of a library were accessed before being set.
    #[error("globals of {0} accessed before initialization")]
    Uninitialized(LibraryId),
    /// Globals of a library were set twice.
    #[error("globals of {0} are already initialized")]
    AlreadyInitialized(LibraryId),
    /// Globals of a library were requested with a type other than the one
    /// they were registered with.
    #[error("globals of {0} have a different type than requested")]
    GlobalsType(LibraryId),
    /// An embedded array does not match the length of its mirror array.
    #[error("field `{field}` expects an array of length {expected}, mirror array has length {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A mirror field holds null where an object or array is required.
    #[error("field `{field}` holds null, an object was expected")]
    NullObject {
        field: &'static str,
    },
    /// The host runtime returned a value of an unexpected kind.
    #[error("field `{field}` expected a value of kind `{expected}`, found `{found}`")]
    ValueKind {
        field: &'static str,
        expected: Kind,
        found: Kind,
    },
    /// A native value does not fit into its mirror representation.
    #[error("value {value:#x} of field `{field}` does not fit its mirror representation")]
    Narrowing {
        field: &'static str,
        value: u64,
    },
    /// A type descriptor could not be parsed.
    #[error("invalid type descriptor `{0}`")]
    InvalidDescriptor(String),
    /// The configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The host runtime reported a failure.
    #[error("host runtime failure: {0}")]
    Host(String),
}

/// Result alias used throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sig::Primitive;

    // Verify that error messages name the offending field and values, since
    // they are the only diagnostics a wrapper surfaces to its caller.
    #[test]
    fn error_display() {
        let e = Error::FieldNotFound {
            class: "osi/test/Point",
            name: "z",
            descriptor: "I".into(),
        };
        assert_eq!(
            e.to_string(),
            "field `z` with descriptor `I` not found in mirror class `osi/test/Point`",
        );

        let e = Error::ClassMismatch { class: "osi/test/Point" };
        assert_eq!(e.to_string(), "object is not an instance of mirror class `osi/test/Point`");

        let e = Error::Uninitialized(LibraryId::new(3));
        assert_eq!(e.to_string(), "globals of library#3 accessed before initialization");

        let e = Error::LengthMismatch { field: "data", expected: 8, actual: 6 };
        assert_eq!(
            e.to_string(),
            "field `data` expects an array of length 8, mirror array has length 6",
        );

        let e = Error::ValueKind {
            field: "x",
            expected: Kind::Primitive(Primitive::Int),
            found: Kind::Object,
        };
        assert_eq!(e.to_string(), "field `x` expected a value of kind `int`, found `object`");

        let e = Error::Narrowing { field: "data", value: 0x1_0000_0000 };
        assert_eq!(
            e.to_string(),
            "value 0x100000000 of field `data` does not fit its mirror representation",
        );
    }
}
