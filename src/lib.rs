//! # Mirror-Object Marshalling
//!
//! This crate copies data between native structs and their mirror objects
//! in a managed host runtime. A mirror object has one field per native
//! field. Native code that receives a mirror object copies it into the
//! native struct, operates on it, and copies the result back.
//!
//! Marshalled structs derive [`Marshal`], which makes the Rust struct the
//! single description of both layouts:
//!
//! ```rust,ignore
//! #[derive(Default, osi_marshal::Marshal)]
//! #[marshal(class = "org/example/Point")]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//! ```
//!
//! Field handles of a mirror class are looked up once and cached in the
//! [`globals::LibraryGlobals`] of the library doing the marshalling. Several
//! libraries can be resident in one process, each with their own globals
//! slot in the [`globals::GlobalTable`].

extern crate self as osi_marshal;

pub mod cache;
pub mod config;
pub mod env;
pub mod error;
pub mod ffi;
pub mod field;
pub mod globals;
pub mod host;
pub mod pin;
pub mod sig;

pub use cache::{FieldCache, FieldDesc, Marshal};
pub use config::{Config, PointerRepr};
pub use env::Env;
pub use error::{Error, Result};
pub use field::{Element, Field, NativeField};
pub use globals::{GlobalTable, LibraryGlobals, LibraryId, SlotState};
pub use host::{Host, Value};
pub use pin::{Pinned, Release};
pub use sig::{Descriptor, Kind, Primitive, Signature};

/// Derive [`Marshal`] and [`NativeField`] for a struct with named fields.
///
/// The mirror class is set via `#[marshal(class = "pkg/Name")]`. A field can
/// map to a mirror field of another name via `#[marshal(rename = "name")]`.
pub use osi_marshal_derive::Marshal;
