//! Foreign Function Interfaces
//! ===========================
//!
//! This module provides the definitions of the host runtime interfaces the
//! marshaller drives, as native Rust data-types. The definitions are
//! transposed into Rust following strict rules and guidelines, thus yielding
//! predictable type names and definitions. No implementation of the
//! respective interfaces is provided here. See [`crate::host`] for the
//! implementations built on top.
//!
//! Unlike a general-purpose import, the definitions are provided in the
//! format native to the compilation target only. They describe function
//! tables handed to native code by a runtime in the same process, so there
//! is no need for foreign architectures.
//!
//! Transpose Rules
//! ---------------
//!
//! While this module attempts to be a direct mapping to the respective
//! specifications, slight adjustments are usually necessary to account for
//! the peculiarities of Rust:
//!
//!  * All names follow the standard Rust naming scheme, using `CamelCase` for
//!    types, `UPPER_CASE` for constants, and `snake_case` for everything else.
//!
//!  * Prefixes are stripped if the Rust module or type-system provides a
//!    suitable prefix.
//!
//!  * C-enums are always provided as raw integer type, rather than Rust enum
//!    to allow arbitrary discriminants to be used.
//!
//!  * Pointers are always represented as `NonNull` or `Option<NonNull>` and
//!    thus strip any `const` annotations. This is on purpose, since the
//!    classic C-const annotations cannot be transposed to Rust in a sensible
//!    way.
//!
//!  * Function-table entries that are not used by this crate are provided as
//!    opaque pointers, grouped into arrays where the specification has long
//!    runs of them. Only their position in the table is guaranteed.
//!
//! Requirements
//! ------------
//!
//! The following assumptions are made for the target platform, and verified
//! in the test-suite:
//!
//!  * The target platform uses either big-endian or little-endian encoding
//!    for multi-byte integers and addresses.
//!
//!  * The target uses either 32-bit or 64-bit wide pointers with native
//!    alignment. The `usize` type must match this size.
//!
//!  * Function pointers must be equally sized to data pointers.
//!
//!  * The c-int type is a 32-bit signed integer.

#[cfg(not(any(
    target_endian = "big",
    target_endian = "little",
)))]
compile_error!("Target platform has an unsupported endianness.");

#[cfg(not(any(
    target_pointer_width = "32",
    target_pointer_width = "64",
)))]
compile_error!("Target platform has an unsupported pointer-width.");

pub mod jni;
