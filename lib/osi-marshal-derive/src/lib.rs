//! # Mirror-Object Marshalling Derive Macro
//!
//! This proc-macro crate provides the `Marshal` derive of the `osi-marshal`
//! crate. It turns a struct definition into the field schema the marshaller
//! uses to copy the struct in and out of its mirror object, and makes the
//! struct usable as a nested field of other marshalled structs.

use ::proc_macro;
use ::syn;

mod marshal;

/// ## Derive Marshal
///
/// Implement `osi_marshal::Marshal` and `osi_marshal::NativeField` for a
/// struct with named fields. Every field is marshalled, in declaration order,
/// and must implement `osi_marshal::NativeField` itself.
///
/// ### Attributes
///
/// - `#[marshal(class = "pkg/Name")]` on the struct selects the mirror
///   class. By default, the struct name is used, which only fits mirror
///   classes in the default package.
/// - `#[marshal(rename = "name")]` on a field selects the mirror field name.
///   By default, the Rust field name is used, with any raw-identifier prefix
///   stripped.
///
/// ### Limitations
///
/// - Only structs with named fields are supported.
/// - Generic structs are not supported, since the field schema must be a
///   single static description of the mirror class.
#[proc_macro_derive(Marshal, attributes(marshal))]
pub fn derive_marshal(item: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let syn_item = syn::parse_macro_input!(item as syn::DeriveInput);

    proc_macro::TokenStream::from(marshal::derive(syn_item))
}
