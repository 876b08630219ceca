//! # Marshal Derive Implementation
//!
//! This implements the `Marshal` derive. A [`Schema`] is parsed from the
//! target struct, validated, and then expanded into the trait
//! implementations.
//!
//! See [`derive`] for the entry-point of the derive handler.

use ::proc_macro2;
use ::quote;
use ::syn::{self, ext::IdentExt};

/// ## Schema Field
///
/// A single marshalled field: its Rust identifier, its mirror name, and its
/// native type.
pub struct SchemaField {
    pub ident: syn::Ident,
    pub name: String,
    pub ty: syn::Type,
}

/// ## Marshal Schema
///
/// The parsed description of a marshalled struct.
pub struct Schema {
    pub ident: syn::Ident,
    pub class: syn::LitStr,
    pub fields: Vec<SchemaField>,
}

// Parse the `marshal` attributes in `attrs`, invoking `f` for every key.
fn parse_attrs<F>(attrs: &[syn::Attribute], mut f: F) -> syn::Result<()>
where
    F: FnMut(&syn::meta::ParseNestedMeta) -> syn::Result<()>,
{
    for attr in attrs {
        if attr.path().is_ident("marshal") {
            attr.parse_nested_meta(|meta| f(&meta))?;
        }
    }
    Ok(())
}

impl SchemaField {
    fn parse(field: &syn::Field) -> syn::Result<Self> {
        // Only named fields are ever passed in.
        let ident = field.ident.clone().ok_or_else(|| {
            syn::Error::new_spanned(field, "marshalled fields must be named")
        })?;
        let mut name = None;

        parse_attrs(&field.attrs, |meta| {
            if meta.path.is_ident("rename") {
                let v: syn::LitStr = meta.value()?.parse()?;
                if v.value().is_empty() {
                    return Err(syn::Error::new_spanned(v, "empty mirror field name"));
                }
                name = Some(v.value());
                Ok(())
            } else {
                Err(meta.error("unsupported field attribute"))
            }
        })?;

        Ok(Self {
            name: name.unwrap_or_else(|| ident.unraw().to_string()),
            ident: ident,
            ty: field.ty.clone(),
        })
    }
}

impl Schema {
    /// ## Parse Schema
    ///
    /// Parse the schema of a derive target. Anything but a non-generic struct
    /// with named fields is rejected, as are duplicate mirror field names.
    /// The mirror class defaults to the struct name.
    pub fn parse(input: &syn::DeriveInput) -> syn::Result<Self> {
        if !input.generics.params.is_empty() || input.generics.where_clause.is_some() {
            return Err(syn::Error::new_spanned(
                &input.generics,
                "generic structs cannot be marshalled",
            ));
        }

        let named = match &input.data {
            syn::Data::Struct(syn::DataStruct { fields: syn::Fields::Named(v), .. }) => v,
            syn::Data::Struct(_) => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "only structs with named fields can be marshalled",
                ));
            },
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "only structs can be marshalled",
                ));
            },
        };

        let mut class = None;
        parse_attrs(&input.attrs, |meta| {
            if meta.path.is_ident("class") {
                let v: syn::LitStr = meta.value()?.parse()?;
                if v.value().is_empty() || v.value().contains(&['.', ';', '['][..]) {
                    return Err(syn::Error::new_spanned(v, "invalid mirror class path"));
                }
                class = Some(v);
                Ok(())
            } else {
                Err(meta.error("unsupported struct attribute"))
            }
        })?;

        let class = class.unwrap_or_else(|| {
            syn::LitStr::new(&input.ident.unraw().to_string(), input.ident.span())
        });

        let mut fields: Vec<SchemaField> = Vec::with_capacity(named.named.len());
        for v in &named.named {
            let field = SchemaField::parse(v)?;
            if fields.iter().any(|f| f.name == field.name) {
                return Err(syn::Error::new_spanned(
                    v,
                    format!("duplicate mirror field `{}`", field.name),
                ));
            }
            fields.push(field);
        }

        Ok(Self {
            ident: input.ident.clone(),
            class: class,
            fields: fields,
        })
    }

    /// ## Expand Schema
    ///
    /// Generate the `Marshal` and `NativeField` implementations. Fields are
    /// accessed through the resolved field list by declaration index.
    pub fn expand(&self) -> proc_macro2::TokenStream {
        let q_ident = &self.ident;
        let q_class = &self.class;
        let q_names = self.fields.iter().map(|v| &v.name);
        let q_idents = self.fields.iter().map(|v| &v.ident).collect::<Vec<_>>();
        let q_types = self.fields.iter().map(|v| &v.ty).collect::<Vec<_>>();
        let q_indices = (0..self.fields.len())
            .map(proc_macro2::Literal::usize_unsuffixed)
            .collect::<Vec<_>>();

        quote::quote! {
            impl ::osi_marshal::Marshal for #q_ident {
                const CLASS: &'static str = #q_class;
                const FIELDS: &'static [::osi_marshal::FieldDesc] = &[
                    #(
                        ::osi_marshal::FieldDesc::new(
                            #q_names,
                            <#q_types as ::osi_marshal::NativeField>::SIGNATURE,
                        ),
                    )*
                ];

                #[allow(unused_variables)]
                fn read_mirror<H: ::osi_marshal::Host>(
                    env: &::osi_marshal::Env<'_, H>,
                    object: <H as ::osi_marshal::Host>::Object,
                    fields: &[::osi_marshal::Field<H>],
                    dst: &mut Self,
                ) -> ::osi_marshal::Result<()> {
                    #(
                        <#q_types as ::osi_marshal::NativeField>::get(
                            env,
                            object,
                            &fields[#q_indices],
                            &mut dst.#q_idents,
                        )?;
                    )*
                    ::core::result::Result::Ok(())
                }

                #[allow(unused_variables)]
                fn write_mirror<H: ::osi_marshal::Host>(
                    &self,
                    env: &::osi_marshal::Env<'_, H>,
                    object: <H as ::osi_marshal::Host>::Object,
                    fields: &[::osi_marshal::Field<H>],
                ) -> ::osi_marshal::Result<()> {
                    #(
                        <#q_types as ::osi_marshal::NativeField>::set(
                            &self.#q_idents,
                            env,
                            object,
                            &fields[#q_indices],
                        )?;
                    )*
                    ::core::result::Result::Ok(())
                }

                #[allow(unused_variables)]
                fn check_mirror<H: ::osi_marshal::Host>(
                    &self,
                    env: &::osi_marshal::Env<'_, H>,
                    object: <H as ::osi_marshal::Host>::Object,
                    fields: &[::osi_marshal::Field<H>],
                ) -> ::osi_marshal::Result<()> {
                    #(
                        <#q_types as ::osi_marshal::NativeField>::check(
                            &self.#q_idents,
                            env,
                            object,
                            &fields[#q_indices],
                        )?;
                    )*
                    ::core::result::Result::Ok(())
                }
            }

            impl ::osi_marshal::NativeField for #q_ident {
                const SIGNATURE: ::osi_marshal::Signature = ::osi_marshal::Signature::Object(
                    <Self as ::osi_marshal::Marshal>::CLASS,
                );

                fn get<H: ::osi_marshal::Host>(
                    env: &::osi_marshal::Env<'_, H>,
                    object: <H as ::osi_marshal::Host>::Object,
                    field: &::osi_marshal::Field<H>,
                    dst: &mut Self,
                ) -> ::osi_marshal::Result<()> {
                    ::osi_marshal::field::get_nested(env, object, field, dst)
                }

                fn set<H: ::osi_marshal::Host>(
                    &self,
                    env: &::osi_marshal::Env<'_, H>,
                    object: <H as ::osi_marshal::Host>::Object,
                    field: &::osi_marshal::Field<H>,
                ) -> ::osi_marshal::Result<()> {
                    ::osi_marshal::field::set_nested(env, object, field, self)
                }

                fn check<H: ::osi_marshal::Host>(
                    &self,
                    env: &::osi_marshal::Env<'_, H>,
                    object: <H as ::osi_marshal::Host>::Object,
                    field: &::osi_marshal::Field<H>,
                ) -> ::osi_marshal::Result<()> {
                    ::osi_marshal::field::check_nested(env, object, field, self)
                }
            }
        }
    }
}

/// ## Marshal Derive
///
/// This is the implementation of the `Marshal` derive. Invalid targets
/// expand to a compile error.
///
/// This function is untangled from `proc_macro` types and solely uses the
/// types from `proc_macro2`, and can thus be used in unit tests and other
/// non-proc code.
pub fn derive(input: syn::DeriveInput) -> proc_macro2::TokenStream {
    match Schema::parse(&input) {
        Ok(v) => v.expand(),
        Err(e) => e.to_compile_error(),
    }
}
