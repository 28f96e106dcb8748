//! Procedural macro for `fieldseal`.
//!
//! `#[derive(SensitiveFields)]` generates the sensitive-field accessor list
//! for a struct at compile time, replacing any runtime field scanning.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{ext::IdentExt, parse_macro_input, Attribute, Data, DeriveInput, Fields, LitStr};

/// Derives `fieldseal::SensitiveFields` for a struct with named fields.
///
/// # Attributes
///
/// - `#[encrypted]` on a field: the field is stored encrypted. The field type
///   must be `String` or `Option<String>`.
#[proc_macro_derive(SensitiveFields, attributes(encrypted))]
pub fn derive_sensitive_fields(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input).unwrap_or_else(|e| e.to_compile_error()).into()
}

/// Checks if a field carries the bare `#[encrypted]` marker.
fn is_encrypted(attrs: &[Attribute]) -> syn::Result<bool> {
    match attrs.iter().find(|a| a.path().is_ident("encrypted")) {
        Some(attr) => {
            attr.meta.require_path_only()?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "SensitiveFields requires named fields.",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "SensitiveFields can only be derived for structs.",
            ));
        }
    };

    let mut descriptors = Vec::new();
    for field in fields {
        if !is_encrypted(&field.attrs)? {
            continue;
        }
        let Some(ident) = &field.ident else {
            continue;
        };
        let name = LitStr::new(&ident.unraw().to_string(), ident.span());
        descriptors.push(quote! {
            ::fieldseal::SensitiveField::<Self>::new(
                #name,
                |record: &mut Self| ::fieldseal::TaggedSlot::slot(&mut record.#ident),
            )
        });
    }

    Ok(quote! {
        impl #impl_generics ::fieldseal::SensitiveFields for #struct_name #ty_generics #where_clause {
            fn sensitive_fields() -> ::std::vec::Vec<::fieldseal::SensitiveField<Self>> {
                ::std::vec![ #( #descriptors ),* ]
            }
        }
    })
}
