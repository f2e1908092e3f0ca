// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, LitStr};

/// Per-field information collected from the struct definition
struct FieldInfo {
    ident: Ident,
    ty: syn::Type,
    vis: syn::Visibility,
    /// Name reported by `Field::name()` and the layout table
    name: String,
    /// Associated constant holding the `Field` identity
    const_ident: Ident,
}

/// `#[derive(Record)]` macro: generates `hotconf::Record` + one `Field`
/// constant per field
///
/// For each field `foo: T` the struct gains
/// `const FOO: hotconf::Field<Self, T>` with the field's visibility. The
/// record layout is computed by the compiler (`offset_of!`/`size_of`), so any
/// `repr` other than `packed` is accepted.
///
/// Field attributes:
/// - `#[record(rename = "name")]`: name reported by `Field::name()`
///
/// # Errors
///
/// Emits a compile error for enums, unions, tuple structs, generic structs
/// and `#[repr(packed)]` structs.
///
/// Example:
/// ```ignore
/// use hotconf::Record;
///
/// #[derive(Clone, Copy, PartialEq, Record)]
/// struct Settings {
///     a: u32,
///     b: i32,
///     c: bool,
/// }
///
/// store.write_field(Settings::B, -5);
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let type_name = name.unraw().to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }
    if is_packed(&input.attrs)? {
        return Err(syn::Error::new_spanned(
            name,
            "Record cannot be derived for #[repr(packed)] structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            Fields::Unit => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Record needs named fields; unit structs are not supported",
                ))
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Only named fields are supported",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(input, "Only structs are supported")),
    };

    let mut infos = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        let bare = ident.unraw().to_string();
        let name = field_rename(&field.attrs)?.unwrap_or_else(|| bare.clone());
        infos.push(FieldInfo {
            ident: ident.clone(),
            ty: field.ty.clone(),
            vis: field.vis.clone(),
            name,
            const_ident: Ident::new(&to_const_name(&bare), ident.span()),
        });
    }

    let field_layouts = infos.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let field_name = &f.name;
        quote! {
            ::hotconf::FieldLayout {
                name: #field_name,
                offset: ::core::mem::offset_of!(#name, #ident),
                size: ::core::mem::size_of::<#ty>(),
            }
        }
    });

    let field_consts = infos.iter().map(|f| {
        let ident = &f.ident;
        let ty = &f.ty;
        let vis = &f.vis;
        let field_name = &f.name;
        let const_ident = &f.const_ident;
        let doc = format!("Field identity of `{}.{}`.", type_name, ident.unraw());
        quote! {
            #[doc = #doc]
            #vis const #const_ident: ::hotconf::Field<#name, #ty> = {
                fn get(record: &#name) -> &#ty {
                    &record.#ident
                }
                fn get_mut(record: &mut #name) -> &mut #ty {
                    &mut record.#ident
                }
                ::hotconf::Field::new(
                    #field_name,
                    ::core::mem::offset_of!(#name, #ident),
                    get,
                    get_mut,
                )
            };
        }
    });

    Ok(quote! {
        impl ::hotconf::Record for #name {
            fn layout() -> &'static ::hotconf::RecordLayout {
                static LAYOUT: ::hotconf::RecordLayout = ::hotconf::RecordLayout {
                    type_name: #type_name,
                    size: ::core::mem::size_of::<#name>(),
                    fields: &[#(#field_layouts),*],
                };
                &LAYOUT
            }
        }

        #[allow(dead_code)]
        impl #name {
            #(#field_consts)*
        }
    })
}

/// Parse `#[record(rename = "...")]` on a field.
fn field_rename(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut rename = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                if lit.value().is_empty() {
                    return Err(meta.error("rename must not be empty"));
                }
                rename = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported record attribute, expected `rename`"))
            }
        })?;
    }
    Ok(rename)
}

/// Returns true if the struct carries `#[repr(packed)]` or `#[repr(packed(N))]`.
fn is_packed(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut packed = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("repr")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("packed") {
                packed = true;
            }
            // Skip `align(N)` / `packed(N)` arguments
            if meta.input.peek(syn::token::Paren) {
                let content;
                syn::parenthesized!(content in meta.input);
                let _: proc_macro2::TokenStream = content.parse()?;
            }
            Ok(())
        })?;
    }
    Ok(packed)
}

/// `snake_case` field name to `SCREAMING_SNAKE_CASE` constant name.
///
/// Already-uppercase names are kept.
fn to_const_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 4);
    let mut prev_lower = false;
    for ch in field.chars() {
        if ch.is_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        out.extend(ch.to_uppercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_name_snake_case() {
        assert_eq!(to_const_name("a"), "A");
        assert_eq!(to_const_name("max_conn"), "MAX_CONN");
        assert_eq!(to_const_name("gain2"), "GAIN2");
    }

    #[test]
    fn test_const_name_camel_case() {
        assert_eq!(to_const_name("maxConn"), "MAX_CONN");
        assert_eq!(to_const_name("URL"), "URL");
    }

    #[test]
    fn test_const_name_leading_underscore() {
        assert_eq!(to_const_name("_reserved"), "_RESERVED");
    }

    #[test]
    fn test_rejects_enum() {
        let input: DeriveInput = syn::parse_quote! {
            enum Mode { A, B }
        };
        let err = expand(&input).unwrap_err();
        assert!(err.to_string().contains("Only structs"));
    }

    #[test]
    fn test_rejects_tuple_struct() {
        let input: DeriveInput = syn::parse_quote! {
            struct Pair(u32, u32);
        };
        assert!(expand(&input).is_err());
    }

    #[test]
    fn test_rejects_generics() {
        let input: DeriveInput = syn::parse_quote! {
            struct Wrapper<T> { value: T }
        };
        let err = expand(&input).unwrap_err();
        assert!(err.to_string().contains("generic"));
    }

    #[test]
    fn test_rejects_packed() {
        let input: DeriveInput = syn::parse_quote! {
            #[repr(C, packed)]
            struct Wire { a: u8, b: u32 }
        };
        let err = expand(&input).unwrap_err();
        assert!(err.to_string().contains("packed"));
    }

    #[test]
    fn test_accepts_repr_c_and_align() {
        let input: DeriveInput = syn::parse_quote! {
            #[repr(C, align(64))]
            struct Hot { a: u64 }
        };
        assert!(expand(&input).is_ok());
    }

    #[test]
    fn test_rename_attribute() {
        let input: DeriveInput = syn::parse_quote! {
            struct Limits {
                #[record(rename = "timeout")]
                timeout_ms: u64,
            }
        };
        let tokens = expand(&input).expect("expand").to_string();
        assert!(tokens.contains("\"timeout\""));
        assert!(tokens.contains("TIMEOUT_MS"));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Limits {
                #[record(skip)]
                timeout_ms: u64,
            }
        };
        let err = expand(&input).unwrap_err();
        assert!(err.to_string().contains("unsupported record attribute"));
    }
}
