//! Procedural macros for the repolayer project.
//!
//! Provides the `Document` derive, which wires an entity struct into the
//! repository layer: collection name, identifier accessors, and the list of
//! fields to mask in diagnostic logs.

#[allow(unused_extern_crates)]
extern crate self as repolayer_macros;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, Fields, LitStr};

/// Derives `repolayer_core::document::Document` for an entity struct.
///
/// The struct must have a named field `id: Option<bson::Uuid>`; the store
/// assigns its value at creation time. The collection name is mandatory:
///
/// ```ignore
/// #[derive(Document, Serialize, Deserialize, Clone)]
/// #[document(collection = "users")]
/// pub struct User {
///     #[serde(skip_serializing_if = "Option::is_none")]
///     pub id: Option<Uuid>,
///     pub email: String,
///     #[document(redact)]
///     pub password: String,
/// }
/// ```
///
/// Fields marked `#[document(redact)]` (and anything nested under them) are
/// masked whenever a filter or update mentioning them is logged.
#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_document(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_document(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "Document does not support generic structs",
        ));
    }

    let collection = parse_collection_name(&input.attrs)?.ok_or_else(|| {
        syn::Error::new(
            struct_name.span(),
            "Document requires #[document(collection = \"...\")]",
        )
    })?;

    let Data::Struct(data_struct) = input.data else {
        return Err(syn::Error::new(
            struct_name.span(),
            "Document can only be derived for structs",
        ));
    };

    let Fields::Named(named_fields) = data_struct.fields else {
        return Err(syn::Error::new(
            struct_name.span(),
            "Document requires named fields",
        ));
    };

    let mut has_id = false;
    let mut redacted = Vec::<String>::new();

    for field in &named_fields.named {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new(field.span(), "Document requires named fields"))?;

        if ident == "id" {
            has_id = true;
        }

        if parse_redact_marker(&field.attrs)? {
            if ident == "id" {
                return Err(syn::Error::new(
                    field.span(),
                    "the identifier field cannot be redacted",
                ));
            }
            redacted.push(ident.to_string());
        }
    }

    if !has_id {
        return Err(syn::Error::new(
            struct_name.span(),
            "Document requires a field named `id` of type Option<Uuid>",
        ));
    }

    let redacted_literals = redacted.iter().map(|name| name.as_str());

    Ok(quote! {
        impl ::repolayer_core::document::Document for #struct_name {
            fn id(&self) -> Option<::repolayer_core::bson::Uuid> {
                self.id
            }

            fn set_id(&mut self, id: ::repolayer_core::bson::Uuid) {
                self.id = Some(id);
            }

            fn collection_name() -> &'static str {
                #collection
            }

            fn redacted_fields() -> &'static [&'static str] {
                &[#(#redacted_literals),*]
            }
        }
    })
}

fn parse_collection_name(attrs: &[syn::Attribute]) -> syn::Result<Option<String>> {
    let mut collection = None;

    for attr in attrs {
        if !attr.path().is_ident("document") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(meta.error("collection name cannot be empty"));
                }
                collection = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported #[document(...)] option"))
            }
        })?;
    }

    Ok(collection)
}

fn parse_redact_marker(attrs: &[syn::Attribute]) -> syn::Result<bool> {
    let mut redact = false;

    for attr in attrs {
        if !attr.path().is_ident("document") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("redact") {
                redact = true;
                Ok(())
            } else {
                Err(meta.error("unsupported #[document(...)] option on a field"))
            }
        })?;
    }

    Ok(redact)
}
