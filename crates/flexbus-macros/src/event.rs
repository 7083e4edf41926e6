//! Event derive macro implementation, **parent-in-child** design.
//!
//! # Overview
//!
//! `#[derive(Event)]` generates:
//!
//! 1. `impl Event` with `supertypes` listing every parent field
//! 2. `impl Deref[Mut]` when exactly one parent field exists
//!
//! # Type-level attributes `#[event(...)]`
//!
//! | Key | Example | Description |
//! |-----|---------|-------------|
//! | `name` | `"order.created"` | Event name used in logs (default: the type name) |
//!
//! # Field-level attributes `#[event(...)]`
//!
//! | Key | Description |
//! |-----|-------------|
//! | `parent` | Marks this field as an embedded parent event |

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Index, Member, Type, spanned::Spanned};

// ============================================================================
// Attribute parsing
// ============================================================================

fn parse_type_attrs(attrs: &[Attribute]) -> syn::Result<Option<syn::LitStr>> {
    let mut name = None;

    for attr in attrs {
        if !attr.path().is_ident("event") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<syn::LitStr>()?);
                Ok(())
            } else {
                Err(meta.error("unknown event attribute, expected `name = \"...\"`"))
            }
        })?;
    }

    Ok(name)
}

fn is_parent(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut parent = false;

    for attr in attrs {
        if !attr.path().is_ident("event") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("parent") {
                parent = true;
                Ok(())
            } else {
                Err(meta.error("unknown field attribute, expected `parent`"))
            }
        })?;
    }

    Ok(parent)
}

fn parent_fields(fields: &Fields) -> syn::Result<Vec<(Member, Type)>> {
    let mut parents = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        if !is_parent(&field.attrs)? {
            continue;
        }
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index {
                index: index as u32,
                span: field.span(),
            }),
        };
        parents.push((member, field.ty.clone()));
    }

    Ok(parents)
}

// ============================================================================
// Code generation
// ============================================================================

pub fn derive_event(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let event_name = parse_type_attrs(&input.attrs)?;

    let parents = match &input.data {
        Data::Struct(data) => parent_fields(&data.fields)?,
        Data::Enum(data) => {
            for variant in &data.variants {
                if !parent_fields(&variant.fields)?.is_empty() {
                    return Err(syn::Error::new(
                        variant.span(),
                        "#[event(parent)] is only supported on struct fields",
                    ));
                }
            }
            Vec::new()
        }
        Data::Union(_) => {
            return Err(syn::Error::new(
                input.span(),
                "Event cannot be derived for unions",
            ));
        }
    };

    let generics = crate::thread_safe_generics(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    // ── supertypes ──
    let supertypes_impl = if parents.is_empty() {
        quote! {}
    } else {
        let members = parents.iter().map(|(member, _)| member);
        quote! {
            fn supertypes(&self) -> ::std::vec::Vec<&(dyn ::flexbus_core::Event + 'static)> {
                ::std::vec![#(&self.#members as &(dyn ::flexbus_core::Event + 'static)),*]
            }
        }
    };

    // ── event_name ──
    let event_name_impl = match event_name {
        Some(lit) => quote! {
            fn event_name(&self) -> &'static str {
                #lit
            }
        },
        None => quote! {},
    };

    // ── Deref / DerefMut ──
    let deref_impls = match parents.as_slice() {
        [(member, parent_ty)] => quote! {
            impl #impl_generics ::std::ops::Deref for #name #ty_generics #where_clause {
                type Target = #parent_ty;
                #[inline]
                fn deref(&self) -> &Self::Target {
                    &self.#member
                }
            }

            impl #impl_generics ::std::ops::DerefMut for #name #ty_generics #where_clause {
                #[inline]
                fn deref_mut(&mut self) -> &mut Self::Target {
                    &mut self.#member
                }
            }
        },
        _ => quote! {},
    };

    Ok(quote! {
        impl #impl_generics ::flexbus_core::Event for #name #ty_generics #where_clause {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            #supertypes_impl
            #event_name_impl
        }

        #deref_impls
    })
}
