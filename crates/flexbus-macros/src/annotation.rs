//! Annotation derive macro implementation.
//!
//! `#[derive(Annotation)]` implements `Annotation` for any `'static` type.
//! Meta-annotations are listed as expressions in
//! `#[annotation(meta(...))]`; each is evaluated whenever the resolver asks
//! for the type's declared annotations.

use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Attribute, DeriveInput, Expr, Token};

fn parse_meta(attrs: &[Attribute]) -> syn::Result<Vec<Expr>> {
    let mut declared = Vec::new();

    for attr in attrs {
        if !attr.path().is_ident("annotation") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("meta") {
                let content;
                syn::parenthesized!(content in meta.input);
                let exprs = Punctuated::<Expr, Token![,]>::parse_terminated(&content)?;
                declared.extend(exprs);
                Ok(())
            } else {
                Err(meta.error("unknown annotation attribute, expected `meta(...)`"))
            }
        })?;
    }

    Ok(declared)
}

pub fn derive_annotation(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let declared = parse_meta(&input.attrs)?;

    let generics = crate::thread_safe_generics(&input.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let declared_impl = if declared.is_empty() {
        quote! {}
    } else {
        quote! {
            fn declared_annotations(&self) -> ::std::vec::Vec<::flexbus_core::AnnotationRef> {
                ::std::vec![
                    #(::std::sync::Arc::new(#declared) as ::flexbus_core::AnnotationRef),*
                ]
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::flexbus_core::Annotation for #name #ty_generics #where_clause {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::sync::Arc<dyn ::std::any::Any + ::std::marker::Send + ::std::marker::Sync> {
                self
            }

            #declared_impl
        }
    })
}
