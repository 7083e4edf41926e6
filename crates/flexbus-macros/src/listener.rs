//! `#[listener]` attribute implementation.
//!
//! # Overview
//!
//! The attribute is placed on an inherent `impl` block and generates
//! `impl Listener` for its self type. `methods()` lists one
//! `MethodDescriptor` per `pub fn` taking `&self`:
//!
//! | Method | Descriptor |
//! |--------|------------|
//! | tagged, one `&T` / `T` parameter | `MethodDescriptor::unary`, invokes the method |
//! | tagged, any other arity | `MethodDescriptor::opaque`, rejected at registration |
//! | untagged | `MethodDescriptor::opaque`, never invoked |
//!
//! # Method attributes
//!
//! | Attribute | Annotations |
//! |-----------|-------------|
//! | `#[subscribe]` | `::flexbus_core::Subscribe` |
//! | `#[annotate(Expr, ...)]` | each expression, in order |
//!
//! Both attributes are removed from the emitted `impl` block.

use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Expr, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, Token, Type, Visibility,
    spanned::Spanned,
};

// ============================================================================
// Method analysis
// ============================================================================

/// How a handler parameter is passed.
enum Param {
    /// `&T`: the view is passed through.
    Borrowed(Type),
    /// `T`: the view is cloned.
    Owned(Type),
}

/// Removes `#[subscribe]` / `#[annotate(...)]` from `attrs` and returns the
/// annotation expressions they declared.
fn take_annotations(attrs: &mut Vec<Attribute>) -> syn::Result<Vec<Expr>> {
    let mut annotations = Vec::new();
    let mut kept = Vec::with_capacity(attrs.len());

    for attr in attrs.drain(..) {
        if attr.path().is_ident("subscribe") {
            attr.meta.require_path_only()?;
            annotations.push(syn::parse_quote!(::flexbus_core::Subscribe));
        } else if attr.path().is_ident("annotate") {
            let exprs = attr.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated)?;
            if exprs.is_empty() {
                return Err(syn::Error::new(
                    attr.span(),
                    "#[annotate] requires at least one annotation",
                ));
            }
            annotations.extend(exprs);
        } else {
            kept.push(attr);
        }
    }

    *attrs = kept;
    Ok(annotations)
}

fn has_ref_self_receiver(method: &ImplItemFn) -> bool {
    match method.sig.receiver() {
        Some(receiver) => receiver.reference.is_some() && receiver.mutability.is_none(),
        None => false,
    }
}

fn typed_params(method: &ImplItemFn) -> Vec<&Type> {
    method
        .sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat) => Some(&*pat.ty),
            FnArg::Receiver(_) => None,
        })
        .collect()
}

fn classify_param(ty: &Type) -> syn::Result<Param> {
    match ty {
        Type::Reference(reference) if reference.mutability.is_some() => Err(syn::Error::new(
            ty.span(),
            "handler parameters cannot be `&mut`; events are shared between handlers",
        )),
        // `&'static T` is an event type of its own, such as `&'static str`.
        Type::Reference(reference)
            if reference
                .lifetime
                .as_ref()
                .is_some_and(|lifetime| lifetime.ident == "static") =>
        {
            Ok(Param::Owned(ty.clone()))
        }
        Type::Reference(reference) => Ok(Param::Borrowed((*reference.elem).clone())),
        Type::ImplTrait(_) => Err(syn::Error::new(
            ty.span(),
            "handler parameters must name a concrete event type",
        )),
        _ => Ok(Param::Owned(ty.clone())),
    }
}

// ============================================================================
// Code generation
// ============================================================================

fn describe_method(method: &ImplItemFn, annotations: &[Expr]) -> syn::Result<TokenStream> {
    let ident = &method.sig.ident;
    let name = LitStr::new(&ident.to_string(), ident.span());
    let params = typed_params(method);

    if annotations.is_empty() {
        let arity = params.len();
        return Ok(quote! {
            ::flexbus_core::MethodDescriptor::opaque(#name, #arity)
        });
    }

    if !method.sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            method.sig.generics.span(),
            "handler methods cannot be generic",
        ));
    }

    let descriptor = match params.as_slice() {
        [ty] => match classify_param(ty)? {
            Param::Borrowed(ty) => quote! {
                ::flexbus_core::MethodDescriptor::unary(
                    #name,
                    |listener: &Self, event: &#ty| Self::#ident(listener, event),
                )
            },
            Param::Owned(ty) => quote! {
                ::flexbus_core::MethodDescriptor::unary(
                    #name,
                    |listener: &Self, event: &#ty| {
                        Self::#ident(listener, ::std::clone::Clone::clone(event))
                    },
                )
            },
        },
        params => {
            let arity = params.len();
            quote! { ::flexbus_core::MethodDescriptor::opaque(#name, #arity) }
        }
    };

    Ok(quote! {
        #descriptor.annotated_with(::std::vec![
            #(::std::sync::Arc::new(#annotations) as ::flexbus_core::AnnotationRef),*
        ])
    })
}

pub fn expand_listener(attr: TokenStream, mut item: ItemImpl) -> syn::Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new(
            attr.span(),
            "#[listener] does not take arguments",
        ));
    }
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new(
            path.span(),
            "#[listener] must be placed on an inherent impl block",
        ));
    }

    let mut descriptors = Vec::new();

    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };

        let annotations = take_annotations(&mut method.attrs)?;
        let listed = matches!(method.vis, Visibility::Public(_)) && has_ref_self_receiver(method);

        if !listed {
            if !annotations.is_empty() {
                return Err(syn::Error::new(
                    method.sig.ident.span(),
                    "handler methods must be `pub fn` taking `&self`",
                ));
            }
            continue;
        }

        descriptors.push(describe_method(method, &annotations)?);
    }

    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();
    let listener_impl = quote! {
        impl #impl_generics ::flexbus_core::Listener for #self_ty #where_clause {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn methods(&self) -> ::std::vec::Vec<::flexbus_core::MethodDescriptor> {
                ::std::vec![#(#descriptors),*]
            }
        }
    };

    Ok(quote! {
        #item
        #listener_impl
    })
}
