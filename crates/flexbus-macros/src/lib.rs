//! Procedural macros for the flexbus event bus.
//!
//! This crate provides:
//!
//! - `#[derive(Event)]` - Implements `Event`, declaring parents with `#[event(parent)]`
//! - `#[derive(Annotation)]` - Implements `Annotation`, with meta-annotations
//! - `#[listener]` - Generates the `Listener` method table of an inherent `impl`
//!
//! Generated code refers to `::flexbus_core`, so the crate using the macros
//! must depend on `flexbus-core` (directly or through `flexbus`).
//!
//! ```rust,ignore
//! use flexbus::prelude::*;
//!
//! #[derive(Debug, Default, Annotation)]
//! #[annotation(meta(Subscribe))]
//! pub struct Audited;
//!
//! #[derive(Clone, Event)]
//! pub struct Transfer {
//!     pub amount: u64,
//! }
//!
//! #[derive(Default)]
//! pub struct Ledger {
//!     total: AtomicU64,
//! }
//!
//! #[listener]
//! impl Ledger {
//!     #[annotate(Audited)]
//!     pub fn on_transfer(&self, transfer: &Transfer) {
//!         self.total.fetch_add(transfer.amount, Ordering::SeqCst);
//!     }
//! }
//! ```

mod annotation;
mod event;
mod listener;

use proc_macro::TokenStream;
use syn::{DeriveInput, GenericParam, Generics, ItemImpl, parse_macro_input};

/// Derives `flexbus_core::Event`.
///
/// # Attributes
///
/// - `#[event(name = "...")]` on the type - Override the event name used in logs
/// - `#[event(parent)]` on a field - Declare the field as an embedded parent
///
/// A handler registered for a parent type receives every child event, viewed
/// as the embedded parent. Several parent fields may be declared; with
/// exactly one, `Deref` and `DerefMut` to it are generated too.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Event)]
/// pub struct Notice {
///     pub text: String,
/// }
///
/// #[derive(Clone, Event)]
/// #[event(name = "poke")]
/// pub struct Poke {
///     #[event(parent)]
///     pub notice: Notice,
///     pub target: u64,
/// }
/// ```
#[proc_macro_derive(Event, attributes(event))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match event::derive_event(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derives `flexbus_core::Annotation`.
///
/// # Attributes
///
/// - `#[annotation(meta(Expr, ...))]` - Annotations declared on this annotation type
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Default, Annotation)]
/// #[annotation(meta(Subscribe))]
/// pub struct Audited;
///
/// #[derive(Debug, Annotation)]
/// #[annotation(meta(Audited, Priority(3)))]
/// pub struct Critical;
/// ```
#[proc_macro_derive(Annotation, attributes(annotation))]
pub fn derive_annotation(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match annotation::derive_annotation(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Implements `flexbus_core::Listener` for the self type of an inherent
/// `impl` block.
///
/// Every `pub fn` taking `&self` is listed. Methods are tagged with:
///
/// - `#[subscribe]` - The default `Subscribe` marker
/// - `#[annotate(Expr, ...)]` - Arbitrary annotation values
///
/// A tagged method with a single `&T` or `T` parameter is invoked with the
/// event viewed as `T` (by-value parameters are cloned). A tagged method of
/// any other arity is still listed, so that registering the listener fails
/// with a descriptive error.
///
/// # Example
///
/// ```rust,ignore
/// #[listener]
/// impl StringHandler {
///     #[subscribe]
///     pub fn on_string(&self, value: &String) {
///         self.seen.lock().push(value.clone());
///     }
///
///     pub fn on_string_unmarked(&self, _: &String) {
///         panic!("never a handler");
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn listener(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = proc_macro2::TokenStream::from(attr);
    let item = parse_macro_input!(item as ItemImpl);

    match listener::expand_listener(attr, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Adds `Send + Sync + 'static` bounds to every type parameter, as required
/// by the `Event` and `Annotation` supertraits.
fn thread_safe_generics(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    let type_params: Vec<_> = generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(ty.ident.clone()),
            _ => None,
        })
        .collect();

    let where_clause = generics.make_where_clause();
    for ident in type_params {
        where_clause
            .predicates
            .push(syn::parse_quote!(#ident: ::std::marker::Send + ::std::marker::Sync + 'static));
    }
    generics
}
