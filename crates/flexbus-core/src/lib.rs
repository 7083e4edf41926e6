//! # Flexbus Core
//!
//! The handler-discovery and dispatch engine of the flexbus event bus.
//!
//! Listener objects expose their methods through the [`Listener`]
//! capability. Methods tagged with a marker annotation (by default
//! [`Subscribe`], directly or through meta-annotations) become handlers for
//! the type of their single parameter. Posted events reach every handler
//! registered for the event's own type or for one of its declared ancestors.
//!
//! ## Components
//!
//! - **Annotations**: markers and the meta-annotation resolver ([`annotation`])
//! - **Discovery**: finds the handlers of a listener ([`HandlerFinder`])
//! - **Handlers**: bound, failure-isolated methods ([`HandlerWrapper`])
//! - **Registry**: event type to handler set ([`SubscriptionRegistry`])
//! - **Dispatcher**: routing, dead events ([`Dispatcher`], [`DeadEvent`])
//! - **Failures**: pluggable failure sink ([`ExceptionHandler`])
//!
//! ## Data Flow
//!
//! ```text
//!  register ──▶ HandlerFinder ──▶ SubscriptionRegistry
//!                                          │
//!  post ──────▶ Dispatcher ◀───────────────┘
//!                   │
//!                   ├──▶ HandlerWrapper ──▶ listener method
//!                   │          └──────────▶ ExceptionHandler
//!                   └──▶ DeadEvent (nothing matched, once)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use flexbus_core::{EventBus, Listener, MethodDescriptor, Subscribe};
//! use std::any::Any;
//! use std::sync::Arc;
//!
//! struct Greeter;
//!
//! impl Greeter {
//!     fn on_name(&self, name: &String) {
//!         println!("Hello, {name}!");
//!     }
//! }
//!
//! impl Listener for Greeter {
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!
//!     fn methods(&self) -> Vec<MethodDescriptor> {
//!         vec![MethodDescriptor::unary("on_name", Self::on_name).annotated(Subscribe)]
//!     }
//! }
//!
//! let bus = EventBus::new();
//! bus.register(Arc::new(Greeter))?;
//! bus.post(String::from("flexbus"));
//! ```

pub mod annotation;
pub mod bus;
pub mod config;
pub mod dead_event;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod exception;
pub mod handler;
pub mod listener;
pub mod registry;

pub use annotation::{Annotation, AnnotationRef, AnnotationType, Subscribe, resolve, resolve_type};
pub use bus::{EventBus, EventBusBuilder};
pub use config::BusConfig;
pub use dead_event::DeadEvent;
pub use discovery::{AnnotatedHandlerFinder, HandlerFinder, HandlerMap};
pub use dispatcher::Dispatcher;
pub use error::{BoxError, HandlerError, RegistrationError, RegistrationResult};
pub use event::{AnyEvent, Event, EventType};
pub use exception::{ExceptionHandler, HandlerFailure, LoggingExceptionHandler};
pub use handler::HandlerWrapper;
pub use listener::{
    IntoHandlerResult, Invoker, Listener, MethodDescriptor, Opaque, downcast_arg,
    downcast_listener,
};
pub use registry::SubscriptionRegistry;
