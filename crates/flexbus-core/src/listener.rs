//! Listener introspection.
//!
//! A [`Listener`] lists its public methods as [`MethodDescriptor`]s: the
//! method name, the annotations declared on it, its parameter types and an
//! invoker. This is the whole introspection surface the discovery engine
//! relies on.
//!
//! The `#[listener]` attribute from `flexbus-macros` generates the table from
//! an inherent `impl` block. Without the macro, the table is written by hand:
//!
//! ```rust,ignore
//! use flexbus_core::{Listener, MethodDescriptor, Subscribe};
//!
//! struct Recorder {
//!     seen: Mutex<Vec<String>>,
//! }
//!
//! impl Recorder {
//!     fn on_string(&self, value: &String) {
//!         self.seen.lock().push(value.clone());
//!     }
//! }
//!
//! impl Listener for Recorder {
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!
//!     fn methods(&self) -> Vec<MethodDescriptor> {
//!         vec![MethodDescriptor::unary("on_string", Self::on_string).annotated(Subscribe)]
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::annotation::{Annotation, AnnotationRef};
use crate::error::{BoxError, HandlerError};
use crate::event::EventType;

/// Type-erased method body: `(listener, arguments) -> result`.
pub type Invoker =
    Arc<dyn Fn(&dyn Any, &[&dyn Any]) -> Result<(), HandlerError> + Send + Sync + 'static>;

/// An object whose methods may receive events.
pub trait Listener: Any + Send + Sync {
    /// Returns a reference to self as `Any`.
    fn as_any(&self) -> &dyn Any;

    /// Lists the public methods of this listener.
    fn methods(&self) -> Vec<MethodDescriptor>;

    /// Returns the listener type name for diagnostics.
    fn listener_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

// ============================================================================
// Method Descriptor
// ============================================================================

/// Describes one public method of a listener.
#[derive(Clone)]
pub struct MethodDescriptor {
    name: &'static str,
    annotations: Vec<AnnotationRef>,
    parameters: Vec<EventType>,
    invoker: Option<Invoker>,
}

impl MethodDescriptor {
    /// Creates a descriptor from explicit parameter types and an invoker.
    ///
    /// The invoker receives the listener and one argument per parameter, each
    /// viewable as the matching parameter type.
    pub fn new<F>(name: &'static str, parameters: Vec<EventType>, invoker: F) -> Self
    where
        F: Fn(&dyn Any, &[&dyn Any]) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self {
            name,
            annotations: Vec::new(),
            parameters,
            invoker: Some(Arc::new(invoker)),
        }
    }

    /// Creates a descriptor for a single-parameter method.
    pub fn unary<L, T, R, F>(name: &'static str, method: F) -> Self
    where
        L: Listener,
        T: 'static,
        R: IntoHandlerResult,
        F: Fn(&L, &T) -> R + Send + Sync + 'static,
    {
        Self::new(name, vec![EventType::of::<T>()], move |listener, args| {
            let listener = downcast_listener::<L>(listener)?;
            let arg = downcast_arg::<T>(args, 0)?;
            method(listener, arg).into_handler_result()
        })
    }

    /// Creates a descriptor for a method that is listed but never invoked,
    /// such as a method whose parameters cannot be expressed as event types.
    pub fn opaque(name: &'static str, arity: usize) -> Self {
        Self {
            name,
            annotations: Vec::new(),
            parameters: vec![EventType::of::<Opaque>(); arity],
            invoker: None,
        }
    }

    /// Adds an annotation.
    pub fn annotated(mut self, annotation: impl Annotation) -> Self {
        self.annotations.push(Arc::new(annotation));
        self
    }

    /// Adds several annotations.
    pub fn annotated_with(mut self, annotations: impl IntoIterator<Item = AnnotationRef>) -> Self {
        self.annotations.extend(annotations);
        self
    }

    /// Returns the method name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the annotations declared on the method.
    pub fn annotations(&self) -> &[AnnotationRef] {
        &self.annotations
    }

    /// Returns the parameter types.
    pub fn parameters(&self) -> &[EventType] {
        &self.parameters
    }

    /// Returns the number of parameters.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Invokes the method on `listener`.
    pub fn invoke(&self, listener: &dyn Any, args: &[&dyn Any]) -> Result<(), HandlerError> {
        match &self.invoker {
            Some(invoker) => invoker(listener, args),
            None => Err(HandlerError::NotInvocable { method: self.name }),
        }
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("annotations", &self.annotations)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Placeholder parameter type of [`MethodDescriptor::opaque`] methods.
#[derive(Debug)]
pub enum Opaque {}

// ============================================================================
// Invocation Helpers
// ============================================================================

/// Downcasts the receiver of a method invocation.
pub fn downcast_listener<L: Any>(listener: &dyn Any) -> Result<&L, HandlerError> {
    listener
        .downcast_ref::<L>()
        .ok_or(HandlerError::ReceiverMismatch {
            expected: std::any::type_name::<L>(),
        })
}

/// Downcasts the argument at `index`.
pub fn downcast_arg<'a, T: Any>(args: &[&'a dyn Any], index: usize) -> Result<&'a T, HandlerError> {
    args.get(index)
        .and_then(|arg| arg.downcast_ref::<T>())
        .ok_or(HandlerError::ArgumentMismatch {
            index,
            expected: std::any::type_name::<T>(),
        })
}

/// Converts a handler's return value into an invocation result.
pub trait IntoHandlerResult {
    /// Performs the conversion.
    fn into_handler_result(self) -> Result<(), HandlerError>;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> Result<(), HandlerError> {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_handler_result(self) -> Result<(), HandlerError> {
        self.map_err(HandlerError::failed)
    }
}
