//! The event bus facade.
//!
//! [`EventBus`] bundles a [`SubscriptionRegistry`] and a [`Dispatcher`]
//! behind one cheaply clonable handle. Clones share all state.
//!
//! ```rust,ignore
//! use flexbus::prelude::*;
//!
//! let bus = EventBus::builder()
//!     .config(BusConfig::named("orders"))
//!     .marker::<Audited>()
//!     .exception_handler(|failure: &HandlerFailure| eprintln!("{failure}"))
//!     .build();
//!
//! bus.register(Arc::new(Ledger::default()))?;
//! bus.post(Transfer { amount: 10 });
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::annotation::{Annotation, Subscribe};
use crate::config::BusConfig;
use crate::discovery::{AnnotatedHandlerFinder, HandlerFinder};
use crate::dispatcher::Dispatcher;
use crate::error::RegistrationResult;
use crate::event::Event;
use crate::exception::{ExceptionHandler, LoggingExceptionHandler};
use crate::listener::Listener;
use crate::registry::SubscriptionRegistry;

/// A synchronous, in-process event bus.
#[derive(Clone)]
pub struct EventBus {
    config: Arc<BusConfig>,
    dispatcher: Arc<Dispatcher>,
}

impl EventBus {
    /// Creates a bus with the default configuration, the [`Subscribe`] marker
    /// and the logging exception handler.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a bus from `config` with the default marker and exception
    /// handler.
    pub fn with_config(config: BusConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Returns a builder.
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::default()
    }

    /// Returns the bus identifier.
    pub fn identifier(&self) -> &str {
        &self.config.identifier
    }

    /// Returns the bus configuration.
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Returns the subscription registry.
    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        self.dispatcher.registry()
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Registers every handler method of `listener`.
    ///
    /// Fails without registering anything if a tagged method does not take
    /// exactly one parameter. Registering the same instance twice is a
    /// no-op. Returns the number of newly registered handlers.
    pub fn register<L: Listener>(&self, listener: Arc<L>) -> RegistrationResult<usize> {
        self.register_dyn(listener)
    }

    /// Type-erased variant of [`register`](Self::register).
    pub fn register_dyn(&self, listener: Arc<dyn Listener>) -> RegistrationResult<usize> {
        self.registry().register(listener)
    }

    /// Unregisters every handler of `listener`. Returns how many were
    /// removed.
    pub fn unregister<L: Listener>(&self, listener: &Arc<L>) -> usize {
        let listener: Arc<dyn Listener> = Arc::clone(listener) as Arc<dyn Listener>;
        self.unregister_dyn(&listener)
    }

    /// Type-erased variant of [`unregister`](Self::unregister).
    pub fn unregister_dyn(&self, listener: &Arc<dyn Listener>) -> usize {
        self.registry().unregister(listener)
    }

    /// Posts `event` to every handler registered for its type or one of its
    /// ancestors.
    ///
    /// Handler failures are reported to the exception handler and never
    /// returned. Returns `true` if at least one handler received the event.
    pub fn post<E: Event>(&self, event: E) -> bool {
        self.dispatcher.post(event)
    }

    /// Posts an already shared event.
    pub fn post_arc(&self, event: Arc<dyn Event>) -> bool {
        self.dispatcher.post_arc(event)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("identifier", &self.config.identifier)
            .field("registry", self.registry())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

type FinderFactory = fn(Arc<dyn ExceptionHandler>) -> Arc<dyn HandlerFinder>;

fn annotated_finder<A: Annotation>(exception_handler: Arc<dyn ExceptionHandler>) -> Arc<dyn HandlerFinder> {
    Arc::new(AnnotatedHandlerFinder::<A>::with_exception_handler(
        exception_handler,
    ))
}

/// Builder for [`EventBus`].
pub struct EventBusBuilder {
    config: BusConfig,
    marker: (&'static str, FinderFactory),
    exception_handler: Arc<dyn ExceptionHandler>,
    finder: Option<Arc<dyn HandlerFinder>>,
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self {
            config: BusConfig::default(),
            marker: (std::any::type_name::<Subscribe>(), annotated_finder::<Subscribe>),
            exception_handler: Arc::new(LoggingExceptionHandler),
            finder: None,
        }
    }
}

impl EventBusBuilder {
    /// Sets the bus configuration.
    pub fn config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the bus identifier.
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.config.identifier = identifier.into();
        self
    }

    /// Uses `A` instead of [`Subscribe`] as the handler marker.
    pub fn marker<A: Annotation>(mut self) -> Self {
        self.marker = (std::any::type_name::<A>(), annotated_finder::<A>);
        self
    }

    /// Sets the sink for handler failures.
    pub fn exception_handler(mut self, handler: impl ExceptionHandler + 'static) -> Self {
        self.exception_handler = Arc::new(handler);
        self
    }

    /// Replaces annotation-based discovery with a custom finder.
    ///
    /// The finder binds its own exception handler, so the marker and the
    /// exception handler set on this builder are ignored.
    pub fn finder(mut self, finder: impl HandlerFinder + 'static) -> Self {
        self.finder = Some(Arc::new(finder));
        self
    }

    /// Builds the bus.
    pub fn build(self) -> EventBus {
        let finder = match self.finder {
            Some(finder) => finder,
            None => {
                let (marker, factory) = self.marker;
                debug!(bus = %self.config.identifier, marker, "Using annotated handler finder");
                factory(self.exception_handler)
            }
        };

        let registry = Arc::new(SubscriptionRegistry::new(finder));
        let dispatcher = Arc::new(Dispatcher::new(registry, &self.config));

        EventBus {
            config: Arc::new(self.config),
            dispatcher,
        }
    }
}
