//! # Flexbus
//!
//! An in-process, synchronous event bus with annotation-driven handler
//! discovery.
//!
//! ## Overview
//!
//! Listener objects register with an [`EventBus`](flexbus_core::EventBus).
//! Their methods tagged with a marker annotation become handlers for the type
//! of their single parameter; posted events reach every handler registered
//! for the event's type or one of its declared parents. Events nobody
//! handles are reposted once as a `DeadEvent`.
//!
//! ```text
//! ┌──────────┐ register ┌──────────────┐        ┌────────────┐
//! │ Listener │─────────▶│   Registry   │◀───────│ Dispatcher │◀── post(event)
//! └──────────┘          └──────────────┘        └─────┬──────┘
//!       ▲                                             │
//!       └──────────── handler(&event) ◀───────────────┘
//! ```
//!
//! - **flexbus-core**: events, annotations, discovery, registry, dispatch
//! - **flexbus-macros**: `#[derive(Event)]`, `#[derive(Annotation)]`, `#[listener]`
//! - **flexbus-runtime**: layered configuration and logging setup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flexbus::prelude::*;
//!
//! #[derive(Clone, Event)]
//! pub struct Deposit {
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
//!     #[subscribe]
//!     pub fn on_deposit(&self, deposit: &Deposit) {
//!         self.total.fetch_add(deposit.amount, Ordering::SeqCst);
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = flexbus::runtime::config::load_config()?;
//!     let bus = flexbus::runtime::init(&config);
//!
//!     bus.register(Arc::new(Ledger::default()))?;
//!     bus.post(Deposit { amount: 10 });
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: load `flexbus.toml` configuration files
//! - `json-log`: enable the JSON log format

pub use flexbus_core as core;
pub use flexbus_macros as macros;
pub use flexbus_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use flexbus::prelude::*;
/// ```
pub mod prelude {
    // Bus facade - main entry point
    pub use flexbus_core::{BusConfig, EventBus, EventBusBuilder};

    // Events and annotations
    pub use flexbus_core::{Annotation, AnyEvent, DeadEvent, Event, Subscribe};

    // Listeners
    pub use flexbus_core::{Listener, MethodDescriptor};

    // Failures
    pub use flexbus_core::{
        ExceptionHandler, HandlerError, HandlerFailure, RegistrationError, RegistrationResult,
    };

    // Derive and attribute macros; they share names with the traits above
    // but live in the macro namespace.
    pub use flexbus_macros::{Annotation, Event, listener};

    pub use std::sync::Arc;
}
