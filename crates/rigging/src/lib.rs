// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![doc(html_logo_url = "https://media.githubusercontent.com/media/microsoft/oxidizer/refs/heads/main/crates/rigging/logo.png")]
#![doc(html_favicon_url = "https://media.githubusercontent.com/media/microsoft/oxidizer/refs/heads/main/crates/rigging/favicon.ico")]

//! Runtime object wiring: declarative bindings resolved on demand into a
//! fully constructed object graph.
//!
//! This crate provides [`Session`], a container that turns a set of
//! *bindings* — rules describing how to produce an instance of a requested
//! type — into live objects. Resolution walks the dependency graph
//! recursively, reuses singletons where declared, detects circular
//! dependencies instead of recursing forever, and announces every
//! construction to an ordered set of [`Listener`]s.
//!
//! # Quick Start
//!
//! ```
//! use rigging::{Bindings, Session};
//!
//! struct Limits(u32);
//!
//! let bindings = Bindings::new()
//!     .bind::<Limits>().to_instance(Limits(8))
//!     .bind::<String>().to_provider(|| "ready".to_string());
//!
//! let session = Session::new(bindings, Vec::new())?;
//! assert_eq!(session.get::<Limits>()?.0, 8);
//! assert_eq!(*session.get::<String>()?, "ready");
//! # Ok::<(), rigging::Error>(())
//! ```
//!
//! # Binding strategies
//!
//! | Strategy | Declared via | Behavior |
//! |---|---|---|
//! | Instance | [`Bind::to_instance`] | requests return the pre-built value |
//! | Redirect | [`Bind::to`] | requests for one key resolve another |
//! | Singleton | [`Bind::as_singleton`] | built at most once per session, cached |
//! | Eager singleton | [`Bind::as_eager_singleton`] | built during session creation |
//! | Provider | [`Bind::to_provider`] | a closure produces each instance |
//!
//! When several bindings cover the same key, the first one registered wins;
//! later duplicates are inert.
//!
//! A key with no binding at all is constructed through the session's
//! [`Schema`]: the port reports the type's constructor parameters, the
//! engine resolves each parameter recursively, and the port instantiates
//! the type with the resolved arguments. The shipped [`SchemaRegistry`]
//! implementation is fed explicitly through [`Blueprint`]:
//!
//! ```
//! use std::sync::Arc;
//! use rigging::{Args, Bindings, Blueprint, BoxError, Param, SchemaRegistry, Session};
//!
//! struct Limits(u32);
//!
//! impl Blueprint for Limits {
//!     fn params() -> Vec<Param> {
//!         Vec::new()
//!     }
//!
//!     fn build(_args: Args) -> Result<Self, BoxError> {
//!         Ok(Self(8))
//!     }
//! }
//!
//! struct Pool {
//!     limits: Arc<Limits>,
//! }
//!
//! impl Blueprint for Pool {
//!     fn params() -> Vec<Param> {
//!         vec![Param::of::<Limits>("limits")]
//!     }
//!
//!     fn build(mut args: Args) -> Result<Self, BoxError> {
//!         Ok(Self {
//!             limits: args.take::<Limits>()?,
//!         })
//!     }
//! }
//!
//! let schema = SchemaRegistry::new().with::<Limits>().with::<Pool>();
//! let session = Session::with_schema(Bindings::new(), Vec::new(), Arc::new(schema))?;
//!
//! let pool = session.get::<Pool>()?;
//! assert_eq!(pool.limits.0, 8);
//! # Ok::<(), rigging::Error>(())
//! ```
//!
//! # Trait objects
//!
//! Keys are concrete Rust types. To wire a capability behind a trait, bind
//! the handle type `Arc<dyn Capability>` and produce it from a provider or a
//! registered instance:
//!
//! ```
//! use std::sync::Arc;
//! use rigging::{Bindings, Session};
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English;
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! let bindings = Bindings::new()
//!     .bind::<Arc<dyn Greeter>>()
//!     .to_provider(|| Arc::new(English) as Arc<dyn Greeter>);
//!
//! let session = Session::new(bindings, Vec::new())?;
//! let greeter = session.get::<Arc<dyn Greeter>>()?;
//! assert_eq!(greeter.greet(), "hello");
//! # Ok::<(), rigging::Error>(())
//! ```
//!
//! # Concurrency
//!
//! A [`Session`] may be shared freely across threads. Singleton
//! construction is serialized per type key — concurrent requesters for the
//! same key block until the first build completes and then share its result,
//! while unrelated keys build in parallel. Each top-level request carries
//! its own cycle-detection state, so concurrent resolutions never interfere
//! with one another's bookkeeping.
//!
//! # Failure modes
//!
//! Resolution never silently returns nothing: every failure is a typed
//! [`Error`] — a dependency cycle with the full chain of keys, a key nobody
//! can build, a constructor or provider failure with its source attached, or
//! a listener that rejected an otherwise successful construction. Failed
//! singleton builds leave no cache entry behind and are retried on the next
//! request.

mod binding;
mod error;
mod key;
mod listener;
mod schema;
mod session;
mod store;

pub use binding::{Bind, Binding, Bindings};
pub use error::{BoxError, Error, ErrorKind, Result};
pub use key::{Object, TypeKey};
pub use listener::Listener;
pub use schema::{Args, Blueprint, Param, Schema, SchemaRegistry};
pub use session::Session;
