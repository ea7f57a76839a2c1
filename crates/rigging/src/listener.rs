// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, Error, Result};
use crate::key::{Object, TypeKey};

/// Observer invoked after every successful object construction.
///
/// Listeners run synchronously, in registration order, once per constructed
/// object — including eagerly-built singletons and pre-registered instances.
/// Fetching a cached singleton does not notify again.
///
/// Returning an error aborts the resolution call that triggered the
/// construction; the object itself already exists at that point, so the
/// failure is reported as [`ErrorKind::Listener`][crate::ErrorKind::Listener]
/// rather than as a resolution failure.
pub trait Listener: Send + Sync {
    /// Diagnostic name reported when this listener fails.
    fn name(&self) -> &str;

    /// Called with the constructed object and the key it was built for.
    ///
    /// # Errors
    ///
    /// Any error returned here is logged and re-raised to the caller whose
    /// resolution triggered the construction.
    fn constructed(&self, key: TypeKey, instance: &Object) -> std::result::Result<(), BoxError>;
}

/// The ordered set of listeners owned by a session.
pub(crate) struct ListenerSet {
    listeners: Vec<Arc<dyn Listener>>,
}

impl ListenerSet {
    pub(crate) fn new(listeners: Vec<Arc<dyn Listener>>) -> Self {
        Self { listeners }
    }

    /// Notifies every listener in registration order, stopping at the first
    /// failure.
    pub(crate) fn notify(&self, key: TypeKey, instance: &Object) -> Result<()> {
        for listener in &self.listeners {
            if let Err(source) = listener.constructed(key, instance) {
                tracing::event!(
                    name: "rigging.listener_failed",
                    tracing::Level::ERROR,
                    listener = listener.name(),
                    key = %key,
                    error = %source,
                );
                return Err(Error::listener(listener.name(), key, source));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.listeners.len())
            .finish()
    }
}
