// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::binding::{Binding, Bindings, Strategy};
use crate::error::{Error, ErrorKind, Result};
use crate::key::{Object, TypeKey};
use crate::listener::{Listener, ListenerSet};
use crate::schema::{Schema, SchemaRegistry};
use crate::store::SingletonStore;

/// The live container: bindings, singleton cache, listeners, and the schema
/// port, resolved against on demand.
///
/// A session is created once from an ordered binding registry and lives for
/// the duration of the enclosing application. Creation runs an eager
/// initialization pass: every eager singleton is built and every pre-built
/// instance is announced to the listeners before the constructor returns.
///
/// Sessions are [`Send`] and [`Sync`]; any number of threads may resolve
/// concurrently. Resolution is synchronous and blocks only when another
/// thread is already building the same singleton.
pub struct Session {
    bindings: Vec<Binding>,
    index: HashMap<TypeKey, usize>,
    overlay: RwLock<HashMap<TypeKey, Object>>,
    store: SingletonStore,
    listeners: ListenerSet,
    schema: Arc<dyn Schema>,
}

impl Session {
    /// Creates a session over `bindings` and `listeners` with an empty
    /// schema, running the eager initialization pass.
    ///
    /// # Errors
    ///
    /// Fails when an eager singleton cannot be built or a listener rejects a
    /// construction during initialization.
    pub fn new(bindings: Bindings, listeners: Vec<Arc<dyn Listener>>) -> Result<Self> {
        Self::with_schema(bindings, listeners, Arc::new(SchemaRegistry::new()))
    }

    /// Creates a session that constructs unbound types through `schema`.
    ///
    /// # Errors
    ///
    /// Fails when an eager singleton cannot be built or a listener rejects a
    /// construction during initialization.
    pub fn with_schema(
        bindings: Bindings,
        listeners: Vec<Arc<dyn Listener>>,
        schema: Arc<dyn Schema>,
    ) -> Result<Self> {
        let entries = bindings.into_entries();
        let mut index = HashMap::with_capacity(entries.len());
        for (position, binding) in entries.iter().enumerate() {
            // First registration wins; later duplicates stay inert.
            index.entry(binding.key()).or_insert(position);
        }

        let session = Self {
            bindings: entries,
            index,
            overlay: RwLock::new(HashMap::new()),
            store: SingletonStore::new(),
            listeners: ListenerSet::new(listeners),
            schema,
        };
        session.initialize()?;
        Ok(session)
    }

    /// Builds eager singletons and announces pre-built instances, in
    /// registration order, before the session serves its first request.
    fn initialize(&self) -> Result<()> {
        for (position, binding) in self.bindings.iter().enumerate() {
            if self.index.get(&binding.key()) != Some(&position) {
                continue;
            }
            match binding.strategy() {
                Strategy::Singleton { target, eager: true } => {
                    let mut trail = Trail::default();
                    trail.enter(binding.key())?;
                    self.singleton(binding.key(), *target, &mut trail)?;
                    tracing::event!(
                        name: "rigging.eager_built",
                        tracing::Level::DEBUG,
                        key = %target,
                    );
                }
                Strategy::Instance(value) => self.listeners.notify(binding.key(), value)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Resolves `T`, constructing it and its dependencies as needed.
    ///
    /// # Errors
    ///
    /// Any [`ErrorKind`]: a dependency cycle, a key with neither binding nor
    /// constructor, a failed construction or listener, or a stored value
    /// whose type is not `T` (possible when `T` redirects to another type;
    /// use [`Session::get_by_key`] for those).
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        match self.get_by_key(key)?.downcast::<T>() {
            Ok(typed) => Ok(typed),
            Err(_value) => Err(Error::mismatch(key)),
        }
    }

    /// Resolves `key` in type-erased form.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Session::get`], minus the downcast.
    pub fn get_by_key(&self, key: TypeKey) -> Result<Object> {
        let mut trail = Trail::default();
        self.resolve(key, &mut trail)
    }

    /// Adds (or overwrites) a pre-built value for `T` after session
    /// creation, announcing it to the listeners exactly once. Values
    /// registered this way take precedence over the binding registry.
    ///
    /// # Errors
    ///
    /// Fails when a listener rejects the registration; the value is kept
    /// either way, matching the behavior of a constructed object whose
    /// observation fails.
    pub fn register<T: Send + Sync + 'static>(&self, value: T) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        let shared = Arc::new(value);
        let erased: Object = Arc::clone(&shared);
        self.overlay.write().insert(key, Arc::clone(&erased));
        self.listeners.notify(key, &erased)?;
        Ok(shared)
    }

    /// Returns `T` only if it is already materialized — registered through
    /// [`Session::register`], bound to an instance, or cached as a
    /// singleton — without constructing anything.
    #[must_use]
    pub fn try_get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let mut visited = Vec::new();
        self.peek(TypeKey::of::<T>(), &mut visited)
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Whether a registered value, a binding, or a constructor description
    /// covers `T`.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        let key = TypeKey::of::<T>();
        self.overlay.read().contains_key(&key)
            || self.index.contains_key(&key)
            || self.schema.constructor(key).is_some()
    }

    fn peek(&self, key: TypeKey, visited: &mut Vec<TypeKey>) -> Option<Object> {
        if visited.contains(&key) {
            return None;
        }
        visited.push(key);

        if let Some(value) = self.overlay.read().get(&key) {
            return Some(Arc::clone(value));
        }
        match self.index.get(&key).map(|&position| self.bindings[position].strategy()) {
            Some(Strategy::Instance(value)) => Some(Arc::clone(value)),
            Some(Strategy::Redirect(target)) => self.peek(*target, visited),
            Some(Strategy::Singleton { target, .. }) => self.store.peek(*target),
            Some(Strategy::Provider(_)) | None => None,
        }
    }

    fn resolve(&self, key: TypeKey, trail: &mut Trail) -> Result<Object> {
        trail.enter(key)?;
        let result = self.dispatch(key, trail);
        trail.leave();
        result
    }

    fn dispatch(&self, key: TypeKey, trail: &mut Trail) -> Result<Object> {
        if let Some(value) = self.overlay.read().get(&key) {
            return Ok(Arc::clone(value));
        }
        match self.index.get(&key).map(|&position| self.bindings[position].strategy()) {
            // Announced once during eager init, not per request.
            Some(Strategy::Instance(value)) => Ok(Arc::clone(value)),
            Some(Strategy::Redirect(target)) => self.resolve(*target, trail),
            Some(Strategy::Singleton { target, .. }) => self.singleton(key, *target, trail),
            Some(Strategy::Provider(produce)) => {
                let value = (**produce)(key).map_err(|source| Error::construction(key, source))?;
                self.listeners.notify(key, &value)?;
                Ok(value)
            }
            None => self.construct(key, trail),
        }
    }

    /// Fetches or builds the singleton for `target`. The build constructs
    /// `target` directly through the schema port; it does not re-enter
    /// binding dispatch for it.
    fn singleton(&self, key: TypeKey, target: TypeKey, trail: &mut Trail) -> Result<Object> {
        let entered_target = target != key;
        if entered_target {
            trail.enter(target)?;
        }
        let outcome = self
            .store
            .get_or_build(target, || self.construct_value(target, &mut *trail));
        if entered_target {
            trail.leave();
        }

        let (value, built) = outcome?;
        if built {
            self.listeners.notify(target, &value)?;
        }
        Ok(value)
    }

    /// Builds `key` through the schema port and announces the result.
    fn construct(&self, key: TypeKey, trail: &mut Trail) -> Result<Object> {
        let value = self.construct_value(key, trail)?;
        self.listeners.notify(key, &value)?;
        Ok(value)
    }

    /// Builds `key` through the schema port without notifying listeners;
    /// callers decide whether this construction is announced (singleton
    /// builds notify only when the cache missed).
    fn construct_value(&self, key: TypeKey, trail: &mut Trail) -> Result<Object> {
        let Some(params) = self.schema.constructor(key) else {
            return Err(Error::not_bound(key));
        };

        let mut args = Vec::with_capacity(params.len());
        for param in &params {
            let value = match self.resolve(param.key(), trail) {
                Ok(value) => value,
                Err(error) => {
                    // A declared default covers absence of the parameter's
                    // type, never a deeper failure.
                    let fallback = match error.kind() {
                        ErrorKind::NotBound { key: missing } if *missing == param.key() => {
                            param.default_value()
                        }
                        _ => None,
                    };
                    fallback.ok_or(error)?
                }
            };
            args.push(value);
        }

        let value = self
            .schema
            .construct(key, args)
            .map_err(|source| Error::construction(key, source))?;
        tracing::event!(
            name: "rigging.constructed",
            tracing::Level::TRACE,
            key = %key,
        );
        Ok(value)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("bindings", &self.bindings.len())
            .field("registered", &self.overlay.read().len())
            .field("store", &self.store)
            .finish()
    }
}

/// The keys currently being resolved on this call chain. Owned by one
/// top-level request; never shared across threads.
#[derive(Default)]
struct Trail {
    keys: Vec<TypeKey>,
}

impl Trail {
    /// Marks `key` as in progress, failing if it already is.
    fn enter(&mut self, key: TypeKey) -> Result<()> {
        if self.keys.contains(&key) {
            let mut chain = self.keys.clone();
            chain.push(key);
            return Err(Error::cycle(chain));
        }
        self.keys.push(key);
        Ok(())
    }

    fn leave(&mut self) {
        self.keys.pop();
    }
}
