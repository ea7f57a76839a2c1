// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::BoxError;
use crate::key::{Object, TypeKey};

pub(crate) type ProvideFn =
    Arc<dyn Fn(TypeKey) -> std::result::Result<Object, BoxError> + Send + Sync>;

/// A rule describing how to satisfy requests for one type key.
///
/// Bindings are pure data; the session pattern-matches them during
/// resolution. Most callers assemble bindings through the fluent
/// [`Bindings`] builder, while the constructors on this type cover the fully
/// general key-based forms.
pub struct Binding {
    key: TypeKey,
    strategy: Strategy,
}

pub(crate) enum Strategy {
    /// Requests for the key are exactly this pre-built value.
    Instance(Object),
    /// Requests for the key are satisfied by resolving the target instead.
    Redirect(TypeKey),
    /// The target is built at most once per session and cached.
    Singleton { target: TypeKey, eager: bool },
    /// An external function produces the instance.
    Provider(ProvideFn),
}

impl Binding {
    /// Binds `T` to a pre-built value.
    #[must_use]
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            strategy: Strategy::Instance(Arc::new(value)),
        }
    }

    /// Binds `key` so that requests for it resolve `target` instead.
    #[must_use]
    pub fn redirect(key: TypeKey, target: TypeKey) -> Self {
        Self {
            key,
            strategy: Strategy::Redirect(target),
        }
    }

    /// Binds `key` to a singleton of `target`, built at most once per
    /// session; `eager` forces the build during session creation.
    #[must_use]
    pub fn singleton(key: TypeKey, target: TypeKey, eager: bool) -> Self {
        Self {
            key,
            strategy: Strategy::Singleton { target, eager },
        }
    }

    /// Binds `key` to a producing function. The function receives the
    /// requested key; failures surface as
    /// [`ErrorKind::Construction`][crate::ErrorKind::Construction].
    #[must_use]
    pub fn provider<F>(key: TypeKey, produce: F) -> Self
    where
        F: Fn(TypeKey) -> std::result::Result<Object, BoxError> + Send + Sync + 'static,
    {
        Self {
            key,
            strategy: Strategy::Provider(Arc::new(produce)),
        }
    }

    /// The key this rule applies to.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub(crate) fn strategy(&self) -> &Strategy {
        &self.strategy
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = match &self.strategy {
            Strategy::Instance(_) => "instance",
            Strategy::Redirect(_) => "redirect",
            Strategy::Singleton { eager: true, .. } => "eager singleton",
            Strategy::Singleton { eager: false, .. } => "singleton",
            Strategy::Provider(_) => "provider",
        };
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("strategy", &strategy)
            .finish()
    }
}

/// Ordered registry of bindings.
///
/// Registration order matters: when several bindings cover the same key, the
/// first one registered wins and the rest are inert.
///
/// # Examples
///
/// ```
/// use rigging::Bindings;
///
/// struct Limits(u32);
/// struct Pool;
///
/// let bindings = Bindings::new()
///     .bind::<Limits>().to_instance(Limits(8))
///     .bind::<Pool>().as_singleton();
/// assert_eq!(bindings.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Bindings {
    entries: Vec<Binding>,
}

impl Bindings {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a rule for `T`; the returned stage selects the strategy.
    #[must_use]
    pub fn bind<T: ?Sized + 'static>(self) -> Bind<T> {
        Bind {
            bindings: self,
            _marker: PhantomData,
        }
    }

    /// Appends an already-assembled binding.
    #[must_use]
    pub fn with(mut self, binding: Binding) -> Self {
        self.entries.push(binding);
        self
    }

    /// The number of registered bindings, inert duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no binding has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<Binding> {
        self.entries
    }
}

/// Strategy-selection stage of the fluent builder, started by
/// [`Bindings::bind`].
pub struct Bind<T: ?Sized> {
    bindings: Bindings,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ?Sized + 'static> Bind<T> {
    fn finish(self, strategy: Strategy) -> Bindings {
        self.bindings.with(Binding {
            key: TypeKey::of::<T>(),
            strategy,
        })
    }

    /// Requests for `T` are satisfied by resolving `U` instead.
    #[must_use]
    pub fn to<U: ?Sized + 'static>(self) -> Bindings {
        self.finish(Strategy::Redirect(TypeKey::of::<U>()))
    }

    /// Requests for `T` return exactly this pre-built value.
    #[must_use]
    pub fn to_instance<V: Send + Sync + 'static>(self, value: V) -> Bindings {
        self.finish(Strategy::Instance(Arc::new(value)))
    }

    /// `T` is built at most once per session, on first request.
    #[must_use]
    pub fn as_singleton(self) -> Bindings {
        self.finish(Strategy::Singleton {
            target: TypeKey::of::<T>(),
            eager: false,
        })
    }

    /// `T` is built at most once per session, during session creation.
    #[must_use]
    pub fn as_eager_singleton(self) -> Bindings {
        self.finish(Strategy::Singleton {
            target: TypeKey::of::<T>(),
            eager: true,
        })
    }

    /// Requests for `T` share a single lazily-built `U`.
    #[must_use]
    pub fn to_singleton<U: 'static>(self) -> Bindings {
        self.finish(Strategy::Singleton {
            target: TypeKey::of::<U>(),
            eager: false,
        })
    }

    /// Requests for `T` share a single `U` built during session creation.
    #[must_use]
    pub fn to_eager_singleton<U: 'static>(self) -> Bindings {
        self.finish(Strategy::Singleton {
            target: TypeKey::of::<U>(),
            eager: true,
        })
    }

    /// Requests for `T` invoke `produce` on every resolution.
    #[must_use]
    pub fn to_provider<V, F>(self, produce: F) -> Bindings
    where
        V: Send + Sync + 'static,
        F: Fn() -> V + Send + Sync + 'static,
    {
        self.finish(Strategy::Provider(Arc::new(move |_key| {
            Ok(Arc::new(produce()) as Object)
        })))
    }

    /// Requests for `T` invoke `produce` on every resolution; failures
    /// surface as [`ErrorKind::Construction`][crate::ErrorKind::Construction].
    #[must_use]
    pub fn to_fallible_provider<V, F>(self, produce: F) -> Bindings
    where
        V: Send + Sync + 'static,
        F: Fn() -> std::result::Result<V, BoxError> + Send + Sync + 'static,
    {
        self.finish(Strategy::Provider(Arc::new(move |_key| {
            produce().map(|value| Arc::new(value) as Object)
        })))
    }
}

impl<T: ?Sized> fmt::Debug for Bind<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bind")
            .field("bindings", &self.bindings)
            .finish()
    }
}
