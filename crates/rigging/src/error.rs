// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::key::TypeKey;

/// The result for fallible operations that use the [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// A boxed error as produced by schema ports, providers, and listeners.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An error produced while resolving an object graph.
///
/// Resolution failures propagate synchronously through every recursive frame
/// to the original caller; nothing partial is returned and no failed
/// singleton build is cached. Inspect [`Error::kind`] to react to a specific
/// failure mode.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(#[from] ErrorKind);

/// The individual failure modes of graph resolution.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A key was requested while a resolution of the same key was already in
    /// progress on the current call chain.
    ///
    /// The chain lists every key visited on the way into the cycle, in visit
    /// order, ending with the repeated key.
    #[error("cyclic dependency: {}", render_chain(.chain))]
    Cycle {
        /// The keys on the resolution chain, ending with the repeat.
        chain: Vec<TypeKey>,
    },

    /// No binding matches the requested key and the schema port reports no
    /// usable constructor for it.
    #[error("no binding for `{key}` and no usable constructor")]
    NotBound {
        /// The key that could not be satisfied.
        key: TypeKey,
    },

    /// The schema port or a provider failed while instantiating the key.
    #[error("constructing `{key}` failed")]
    Construction {
        /// The key whose construction failed.
        key: TypeKey,
        /// The underlying failure, propagated unchanged.
        #[source]
        source: BoxError,
    },

    /// A listener failed after the key was successfully constructed.
    ///
    /// The object exists (and, for singletons, stays cached); the failure
    /// signals a defect in the observation layer, not in the graph.
    #[error("listener `{listener}` failed observing `{key}`")]
    Listener {
        /// The name of the listener that failed.
        listener: String,
        /// The key whose construction was being observed.
        key: TypeKey,
        /// The error the listener returned.
        #[source]
        source: BoxError,
    },

    /// A typed accessor requested a different type than the value stored
    /// under the key.
    #[error("value stored for `{key}` has a different type")]
    Mismatch {
        /// The key whose value failed to downcast.
        key: TypeKey,
    },
}

fn render_chain(chain: &[TypeKey]) -> String {
    chain
        .iter()
        .map(TypeKey::name)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl Error {
    pub(crate) fn cycle(chain: Vec<TypeKey>) -> Self {
        Self(ErrorKind::Cycle { chain })
    }

    pub(crate) fn not_bound(key: TypeKey) -> Self {
        Self(ErrorKind::NotBound { key })
    }

    pub(crate) fn construction(key: TypeKey, source: BoxError) -> Self {
        Self(ErrorKind::Construction { key, source })
    }

    pub(crate) fn listener(listener: &str, key: TypeKey, source: BoxError) -> Self {
        Self(ErrorKind::Listener {
            listener: listener.to_owned(),
            key,
            source,
        })
    }

    pub(crate) fn mismatch(key: TypeKey) -> Self {
        Self(ErrorKind::Mismatch { key })
    }

    /// The kind of failure this error represents.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(Error: Send, Sync);
        static_assertions::assert_impl_all!(ErrorKind: Send, Sync);
    }

    #[test]
    fn cycle_message_lists_chain() {
        struct A;
        struct B;
        let error = Error::cycle(vec![
            TypeKey::of::<A>(),
            TypeKey::of::<B>(),
            TypeKey::of::<A>(),
        ]);

        let message = error.to_string();
        assert!(message.starts_with("cyclic dependency: "));
        assert_eq!(message.matches("A").count(), 2);
        assert_eq!(message.matches(" -> ").count(), 2);
    }

    #[test]
    fn construction_preserves_source() {
        let source: BoxError = "boom".into();
        let error = Error::construction(TypeKey::of::<u32>(), source);

        assert!(matches!(error.kind(), ErrorKind::Construction { .. }));
        let source = std::error::Error::source(&error).expect("source is attached");
        assert_eq!(source.to_string(), "boom");
    }

    #[test]
    fn listener_message_names_the_listener() {
        let error = Error::listener("metrics", TypeKey::of::<u32>(), "down".into());
        assert!(error.to_string().contains("`metrics`"));
    }
}
