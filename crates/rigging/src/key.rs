// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A type-erased constructed value as it travels through the engine.
///
/// Every object the engine produces or caches is held in this form; the typed
/// accessors on [`Session`][crate::Session] downcast at the boundary.
pub type Object = Arc<dyn Any + Send + Sync>;

/// Opaque identifier for a requested type.
///
/// Two keys are equal exactly when they denote the same Rust type. The
/// captured type name travels along for diagnostics only and never
/// participates in equality or hashing.
///
/// # Examples
///
/// ```
/// use rigging::TypeKey;
///
/// let key = TypeKey::of::<String>();
/// assert_eq!(key, TypeKey::of::<String>());
/// assert_ne!(key, TypeKey::of::<u32>());
/// ```
#[derive(Clone, Copy, Debug, Eq)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key identifying `T`.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The diagnostic name of the type this key denotes.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
