// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::key::{Object, TypeKey};

/// Introspection port the engine uses to construct types that have no
/// binding.
///
/// The port answers two questions: what are the constructor parameters of a
/// given type, and how is the type instantiated from an argument list. Rust
/// has no runtime constructor reflection, so the shipped implementation is
/// [`SchemaRegistry`], where call sites declare constructors explicitly
/// through [`Blueprint`]. Hosts with their own type metadata can implement
/// this trait instead.
pub trait Schema: Send + Sync {
    /// Describes `key`'s constructor as an ordered parameter list, or `None`
    /// when the type is unknown to this schema.
    fn constructor(&self, key: TypeKey) -> Option<Vec<Param>>;

    /// Invokes `key`'s constructor with `args` matching the declared
    /// parameter order.
    ///
    /// # Errors
    ///
    /// Any failure raised by the constructor body; the engine wraps it as
    /// [`ErrorKind::Construction`][crate::ErrorKind::Construction].
    fn construct(&self, key: TypeKey, args: Vec<Object>) -> std::result::Result<Object, BoxError>;
}

/// A constructor parameter: its name, its type key, and the declared default
/// value when one exists.
#[derive(Clone)]
pub struct Param {
    name: &'static str,
    key: TypeKey,
    default: Option<Arc<dyn Fn() -> Object + Send + Sync>>,
}

impl Param {
    /// A required parameter of type `T`.
    #[must_use]
    pub fn of<T: Send + Sync + 'static>(name: &'static str) -> Self {
        Self {
            name,
            key: TypeKey::of::<T>(),
            default: None,
        }
    }

    /// A parameter of type `T` with a declared default, used when nothing in
    /// the session can satisfy `T`.
    #[must_use]
    pub fn with_default<T, F>(name: &'static str, default: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            name,
            key: TypeKey::of::<T>(),
            default: Some(Arc::new(move || Arc::new(default()) as Object)),
        }
    }

    /// The parameter's declared name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The key of the parameter's type.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub(crate) fn default_value(&self) -> Option<Object> {
        self.default.as_ref().map(|default| (**default)())
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

/// Describes how to construct `Self` from resolved constructor arguments.
///
/// Implementations pair an ordered parameter list with a constructor body;
/// [`SchemaRegistry::with`] records them for the engine.
///
/// # Examples
///
/// ```
/// use rigging::{Args, Blueprint, BoxError, Param};
/// use std::sync::Arc;
///
/// struct Limits(u32);
///
/// struct Gate {
///     limits: Arc<Limits>,
/// }
///
/// impl Blueprint for Gate {
///     fn params() -> Vec<Param> {
///         vec![Param::of::<Limits>("limits")]
///     }
///
///     fn build(mut args: Args) -> Result<Self, BoxError> {
///         Ok(Self {
///             limits: args.take::<Limits>()?,
///         })
///     }
/// }
/// ```
pub trait Blueprint: Sized + Send + Sync + 'static {
    /// The constructor's parameters in declared order.
    fn params() -> Vec<Param>;

    /// Builds the value from arguments matching [`Blueprint::params`].
    ///
    /// # Errors
    ///
    /// Any failure of the constructor body, including argument type
    /// mismatches surfaced by [`Args::take`].
    fn build(args: Args) -> std::result::Result<Self, BoxError>;
}

/// Positional constructor arguments handed to [`Blueprint::build`].
///
/// Arguments arrive in declared parameter order; [`Args::take`] consumes them
/// front to back.
pub struct Args {
    key: TypeKey,
    values: std::vec::IntoIter<Object>,
    position: usize,
}

impl Args {
    pub(crate) fn new(key: TypeKey, values: Vec<Object>) -> Self {
        Self {
            key,
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Consumes the next argument, downcast to `T`.
    ///
    /// # Errors
    ///
    /// Fails when no argument remains or the next argument is not a `T`;
    /// either indicates a constructor registered with a parameter list that
    /// does not match its body.
    pub fn take<T: Send + Sync + 'static>(&mut self) -> std::result::Result<Arc<T>, BoxError> {
        let position = self.position;
        self.position += 1;
        let Some(value) = self.values.next() else {
            return Err(format!(
                "constructor for `{}` requested more arguments than it declared (position {position})",
                self.key
            )
            .into());
        };
        match value.downcast::<T>() {
            Ok(typed) => Ok(typed),
            Err(_value) => Err(format!(
                "constructor for `{}` received a value of the wrong type at position {position} (expected `{}`)",
                self.key,
                TypeKey::of::<T>()
            )
            .into()),
        }
    }

    /// The number of arguments not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("key", &self.key)
            .field("remaining", &self.values.len())
            .finish()
    }
}

type BuildFn = Arc<dyn Fn(Vec<Object>) -> std::result::Result<Object, BoxError> + Send + Sync>;

struct Descriptor {
    params: Vec<Param>,
    build: BuildFn,
}

/// Registry-backed [`Schema`] where call sites declare constructors.
///
/// The registry is assembled up front and handed to
/// [`Session::with_schema`][crate::Session::with_schema]; it is immutable
/// from then on.
///
/// # Examples
///
/// ```
/// use rigging::{Args, Blueprint, BoxError, Param, SchemaRegistry};
///
/// struct Settings;
///
/// impl Blueprint for Settings {
///     fn params() -> Vec<Param> {
///         Vec::new()
///     }
///
///     fn build(_args: Args) -> Result<Self, BoxError> {
///         Ok(Self)
///     }
/// }
///
/// let schema = SchemaRegistry::new().with::<Settings>();
/// ```
#[derive(Default)]
pub struct SchemaRegistry {
    types: HashMap<TypeKey, Descriptor>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `T`'s blueprint, replacing any earlier registration for `T`.
    #[must_use]
    pub fn with<T: Blueprint>(mut self) -> Self {
        let key = TypeKey::of::<T>();
        let build: BuildFn = Arc::new(move |values| {
            let args = Args::new(key, values);
            T::build(args).map(|value| Arc::new(value) as Object)
        });
        self.types.insert(
            key,
            Descriptor {
                params: T::params(),
                build,
            },
        );
        self
    }

    /// The number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry has no registrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Schema for SchemaRegistry {
    fn constructor(&self, key: TypeKey) -> Option<Vec<Param>> {
        self.types.get(&key).map(|descriptor| descriptor.params.clone())
    }

    fn construct(&self, key: TypeKey, args: Vec<Object>) -> std::result::Result<Object, BoxError> {
        let Some(descriptor) = self.types.get(&key) else {
            return Err(format!("no constructor registered for `{key}`").into());
        };
        (*descriptor.build)(args)
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("len", &self.types.len())
            .finish()
    }
}
