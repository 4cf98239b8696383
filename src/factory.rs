//! Activation of providers
//!
//! An [`Activator`] encapsulates how a provider's instance is produced. It is
//! an enum rather than a trait object so the injector can dispatch on the
//! provider kind exhaustively.
//!
//! Resolved dependencies reach constructors and factories as [`Args`], in the
//! order the provider declared them.

use crate::provider::Dependency;
use crate::{DiError, Injector, Result};
use std::any::Any;
use std::sync::Arc;

/// A type-erased, shared instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Outcome of resolving a token.
#[derive(Clone, Default)]
pub enum Resolved {
    /// Optional lookup that matched nothing
    #[default]
    None,
    /// A single-valued token
    One(Instance),
    /// A multi-valued token (possibly empty)
    Many(Vec<Instance>),
}

impl Resolved {
    /// True for [`Resolved::None`].
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Resolved::None)
    }

    /// Downcast a single value.
    ///
    /// Returns `Ok(None)` for [`Resolved::None`].
    pub fn one<T: Send + Sync + 'static>(&self, context: &str) -> Result<Option<Arc<T>>> {
        match self {
            Resolved::None => Ok(None),
            Resolved::One(instance) => downcast::<T>(instance, context).map(Some),
            Resolved::Many(_) => Err(DiError::type_mismatch::<T>(context)),
        }
    }

    /// Downcast every value of a collection.
    ///
    /// A single value is returned as a one-element collection.
    pub fn many<T: Send + Sync + 'static>(&self, context: &str) -> Result<Vec<Arc<T>>> {
        match self {
            Resolved::None => Ok(Vec::new()),
            Resolved::One(instance) => Ok(vec![downcast::<T>(instance, context)?]),
            Resolved::Many(instances) => instances
                .iter()
                .map(|instance| downcast::<T>(instance, context))
                .collect(),
        }
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolved::None => f.write_str("None"),
            Resolved::One(_) => f.write_str("One(..)"),
            Resolved::Many(items) => write!(f, "Many({})", items.len()),
        }
    }
}

/// Downcast a shared instance to `Arc<T>`.
#[inline]
pub(crate) fn downcast<T: Send + Sync + 'static>(instance: &Instance, context: &str) -> Result<Arc<T>> {
    Arc::clone(instance)
        .downcast::<T>()
        .map_err(|_| DiError::type_mismatch::<T>(context))
}

/// Positional dependencies handed to a constructor or factory.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::{Args, Construct, Result};
/// use std::sync::Arc;
///
/// struct Config { url: String }
///
/// struct Repository { config: Arc<Config>, cache: Option<Arc<String>> }
///
/// impl Construct for Repository {
///     fn construct(args: &Args) -> Result<Self> {
///         Ok(Repository {
///             config: args.get::<Config>(0)?,
///             cache: args.optional::<String>(1)?,
///         })
///     }
/// }
/// ```
pub struct Args {
    owner: String,
    values: Vec<Resolved>,
}

impl Args {
    pub(crate) fn new(owner: impl Into<String>, values: Vec<Resolved>) -> Self {
        Self {
            owner: owner.into(),
            values,
        }
    }

    /// Name of the provider receiving these arguments.
    #[inline]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Number of declared dependencies.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the provider declared no dependencies.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw access to a resolved dependency.
    pub fn raw(&self, index: usize) -> Result<&Resolved> {
        self.values.get(index).ok_or_else(|| DiError::MissingArgument {
            provider: self.owner.clone(),
            index,
        })
    }

    /// A required single dependency.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>> {
        self.raw(index)?
            .one::<T>(&self.context(index))?
            .ok_or_else(|| DiError::MissingArgument {
                provider: self.owner.clone(),
                index,
            })
    }

    /// An optional single dependency.
    pub fn optional<T: Send + Sync + 'static>(&self, index: usize) -> Result<Option<Arc<T>>> {
        self.raw(index)?.one::<T>(&self.context(index))
    }

    /// A multi-valued dependency.
    pub fn all<T: Send + Sync + 'static>(&self, index: usize) -> Result<Vec<Arc<T>>> {
        self.raw(index)?.many::<T>(&self.context(index))
    }

    /// The resolving injector, declared with [`INJECTOR`](crate::INJECTOR).
    pub fn injector(&self, index: usize) -> Result<Injector> {
        let injector = self.get::<Injector>(index)?;
        Ok((*injector).clone())
    }

    fn context(&self, index: usize) -> String {
        format!("{}[{}]", self.owner, index)
    }
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("owner", &self.owner)
            .field("values", &self.values)
            .finish()
    }
}

/// Type-erased constructor of a type provider
pub(crate) type ConstructFn = fn(&Args) -> Result<Instance>;

/// Type-erased factory function
pub(crate) type FactoryFn = Arc<dyn Fn(&Args) -> Result<Instance> + Send + Sync>;

/// How a provider produces its instance.
pub(crate) enum Activator {
    /// Construct a Rust type from its dependencies
    Type {
        type_name: &'static str,
        dependencies: Vec<Dependency>,
        construct: ConstructFn,
    },
    /// Hand out a precomputed value
    Value(Instance),
    /// Call a function with the resolved dependencies
    Factory {
        dependencies: Vec<Dependency>,
        factory: FactoryFn,
    },
}

impl Activator {
    /// Declared dependencies, empty for values.
    #[inline]
    pub(crate) fn dependencies(&self) -> &[Dependency] {
        match self {
            Activator::Type { dependencies, .. } | Activator::Factory { dependencies, .. } => {
                dependencies
            }
            Activator::Value(_) => &[],
        }
    }

    /// Produce the instance from already-resolved arguments.
    #[inline]
    pub(crate) fn activate(&self, args: &Args) -> Result<Instance> {
        match self {
            Activator::Type { construct, .. } => construct(args),
            Activator::Value(value) => Ok(Arc::clone(value)),
            Activator::Factory { factory, .. } => factory(args),
        }
    }
}
