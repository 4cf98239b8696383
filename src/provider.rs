//! Provider descriptors
//!
//! A [`Provider`] tells the injector how to produce a value for one or more
//! tokens: by constructing a Rust type, by handing out a fixed value, or by
//! calling a factory. Providers are plain data; the injector does the work.

use crate::boot::{BootCast, DestroyCast, OnBoot, OnDestroy};
use crate::factory::{Activator, Instance};
use crate::scope::PROTOTYPE_SCOPE;
use crate::{Args, BOOTABLE, Result, Token};
use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

/// A dependency slot of a type or factory provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Token to resolve
    pub token: Token,
    /// Resolve to nothing instead of failing when no provider exists
    pub optional: bool,
}

impl Dependency {
    /// A required dependency.
    #[inline]
    pub fn required(token: Token) -> Self {
        Self {
            token,
            optional: false,
        }
    }

    /// An optional dependency.
    #[inline]
    pub fn optional(token: Token) -> Self {
        Self {
            token,
            optional: true,
        }
    }
}

/// A Rust type the injector can build from its declared dependencies.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::{Args, Construct, Result};
/// use std::sync::Arc;
///
/// struct Config { debug: bool }
/// struct Logger { config: Arc<Config> }
///
/// impl Construct for Logger {
///     fn construct(args: &Args) -> Result<Self> {
///         Ok(Logger { config: args.get::<Config>(0)? })
///     }
/// }
/// ```
pub trait Construct: Send + Sync + Sized + 'static {
    /// Build an instance from the resolved dependencies.
    fn construct(args: &Args) -> Result<Self>;
}

/// Provider kind, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Builds a Rust type
    Type,
    /// Returns a precomputed value
    Value,
    /// Calls a function
    Factory,
}

pub(crate) struct ProviderInner {
    name: Cow<'static, str>,
    tokens: Vec<Token>,
    scope: Option<Token>,
    activator: Activator,
    boot: Option<BootCast>,
    destroy: Option<DestroyCast>,
}

/// Descriptor telling the injector how to produce a value.
///
/// Cloning is cheap and keeps identity: the injector caches instances per
/// provider, so two clones share one cache entry.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::{Provider, Token, SINGLETON_SCOPE};
///
/// let url = Token::new("DatabaseUrl");
/// let pool = Token::new("Pool");
///
/// let url_provider = Provider::value(url.clone(), String::from("postgres://localhost")).build();
///
/// let pool_provider = Provider::factory(pool.clone(), |args| {
///         let url = args.get::<String>(0)?;
///         Ok(format!("pool for {url}"))
///     })
///     .depends_on(url)
///     .scope(SINGLETON_SCOPE.clone())
///     .build();
///
/// assert_eq!(pool_provider.tokens(), &[pool]);
/// ```
#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
}

impl Provider {
    /// Start a provider that constructs `T` via [`Construct`].
    ///
    /// `Token::of::<T>()` is always one of its tokens.
    pub fn of_type<T: Construct>() -> ProviderBuilder<T, TypeKind> {
        ProviderBuilder::new(
            Cow::Borrowed(std::any::type_name::<T>()),
            Token::of::<T>(),
            TypeKind {
                construct: construct_erased::<T>,
                dependencies: Vec::new(),
            },
        )
    }

    /// Start a provider that always yields `value`.
    pub fn value<T: Send + Sync + 'static>(token: Token, value: T) -> ProviderBuilder<T, ValueKind> {
        let name = Cow::Owned(token.name().to_owned());
        ProviderBuilder::new(
            name,
            token,
            ValueKind {
                value: Arc::new(value),
            },
        )
    }

    /// Start a provider that calls `factory` with its resolved dependencies.
    pub fn factory<T, F>(token: Token, factory: F) -> ProviderBuilder<T, FactoryKind>
    where
        T: Send + Sync + 'static,
        F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
    {
        let name = Cow::Owned(token.name().to_owned());
        ProviderBuilder::new(
            name,
            token,
            FactoryKind {
                factory: Arc::new(move |args: &Args| factory(args).map(|v| Arc::new(v) as Instance)),
                dependencies: Vec::new(),
            },
        )
    }

    /// Human-readable name used in errors and logs.
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Every token this provider answers.
    #[inline]
    pub fn tokens(&self) -> &[Token] {
        &self.inner.tokens
    }

    /// Declared scope. [`PROTOTYPE_SCOPE`] is reported as-is.
    #[inline]
    pub fn scope(&self) -> Option<&Token> {
        self.inner.scope.as_ref()
    }

    /// Scope that decides which injector caches the instance.
    ///
    /// `None` means the requesting injector activates it afresh.
    #[inline]
    pub(crate) fn owning_scope(&self) -> Option<&Token> {
        self.inner.scope.as_ref().filter(|scope| **scope != *PROTOTYPE_SCOPE)
    }

    /// Provider kind.
    pub fn kind(&self) -> ProviderKind {
        match self.inner.activator {
            Activator::Type { .. } => ProviderKind::Type,
            Activator::Value(_) => ProviderKind::Value,
            Activator::Factory { .. } => ProviderKind::Factory,
        }
    }

    /// Declared dependencies, in argument order.
    #[inline]
    pub fn dependencies(&self) -> &[Dependency] {
        self.inner.activator.dependencies()
    }

    /// Whether boot will run a hook for this provider's instance.
    #[inline]
    pub fn is_bootable(&self) -> bool {
        self.inner.boot.is_some()
    }

    #[inline]
    pub(crate) fn activator(&self) -> &Activator {
        &self.inner.activator
    }

    #[inline]
    pub(crate) fn boot_hook(&self, instance: &Instance) -> Option<Arc<dyn OnBoot>> {
        self.inner.boot.and_then(|cast| cast(instance))
    }

    #[inline]
    pub(crate) fn destroy_hook(&self, instance: &Instance) -> Option<Arc<dyn OnDestroy>> {
        self.inner.destroy.and_then(|cast| cast(instance))
    }

    /// Identity key of this provider.
    #[inline]
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl PartialEq for Provider {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Provider {}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Provider");
        debug
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("tokens", &self.inner.tokens)
            .field("scope", &self.inner.scope);
        if let Activator::Type { type_name, .. } = &self.inner.activator {
            debug.field("type", type_name);
        }
        debug.field("dependencies", &self.dependencies()).finish()
    }
}

fn construct_erased<T: Construct>(args: &Args) -> Result<Instance> {
    T::construct(args).map(|v| Arc::new(v) as Instance)
}

fn boot_cast<T: OnBoot>(instance: &Instance) -> Option<Arc<dyn OnBoot>> {
    Arc::clone(instance)
        .downcast::<T>()
        .ok()
        .map(|v| v as Arc<dyn OnBoot>)
}

fn destroy_cast<T: OnDestroy>(instance: &Instance) -> Option<Arc<dyn OnDestroy>> {
    Arc::clone(instance)
        .downcast::<T>()
        .ok()
        .map(|v| v as Arc<dyn OnDestroy>)
}

// =============================================================================
// Builder
// =============================================================================

/// Kind state of a provider builder.
pub trait BuilderKind: sealed::Activate {}

/// Kinds whose builders accept dependencies.
pub trait WithDependencies: BuilderKind + sealed::Depend {}

mod sealed {
    use crate::factory::Activator;
    use crate::provider::Dependency;

    pub trait Activate {
        fn into_activator(self, type_name: &'static str) -> Activator;
    }

    pub trait Depend {
        fn push(&mut self, dependency: Dependency);
    }
}

/// Builder state for [`Provider::of_type`].
pub struct TypeKind {
    construct: crate::factory::ConstructFn,
    dependencies: Vec<Dependency>,
}

/// Builder state for [`Provider::value`].
pub struct ValueKind {
    value: Instance,
}

/// Builder state for [`Provider::factory`].
pub struct FactoryKind {
    factory: crate::factory::FactoryFn,
    dependencies: Vec<Dependency>,
}

impl sealed::Activate for TypeKind {
    fn into_activator(self, type_name: &'static str) -> Activator {
        Activator::Type {
            type_name,
            dependencies: self.dependencies,
            construct: self.construct,
        }
    }
}

impl sealed::Activate for ValueKind {
    fn into_activator(self, _type_name: &'static str) -> Activator {
        Activator::Value(self.value)
    }
}

impl sealed::Activate for FactoryKind {
    fn into_activator(self, _type_name: &'static str) -> Activator {
        Activator::Factory {
            dependencies: self.dependencies,
            factory: self.factory,
        }
    }
}

impl sealed::Depend for TypeKind {
    fn push(&mut self, dependency: Dependency) {
        self.dependencies.push(dependency);
    }
}

impl sealed::Depend for FactoryKind {
    fn push(&mut self, dependency: Dependency) {
        self.dependencies.push(dependency);
    }
}

impl BuilderKind for TypeKind {}
impl BuilderKind for ValueKind {}
impl BuilderKind for FactoryKind {}
impl WithDependencies for TypeKind {}
impl WithDependencies for FactoryKind {}

/// Fluent builder for a [`Provider`] producing `T`.
#[must_use = "call `build()` to obtain the provider"]
pub struct ProviderBuilder<T, K> {
    name: Cow<'static, str>,
    tokens: Vec<Token>,
    scope: Option<Token>,
    kind: K,
    boot: Option<BootCast>,
    destroy: Option<DestroyCast>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static, K: BuilderKind> ProviderBuilder<T, K> {
    fn new(name: Cow<'static, str>, token: Token, kind: K) -> Self {
        Self {
            name,
            tokens: vec![token],
            scope: None,
            kind,
            boot: None,
            destroy: None,
            _marker: PhantomData,
        }
    }

    /// Also answer `token`. Adding a token twice has no effect.
    pub fn token(mut self, token: Token) -> Self {
        if !self.tokens.contains(&token) {
            self.tokens.push(token);
        }
        self
    }

    /// Also answer every token in `tokens`.
    pub fn tokens(self, tokens: impl IntoIterator<Item = Token>) -> Self {
        tokens.into_iter().fold(self, |builder, token| builder.token(token))
    }

    /// Cache the instance in the nearest injector reporting `scope`.
    pub fn scope(mut self, scope: Token) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Shorthand for the singleton scope.
    pub fn singleton(self) -> Self {
        self.scope(crate::SINGLETON_SCOPE.clone())
    }

    /// Shorthand for the application scope.
    pub fn application(self) -> Self {
        self.scope(crate::APPLICATION_SCOPE.clone())
    }

    /// Override the name used in errors and logs.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Run the instance's destroy hook when its caching injector is destroyed.
    pub fn disposable(mut self) -> Self
    where
        T: OnDestroy,
    {
        self.destroy = Some(destroy_cast::<T>);
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> Provider {
        Provider {
            inner: Arc::new(ProviderInner {
                activator: self.kind.into_activator(std::any::type_name::<T>()),
                name: self.name,
                tokens: self.tokens,
                scope: self.scope,
                boot: self.boot,
                destroy: self.destroy,
            }),
        }
    }
}

impl<T: OnBoot, K: BuilderKind> ProviderBuilder<T, K> {
    /// Register under [`BOOTABLE`] and run `T::boot` when the application boots.
    pub fn bootable(mut self) -> Self {
        self.boot = Some(boot_cast::<T>);
        self.token(BOOTABLE.clone())
    }
}

impl<T: Send + Sync + 'static, K: WithDependencies> ProviderBuilder<T, K> {
    /// Append a required dependency.
    pub fn depends_on(mut self, token: Token) -> Self {
        self.kind.push(Dependency::required(token));
        self
    }

    /// Append an optional dependency.
    pub fn depends_on_optional(mut self, token: Token) -> Self {
        self.kind.push(Dependency::optional(token));
        self
    }

    /// Append a dependency on the canonical token of `D`.
    pub fn depends_on_type<D: ?Sized + 'static>(self) -> Self {
        self.depends_on(Token::of::<D>())
    }
}
