//! Scoped resolver
//!
//! An [`Injector`] resolves tokens against its [`Container`], activating and
//! caching instances. Injectors form a chain through their parents; a provider
//! with a declared scope is cached by the nearest injector in that chain whose
//! scope token matches.
//!
//! Activation is serialized per injector with a re-entrant lock, so nested
//! resolutions on the same thread go through while other threads wait. Cached
//! hits are answered from a lock-free map without touching the lock.

use crate::factory::{Activator, Args, Instance, Resolved, downcast};
use crate::scope::{InjectorId, InjectorKind};
use crate::storage::InstanceCache;
use crate::{Container, DiError, INJECTOR, Provider, Result, Token};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{Span, debug, debug_span, trace};

struct InjectorInner {
    id: InjectorId,
    kind: &'static str,
    scope: Token,
    container: Container,
    parent: Option<Injector>,
    instances: InstanceCache,
    /// Providers currently being activated by this injector, outermost first
    activating: ReentrantMutex<RefCell<Vec<Provider>>>,
    #[cfg(feature = "logging")]
    span: Span,
}

/// Stateful, scoped resolver bound to a container.
///
/// Cloning yields another handle to the same injector.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::{Container, Injector, Provider, SingletonScope, Token};
///
/// let port = Token::new("Port");
/// let container = Container::new(Vec::new(), vec![Provider::value(port.clone(), 8080u16).build()], None);
///
/// let injector = Injector::root::<SingletonScope>(container);
/// assert_eq!(*injector.get::<u16>(&port).unwrap(), 8080);
/// ```
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

impl Injector {
    /// Create a root injector of kind `K`.
    pub fn root<K: InjectorKind>(container: Container) -> Self {
        Self::create(container, None, K::scope(), K::name())
    }

    /// Create a root injector reporting an arbitrary scope token.
    pub fn root_with_scope(container: Container, scope: Token) -> Self {
        Self::create(container, None, scope, "Injector")
    }

    /// Create a child injector of kind `K`, bound to the same container and
    /// with `self` as parent. This is how a new scope enters the chain.
    pub fn create_child_injector<K: InjectorKind>(&self) -> Self {
        Self::create(self.inner.container.clone(), Some(self.clone()), K::scope(), K::name())
    }

    /// Create a child injector reporting an arbitrary scope token.
    pub fn create_child_with_scope(&self, scope: Token) -> Self {
        Self::create(self.inner.container.clone(), Some(self.clone()), scope, "Injector")
    }

    fn create(container: Container, parent: Option<Injector>, scope: Token, kind: &'static str) -> Self {
        let id = InjectorId::new();

        #[cfg(feature = "logging")]
        let span = {
            let parent_span = parent.as_ref().and_then(|p| p.inner.span.id());
            let span = debug_span!(
                target: "scoped_injector",
                parent: parent_span,
                "injector",
                id = id.id(),
                scope = scope.name()
            );
            span.in_scope(|| {
                debug!(
                    target: "scoped_injector",
                    kind,
                    container = container.name(),
                    has_parent = parent.is_some(),
                    "Creating injector"
                )
            });
            span
        };

        Self {
            inner: Arc::new(InjectorInner {
                id,
                kind,
                scope,
                container,
                parent,
                instances: InstanceCache::new(),
                activating: ReentrantMutex::new(RefCell::new(Vec::new())),
                #[cfg(feature = "logging")]
                span,
            }),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Scope token this injector reports.
    #[inline]
    pub fn scope(&self) -> &Token {
        &self.inner.scope
    }

    /// Unique id.
    #[inline]
    pub fn id(&self) -> InjectorId {
        self.inner.id
    }

    /// Kind name used in logs.
    #[inline]
    pub fn kind(&self) -> &'static str {
        self.inner.kind
    }

    /// Bound container.
    #[inline]
    pub fn container(&self) -> &Container {
        &self.inner.container
    }

    /// Parent injector, if any.
    #[inline]
    pub fn parent(&self) -> Option<&Injector> {
        self.inner.parent.as_ref()
    }

    /// Number of instances cached by this injector.
    #[inline]
    pub fn cached_count(&self) -> usize {
        self.inner.instances.len()
    }

    /// Whether this injector holds a cached instance of `provider`.
    #[inline]
    pub fn is_cached(&self, provider: &Provider) -> bool {
        self.inner.instances.contains(provider)
    }

    /// Providers answering `token` in the bound container.
    #[inline]
    pub fn locate(&self, token: &Token) -> Vec<Provider> {
        self.inner.container.locate(token)
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve `token` without downcasting.
    ///
    /// Multi-valued tokens always yield [`Resolved::Many`], possibly empty.
    /// Single-valued tokens need exactly one provider; with `allow_null` a
    /// missing provider yields [`Resolved::None`] instead of an error.
    pub fn resolve(&self, token: &Token, allow_null: bool) -> Result<Resolved> {
        if *token == *INJECTOR {
            return Ok(Resolved::One(Arc::new(self.clone()) as Instance));
        }

        let providers = self.matching_providers(token, allow_null)?;
        let mut instances = providers
            .iter()
            .map(|provider| self.resolve_provider(provider))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(feature = "logging")]
        trace!(
            target: "scoped_injector",
            parent: &self.inner.span,
            token = token.name(),
            resolved = instances.len(),
            "Resolved token"
        );

        Ok(if token.is_multiple() {
            Resolved::Many(instances)
        } else {
            instances.pop().map_or(Resolved::None, Resolved::One)
        })
    }

    /// Resolve a single-valued token to `T`.
    pub fn get<T: Send + Sync + 'static>(&self, token: &Token) -> Result<Arc<T>> {
        match self.resolve(token, false)? {
            Resolved::One(instance) => downcast::<T>(&instance, token.name()),
            _ => Err(DiError::type_mismatch::<T>(token.name())),
        }
    }

    /// Resolve a single-valued token to `T`, or `None` when nothing provides it.
    pub fn try_get<T: Send + Sync + 'static>(&self, token: &Token) -> Result<Option<Arc<T>>> {
        self.resolve(token, true)?.one::<T>(token.name())
    }

    /// Resolve every provider of a token, in registration order.
    pub fn get_all<T: Send + Sync + 'static>(&self, token: &Token) -> Result<Vec<Arc<T>>> {
        self.resolve(token, false)?.many::<T>(token.name())
    }

    /// Resolve a token and keep each instance paired with its provider.
    pub(crate) fn resolve_entries(&self, token: &Token) -> Result<Vec<(Provider, Instance)>> {
        self.matching_providers(token, true)?
            .into_iter()
            .map(|provider| {
                let instance = self.resolve_provider(&provider)?;
                Ok((provider, instance))
            })
            .collect()
    }

    /// Locate providers and enforce cardinality before anything is activated.
    fn matching_providers(&self, token: &Token, allow_null: bool) -> Result<Vec<Provider>> {
        let providers = self.inner.container.locate(token);
        if !token.is_multiple() {
            match providers.len() {
                0 if !allow_null => return Err(DiError::no_provider(token)),
                0 | 1 => {}
                count => return Err(DiError::multiple_providers(token, count)),
            }
        }
        Ok(providers)
    }

    /// Route a provider to the injector owning its scope.
    fn resolve_provider(&self, provider: &Provider) -> Result<Instance> {
        match provider.owning_scope() {
            None => self.activate(provider),
            Some(scope) => {
                let owner = self
                    .locate_injector(scope)
                    .ok_or_else(|| DiError::scope_not_found(scope))?;
                owner.cached_or_activate(provider)
            }
        }
    }

    /// Nearest injector, starting with `self`, that reports `scope`.
    pub fn locate_injector(&self, scope: &Token) -> Option<&Injector> {
        let mut current = Some(self);
        while let Some(injector) = current {
            if injector.inner.scope == *scope {
                return Some(injector);
            }
            current = injector.inner.parent.as_ref();
        }
        None
    }

    fn cached_or_activate(&self, provider: &Provider) -> Result<Instance> {
        if let Some(instance) = self.inner.instances.get(provider) {
            return Ok(instance);
        }

        // Another thread may have finished the activation while we waited.
        let _serial = self.inner.activating.lock();
        if let Some(instance) = self.inner.instances.get(provider) {
            return Ok(instance);
        }
        self.activate(provider)
    }

    /// Produce an instance of `provider` in this injector and cache it here.
    fn activate(&self, provider: &Provider) -> Result<Instance> {
        let instance = match provider.activator() {
            Activator::Value(value) => Arc::clone(value),
            activator => {
                let state = self.inner.activating.lock();
                let _frame = ActivationFrame::enter(&state, provider)?;

                #[cfg(feature = "logging")]
                debug!(
                    target: "scoped_injector",
                    parent: &self.inner.span,
                    provider = provider.name(),
                    kind = ?provider.kind(),
                    "Activating provider"
                );

                let args = self.resolve_dependencies(provider)?;
                activator.activate(&args)?
            }
        };

        self.inner.instances.insert(provider, Arc::clone(&instance));
        Ok(instance)
    }

    fn resolve_dependencies(&self, provider: &Provider) -> Result<Args> {
        let values = provider
            .dependencies()
            .iter()
            .map(|dependency| {
                let resolved = self.resolve(&dependency.token, true)?;
                if resolved.is_none() && !dependency.optional {
                    return Err(DiError::no_provider_for_dependency(provider.name(), &dependency.token));
                }
                Ok(resolved)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Args::new(provider.name(), values))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Drop every cached instance and run the destroy hooks of disposable
    /// providers, newest activation first.
    ///
    /// Every hook runs even if an earlier one fails; the first failure is
    /// returned. Ancestors and descendants are not affected.
    pub async fn destroy(&self) -> Result<()> {
        let drained = {
            let _serial = self.inner.activating.lock();
            self.inner.instances.drain()
        };

        #[cfg(feature = "logging")]
        debug!(
            target: "scoped_injector",
            parent: &self.inner.span,
            released = drained.len(),
            "Destroying injector"
        );

        let mut first_error = None;
        for entry in drained {
            let Some(hook) = entry.provider.destroy_hook(&entry.instance) else {
                continue;
            };
            if let Err(source) = hook.destroy().await {
                #[cfg(feature = "logging")]
                tracing::warn!(
                    target: "scoped_injector",
                    provider = entry.provider.name(),
                    error = %source,
                    "Destroy hook failed"
                );
                first_error.get_or_insert(DiError::DestroyFailed {
                    provider: entry.provider.name().to_owned(),
                    source: source.into(),
                });
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("scope", &self.inner.scope)
            .field("container", &self.inner.container.name())
            .field("parent", &self.inner.parent.as_ref().map(|p| p.inner.id))
            .field("cached", &self.inner.instances.len())
            .finish()
    }
}

/// Marks a provider as activating for as long as the frame lives.
struct ActivationFrame<'a> {
    stack: &'a RefCell<Vec<Provider>>,
}

impl<'a> ActivationFrame<'a> {
    fn enter(stack: &'a RefCell<Vec<Provider>>, provider: &Provider) -> Result<Self> {
        let mut active = stack.borrow_mut();
        if let Some(start) = active.iter().position(|p| p == provider) {
            let mut path: Vec<String> = active[start..].iter().map(|p| p.name().to_owned()).collect();
            path.push(provider.name().to_owned());
            return Err(DiError::CyclicDependency { path });
        }
        active.push(provider.clone());
        Ok(Self { stack })
    }
}

impl Drop for ActivationFrame<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}
