//! Immutable provider registry
//!
//! A `Container` indexes providers by token and may sit on top of any number
//! of parent containers. Once built it never changes, so it can be shared by
//! every injector and thread without synchronization.

use crate::{Provider, Token};
use ahash::RandomState;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

struct ContainerInner {
    name: String,
    parents: Vec<Container>,
    /// Token -> providers, in registration order
    index: HashMap<Token, Vec<Provider>, RandomState>,
    provider_count: usize,
}

/// Immutable, tree-structured provider registry.
///
/// Lookups gather the providers registered here first, then those of each
/// parent container in declaration order, recursively.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::{Container, Provider, Token};
///
/// let greeting = Token::new("Greeting");
///
/// let base = Container::new(
///     Vec::new(),
///     vec![Provider::value(greeting.clone(), "hello").build()],
///     Some("base"),
/// );
/// let app = Container::builder().name("app").parent(base).build();
///
/// assert!(app.exists(&greeting));
/// assert_eq!(app.locate(&greeting).len(), 1);
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Build a container from its parents and its own providers.
    ///
    /// Every provider is indexed under every one of its tokens. Without a
    /// name, a unique `container-N` name is generated.
    pub fn new(parents: Vec<Container>, providers: Vec<Provider>, name: Option<&str>) -> Self {
        let name = name.map(str::to_owned).unwrap_or_else(generate_name);

        let mut index: HashMap<Token, Vec<Provider>, RandomState> =
            HashMap::with_capacity_and_hasher(providers.len(), RandomState::new());
        for provider in &providers {
            for token in provider.tokens() {
                index.entry(token.clone()).or_default().push(provider.clone());
            }
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "scoped_injector",
            container = name.as_str(),
            providers = providers.len(),
            tokens = index.len(),
            parents = parents.len(),
            "Built container"
        );

        Self {
            inner: Arc::new(ContainerInner {
                name,
                parents,
                index,
                provider_count: providers.len(),
            }),
        }
    }

    /// Start a fluent container definition.
    #[inline]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    /// Container name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Parent containers, in declaration order.
    #[inline]
    pub fn parents(&self) -> &[Container] {
        &self.inner.parents
    }

    /// Number of providers registered directly in this container.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.provider_count
    }

    /// Whether this container registers no providers itself.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.provider_count == 0
    }

    /// Whether any provider in this container or its parents answers `token`.
    pub fn exists(&self, token: &Token) -> bool {
        self.inner.index.contains_key(token) || self.inner.parents.iter().any(|p| p.exists(token))
    }

    /// Every provider answering `token`: local ones first, then each parent's
    /// in declaration order.
    pub fn locate(&self, token: &Token) -> Vec<Provider> {
        let mut found = Vec::new();
        self.collect(token, &mut found);

        #[cfg(feature = "logging")]
        trace!(
            target: "scoped_injector",
            container = self.name(),
            token = token.name(),
            found = found.len(),
            "Located providers"
        );

        found
    }

    fn collect(&self, token: &Token, found: &mut Vec<Provider>) {
        if let Some(local) = self.inner.index.get(token) {
            found.extend(local.iter().cloned());
        }
        for parent in &self.inner.parents {
            parent.collect(token, found);
        }
    }

    /// Render the container tree, one line per container.
    ///
    /// ```text
    /// app (2 providers, 3 tokens)
    ///   base (1 providers, 1 tokens)
    /// ```
    pub fn tree(&self) -> String {
        let mut out = String::new();
        self.render(0, &mut out);
        out
    }

    fn render(&self, depth: usize, out: &mut String) {
        let _ = writeln!(
            out,
            "{:indent$}{} ({} providers, {} tokens)",
            "",
            self.name(),
            self.len(),
            self.inner.index.len(),
            indent = depth * 2
        );
        for parent in &self.inner.parents {
            parent.render(depth + 1, out);
        }
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name())
            .field("provider_count", &self.len())
            .field("token_count", &self.inner.index.len())
            .field("parents", &self.inner.parents.len())
            .finish()
    }
}

fn generate_name() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    format!("container-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Fluent builder for [`Container`].
#[derive(Default)]
#[must_use = "call `build()` to obtain the container"]
pub struct ContainerBuilder {
    name: Option<String>,
    parents: Vec<Container>,
    providers: Vec<Provider>,
}

impl ContainerBuilder {
    /// Set the container name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a parent container
    pub fn parent(mut self, parent: Container) -> Self {
        self.parents.push(parent);
        self
    }

    /// Register a provider
    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Register several providers
    pub fn providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self
    }

    /// Index everything and freeze the container
    pub fn build(self) -> Container {
        Container::new(self.parents, self.providers, self.name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(token: &Token, v: &'static str) -> Provider {
        Provider::value(token.clone(), v).build()
    }

    #[test]
    fn test_empty_container() {
        let container = Container::new(Vec::new(), Vec::new(), None);
        let token = Token::new("anything");

        assert!(!container.exists(&token));
        assert!(container.locate(&token).is_empty());
        assert!(container.is_empty());
        assert!(container.name().starts_with("container-"));
    }

    #[test]
    fn test_named_container() {
        let container = Container::new(Vec::new(), Vec::new(), Some("MyContainer"));
        assert_eq!(container.name(), "MyContainer");
    }

    #[test]
    fn test_exists_local_and_parent() {
        let token = Token::new("provider");
        let parent = Container::new(Vec::new(), vec![value(&token, "p")], None);
        let child = Container::new(vec![parent.clone()], Vec::new(), None);

        assert!(parent.exists(&token));
        assert!(child.exists(&token));
        assert!(!child.exists(&Token::new("provider")));
    }

    #[test]
    fn test_locate_returns_same_provider() {
        let token = Token::new("provider");
        let provider = value(&token, "p");
        let container = Container::new(Vec::new(), vec![provider.clone()], None);

        assert_eq!(container.locate(&token), vec![provider]);
    }

    #[test]
    fn test_locate_local_before_parents_in_order() {
        let token = Token::new("provider");
        let local = value(&token, "local");
        let first = value(&token, "first");
        let second = value(&token, "second");
        let grand = value(&token, "grand");

        let grandparent = Container::new(Vec::new(), vec![grand.clone()], None);
        let parent_a = Container::new(vec![grandparent], vec![first.clone()], None);
        let parent_b = Container::new(Vec::new(), vec![second.clone()], None);
        let child = Container::new(vec![parent_a, parent_b], vec![local.clone()], None);

        let found = child.locate(&token);
        assert_eq!(found, vec![local, first, grand, second]);

        // Deterministic across calls
        assert_eq!(child.locate(&token), found);
    }

    #[test]
    fn test_provider_indexed_under_every_token() {
        let a = Token::new("a");
        let b = Token::new("b");
        let provider = Provider::value(a.clone(), 1u8).token(b.clone()).build();
        let container = Container::new(Vec::new(), vec![provider.clone()], None);

        assert_eq!(container.locate(&a), vec![provider.clone()]);
        assert_eq!(container.locate(&b), vec![provider]);
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_builder_and_tree() {
        let token = Token::new("t");
        let base = Container::builder().name("base").provider(value(&token, "x")).build();
        let app = Container::builder()
            .name("app")
            .parent(base)
            .providers([value(&token, "y"), value(&Token::new("u"), "z")])
            .build();

        assert_eq!(app.parents().len(), 1);
        assert_eq!(app.tree(), "app (2 providers, 2 tokens)\n  base (1 providers, 1 tokens)\n");
    }
}
