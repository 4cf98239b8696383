//! Packages
//!
//! A [`Package`] groups providers and imports other packages. Loading it turns
//! the import graph into a tree of [`Container`]s.

use crate::{Construct, Container, Provider, ProviderBuilder, Token, TypeKind};
use once_cell::sync::Lazy;
use std::borrow::Cow;

/// Multi-valued token collecting package types registered with
/// [`Package::of_provider`].
pub static PACKAGES: Lazy<Token> = Lazy::new(|| Token::multi("Packages"));

/// A named group of providers and imported packages.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::{Package, Provider, Token};
///
/// let url = Token::new("DatabaseUrl");
///
/// let database = Package::new("database")
///     .provider(Provider::value(url.clone(), "postgres://localhost").build());
/// let app = Package::new("app").import(database);
///
/// let container = app.load();
/// assert_eq!(container.name(), "app");
/// assert!(container.exists(&url));
/// ```
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct Package {
    name: Option<Cow<'static, str>>,
    imports: Vec<Package>,
    providers: Vec<Provider>,
}

/// A Rust type that stands for a package.
///
/// ```rust
/// use scoped_injector::{DefinesPackage, Package};
///
/// struct CorePackage;
///
/// impl DefinesPackage for CorePackage {
///     fn package() -> Package {
///         Package::default()
///     }
/// }
///
/// // Unnamed packages take the short type name.
/// assert_eq!(Package::of::<CorePackage>().name(), Some("CorePackage"));
/// ```
pub trait DefinesPackage: 'static {
    /// Describe the package.
    fn package() -> Package;
}

impl Package {
    /// Create a named, empty package.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// The package a type defines, named after the type unless it names itself.
    pub fn of<P: DefinesPackage>() -> Self {
        let mut package = P::package();
        if package.name.is_none() {
            package.name = Some(Cow::Borrowed(short_type_name::<P>()));
        }
        package
    }

    /// The package a type defines, with the type itself registered as one of
    /// its providers under its own token and [`PACKAGES`].
    ///
    /// `configure` adjusts that provider, e.g. to add a scope, dependencies or
    /// a boot hook.
    pub fn of_provider<P, F>(configure: F) -> Self
    where
        P: DefinesPackage + Construct,
        F: FnOnce(ProviderBuilder<P, TypeKind>) -> ProviderBuilder<P, TypeKind>,
    {
        let provider = configure(Provider::of_type::<P>().token(PACKAGES.clone())).build();
        Self::of::<P>().provider(provider)
    }

    /// Import another package.
    pub fn import(mut self, package: Package) -> Self {
        self.imports.push(package);
        self
    }

    /// Import the package a type defines.
    pub fn import_type<P: DefinesPackage>(self) -> Self {
        self.import(Package::of::<P>())
    }

    /// Register a provider.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Register several providers.
    pub fn providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self
    }

    /// Package name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Imported packages, in declaration order.
    pub fn imports(&self) -> &[Package] {
        &self.imports
    }

    /// Providers registered directly in this package.
    pub fn provider_list(&self) -> &[Provider] {
        &self.providers
    }

    /// Build the container tree: imports are loaded first and become the
    /// parents of this package's container, in import order.
    ///
    /// A package imported twice along different paths is loaded twice.
    pub fn load(&self) -> Container {
        let parents = self.imports.iter().map(Package::load).collect();
        Container::new(parents, self.providers.clone(), self.name())
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    static LEVEL: Lazy<Token> = Lazy::new(|| Token::new("LogLevel"));

    struct LoggingPackage;

    impl DefinesPackage for LoggingPackage {
        fn package() -> Package {
            Package::default().provider(Provider::value(LEVEL.clone(), "info").build())
        }
    }

    struct NamedPackage;

    impl DefinesPackage for NamedPackage {
        fn package() -> Package {
            Package::new("custom")
        }
    }

    #[test]
    fn test_of_uses_type_name() {
        assert_eq!(Package::of::<LoggingPackage>().name(), Some("LoggingPackage"));
        assert_eq!(Package::of::<NamedPackage>().name(), Some("custom"));
    }

    #[test]
    fn test_load_builds_container_per_package() {
        let app = Package::new("app")
            .import_type::<LoggingPackage>()
            .import(Package::new("empty"))
            .provider(Provider::value(Token::new("port"), 80u16).build());

        let container = app.load();
        assert_eq!(container.name(), "app");
        assert_eq!(container.len(), 1);

        let parents: Vec<&str> = container.parents().iter().map(Container::name).collect();
        assert_eq!(parents, vec!["LoggingPackage", "empty"]);
        assert!(container.exists(&LEVEL));
    }

    #[test]
    fn test_unnamed_package_gets_generated_name() {
        let container = Package::default().load();
        assert!(container.name().starts_with("container-"));
    }

    #[test]
    fn test_diamond_import_duplicates_providers() {
        let shared = Package::of::<LoggingPackage>();
        let app = Package::new("app")
            .import(Package::new("left").import(shared.clone()))
            .import(Package::new("right").import(shared));

        assert_eq!(app.load().locate(&LEVEL).len(), 2);
    }

    #[tokio::test]
    async fn test_package_type_is_its_own_bootable_provider() {
        use crate::{Application, Args, BoxError, OnBoot};
        use async_trait::async_trait;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        static GREETED: AtomicUsize = AtomicUsize::new(0);

        struct HelloWorldPackage {
            level: Arc<&'static str>,
        }

        impl DefinesPackage for HelloWorldPackage {
            fn package() -> Package {
                Package::default().import_type::<LoggingPackage>()
            }
        }

        impl Construct for HelloWorldPackage {
            fn construct(args: &Args) -> crate::Result<Self> {
                Ok(HelloWorldPackage { level: args.get(0)? })
            }
        }

        #[async_trait]
        impl OnBoot for HelloWorldPackage {
            async fn boot(&self) -> std::result::Result<(), BoxError> {
                if *self.level == "info" {
                    GREETED.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }
        }

        let package = Package::of_provider::<HelloWorldPackage, _>(|provider| {
            provider.depends_on(LEVEL.clone()).singleton().bootable()
        });
        assert_eq!(package.name(), Some("HelloWorldPackage"));

        let container = package.load();
        assert!(container.exists(&Token::of::<HelloWorldPackage>()));
        assert_eq!(container.locate(&PACKAGES).len(), 1);

        let app = Application::builder(package).build();
        app.boot().await.unwrap();
        assert_eq!(GREETED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
        assert_eq!(short_type_name::<LoggingPackage>(), "LoggingPackage");
    }
}
