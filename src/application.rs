//! Application entry point
//!
//! Loads a package, sets up the root and singleton injectors and drives the
//! boot and shutdown lifecycle.

use crate::scope::{ApplicationScope, SingletonScope};
use crate::{Container, DefinesPackage, Injector, Package, Result, boot_all};

#[cfg(feature = "logging")]
use tracing::{debug, info};

/// A loaded application: an application-scoped root injector with a
/// singleton-scoped child.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::{Application, Package, Provider, Token};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> scoped_injector::Result<()> {
/// let greeting = Token::new("Greeting");
/// let package = Package::new("app").provider(Provider::value(greeting.clone(), "hi").build());
///
/// let app = Application::builder(package).debug(true).build();
/// app.boot().await?;
/// assert_eq!(*app.injector().get::<&str>(&greeting)?, "hi");
/// app.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Application {
    container: Container,
    root: Injector,
    singleton: Injector,
}

impl Application {
    /// Start from a package value.
    pub fn builder(package: Package) -> ApplicationBuilder {
        ApplicationBuilder {
            package,
            debug: false,
        }
    }

    /// Start from the package a type defines.
    pub fn of<P: DefinesPackage>() -> ApplicationBuilder {
        Self::builder(Package::of::<P>())
    }

    /// Injector used to resolve application services.
    pub fn injector(&self) -> &Injector {
        &self.singleton
    }

    /// Root injector reporting the application scope.
    pub fn root(&self) -> &Injector {
        &self.root
    }

    /// Container tree loaded from the package.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Boot every bootable provider.
    pub async fn boot(&self) -> Result<()> {
        #[cfg(feature = "logging")]
        info!(target: "scoped_injector", container = self.container.name(), "Starting application");

        boot_all(&self.singleton).await?;

        #[cfg(feature = "logging")]
        info!(target: "scoped_injector", "Application started");
        Ok(())
    }

    /// Destroy the singleton injector, then the root.
    ///
    /// Both are destroyed even if the first fails; the first failure is
    /// returned.
    pub async fn shutdown(&self) -> Result<()> {
        #[cfg(feature = "logging")]
        debug!(target: "scoped_injector", "Shutting down application");

        let singleton = self.singleton.destroy().await;
        let root = self.root.destroy().await;
        singleton.and(root)
    }
}

/// Configures an [`Application`].
#[derive(Debug)]
#[must_use = "call `build()` to load the application"]
pub struct ApplicationBuilder {
    package: Package,
    debug: bool,
}

impl ApplicationBuilder {
    /// Log the loaded container tree at info level.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Load the package and create the injectors.
    pub fn build(self) -> Application {
        let container = self.package.load();

        if self.debug {
            #[cfg(feature = "logging")]
            info!(target: "scoped_injector", tree = %container.tree(), "Loaded containers");
        }

        let root = Injector::root::<ApplicationScope>(container.clone());
        let singleton = root.create_child_injector::<SingletonScope>();

        Application {
            container,
            root,
            singleton,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Args, BoxError, Construct, DiError, OnBoot, OnDestroy, Provider, Token};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static STARTED: AtomicUsize = AtomicUsize::new(0);
    static STOPPED: AtomicUsize = AtomicUsize::new(0);

    struct Server;

    impl Construct for Server {
        fn construct(_: &Args) -> crate::Result<Self> {
            Ok(Server)
        }
    }

    #[async_trait]
    impl OnBoot for Server {
        async fn boot(&self) -> std::result::Result<(), BoxError> {
            STARTED.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl OnDestroy for Server {
        async fn destroy(&self) -> std::result::Result<(), BoxError> {
            STOPPED.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ServerPackage;

    impl DefinesPackage for ServerPackage {
        fn package() -> Package {
            Package::default().provider(
                Provider::of_type::<Server>()
                    .singleton()
                    .bootable()
                    .disposable()
                    .build(),
            )
        }
    }

    #[tokio::test]
    async fn test_boot_and_shutdown() {
        let app = Application::of::<ServerPackage>().debug(true).build();
        assert_eq!(app.container().name(), "ServerPackage");
        assert_eq!(app.injector().parent().map(Injector::id), Some(app.root().id()));

        app.boot().await.unwrap();
        assert_eq!(STARTED.load(Ordering::SeqCst), 1);

        // Booting activated the singleton in the singleton injector.
        let server = app.injector().get::<Server>(&Token::of::<Server>()).unwrap();
        assert_eq!(app.injector().cached_count(), 1);
        drop(server);

        app.shutdown().await.unwrap();
        assert_eq!(STOPPED.load(Ordering::SeqCst), 1);
        assert_eq!(app.injector().cached_count(), 0);
    }

    #[tokio::test]
    async fn test_boot_failure_is_returned() {
        struct Broken;

        #[async_trait]
        impl OnBoot for Broken {
            async fn boot(&self) -> std::result::Result<(), BoxError> {
                Err("port in use".into())
            }
        }

        let package = Package::new("broken").provider(
            Provider::factory(Token::new("Broken"), |_| Ok(Broken))
                .bootable()
                .build(),
        );
        let app = Application::builder(package).build();

        let err = app.boot().await.unwrap_err();
        assert!(matches!(err, DiError::BootFailed { ref provider, .. } if provider == "Broken"));
    }

    #[tokio::test]
    async fn test_application_scoped_lives_in_root() {
        let counter = Arc::new(AtomicUsize::new(0));
        let token = Token::new("Shared");
        let provider = {
            let counter = Arc::clone(&counter);
            Provider::factory(token.clone(), move |_| Ok(counter.fetch_add(1, Ordering::SeqCst)))
                .application()
                .build()
        };
        let app = Application::builder(Package::new("app").provider(provider.clone())).build();

        app.injector().get::<usize>(&token).unwrap();
        app.injector().get::<usize>(&token).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(app.root().is_cached(&provider));
        assert!(!app.injector().is_cached(&provider));
    }
}
