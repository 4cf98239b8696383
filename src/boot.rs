//! Boot orchestration and lifecycle hooks
//!
//! Providers that opt in with [`ProviderBuilder::bootable`](crate::ProviderBuilder::bootable)
//! are registered under the reserved multi-valued [`BOOTABLE`] token. Booting
//! resolves that token, launches every hook concurrently and waits for them.
//! The first failure is reported straight away. Hooks that are still running
//! are left to finish.

use crate::error::BoxError;
use crate::factory::Instance;
use crate::{DiError, Injector, Result, Token};
use async_trait::async_trait;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use once_cell::sync::Lazy;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Reserved multi-valued token collecting everything that takes part in boot.
pub static BOOTABLE: Lazy<Token> = Lazy::new(|| Token::multi("Bootable"));

/// Asynchronous startup hook.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::{BoxError, OnBoot};
/// use async_trait::async_trait;
///
/// struct HttpServer;
///
/// #[async_trait]
/// impl OnBoot for HttpServer {
///     async fn boot(&self) -> Result<(), BoxError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait OnBoot: Send + Sync + 'static {
    /// Start the service.
    async fn boot(&self) -> std::result::Result<(), BoxError>;
}

/// Asynchronous teardown hook, run when the caching injector is destroyed.
#[async_trait]
pub trait OnDestroy: Send + Sync + 'static {
    /// Release what the instance holds.
    async fn destroy(&self) -> std::result::Result<(), BoxError>;
}

/// Recovers the boot hook from a type-erased instance
pub(crate) type BootCast = fn(&Instance) -> Option<Arc<dyn OnBoot>>;

/// Recovers the destroy hook from a type-erased instance
pub(crate) type DestroyCast = fn(&Instance) -> Option<Arc<dyn OnDestroy>>;

/// Boot everything registered under [`BOOTABLE`] in `injector`.
///
/// Every hook is spawned on the current tokio runtime before any is awaited.
/// Returns once all hooks succeeded, or as soon as one fails. Hooks still
/// running at that point keep running to completion.
///
/// Instances registered under [`BOOTABLE`] without a boot hook are skipped.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub async fn boot_all(injector: &Injector) -> Result<()> {
    let entries = injector.resolve_entries(&BOOTABLE)?;

    let mut hooks = Vec::with_capacity(entries.len());
    for (provider, instance) in entries {
        match provider.boot_hook(&instance) {
            Some(hook) => hooks.push((provider.name().to_owned(), hook)),
            None => {
                #[cfg(feature = "logging")]
                warn!(
                    target: "scoped_injector",
                    provider = provider.name(),
                    "Bootable provider has no boot hook, skipping"
                );
            }
        }
    }

    #[cfg(feature = "logging")]
    debug!(
        target: "scoped_injector",
        injector = %injector.id(),
        hooks = hooks.len(),
        "Booting"
    );

    #[cfg(feature = "logging")]
    let total = hooks.len();
    // Dropping a join handle detaches its task, so returning early cancels nothing.
    let mut running: FuturesUnordered<_> = hooks
        .into_iter()
        .map(|(provider, hook)| tokio::spawn(async move { hook.boot().await }).map(move |joined| (provider, joined)))
        .collect();

    while let Some((provider, joined)) = running.next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(source)) => {
                #[cfg(feature = "logging")]
                warn!(
                    target: "scoped_injector",
                    provider = provider.as_str(),
                    error = %source,
                    "Boot hook failed"
                );
                return Err(DiError::BootFailed {
                    provider,
                    source: source.into(),
                });
            }
            Err(_panicked) => {
                #[cfg(feature = "logging")]
                warn!(target: "scoped_injector", provider = provider.as_str(), "Boot hook aborted");
                return Err(DiError::BootAborted { provider });
            }
        }
    }

    #[cfg(feature = "logging")]
    debug!(target: "scoped_injector", hooks = total, "Boot completed");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Container, Provider, SingletonScope};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Service {
        delay_ms: u64,
        fail: bool,
        completed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl OnBoot for Service {
        async fn boot(&self) -> std::result::Result<(), BoxError> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            if self.fail {
                return Err("refused to start".into());
            }
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn service(name: &'static str, delay_ms: u64, fail: bool, completed: &Arc<AtomicUsize>) -> Provider {
        Provider::value(
            Token::new(name),
            Service {
                delay_ms,
                fail,
                completed: Arc::clone(completed),
            },
        )
        .bootable()
        .build()
    }

    #[tokio::test]
    async fn test_boot_runs_every_hook() {
        let completed = Arc::new(AtomicUsize::new(0));
        let container = Container::new(
            Vec::new(),
            vec![
                service("a", 5, false, &completed),
                service("b", 1, false, &completed),
            ],
            Some("boot"),
        );
        let injector = Injector::root::<SingletonScope>(container);

        boot_all(&injector).await.unwrap();
        assert_eq!(completed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_boot_failure_does_not_cancel_others() {
        let completed = Arc::new(AtomicUsize::new(0));
        let container = Container::new(
            Vec::new(),
            vec![
                service("slow-1", 50, false, &completed),
                service("broken", 0, true, &completed),
                service("slow-2", 50, false, &completed),
            ],
            None,
        );
        let injector = Injector::root::<SingletonScope>(container);

        let err = boot_all(&injector).await.unwrap_err();
        assert!(matches!(err, DiError::BootFailed { ref provider, .. } if provider == "broken"));

        // Failure is surfaced before the slow hooks finish ...
        assert_eq!(completed.load(Ordering::SeqCst), 0);

        // ... and they still run to completion.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(completed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_instances_without_hook_are_skipped() {
        let completed = Arc::new(AtomicUsize::new(0));
        let plain = Provider::value(Token::new("plain"), 5u32)
            .token(BOOTABLE.clone())
            .build();
        let container = Container::new(
            Vec::new(),
            vec![plain, service("real", 0, false, &completed)],
            None,
        );
        let injector = Injector::root::<SingletonScope>(container);

        boot_all(&injector).await.unwrap();
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_nothing_to_boot() {
        let injector = Injector::root::<SingletonScope>(Container::new(Vec::new(), Vec::new(), None));
        boot_all(&injector).await.unwrap();
    }

    #[tokio::test]
    async fn test_panicking_hook_is_reported() {
        struct Panics;

        #[async_trait]
        impl OnBoot for Panics {
            async fn boot(&self) -> std::result::Result<(), BoxError> {
                panic!("boom");
            }
        }

        let container = Container::new(
            Vec::new(),
            vec![Provider::value(Token::new("panics"), Panics).bootable().build()],
            None,
        );
        let injector = Injector::root::<SingletonScope>(container);

        let err = boot_all(&injector).await.unwrap_err();
        assert!(matches!(err, DiError::BootAborted { ref provider } if provider == "panics"));
    }

    #[tokio::test]
    async fn test_panicking_hook_is_reported_before_slow_sibling() {
        struct Panics;

        #[async_trait]
        impl OnBoot for Panics {
            async fn boot(&self) -> std::result::Result<(), BoxError> {
                panic!("boom");
            }
        }

        let completed = Arc::new(AtomicUsize::new(0));
        let container = Container::new(
            Vec::new(),
            vec![
                service("long-running", 2_000, false, &completed),
                Provider::value(Token::new("panics"), Panics).bootable().build(),
            ],
            None,
        );
        let injector = Injector::root::<SingletonScope>(container);

        let started = tokio::time::Instant::now();
        let err = boot_all(&injector).await.unwrap_err();
        assert!(matches!(err, DiError::BootAborted { ref provider } if provider == "panics"));
        assert!(started.elapsed() < Duration::from_millis(1_000));
        assert_eq!(completed.load(Ordering::SeqCst), 0);
    }
}
