//! Session scopes on top of the built-in application and singleton scopes
//!
//! ```bash
//! cargo run --example scoped
//! ```

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scoped_injector::{
    Application, Args, BoxError, Construct, DefinesPackage, InjectorKind, OnBoot, OnDestroy, Package,
    Provider, Result, Token,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

static SESSION_SCOPE: Lazy<Token> = Lazy::new(|| Token::new("SessionScope"));
static PLUGINS: Lazy<Token> = Lazy::new(|| Token::multi("Plugins"));

struct SessionScope;

impl InjectorKind for SessionScope {
    fn scope() -> Token {
        SESSION_SCOPE.clone()
    }
}

struct Server {
    plugins: Vec<Arc<&'static str>>,
}

impl Construct for Server {
    fn construct(args: &Args) -> Result<Self> {
        Ok(Server { plugins: args.all(0)? })
    }
}

#[async_trait]
impl OnBoot for Server {
    async fn boot(&self) -> std::result::Result<(), BoxError> {
        let names: Vec<&str> = self.plugins.iter().map(|p| **p).collect();
        println!("  [Server] listening with plugins {names:?}");
        Ok(())
    }
}

#[async_trait]
impl OnDestroy for Server {
    async fn destroy(&self) -> std::result::Result<(), BoxError> {
        println!("  [Server] stopped");
        Ok(())
    }
}

struct Session {
    id: u32,
}

impl Construct for Session {
    fn construct(_: &Args) -> Result<Self> {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Ok(Session {
            id: NEXT.fetch_add(1, Ordering::SeqCst),
        })
    }
}

struct PluginPackage;

impl DefinesPackage for PluginPackage {
    fn package() -> Package {
        Package::default()
            .provider(Provider::value(PLUGINS.clone(), "auth").build())
            .provider(Provider::value(PLUGINS.clone(), "metrics").build())
    }
}

struct AppPackage;

impl DefinesPackage for AppPackage {
    fn package() -> Package {
        Package::default()
            .import_type::<PluginPackage>()
            .provider(
                Provider::of_type::<Server>()
                    .depends_on(PLUGINS.clone())
                    .singleton()
                    .bootable()
                    .disposable()
                    .named("Server")
                    .build(),
            )
            .provider(Provider::of_type::<Session>().scope(SESSION_SCOPE.clone()).build())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = Application::of::<AppPackage>().debug(true).build();
    println!("{}", app.container().tree());

    app.boot().await?;

    let session_token = Token::of::<Session>();
    for _ in 0..2 {
        let session = app.injector().create_child_injector::<SessionScope>();
        let first = session.get::<Session>(&session_token)?;
        let again = session.get::<Session>(&session_token)?;
        println!(
            "  [Session] {} id={} (same instance: {})",
            session.id(),
            first.id,
            Arc::ptr_eq(&first, &again)
        );
        session.destroy().await?;
    }

    // Sessions cannot be resolved outside a session injector
    if let Err(err) = app.injector().get::<Session>(&session_token) {
        println!("  [App] {err}");
    }

    app.shutdown().await
}
