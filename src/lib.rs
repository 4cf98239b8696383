//! # Scoped Injector - Token-Based Dependency Injection for Rust
//!
//! Services are described by [`Provider`]s registered in immutable
//! [`Container`] trees and resolved through a chain of [`Injector`]s, each
//! standing for a scope.
//!
//! ## Features
//!
//! - **Identity tokens** - Keys compare by identity, so two `"Config"` tokens never collide
//! - **Immutable containers** - Shared freely between injectors and threads
//! - **Scoped caching** - A provider is cached by the nearest injector of its scope
//! - **Multi-valued tokens** - Plugin-style collections in registration order
//! - **Cycle detection** - Reports the full path, `A -> B -> A`
//! - **Async boot** - Concurrent `OnBoot` hooks with fail-fast reporting
//! - **Observable** - Optional tracing integration, one span per injector
//!
//! ## Quick Start
//!
//! ```rust
//! use scoped_injector::prelude::*;
//!
//! struct Database {
//!     url: Arc<String>,
//! }
//!
//! impl Construct for Database {
//!     fn construct(args: &Args) -> Result<Self> {
//!         Ok(Database { url: args.get(0)? })
//!     }
//! }
//!
//! let url = Token::new("DatabaseUrl");
//!
//! let container = Container::new(
//!     Vec::new(),
//!     vec![
//!         Provider::value(url.clone(), String::from("postgres://localhost")).build(),
//!         Provider::of_type::<Database>().depends_on(url).singleton().build(),
//!     ],
//!     Some("app"),
//! );
//!
//! let root = Injector::root::<ApplicationScope>(container);
//! let singleton = root.create_child_injector::<SingletonScope>();
//!
//! let db = singleton.get::<Database>(&Token::of::<Database>()).unwrap();
//! assert_eq!(db.url.as_str(), "postgres://localhost");
//!
//! // Cached by the singleton injector
//! let again = singleton.get::<Database>(&Token::of::<Database>()).unwrap();
//! assert!(Arc::ptr_eq(&db, &again));
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use scoped_injector::prelude::*;
//! use scoped_injector::InjectorKind;
//! use once_cell::sync::Lazy;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! static REQUEST: Lazy<Token> = Lazy::new(|| Token::new("RequestScope"));
//! static NEXT: AtomicU32 = AtomicU32::new(0);
//!
//! struct RequestScope;
//!
//! impl InjectorKind for RequestScope {
//!     fn scope() -> Token {
//!         REQUEST.clone()
//!     }
//! }
//!
//! let request_id = Token::new("RequestId");
//! let container = Container::builder()
//!     .provider(
//!         Provider::factory(request_id.clone(), |_| Ok(NEXT.fetch_add(1, Ordering::SeqCst)))
//!             .scope(REQUEST.clone())
//!             .build(),
//!     )
//!     .build();
//!
//! let root = Injector::root::<ApplicationScope>(container);
//! let first = root.create_child_injector::<RequestScope>();
//! let second = root.create_child_injector::<RequestScope>();
//!
//! // One instance per request injector
//! assert_eq!(first.get::<u32>(&request_id).unwrap(), first.get::<u32>(&request_id).unwrap());
//! assert_ne!(first.get::<u32>(&request_id).unwrap(), second.get::<u32>(&request_id).unwrap());
//!
//! // No request injector in the chain
//! assert!(root.get::<u32>(&request_id).is_err());
//! ```

mod application;
mod boot;
mod container;
mod error;
mod factory;
mod injector;
#[cfg(feature = "logging")]
pub mod logging;
mod package;
mod provider;
mod scope;
mod storage;
mod token;

pub use application::*;
pub use boot::*;
pub use container::*;
pub use error::*;
pub use factory::*;
pub use injector::*;
pub use package::*;
pub use provider::*;
pub use scope::*;
pub use token::*;

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ApplicationScope, Args, Construct, Container, DiError, Injector, Provider, Result,
        SingletonScope, Token,
    };
    pub use std::sync::Arc;
}
