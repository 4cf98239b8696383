//! Scope identities
//!
//! A scope is nothing more than a [`Token`] an injector reports. Providers
//! declaring that token are cached by the nearest injector reporting it.
//! Custom scopes are declared by implementing [`InjectorKind`].

use crate::Token;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide root scope.
pub static APPLICATION_SCOPE: Lazy<Token> = Lazy::new(|| Token::new("ApplicationScope"));

/// One instance per application run, usually the root's direct child.
pub static SINGLETON_SCOPE: Lazy<Token> = Lazy::new(|| Token::new("SingletonScope"));

/// Unscoped marker: providers with this scope are activated afresh by the
/// requesting injector, exactly like providers without a scope.
pub static PROTOTYPE_SCOPE: Lazy<Token> = Lazy::new(|| Token::new("PrototypeScope"));

/// A kind of injector, identified by the scope token it reports.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::{InjectorKind, Token};
/// use once_cell::sync::Lazy;
///
/// static SESSION: Lazy<Token> = Lazy::new(|| Token::new("SessionScope"));
///
/// struct SessionScope;
///
/// impl InjectorKind for SessionScope {
///     fn scope() -> Token {
///         SESSION.clone()
///     }
/// }
/// ```
pub trait InjectorKind: 'static {
    /// Scope token reported by injectors of this kind.
    fn scope() -> Token;

    /// Name used in logs.
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Root injector kind.
#[derive(Debug, Clone, Copy)]
pub struct ApplicationScope;

impl InjectorKind for ApplicationScope {
    fn scope() -> Token {
        APPLICATION_SCOPE.clone()
    }

    fn name() -> &'static str {
        "ApplicationScope"
    }
}

/// Per-run injector kind.
#[derive(Debug, Clone, Copy)]
pub struct SingletonScope;

impl InjectorKind for SingletonScope {
    fn scope() -> Token {
        SINGLETON_SCOPE.clone()
    }

    fn name() -> &'static str {
        "SingletonScope"
    }
}

/// Injector kind for throwaway resolution contexts.
#[derive(Debug, Clone, Copy)]
pub struct PrototypeScope;

impl InjectorKind for PrototypeScope {
    fn scope() -> Token {
        PROTOTYPE_SCOPE.clone()
    }

    fn name() -> &'static str {
        "PrototypeScope"
    }
}

/// Unique injector identifier.
///
/// Each injector gets a unique ID for tracking and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InjectorId(u64);

impl InjectorId {
    /// Generate a new unique ID.
    #[inline]
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for InjectorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InjectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "injector-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_scopes_are_distinct() {
        assert_ne!(ApplicationScope::scope(), SingletonScope::scope());
        assert_ne!(SingletonScope::scope(), PrototypeScope::scope());
        assert_eq!(SingletonScope::scope(), *SINGLETON_SCOPE);
    }

    #[test]
    fn test_custom_scope_default_name() {
        static REQUEST: Lazy<Token> = Lazy::new(|| Token::new("Request"));
        struct RequestScope;
        impl InjectorKind for RequestScope {
            fn scope() -> Token {
                REQUEST.clone()
            }
        }

        assert!(RequestScope::name().ends_with("RequestScope"));
        assert_eq!(RequestScope::scope(), RequestScope::scope());
    }

    #[test]
    fn test_injector_ids_unique() {
        let a = InjectorId::new();
        let b = InjectorId::new();
        assert_ne!(a, b);
        assert!(format!("{}", a).starts_with("injector-"));
    }
}
