//! Error types for dependency injection

use crate::Token;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by boot and destroy hooks.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Shared, clonable form of a hook error.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Errors that can occur while resolving or managing providers.
///
/// Every error is raised where it is detected and travels unchanged through
/// nested resolutions up to the original caller.
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// A single-valued token matched no provider
    #[error("No provider found for token `{token}`")]
    NoProviderFound { token: String },

    /// A single-valued token matched more than one provider
    #[error("Multiple providers ({count}) found for token `{token}`; mark the token as multiple to collect them")]
    MultipleProviderFound { token: String, count: usize },

    /// A required dependency of a provider resolved to nothing
    #[error("Cannot resolve dependency `{token}` of `{provider}`")]
    NoProviderForDependency { provider: String, token: String },

    /// No injector in the parent chain reports the requested scope
    #[error("No injector with scope `{scope}` found in the injector chain")]
    ScopeNotFound { scope: String },

    /// A provider was re-entered while still activating
    #[error("Cyclic dependency detected: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    /// A resolved instance is not of the requested Rust type
    #[error("Instance resolved for `{context}` is not a `{expected}`")]
    TypeMismatch {
        context: String,
        expected: &'static str,
    },

    /// A constructor asked for a dependency position that was never declared
    #[error("`{provider}` has no dependency at position {index}")]
    MissingArgument { provider: String, index: usize },

    /// A constructor or factory refused to build its instance
    #[error("Failed to create `{provider}`: {reason}")]
    CreationFailed { provider: String, reason: String },

    /// A boot hook failed
    #[error("Boot of `{provider}` failed: {source}")]
    BootFailed {
        provider: String,
        #[source]
        source: SharedError,
    },

    /// A boot task ended without reporting (it panicked)
    #[error("Boot of `{provider}` was aborted before completing")]
    BootAborted { provider: String },

    /// A destroy hook failed
    #[error("Destroy hook of `{provider}` failed: {source}")]
    DestroyFailed {
        provider: String,
        #[source]
        source: SharedError,
    },
}

impl DiError {
    /// Create a NoProviderFound error for a token
    #[inline]
    pub fn no_provider(token: &Token) -> Self {
        Self::NoProviderFound {
            token: token.to_string(),
        }
    }

    /// Create a MultipleProviderFound error
    #[inline]
    pub fn multiple_providers(token: &Token, count: usize) -> Self {
        Self::MultipleProviderFound {
            token: token.to_string(),
            count,
        }
    }

    /// Create a NoProviderForDependency error
    #[inline]
    pub fn no_provider_for_dependency(provider: impl Into<String>, token: &Token) -> Self {
        Self::NoProviderForDependency {
            provider: provider.into(),
            token: token.to_string(),
        }
    }

    /// Create a ScopeNotFound error
    #[inline]
    pub fn scope_not_found(scope: &Token) -> Self {
        Self::ScopeNotFound {
            scope: scope.to_string(),
        }
    }

    /// Create a TypeMismatch error for type `T`
    #[inline]
    pub fn type_mismatch<T: ?Sized + 'static>(context: impl Into<String>) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for the cyclic-dependency variant
    pub fn is_cyclic(&self) -> bool {
        matches!(self, Self::CyclicDependency { .. })
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_path() {
        let err = DiError::CyclicDependency {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "Cyclic dependency detected: A -> B -> A");
        assert!(err.is_cyclic());
    }

    #[test]
    fn test_boot_failure_keeps_source() {
        let source: SharedError = Arc::new(std::io::Error::other("port in use"));
        let err = DiError::BootFailed {
            provider: "WebServer".into(),
            source,
        };
        assert!(err.to_string().contains("port in use"));
        assert!(StdError::source(&err).is_some());

        // Clone shares the same source
        let cloned = err.clone();
        assert_eq!(cloned.to_string(), err.to_string());
    }

    #[test]
    fn test_helpers_use_token_names() {
        let token = Token::new("Database");
        assert_eq!(
            DiError::no_provider(&token).to_string(),
            "No provider found for token `Database`"
        );
        let err = DiError::no_provider_for_dependency("UserService", &token);
        assert!(matches!(
            err,
            DiError::NoProviderForDependency { ref provider, ref token }
                if provider == "UserService" && token == "Database"
        ));
    }
}
