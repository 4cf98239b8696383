//! Identity-compared tokens
//!
//! A [`Token`] is the key used to ask an injector for something. Two tokens
//! are equal only when they are the same token; the name is for humans.

use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::borrow::Cow;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

struct TokenInner {
    name: Cow<'static, str>,
    multiple: bool,
}

/// Opaque key identifying a value in the injector.
///
/// Cloning a token is cheap and yields the *same* token. Creating a new token
/// with the same name yields a *different* one.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::Token;
///
/// let a = Token::new("Config");
/// let b = Token::new("Config");
///
/// assert_eq!(a, a.clone());
/// assert_ne!(a, b);
/// ```
#[derive(Clone)]
pub struct Token(Arc<TokenInner>);

impl Token {
    /// Create a single-valued token: at most one provider may answer it.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(Arc::new(TokenInner {
            name: name.into(),
            multiple: false,
        }))
    }

    /// Create a multi-valued token: every registered provider answers it,
    /// in registration order.
    pub fn multi(name: impl Into<Cow<'static, str>>) -> Self {
        Self(Arc::new(TokenInner {
            name: name.into(),
            multiple: true,
        }))
    }

    /// The canonical token of a Rust type.
    ///
    /// Repeated calls for the same `T` return the same token, so a type can
    /// be used as its own key.
    ///
    /// The token of [`Injector`](crate::Injector) is [`INJECTOR`].
    pub fn of<T: ?Sized + 'static>() -> Self {
        if TypeId::of::<T>() == TypeId::of::<crate::Injector>() {
            return INJECTOR.clone();
        }
        TYPE_TOKENS
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Token::new(std::any::type_name::<T>()))
            .clone()
    }

    /// Descriptive name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Whether the token resolves to a collection.
    #[inline]
    pub fn is_multiple(&self) -> bool {
        self.0.multiple
    }

    #[inline]
    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Token {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Token {}

impl Hash for Token {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("name", &self.name())
            .field("multiple", &self.is_multiple())
            .finish()
    }
}

static TYPE_TOKENS: Lazy<DashMap<TypeId, Token, RandomState>> =
    Lazy::new(|| DashMap::with_hasher(RandomState::new()));

/// Reserved token that resolves to the injector performing the resolution.
///
/// Also the canonical type token of [`Injector`](crate::Injector).
pub static INJECTOR: Lazy<Token> = Lazy::new(|| Token::new("Injector"));

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_not_name() {
        let a = Token::new("same");
        let b = Token::new("same");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(b.clone());
        set.insert(a.clone());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_multiplicity() {
        assert!(!Token::new("one").is_multiple());
        assert!(Token::multi("many").is_multiple());
    }

    #[test]
    fn test_type_tokens_are_canonical() {
        struct Database;
        struct Cache;

        assert_eq!(Token::of::<Database>(), Token::of::<Database>());
        assert_ne!(Token::of::<Database>(), Token::of::<Cache>());
        assert!(Token::of::<Database>().name().ends_with("Database"));
    }

    #[test]
    fn test_reserved_token_is_stable() {
        let first: Token = INJECTOR.clone();
        assert_eq!(first, *INJECTOR);
        assert_eq!(format!("{}", first), "Injector");
    }

    #[test]
    fn test_injector_type_token_is_reserved_token() {
        assert_eq!(Token::of::<crate::Injector>(), *INJECTOR);
        assert_eq!(Token::of::<crate::Injector>().name(), "Injector");
    }
}
