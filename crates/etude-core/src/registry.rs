//! Resolver registry.
//!
//! Maps resolver names to resolvers. Written only during startup (through
//! `&mut`), then frozen behind an `Arc` and shared read-only with the
//! dispatcher for the life of the process.
//!
//! # Example
//!
//! ```rust,ignore
//! use etude_core::prelude::*;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register(Resolver::new("ping", |_ctx: RequestContext| async {
//!     Ok::<_, ResolverError>("pong")
//! }))?;
//!
//! let ping = registry.lookup("ping")?;
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::{DuplicateHandlerError, RegisterError, UnknownHandlerError};
use crate::resolver::Resolver;

/// Registry mapping resolver names to resolvers.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    resolvers: HashMap<String, Resolver>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    /// Register a resolver under its name.
    ///
    /// Fails if the name is empty or already taken, whether or not the
    /// resolvers are the same.
    pub fn register(&mut self, resolver: Resolver) -> Result<(), RegisterError> {
        if resolver.name().is_empty() {
            return Err(RegisterError::EmptyName);
        }

        match self.resolvers.entry(resolver.name().to_string()) {
            Entry::Occupied(entry) => Err(DuplicateHandlerError {
                name: entry.key().clone(),
            }
            .into()),
            Entry::Vacant(entry) => {
                tracing::trace!(resolver = %entry.key(), gated = resolver.requirement().is_some(), "registered resolver");
                entry.insert(resolver);
                Ok(())
            }
        }
    }

    /// Look up a resolver by name.
    pub fn lookup(&self, name: &str) -> Result<&Resolver, UnknownHandlerError> {
        self.resolvers.get(name).ok_or_else(|| UnknownHandlerError {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Iterate over registered resolvers in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Resolver> {
        self.resolvers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolverError;
    use crate::gate::require_identity;
    use crate::resolver::RequestContext;

    fn constant(name: &str, value: i64) -> Resolver {
        Resolver::new(name, move |_ctx: RequestContext| async move {
            Ok::<_, ResolverError>(value)
        })
    }

    #[test]
    fn test_register_distinct_names() {
        let mut registry = HandlerRegistry::new();

        registry.register(constant("first", 1)).unwrap();
        registry.register(constant("second", 2)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["first", "second"]);
    }

    #[test]
    fn test_register_duplicate_fails() {
        let mut registry = HandlerRegistry::new();
        registry.register(constant("foo", 1)).unwrap();

        let err = registry.register(constant("foo", 2)).unwrap_err();
        assert_eq!(
            err,
            RegisterError::Duplicate(DuplicateHandlerError { name: "foo".into() })
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_same_resolver_twice_fails() {
        let mut registry = HandlerRegistry::new();
        let foo = constant("foo", 1);

        registry.register(foo.clone()).unwrap();
        assert!(matches!(
            registry.register(foo),
            Err(RegisterError::Duplicate(_))
        ));
    }

    #[test]
    fn test_register_empty_name_fails() {
        let mut registry = HandlerRegistry::new();
        assert_eq!(
            registry.register(constant("", 1)),
            Err(RegisterError::EmptyName)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_lookup_returns_registered_resolver() {
        let mut registry = HandlerRegistry::new();
        let foo = constant("foo", 1);
        registry.register(foo.clone()).unwrap();

        let found = registry.lookup("foo").unwrap();
        assert!(found.same_callable(&foo));
        assert!(registry.contains("foo"));
    }

    #[test]
    fn test_lookup_unknown_fails() {
        let registry = HandlerRegistry::new();

        let err = registry.lookup("doesNotExist").unwrap_err();
        assert_eq!(err.name, "doesNotExist");
    }

    #[test]
    fn test_gated_resolver_keeps_requirement_in_registry() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(require_identity("admin").wrap(constant("secret", 42)))
            .unwrap();

        let found = registry.lookup("secret").unwrap();
        assert_eq!(found.requirement(), Some("admin"));
    }
}
