//! Alias table mapping alternative names to canonical bean names.

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::error::{DiError, DiResult};

/// Registry of bean name aliases.
///
/// Alias chains are allowed (`a3 -> a2 -> a1`) and resolved transitively;
/// chains that would loop back on themselves are rejected at registration
/// time, as is rebinding an alias to a different canonical name.
pub struct AliasRegistry {
    aliases: RwLock<AHashMap<String, String>>,
}

impl Default for AliasRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AliasRegistry {
    pub fn new() -> Self {
        AliasRegistry {
            aliases: RwLock::new(AHashMap::new()),
        }
    }

    /// Register `alias` for the bean (or alias) `name`.
    ///
    /// Registering a name as its own alias removes any previous binding of
    /// that alias instead of storing a self-loop.
    pub fn register_alias(&self, name: &str, alias: &str) -> DiResult<()> {
        let mut aliases = self.aliases.write();
        if alias == name {
            aliases.remove(alias);
            return Ok(());
        }
        if let Some(existing) = aliases.get(alias) {
            if existing == name {
                return Ok(());
            }
            return Err(DiError::store(
                alias,
                format!(
                    "cannot alias '{}': alias is already bound to '{}'",
                    name, existing
                ),
            ));
        }
        // Walking from `name` must never reach `alias`, or resolution loops.
        let mut current = name;
        loop {
            if current == alias {
                return Err(DiError::store(
                    alias,
                    format!("alias chain for '{}' would be circular", name),
                ));
            }
            match aliases.get(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        aliases.insert(alias.to_string(), name.to_string());
        Ok(())
    }

    /// Remove `alias`; returns whether it was registered.
    pub fn remove_alias(&self, alias: &str) -> bool {
        self.aliases.write().remove(alias).is_some()
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.read().contains_key(name)
    }

    /// Follow alias chains to the canonical bean name.
    pub fn canonical_name(&self, name: &str) -> String {
        let aliases = self.aliases.read();
        let mut current = name;
        while let Some(next) = aliases.get(current) {
            current = next;
        }
        current.to_string()
    }

    /// All aliases resolving (directly or transitively) to `name`.
    pub fn aliases_of(&self, name: &str) -> Vec<String> {
        let aliases = self.aliases.read();
        let mut found: Vec<String> = Vec::new();
        let mut frontier = vec![name.to_string()];
        while let Some(target) = frontier.pop() {
            for (alias, bound) in aliases.iter() {
                if *bound == target && !found.contains(alias) {
                    found.push(alias.clone());
                    frontier.push(alias.clone());
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitive_resolution() {
        let registry = AliasRegistry::new();
        registry.register_alias("a1", "a2").unwrap();
        registry.register_alias("a2", "a3").unwrap();
        assert_eq!(registry.canonical_name("a3"), "a1");
        assert_eq!(registry.canonical_name("a1"), "a1");
        let mut aliases = registry.aliases_of("a1");
        aliases.sort();
        assert_eq!(aliases, vec!["a2".to_string(), "a3".to_string()]);
    }

    #[test]
    fn collision_is_rejected() {
        let registry = AliasRegistry::new();
        registry.register_alias("first", "shared").unwrap();
        let err = registry.register_alias("second", "shared").unwrap_err();
        assert!(matches!(err, DiError::DefinitionStore { .. }));
        // Re-registering the same binding is fine.
        registry.register_alias("first", "shared").unwrap();
    }

    #[test]
    fn cycles_are_rejected() {
        let registry = AliasRegistry::new();
        registry.register_alias("a", "b").unwrap();
        registry.register_alias("b", "c").unwrap();
        let err = registry.register_alias("c", "a").unwrap_err();
        assert!(matches!(err, DiError::DefinitionStore { .. }));
    }

    #[test]
    fn self_alias_is_dropped() {
        let registry = AliasRegistry::new();
        registry.register_alias("a", "b").unwrap();
        registry.register_alias("b", "b").unwrap();
        assert!(!registry.is_alias("b"));
    }
}
