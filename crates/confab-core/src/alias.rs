//! Contact alias resolution.
//!
//! An alias table maps human-readable names to canonical chat-network
//! addresses. Lookups chase chained entries (`a → b`, `b → c` resolves `a`
//! to `c`) and work in both directions; the inverse table is recomputed per
//! call rather than cached.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tracing::warn;

/// Which way to read the alias table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// alias → canonical address.
    Forward,
    /// canonical address → alias.
    Inverse,
}

/// Shared alias table with chained-substitution lookup.
///
/// A lookup that matches no entry returns its input unchanged, so handlers
/// can pass unknown addresses straight through. A cyclic chain stops at the
/// first revisited key instead of looping, with a warning; seeding a cyclic
/// table is a configuration mistake, not a crash.
#[derive(Default)]
pub struct AliasResolver {
    table: RwLock<HashMap<String, String>>,
}

impl AliasResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver seeded from an existing table.
    pub fn from_table(table: HashMap<String, String>) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Inserts or replaces one alias entry.
    pub fn insert(&self, alias: impl Into<String>, address: impl Into<String>) {
        self.table.write().insert(alias.into(), address.into());
    }

    /// Removes one alias entry, returning the address it pointed at.
    pub fn remove(&self, alias: &str) -> Option<String> {
        self.table.write().remove(alias)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Returns true when the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Returns a copy of the current table.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.table.read().clone()
    }

    /// Resolves `name` through the table in the given direction.
    pub fn resolve(&self, name: &str, direction: Direction) -> String {
        let table = self.table.read();
        match direction {
            Direction::Forward => {
                chase(name, |key| table.get(key).map(String::as_str)).to_string()
            }
            Direction::Inverse => {
                let inverse: HashMap<&str, &str> = table
                    .iter()
                    .map(|(alias, address)| (address.as_str(), alias.as_str()))
                    .collect();
                chase(name, |key| inverse.get(key).copied()).to_string()
            }
        }
    }
}

/// Follows chained substitutions until the current value is not a key.
///
/// Stops at the first revisited key so cyclic tables terminate.
fn chase<'a>(start: &'a str, lookup: impl Fn(&str) -> Option<&'a str>) -> &'a str {
    let mut current = start;
    let mut visited: HashSet<&str> = HashSet::new();
    while let Some(next) = lookup(current) {
        if !visited.insert(current) {
            warn!(alias = %start, "alias chain contains a cycle, stopping chase");
            break;
        }
        current = next;
    }
    current
}

impl std::fmt::Debug for AliasResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasResolver")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> AliasResolver {
        AliasResolver::from_table(HashMap::from([
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "c".to_string()),
            ("anthony".to_string(), "5511999999999".to_string()),
        ]))
    }

    #[test]
    fn forward_lookup_follows_chain() {
        assert_eq!(resolver().resolve("a", Direction::Forward), "c");
    }

    #[test]
    fn absent_key_is_identity() {
        assert_eq!(resolver().resolve("nobody", Direction::Forward), "nobody");
        assert_eq!(resolver().resolve("nobody", Direction::Inverse), "nobody");
    }

    #[test]
    fn inverse_lookup_recovers_alias() {
        assert_eq!(
            resolver().resolve("5511999999999", Direction::Inverse),
            "anthony"
        );
    }

    #[test]
    fn inverse_chases_too() {
        // c → b → a when read backwards.
        assert_eq!(resolver().resolve("c", Direction::Inverse), "a");
    }

    #[test]
    fn cyclic_chain_terminates() {
        let resolver = AliasResolver::from_table(HashMap::from([
            ("x".to_string(), "y".to_string()),
            ("y".to_string(), "x".to_string()),
        ]));
        // The chase stops once it would revisit "x"; either member of the
        // cycle is an acceptable stopping point, but it must return.
        let resolved = resolver.resolve("x", Direction::Forward);
        assert!(resolved == "x" || resolved == "y");
    }

    #[test]
    fn insert_and_remove_mutate_table() {
        let resolver = AliasResolver::new();
        resolver.insert("ops", "5511000000000");
        assert_eq!(resolver.resolve("ops", Direction::Forward), "5511000000000");
        assert_eq!(resolver.remove("ops").as_deref(), Some("5511000000000"));
        assert!(resolver.is_empty());
    }
}
