//! Dependency edge tracking for teardown ordering and cycle diagnostics.

use ahash::AHashMap;
use parking_lot::RwLock;

/// Directed dependency edges discovered during bean creation.
///
/// `register_dependent(name, dependent)` records that `dependent` depends on
/// `name`. At teardown, dependents are destroyed before the beans they depend
/// on; during creation, the transitive closure answers explicit `depends_on`
/// cycle checks.
pub struct DependencyGraph {
    /// name -> beans that depend on it
    dependents: RwLock<AHashMap<String, Vec<String>>>,
    /// name -> beans it depends on
    dependencies: RwLock<AHashMap<String, Vec<String>>>,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyGraph {
    pub fn new() -> Self {
        DependencyGraph {
            dependents: RwLock::new(AHashMap::new()),
            dependencies: RwLock::new(AHashMap::new()),
        }
    }

    /// Record that `dependent` depends on `name`.
    pub fn register_dependent(&self, name: &str, dependent: &str) {
        if name == dependent {
            return;
        }
        {
            let mut dependents = self.dependents.write();
            let entry = dependents.entry(name.to_string()).or_default();
            if !entry.iter().any(|d| d == dependent) {
                entry.push(dependent.to_string());
            }
        }
        let mut dependencies = self.dependencies.write();
        let entry = dependencies.entry(dependent.to_string()).or_default();
        if !entry.iter().any(|d| d == name) {
            entry.push(name.to_string());
        }
    }

    /// Beans that directly depend on `name`, in discovery order.
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.dependents
            .read()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Beans `name` directly depends on, in discovery order.
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.dependencies
            .read()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_dependents(&self, name: &str) -> bool {
        self.dependents
            .read()
            .get(name)
            .map_or(false, |d| !d.is_empty())
    }

    /// Whether `candidate` (transitively) depends on `name`.
    pub fn is_dependent(&self, name: &str, candidate: &str) -> bool {
        let dependents = self.dependents.read();
        let mut visited: Vec<&str> = Vec::new();
        let mut frontier: Vec<&str> = vec![name];
        while let Some(current) = frontier.pop() {
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);
            if let Some(direct) = dependents.get(current) {
                for dependent in direct {
                    if dependent == candidate {
                        return true;
                    }
                    frontier.push(dependent);
                }
            }
        }
        false
    }

    /// Take the dependents entry for `name`, removing it from the graph.
    ///
    /// Teardown uses this to recurse without revisiting cyclic edges.
    pub(crate) fn remove_dependents_of(&self, name: &str) -> Vec<String> {
        self.dependents.write().remove(name).unwrap_or_default()
    }

    /// All `(dependent, dependency)` pairs currently recorded.
    pub fn edges(&self) -> Vec<(String, String)> {
        let dependencies = self.dependencies.read();
        let mut edges = Vec::new();
        for (dependent, deps) in dependencies.iter() {
            for dep in deps {
                edges.push((dependent.clone(), dep.clone()));
            }
        }
        edges
    }

    pub fn clear(&self) {
        self.dependents.write().clear();
        self.dependencies.write().clear();
    }
}
