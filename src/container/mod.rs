//! The bean container: instance resolution engine and public API.
//!
//! A [`Container`] owns the definition registry, alias table, singleton
//! cache, dependency graph, scope registry, post-processors, and observers.
//! It is cheap to clone (`Arc`-backed) and safe to share across threads.

use std::any::TypeId;
use std::fmt;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Instant;

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};

use crate::alias::AliasRegistry;
use crate::convert::{NoConversion, TypeInfo, ValueConverter};
use crate::definition::BeanDefinition;
use crate::error::{DiError, DiResult};
use crate::graph::DependencyGraph;
use crate::lifecycle::{bean_type_id, downcast_bean, AnyArc, Bean, BeanArc};
use crate::observer::{ContainerObserver, Observers};
use crate::processor::BeanPostProcessor;
use crate::registry::DefinitionRegistry;
use crate::scope::{Scope, ScopeRegistry};
use crate::singleton::SingletonRegistry;

mod create;

/// Prefix distinguishing "the factory bean itself" from "the object the
/// factory produces" for object-producing beans.
pub const FACTORY_PREFIX: char = '&';

/// Dependency injection container.
///
/// Resolves named bean definitions into live, fully-initialized instances:
/// alias and parent-definition resolution, scoped caching, circular-reference
/// handling through early references, autowiring, the ordered lifecycle
/// pipeline, and coordinated teardown.
///
/// # Examples
///
/// ```
/// # fn main() -> wrought_di::DiResult<()> {
/// use std::sync::{Arc, OnceLock};
/// use wrought_di::{Bean, BeanDefinition, BeanValue, Container};
///
/// struct Database { url: String }
/// impl Bean for Database {}
///
/// struct UserService { db: OnceLock<Arc<Database>> }
/// impl Bean for UserService {}
///
/// let container = Container::new();
/// container.register_definition(
///     "database",
///     BeanDefinition::for_type::<Database>()
///         .constructor(|_| Ok(Database { url: "postgres://localhost".into() })),
/// )?;
/// container.register_definition(
///     "userService",
///     BeanDefinition::for_type::<UserService>()
///         .constructor(|_| Ok(UserService { db: OnceLock::new() }))
///         .setter("db", |svc: &UserService, db: Arc<Database>| {
///             let _ = svc.db.set(db);
///         })
///         .property("db", BeanValue::reference("database")),
/// )?;
///
/// let service = container.get_as::<UserService>("userService")?;
/// assert_eq!(service.db.get().unwrap().url, "postgres://localhost");
/// # Ok(())
/// # }
/// ```
pub struct Container {
    pub(crate) inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) definitions: DefinitionRegistry,
    pub(crate) aliases: AliasRegistry,
    pub(crate) singletons: SingletonRegistry,
    pub(crate) graph: DependencyGraph,
    pub(crate) scopes: ScopeRegistry,
    pub(crate) processors: RwLock<Vec<Arc<dyn BeanPostProcessor>>>,
    pub(crate) converter: RwLock<Arc<dyn ValueConverter>>,
    pub(crate) observers: Observers,
    pub(crate) parent: RwLock<Option<Container>>,
    pub(crate) factory_products: Mutex<AHashMap<String, BeanArc>>,
    pub(crate) inner_bean_counter: AtomicUsize,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Container {
            inner: self.inner.clone(),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.inner.definitions.len())
            .field("singletons", &self.inner.singletons.len())
            .field("frozen", &self.inner.definitions.is_frozen())
            .finish()
    }
}

impl Container {
    pub fn new() -> Self {
        Container {
            inner: Arc::new(ContainerInner {
                definitions: DefinitionRegistry::new(),
                aliases: AliasRegistry::new(),
                singletons: SingletonRegistry::new(),
                graph: DependencyGraph::new(),
                scopes: ScopeRegistry::new(),
                processors: RwLock::new(Vec::new()),
                converter: RwLock::new(Arc::new(NoConversion)),
                observers: Observers::new(),
                parent: RwLock::new(None),
                factory_products: Mutex::new(AHashMap::new()),
                inner_bean_counter: AtomicUsize::new(0),
            }),
        }
    }

    // ----- lookup -----

    /// Resolve the bean registered under `name` (or one of its aliases).
    pub fn get(&self, name: &str) -> DiResult<BeanArc> {
        self.do_get(name, None)
    }

    /// Resolve and downcast to the concrete type `T`.
    pub fn get_as<T: Bean>(&self, name: &str) -> DiResult<Arc<T>> {
        let bean = self.get(name)?;
        downcast_bean::<T>(bean).map_err(|_| DiError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Resolve a prototype-scoped bean with explicit constructor arguments,
    /// overriding the definition's configured argument specs.
    pub fn get_with_args(&self, name: &str, args: Vec<AnyArc>) -> DiResult<BeanArc> {
        self.do_get(name, Some(args))
    }

    /// Resolve the unique bean of type `T`.
    ///
    /// Ties among multiple candidates break on the `primary` flag, then on
    /// explicit `order` metadata; remaining ties fail as ambiguous.
    pub fn get_by_type<T: Bean>(&self) -> DiResult<Arc<T>> {
        let name = self.unique_name_for_type(&TypeInfo::of::<T>(), None)?;
        self.get_as::<T>(&name)
    }

    /// Names of local definitions and registered singletons of type `T`,
    /// ignoring autowire-candidate filtering.
    pub fn bean_names_for_type<T: Bean>(&self) -> Vec<String> {
        let target = TypeId::of::<T>();
        let mut names = Vec::new();
        for name in self.inner.definitions.names() {
            if let Ok(merged) = self.merged_definition(&name) {
                if merged.type_info().map(|t| t.id) == Some(target) {
                    names.push(name);
                }
            }
        }
        for name in self.inner.singletons.names() {
            if self.inner.definitions.contains(&name) || names.contains(&name) {
                continue;
            }
            if let Some(bean) = self.inner.singletons.get(&name) {
                if bean_type_id(bean.as_ref()) == target {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Whether `name` is known here or in an ancestor container.
    pub fn contains(&self, name: &str) -> bool {
        let canonical = self.canonical(name);
        if self.inner.singletons.contains(&canonical) || self.inner.definitions.contains(&canonical)
        {
            return true;
        }
        self.parent().map_or(false, |p| p.contains(&canonical))
    }

    /// Whether `name` is known to this container alone.
    pub fn contains_local(&self, name: &str) -> bool {
        let canonical = self.canonical(name);
        self.inner.singletons.contains(&canonical) || self.inner.definitions.contains(&canonical)
    }

    /// Whether resolutions of `name` share one instance.
    pub fn is_singleton(&self, name: &str) -> DiResult<bool> {
        let canonical = self.canonical(name);
        if self.inner.singletons.contains(&canonical) {
            return Ok(true);
        }
        if !self.inner.definitions.contains(&canonical) {
            if let Some(parent) = self.parent() {
                return parent.is_singleton(&canonical);
            }
            return Err(DiError::NotFound(canonical));
        }
        Ok(self.merged_definition(&canonical)?.is_singleton_scoped())
    }

    /// Whether each resolution of `name` yields an independent instance.
    pub fn is_prototype(&self, name: &str) -> DiResult<bool> {
        let canonical = self.canonical(name);
        if self.inner.singletons.contains(&canonical) {
            return Ok(false);
        }
        if !self.inner.definitions.contains(&canonical) {
            if let Some(parent) = self.parent() {
                return parent.is_prototype(&canonical);
            }
            return Err(DiError::NotFound(canonical));
        }
        Ok(self.merged_definition(&canonical)?.is_prototype_scoped())
    }

    /// Declared (or, for registered instances, runtime) type of `name`.
    pub fn type_of(&self, name: &str) -> DiResult<Option<TypeId>> {
        let canonical = self.canonical(name);
        if self.inner.definitions.contains(&canonical) {
            return Ok(self.merged_definition(&canonical)?.type_info().map(|t| t.id));
        }
        if let Some(bean) = self.inner.singletons.get(&canonical) {
            return Ok(Some(bean_type_id(bean.as_ref())));
        }
        if let Some(parent) = self.parent() {
            return parent.type_of(&canonical);
        }
        Err(DiError::NotFound(canonical))
    }

    /// Declared type name from the definition, for diagnostics.
    pub fn declared_type_name(&self, name: &str) -> DiResult<Option<&'static str>> {
        let canonical = self.canonical(name);
        if self.inner.definitions.contains(&canonical) {
            return Ok(self
                .merged_definition(&canonical)?
                .type_info()
                .map(|t| t.name));
        }
        if let Some(parent) = self.parent() {
            return parent.declared_type_name(&canonical);
        }
        Err(DiError::NotFound(canonical))
    }

    /// All aliases resolving to `name`.
    pub fn aliases_of(&self, name: &str) -> Vec<String> {
        self.inner.aliases.aliases_of(name)
    }

    /// Canonical bean name behind `name` (factory prefix stripped, alias
    /// chains followed).
    pub fn canonical(&self, name: &str) -> String {
        let stripped = name.trim_start_matches(FACTORY_PREFIX);
        self.inner.aliases.canonical_name(stripped)
    }

    // ----- configuration -----

    /// Bind `definition` under `name`.
    pub fn register_definition(&self, name: &str, definition: BeanDefinition) -> DiResult<()> {
        self.inner.definitions.register(name, definition)?;
        tracing::trace!(bean = name, "registered definition");
        Ok(())
    }

    /// Remove the definition bound to `name`.
    pub fn remove_definition(&self, name: &str) -> DiResult<()> {
        self.inner.definitions.remove(name)
    }

    /// The raw (unmerged) definition bound to `name`.
    pub fn definition(&self, name: &str) -> DiResult<Arc<BeanDefinition>> {
        self.inner.definitions.get(&self.canonical(name))
    }

    /// Names of all local definitions, in registration order.
    pub fn definition_names(&self) -> Vec<String> {
        self.inner.definitions.names()
    }

    pub fn definition_count(&self) -> usize {
        self.inner.definitions.len()
    }

    /// Whether `name` is taken by a definition, a registered singleton, or
    /// an alias.
    pub fn is_name_in_use(&self, name: &str) -> bool {
        self.inner.definitions.contains(name)
            || self.inner.singletons.contains(name)
            || self.inner.aliases.is_alias(name)
    }

    /// Register `alias` for the bean `name`.
    pub fn register_alias(&self, name: &str, alias: &str) -> DiResult<()> {
        if alias != name
            && (self.inner.definitions.contains(alias) || self.inner.singletons.contains(alias))
        {
            return Err(DiError::store(
                alias,
                format!("cannot alias '{}': name is already bound to a bean", name),
            ));
        }
        self.inner.aliases.register_alias(name, alias)
    }

    /// Remove `alias`; returns whether it was registered.
    pub fn remove_alias(&self, alias: &str) -> bool {
        self.inner.aliases.remove_alias(alias)
    }

    /// Install an externally-built instance as a finished singleton.
    ///
    /// The instance participates in lookups, type matching, and teardown
    /// bookkeeping, but runs no creation pipeline.
    pub fn register_singleton(&self, name: &str, bean: BeanArc) -> DiResult<()> {
        self.inner.singletons.register_singleton(name, bean)
    }

    /// Register a post-processor; processors run in registration order.
    pub fn add_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        self.inner.processors.write().push(processor);
    }

    pub fn post_processor_count(&self) -> usize {
        self.inner.processors.read().len()
    }

    /// Register a custom scope strategy under `scope_name`.
    pub fn register_scope(&self, scope_name: &str, scope: Arc<dyn Scope>) -> DiResult<()> {
        self.inner.scopes.register(scope_name, scope)
    }

    /// Names of registered custom scopes.
    pub fn scope_names(&self) -> Vec<String> {
        self.inner.scopes.names()
    }

    pub fn registered_scope(&self, scope_name: &str) -> Option<Arc<dyn Scope>> {
        self.inner.scopes.get(scope_name)
    }

    /// Record that `dependent` depends on `name` (affects destroy order).
    pub fn register_dependent(&self, name: &str, dependent: &str) {
        self.inner
            .graph
            .register_dependent(&self.canonical(name), &self.canonical(dependent));
    }

    /// Beans depending on `name`, destroyed before it.
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        self.inner.graph.dependents_of(&self.canonical(name))
    }

    /// Beans `name` depends on.
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.inner.graph.dependencies_of(&self.canonical(name))
    }

    /// Explicit in-creation flag control for advanced integration.
    ///
    /// The engine keeps its own markers under the creation lock; flipping a
    /// name off merely suppresses its marker and leaves cycle detection for
    /// that name undefined until re-enabled.
    pub fn set_currently_in_creation(&self, name: &str, in_creation: bool) {
        self.inner
            .singletons
            .set_currently_in_creation(&self.canonical(name), in_creation);
    }

    /// Whether `name` is inside a creation call on any path.
    pub fn is_currently_in_creation(&self, name: &str) -> bool {
        self.inner
            .singletons
            .is_currently_in_creation(&self.canonical(name))
    }

    /// Freeze the definition set; structural mutation fails afterwards.
    pub fn freeze(&self) {
        self.inner.definitions.freeze();
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.definitions.is_frozen()
    }

    /// Eagerly create every non-lazy, non-abstract singleton, in definition
    /// registration order. Freezes the registry first so the definition set
    /// is stable mid-traversal.
    pub fn pre_instantiate_singletons(&self) -> DiResult<()> {
        self.freeze();
        let names = self.inner.definitions.names();
        tracing::debug!(count = names.len(), "pre-instantiating singletons");
        for name in names {
            let merged = self.merged_definition(&name)?;
            if merged.is_abstract() || !merged.is_singleton_scoped() || merged.is_lazy() {
                continue;
            }
            self.get(&name)?;
        }
        Ok(())
    }

    /// Set the parent container consulted on local lookup misses.
    /// Parent chains must be acyclic; a would-be cycle is rejected.
    pub fn set_parent(&self, parent: Container) -> DiResult<()> {
        let mut current = Some(parent.clone());
        while let Some(container) = current {
            if Arc::ptr_eq(&container.inner, &self.inner) {
                return Err(DiError::store(
                    "<container>",
                    "parent chain would form a cycle",
                ));
            }
            current = container.parent();
        }
        *self.inner.parent.write() = Some(parent);
        Ok(())
    }

    pub fn parent(&self) -> Option<Container> {
        self.inner.parent.read().clone()
    }

    /// Replace the literal-value conversion strategy.
    pub fn set_converter(&self, converter: Arc<dyn ValueConverter>) {
        *self.inner.converter.write() = converter;
    }

    /// Register a diagnostic observer.
    pub fn add_observer(&self, observer: Arc<dyn ContainerObserver>) {
        self.inner.observers.add(observer);
    }

    // ----- merged definitions -----

    /// The merged definition for `name`: parent chains composed, child
    /// fields taking precedence, memoized until structural mutation.
    pub fn merged_definition(&self, name: &str) -> DiResult<Arc<BeanDefinition>> {
        let canonical = self.canonical(name);
        let mut chain = Vec::new();
        self.merged_definition_guarded(&canonical, &mut chain)
    }

    fn merged_definition_guarded(
        &self,
        canonical: &str,
        chain: &mut Vec<String>,
    ) -> DiResult<Arc<BeanDefinition>> {
        if let Some(merged) = self.inner.definitions.cached_merged(canonical) {
            return Ok(merged);
        }
        if !self.inner.definitions.contains(canonical) {
            if let Some(parent) = self.parent() {
                return parent.merged_definition(canonical);
            }
            return Err(DiError::NotFound(canonical.to_string()));
        }
        if chain.iter().any(|n| n == canonical) {
            return Err(DiError::store(
                canonical,
                format!("circular parent-definition chain: {}", chain.join(" -> ")),
            ));
        }
        chain.push(canonical.to_string());
        let definition = self.inner.definitions.get(canonical)?;
        let merged = match definition.parent_name() {
            None => Arc::new(definition.flattened()),
            Some(parent_name) => {
                let parent_canonical = self.inner.aliases.canonical_name(parent_name);
                let parent_merged = self.merged_definition_guarded(&parent_canonical, chain)?;
                Arc::new(definition.merged_onto(&parent_merged))
            }
        };
        chain.pop();
        self.inner.definitions.cache_merged(canonical, merged.clone());
        Ok(merged)
    }

    // ----- teardown -----

    /// Destroy all singletons: dependents before their dependencies,
    /// otherwise reverse completion order. Teardown failures are logged and
    /// reported to observers, never propagated.
    pub fn destroy_singletons(&self) {
        tracing::debug!("destroying singletons");
        let names = self.inner.singletons.disposable_names();
        for name in names.iter().rev() {
            self.destroy_singleton(name);
        }
        self.inner.singletons.clear();
        self.inner.graph.clear();
        self.inner.factory_products.lock().clear();
    }

    /// Destroy the singleton `name` (and its dependents first), removing it
    /// from the cache. A later lookup re-creates from the definition.
    pub fn destroy_singleton(&self, name: &str) {
        let canonical = self.canonical(name);
        let dependents = self.inner.graph.remove_dependents_of(&canonical);
        for dependent in dependents {
            self.destroy_singleton(&dependent);
        }
        let handle = self.inner.singletons.take_disposable(&canonical);
        self.inner.singletons.remove(&canonical);
        self.inner.factory_products.lock().remove(&canonical);
        if let Some(handle) = handle {
            self.run_destruction(&canonical, handle.bean, handle.destroy_callback.as_ref());
        }
    }

    /// Apply the teardown pipeline to an externally-held instance of `name`
    /// (typically a prototype, whose destruction is the caller's concern).
    pub fn destroy_bean(&self, name: &str, bean: BeanArc) {
        let callback = self
            .merged_definition(name)
            .ok()
            .and_then(|merged| merged.destroy_callback().cloned());
        self.run_destruction(&self.canonical(name), bean, callback.as_ref());
    }

    /// Evict `name` from its custom scope and run its teardown pipeline.
    pub fn destroy_scoped_bean(&self, name: &str) -> DiResult<()> {
        let canonical = self.canonical(name);
        let merged = self.merged_definition(&canonical)?;
        if merged.is_singleton_scoped() || merged.is_prototype_scoped() {
            return Err(DiError::store(
                canonical,
                "only custom-scoped beans can be destroyed through their scope",
            ));
        }
        let scope_name = merged.scope_name();
        let scope = self
            .inner
            .scopes
            .get(scope_name)
            .ok_or_else(|| DiError::UnknownScope(scope_name.to_string()))?;
        if let Some(bean) = scope.remove(&canonical) {
            self.run_destruction(&canonical, bean, merged.destroy_callback());
        }
        Ok(())
    }

    pub(crate) fn run_destruction(
        &self,
        name: &str,
        bean: BeanArc,
        callback: Option<&crate::definition::LifecycleCallback>,
    ) {
        if let Some(disposable) = bean.disposable() {
            if let Err(error) = disposable.destroy() {
                tracing::warn!(bean = name, error = %error, "destroy callback failed");
                self.inner.observers.destruction_failed(name, error.as_ref());
            }
        }
        if let Some(callback) = callback {
            if let Err(error) = callback.invoke(bean.as_ref()) {
                tracing::warn!(
                    bean = name,
                    method = callback.name(),
                    error = %error,
                    "destroy method failed"
                );
                self.inner.observers.destruction_failed(name, error.as_ref());
            }
        }
        self.inner.observers.bean_destroyed(name);
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        s.push_str("Definitions:\n");
        for name in self.definition_names() {
            if let Ok(merged) = self.merged_definition(&name) {
                s.push_str(&format!("  {}: {:?}\n", name, merged));
            }
        }
        s.push_str("Singletons:\n");
        for name in self.inner.singletons.names() {
            s.push_str(&format!("  {}\n", name));
        }
        s
    }

    // ----- resolution entry point -----

    pub(crate) fn do_get(&self, name: &str, args: Option<Vec<AnyArc>>) -> DiResult<BeanArc> {
        let factory_ref = name.starts_with(FACTORY_PREFIX);
        let canonical = self.canonical(name);

        if !self.inner.observers.has_observers() {
            return self.do_get_inner(&canonical, args, factory_ref);
        }
        self.inner.observers.resolving(&canonical);
        let start = Instant::now();
        let result = self.do_get_inner(&canonical, args, factory_ref);
        match &result {
            Ok(_) => self.inner.observers.resolved(&canonical, start.elapsed()),
            Err(error) => self.inner.observers.creation_failed(&canonical, error),
        }
        result
    }
}
