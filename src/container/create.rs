//! Bean creation pipeline: instantiation, early-reference publication,
//! property population and autowiring, and the ordered lifecycle pipeline.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::container::{Container, FACTORY_PREFIX};
use crate::convert::TypeInfo;
use crate::definition::{
    Autowire, BeanDefinition, BeanValue, Instantiator, ResolvedArgs,
};
use crate::error::{DiError, DiResult};
use crate::internal::stack;
use crate::lifecycle::{erase, AnyArc, BeanArc};
use crate::processor::BeanPostProcessor;
use crate::singleton::DisposableHandle;

impl Container {
    pub(crate) fn do_get_inner(
        &self,
        canonical: &str,
        args: Option<Vec<AnyArc>>,
        factory_ref: bool,
    ) -> DiResult<BeanArc> {
        // Fast path: finished singleton (or an early reference on our own
        // creation stack).
        if args.is_none() {
            if let Some(shared) = self.inner.singletons.get(canonical) {
                return self.resolve_factory_reference(canonical, shared, factory_ref);
            }
        }

        if !self.inner.definitions.contains(canonical) {
            if let Some(parent) = self.parent() {
                let name = if factory_ref {
                    format!("{}{}", FACTORY_PREFIX, canonical)
                } else {
                    canonical.to_string()
                };
                return parent.do_get(&name, args);
            }
            return Err(DiError::NotFound(canonical.to_string()));
        }

        let merged = self.merged_definition(canonical)?;
        if merged.is_abstract() {
            return Err(DiError::store(
                canonical,
                "abstract definitions cannot be instantiated",
            ));
        }
        if args.is_some() && !merged.is_prototype_scoped() {
            return Err(DiError::store(
                canonical,
                "explicit constructor arguments are only supported for prototype-scoped beans",
            ));
        }

        // Force declared dependencies into existence first.
        for dep in merged.depends_on_names() {
            let dep = self.canonical(dep);
            if self.inner.graph.is_dependent(canonical, &dep) {
                return Err(DiError::creation(
                    canonical,
                    DiError::store(
                        canonical,
                        format!("circular depends-on relationship with '{}'", dep),
                    ),
                ));
            }
            self.inner.graph.register_dependent(&dep, canonical);
            self.get(&dep)
                .map_err(|error| DiError::creation(canonical, error))?;
        }

        let bean = if merged.is_singleton_scoped() {
            self.inner
                .singletons
                .get_or_create(canonical, || self.create_bean(canonical, &merged, None))?
        } else if merged.is_prototype_scoped() {
            self.create_bean(canonical, &merged, args.as_deref())?
        } else {
            let scope_name = merged.scope_name();
            let scope = self
                .inner
                .scopes
                .get(scope_name)
                .ok_or_else(|| DiError::UnknownScope(scope_name.to_string()))?;
            scope.get(canonical, &|| self.create_bean(canonical, &merged, None))?
        };

        self.resolve_factory_reference(canonical, bean, factory_ref)
    }

    /// Plain lookups of an object-producing bean yield its product; the
    /// factory prefix yields the factory itself. Products of singleton
    /// factories are cached per name.
    fn resolve_factory_reference(
        &self,
        canonical: &str,
        bean: BeanArc,
        factory_ref: bool,
    ) -> DiResult<BeanArc> {
        let produces_singleton = bean.object_factory().map(|f| f.produces_singleton());
        let Some(shared_product) = produces_singleton else {
            if factory_ref {
                return Err(DiError::TypeMismatch {
                    name: format!("{}{}", FACTORY_PREFIX, canonical),
                    expected: "an object-producing factory bean",
                });
            }
            return Ok(bean);
        };
        if factory_ref {
            return Ok(bean);
        }
        if shared_product {
            if let Some(cached) = self.inner.factory_products.lock().get(canonical) {
                return Ok(cached.clone());
            }
        }
        let product = {
            let Some(factory) = bean.object_factory() else {
                // Capability sets are fixed per type; not reached.
                return Ok(bean);
            };
            factory
                .produce()
                .map_err(|error| DiError::creation(canonical, error))?
        };
        if shared_product {
            let mut cache = self.inner.factory_products.lock();
            return Ok(cache
                .entry(canonical.to_string())
                .or_insert(product)
                .clone());
        }
        Ok(product)
    }

    /// Build one instance: instantiate, publish the early reference for
    /// in-creation singletons, populate properties, run the lifecycle
    /// pipeline, and register teardown. Any failure is wrapped with this
    /// bean's name so deep failures carry the nesting chain.
    pub(crate) fn create_bean(
        &self,
        name: &str,
        merged: &BeanDefinition,
        args: Option<&[AnyArc]>,
    ) -> DiResult<BeanArc> {
        let _frame = stack::StackGuard::enter(name)?;
        self.do_create_bean(name, merged, args)
            .map_err(|error| match error {
                cycle @ DiError::CircularUnresolvable(_) => cycle,
                wrapped @ DiError::CreationFailure { .. }
                    if wrapped.bean_name() == Some(name) =>
                {
                    wrapped
                }
                other => DiError::creation(name, other),
            })
    }

    fn do_create_bean(
        &self,
        name: &str,
        merged: &BeanDefinition,
        args: Option<&[AnyArc]>,
    ) -> DiResult<BeanArc> {
        let raw = self.instantiate(name, merged, args)?;

        // Publish the raw reference before population so property-level
        // back-references on this call stack can observe it.
        let early_published =
            merged.is_singleton_scoped() && self.inner.singletons.is_marked_in_creation(name);
        if early_published {
            self.inner.singletons.add_early(name, raw.clone());
        }

        self.populate_properties(name, merged, &raw)?;
        let bean = self.initialize_bean(name, Some(merged), raw.clone())?;

        if early_published && !Arc::ptr_eq(&bean, &raw) {
            // A post-processor swapped the instance after the raw reference
            // may have been injected into dependents mid-cycle.
            let dependents = self.inner.graph.dependents_of(name);
            if !dependents.is_empty() {
                return Err(DiError::store(
                    name,
                    format!(
                        "instance was replaced during initialization after its raw \
                         reference was exposed to dependents [{}]",
                        dependents.join(", ")
                    ),
                ));
            }
        }

        if merged.is_singleton_scoped()
            && (bean.disposable().is_some() || merged.destroy_callback().is_some())
        {
            self.inner.singletons.register_disposable(DisposableHandle {
                name: name.to_string(),
                bean: bean.clone(),
                destroy_callback: merged.destroy_callback().cloned(),
            });
        }

        Ok(bean)
    }

    fn instantiate(
        &self,
        name: &str,
        merged: &BeanDefinition,
        explicit: Option<&[AnyArc]>,
    ) -> DiResult<BeanArc> {
        let resolved = match explicit {
            Some(values) => ResolvedArgs::positional(values.to_vec()),
            None => {
                let mut resolved = ResolvedArgs::empty();
                for arg in merged.constructor_args() {
                    let value = self.resolve_value(name, merged, &arg.name, None, &arg.value)?;
                    resolved.push(arg.name.clone(), value);
                }
                resolved
            }
        };

        match merged.instantiator() {
            Some(Instantiator::Constructor(ctor)) => ctor(&resolved),
            Some(Instantiator::FactoryMethod {
                factory_bean,
                method,
            }) => {
                let factory_canonical = self.canonical(factory_bean);
                self.inner.graph.register_dependent(&factory_canonical, name);
                let factory = self.get(factory_bean)?;
                let methods = factory.factory_methods().ok_or_else(|| {
                    DiError::store(
                        name,
                        format!(
                            "factory bean '{}' does not expose invokable factory methods",
                            factory_bean
                        ),
                    )
                })?;
                methods.invoke(method, &resolved)
            }
            None => Err(DiError::store(
                name,
                "definition declares neither a constructor nor a factory method",
            )),
        }
    }

    /// Resolve one configured value: literals go through the converter,
    /// references recurse into the container, nested definitions become
    /// anonymous inner beans, and autowired markers match by accessor type.
    fn resolve_value(
        &self,
        owner: &str,
        _merged: &BeanDefinition,
        property: &str,
        target: Option<&TypeInfo>,
        value: &BeanValue,
    ) -> DiResult<AnyArc> {
        match value {
            BeanValue::Value(literal) => match target {
                Some(target) => {
                    let converter = self.inner.converter.read().clone();
                    converter.convert(literal.clone(), target)
                }
                None => Ok(literal.clone()),
            },
            BeanValue::Ref(ref_name) => {
                let ref_canonical = self.canonical(ref_name);
                self.inner.graph.register_dependent(&ref_canonical, owner);
                let bean = self.get(ref_name)?;
                Ok(erase(bean))
            }
            BeanValue::Bean(definition) => {
                let index = self.inner.inner_bean_counter.fetch_add(1, Ordering::Relaxed) + 1;
                let inner_name = format!("(inner bean)#{}", index);
                let inner_merged = match definition.parent_name() {
                    Some(parent_name) => {
                        let parent_merged = self.merged_definition(parent_name)?;
                        definition.merged_onto(&parent_merged)
                    }
                    None => definition.flattened(),
                };
                let bean = self.create_bean(&inner_name, &inner_merged, None)?;
                Ok(erase(bean))
            }
            BeanValue::Autowired => {
                let target = target.ok_or_else(|| {
                    DiError::store(
                        owner,
                        format!("autowired value for '{}' requires a typed accessor", property),
                    )
                })?;
                let candidate = self.unique_name_for_type(target, Some(owner))?;
                self.inner.graph.register_dependent(&candidate, owner);
                let bean = self.get(&candidate)?;
                Ok(erase(bean))
            }
        }
    }

    fn populate_properties(
        &self,
        name: &str,
        merged: &BeanDefinition,
        bean: &BeanArc,
    ) -> DiResult<()> {
        for spec in merged.properties() {
            let accessor = merged.accessor(&spec.name).ok_or_else(|| {
                DiError::store(name, format!("no writable property '{}'", spec.name))
            })?;
            let value = self.resolve_value(
                name,
                merged,
                &spec.name,
                Some(accessor.value_type()),
                &spec.value,
            )?;
            accessor.apply(bean.as_ref(), value)?;
        }

        match merged.autowire_mode() {
            Autowire::No => {}
            Autowire::ByName => {
                for accessor in merged.accessors() {
                    if merged.has_property(accessor.name()) || !self.contains(accessor.name()) {
                        continue;
                    }
                    let dep = self.canonical(accessor.name());
                    self.inner.graph.register_dependent(&dep, name);
                    let value = self.get(accessor.name())?;
                    accessor.apply(bean.as_ref(), erase(value))?;
                }
            }
            Autowire::ByType => {
                for accessor in merged.accessors() {
                    if merged.has_property(accessor.name()) {
                        continue;
                    }
                    match self.unique_name_for_type(accessor.value_type(), Some(name)) {
                        Ok(candidate) => {
                            self.inner.graph.register_dependent(&candidate, name);
                            let value = self.get(&candidate)?;
                            accessor.apply(bean.as_ref(), erase(value))?;
                        }
                        // No candidate at all: the property stays unset.
                        Err(DiError::NotFound(_)) => continue,
                        Err(error) => return Err(error),
                    }
                }
            }
        }
        Ok(())
    }

    /// The fixed lifecycle pipeline, in documented order: name awareness,
    /// container awareness, processor pre-init hooks, `after_properties_set`,
    /// the definition's init callback, processor post-init hooks.
    pub(crate) fn initialize_bean(
        &self,
        name: &str,
        merged: Option<&BeanDefinition>,
        bean: BeanArc,
    ) -> DiResult<BeanArc> {
        if let Some(aware) = bean.name_aware() {
            aware.set_bean_name(name);
        }
        if let Some(aware) = bean.container_aware() {
            aware.set_container(self.clone());
        }

        let mut current = bean;
        for processor in self.processors() {
            current = processor.before_init(current, name)?;
        }
        if let Some(initializing) = current.initializing() {
            initializing
                .after_properties_set()
                .map_err(|error| DiError::creation(name, error))?;
        }
        if let Some(callback) = merged.and_then(|m| m.init_callback()) {
            callback
                .invoke(current.as_ref())
                .map_err(|error| DiError::creation(name, error))?;
        }
        for processor in self.processors() {
            current = processor.after_init(current, name)?;
        }
        Ok(current)
    }

    fn processors(&self) -> Vec<Arc<dyn BeanPostProcessor>> {
        self.inner.processors.read().clone()
    }

    /// Resolve the single autowire candidate for `target`.
    ///
    /// Candidates are autowire-eligible definitions declaring the type plus
    /// registered singleton instances of it. Ties break on the `primary`
    /// flag, then on unique lowest `order`; remaining ties are ambiguous.
    /// Zero local candidates fall through to the parent container.
    pub(crate) fn unique_name_for_type(
        &self,
        target: &TypeInfo,
        exclude: Option<&str>,
    ) -> DiResult<String> {
        struct Candidate {
            name: String,
            primary: bool,
            order: Option<i32>,
        }

        let mut candidates: Vec<Candidate> = Vec::new();
        for name in self.inner.definitions.names() {
            if exclude == Some(name.as_str()) {
                continue;
            }
            let merged = self.merged_definition(&name)?;
            if merged.is_abstract() || !merged.is_autowire_candidate() {
                continue;
            }
            if merged.type_info().map(|t| t.id) == Some(target.id) {
                candidates.push(Candidate {
                    name,
                    primary: merged.is_primary(),
                    order: merged.order_hint(),
                });
            }
        }
        for name in self.inner.singletons.names() {
            if exclude == Some(name.as_str())
                || self.inner.definitions.contains(&name)
                || candidates.iter().any(|c| c.name == name)
            {
                continue;
            }
            if let Some(bean) = self.inner.singletons.get(&name) {
                if crate::lifecycle::bean_type_id(bean.as_ref()) == target.id {
                    candidates.push(Candidate {
                        name,
                        primary: false,
                        order: None,
                    });
                }
            }
        }

        if candidates.is_empty() {
            if let Some(parent) = self.parent() {
                return parent.unique_name_for_type(target, exclude);
            }
            return Err(DiError::NotFound(format!("bean of type {}", target.name)));
        }
        if candidates.len() == 1 {
            return Ok(candidates.remove(0).name);
        }

        let primaries: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.primary)
            .map(|(i, _)| i)
            .collect();
        match primaries.len() {
            1 => return Ok(candidates.swap_remove(primaries[0]).name),
            0 => {}
            _ => {
                return Err(DiError::Ambiguous {
                    type_name: target.name.to_string(),
                    candidates: primaries
                        .iter()
                        .map(|&i| candidates[i].name.clone())
                        .collect(),
                })
            }
        }

        // No primary: a unique lowest explicit order wins.
        if let Some(lowest) = candidates.iter().filter_map(|c| c.order).min() {
            let ordered: Vec<usize> = candidates
                .iter()
                .enumerate()
                .filter(|(_, c)| c.order == Some(lowest))
                .map(|(i, _)| i)
                .collect();
            if ordered.len() == 1 {
                return Ok(candidates.swap_remove(ordered[0]).name);
            }
        }

        Err(DiError::Ambiguous {
            type_name: target.name.to_string(),
            candidates: candidates.into_iter().map(|c| c.name).collect(),
        })
    }
}
