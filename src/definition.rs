//! Bean definition model: the declarative recipe the engine consumes.
//!
//! A [`BeanDefinition`] describes how to construct and configure one bean:
//! its declared type, scope, constructor arguments, property values, the
//! accessor table used to apply them, autowiring policy, and optional init
//! and destroy callbacks. Definitions are built with a fluent builder,
//! registered under a canonical name, and are effectively immutable once the
//! registry freezes.
//!
//! Property population is reflection-free: the definition carries an explicit
//! accessor table mapping property names to typed setter closures supplied by
//! the construction layer.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::convert::TypeInfo;
use crate::error::{BoxError, DiError, DiResult};
use crate::lifecycle::{downcast_ref, AnyArc, Bean, BeanArc};

/// Scope name of the shared-singleton scope.
pub const SINGLETON_SCOPE: &str = "singleton";

/// Scope name of the independent-per-request scope.
pub const PROTOTYPE_SCOPE: &str = "prototype";

/// Autowiring policy for properties not explicitly configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Autowire {
    /// Only explicitly configured values are injected.
    No,
    /// Unset accessors whose name matches a bean name are injected.
    ByName,
    /// Unset accessors whose declared value type matches exactly one
    /// candidate (after primary/order tie-breaking) are injected.
    ByType,
}

/// Role hint classifying a definition for tooling and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeanRole {
    /// A major, user-facing part of the application.
    Application,
    /// Supporting part of a larger configuration unit.
    Support,
    /// Purely internal plumbing with no end-user relevance.
    Infrastructure,
}

/// A configured value: how one constructor argument or property is supplied.
#[derive(Clone)]
pub enum BeanValue {
    /// A literal value, passed through the container's value converter.
    Value(AnyArc),
    /// A reference to another bean by name, resolved through the container.
    Ref(String),
    /// A nested anonymous definition, built fresh on each resolution.
    Bean(Box<BeanDefinition>),
    /// Resolve by the declared type of the target accessor.
    Autowired,
}

impl BeanValue {
    /// A literal value.
    pub fn literal<V: Send + Sync + 'static>(value: V) -> Self {
        BeanValue::Value(Arc::new(value))
    }

    /// A reference to the bean registered under `name`.
    pub fn reference(name: impl Into<String>) -> Self {
        BeanValue::Ref(name.into())
    }

    /// A nested anonymous bean definition.
    pub fn bean(definition: BeanDefinition) -> Self {
        BeanValue::Bean(Box::new(definition))
    }
}

impl fmt::Debug for BeanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeanValue::Value(_) => f.write_str("Value(..)"),
            BeanValue::Ref(name) => write!(f, "Ref({:?})", name),
            BeanValue::Bean(def) => write!(f, "Bean({:?})", def),
            BeanValue::Autowired => f.write_str("Autowired"),
        }
    }
}

/// Named constructor-argument spec.
#[derive(Debug, Clone)]
pub struct ConstructorArg {
    pub name: String,
    pub value: BeanValue,
}

/// Property name paired with its configured value.
#[derive(Debug, Clone)]
pub struct PropertySpec {
    pub name: String,
    pub value: BeanValue,
}

type SetterFn = Arc<dyn Fn(&dyn Bean, AnyArc) -> DiResult<()> + Send + Sync>;

/// One entry of the accessor table: a property name, the type its setter
/// accepts, and the type-erased setter itself.
#[derive(Clone)]
pub struct PropertyAccessor {
    name: String,
    value_type: TypeInfo,
    set: SetterFn,
}

impl PropertyAccessor {
    /// Build an accessor from a typed setter closure.
    ///
    /// The closure receives the concrete bean and the resolved value; late
    /// injection targets (`OnceLock`, lock-guarded options) are the bean
    /// type's own concern.
    pub fn new<T, V>(
        name: impl Into<String>,
        set: impl Fn(&T, Arc<V>) + Send + Sync + 'static,
    ) -> Self
    where
        T: Bean,
        V: Send + Sync + 'static,
    {
        let name = name.into();
        let property = name.clone();
        PropertyAccessor {
            name,
            value_type: TypeInfo::of::<V>(),
            set: Arc::new(move |bean, value| {
                let target = downcast_ref::<T>(bean).ok_or_else(|| DiError::TypeMismatch {
                    name: property.clone(),
                    expected: std::any::type_name::<T>(),
                })?;
                let value = value.downcast::<V>().map_err(|_| DiError::TypeMismatch {
                    name: property.clone(),
                    expected: std::any::type_name::<V>(),
                })?;
                set(target, value);
                Ok(())
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type the setter accepts; drives conversion and by-type autowiring.
    pub fn value_type(&self) -> &TypeInfo {
        &self.value_type
    }

    pub(crate) fn apply(&self, bean: &dyn Bean, value: AnyArc) -> DiResult<()> {
        (self.set)(bean, value)
    }
}

impl fmt::Debug for PropertyAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyAccessor({:?}: {})", self.name, self.value_type.name)
    }
}

/// Constructor-argument values resolved for one instantiation.
///
/// Arguments keep their configured names; caller-supplied overrides are
/// positional (`"0"`, `"1"`, ...).
#[derive(Default)]
pub struct ResolvedArgs {
    values: SmallVec<[(String, AnyArc); 4]>,
}

impl ResolvedArgs {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Positional arguments, named by index.
    pub fn positional(values: Vec<AnyArc>) -> Self {
        let mut args = Self::empty();
        for (index, value) in values.into_iter().enumerate() {
            args.values.push((index.to_string(), value));
        }
        args
    }

    pub(crate) fn push(&mut self, name: String, value: AnyArc) {
        self.values.push((name, value));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed access by argument name.
    pub fn get<V: Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<V>> {
        let value = self
            .values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| DiError::NotFound(format!("constructor argument '{}'", name)))?;
        Self::cast(name, value)
    }

    /// Typed access by position.
    pub fn get_at<V: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<V>> {
        let (name, value) = self
            .values
            .get(index)
            .ok_or_else(|| DiError::NotFound(format!("constructor argument #{}", index)))?;
        Self::cast(name, value)
    }

    fn cast<V: Send + Sync + 'static>(name: &str, value: &AnyArc) -> DiResult<Arc<V>> {
        value
            .clone()
            .downcast::<V>()
            .map_err(|_| DiError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<V>(),
            })
    }
}

/// Constructor function: builds the raw instance from resolved arguments.
pub type ConstructorFn = Arc<dyn Fn(&ResolvedArgs) -> DiResult<BeanArc> + Send + Sync>;

/// How a definition instantiates its raw object.
#[derive(Clone)]
pub enum Instantiator {
    /// Direct construction through a supplied closure.
    Constructor(ConstructorFn),
    /// Delegation to a named method on another managed bean exposing the
    /// `FactoryMethods` capability.
    FactoryMethod {
        factory_bean: String,
        method: String,
    },
}

impl fmt::Debug for Instantiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instantiator::Constructor(_) => f.write_str("Constructor(..)"),
            Instantiator::FactoryMethod {
                factory_bean,
                method,
            } => write!(f, "FactoryMethod({}::{})", factory_bean, method),
        }
    }
}

type CallbackFn = Arc<dyn Fn(&dyn Bean) -> Result<(), BoxError> + Send + Sync>;

/// Named init/destroy callback from a definition.
///
/// The name is diagnostic only; invocation goes through the supplied closure.
#[derive(Clone)]
pub struct LifecycleCallback {
    name: String,
    invoke: CallbackFn,
}

impl LifecycleCallback {
    pub fn new<T: Bean>(
        name: impl Into<String>,
        f: impl Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        let method = name.clone();
        LifecycleCallback {
            name,
            invoke: Arc::new(move |bean| {
                let target = downcast_ref::<T>(bean).ok_or_else(|| {
                    Box::new(DiError::TypeMismatch {
                        name: method.clone(),
                        expected: std::any::type_name::<T>(),
                    }) as BoxError
                })?;
                f(target)
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn invoke(&self, bean: &dyn Bean) -> Result<(), BoxError> {
        (self.invoke)(bean)
    }
}

impl fmt::Debug for LifecycleCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LifecycleCallback({:?})", self.name)
    }
}

/// Declarative recipe for constructing and configuring one bean.
///
/// Built with the fluent methods below, then registered on a container.
/// Scalar fields left unset inherit from the parent definition during
/// merging; list-shaped fields (constructor args, properties, accessors)
/// are unioned with the child taking precedence on name collisions.
///
/// # Examples
///
/// ```
/// use wrought_di::{Bean, BeanDefinition, BeanValue};
///
/// struct Server { port: u16 }
/// impl Bean for Server {}
///
/// let definition = BeanDefinition::for_type::<Server>()
///     .constructor_arg("port", BeanValue::literal(8080u16))
///     .constructor(|args| {
///         Ok(Server { port: *args.get::<u16>("port")? })
///     });
/// assert!(definition.is_singleton_scoped());
/// ```
#[derive(Clone)]
pub struct BeanDefinition {
    type_info: Option<TypeInfo>,
    parent: Option<String>,
    scope: Option<String>,
    lazy_init: Option<bool>,
    abstract_def: bool,
    primary: bool,
    autowire_candidate: bool,
    autowire: Option<Autowire>,
    role: BeanRole,
    order: Option<i32>,
    depends_on: Vec<String>,
    constructor_args: Vec<ConstructorArg>,
    properties: Vec<PropertySpec>,
    accessors: Vec<PropertyAccessor>,
    instantiator: Option<Instantiator>,
    init_callback: Option<LifecycleCallback>,
    destroy_callback: Option<LifecycleCallback>,
}

impl Default for BeanDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanDefinition {
    /// An untyped definition (factory-method beans, abstract templates).
    pub fn new() -> Self {
        BeanDefinition {
            type_info: None,
            parent: None,
            scope: None,
            lazy_init: None,
            abstract_def: false,
            primary: false,
            autowire_candidate: true,
            autowire: None,
            role: BeanRole::Application,
            order: None,
            depends_on: Vec::new(),
            constructor_args: Vec::new(),
            properties: Vec::new(),
            accessors: Vec::new(),
            instantiator: None,
            init_callback: None,
            destroy_callback: None,
        }
    }

    /// A definition declaring `T` as the bean's type.
    pub fn for_type<T: Bean>() -> Self {
        let mut def = Self::new();
        def.type_info = Some(TypeInfo::of::<T>());
        def
    }

    // ----- builder -----

    /// Inherit unset fields from the definition registered under `name`.
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    /// Explicit scope name (`"singleton"`, `"prototype"`, or custom).
    pub fn scope(mut self, name: impl Into<String>) -> Self {
        self.scope = Some(name.into());
        self
    }

    /// Shorthand for the singleton scope.
    pub fn singleton(self) -> Self {
        self.scope(SINGLETON_SCOPE)
    }

    /// Shorthand for the prototype scope.
    pub fn prototype(self) -> Self {
        self.scope(PROTOTYPE_SCOPE)
    }

    /// Skip this bean during eager singleton pre-instantiation.
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy_init = Some(lazy);
        self
    }

    /// Mark as a template: merged into children, never instantiated itself.
    pub fn abstract_template(mut self) -> Self {
        self.abstract_def = true;
        self
    }

    /// Designated tie-breaker among multiple type-compatible candidates.
    pub fn primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    /// Whether this bean participates in by-type autowiring at all.
    pub fn autowire_candidate(mut self, candidate: bool) -> Self {
        self.autowire_candidate = candidate;
        self
    }

    /// Autowiring policy for unset accessors.
    pub fn autowire(mut self, mode: Autowire) -> Self {
        self.autowire = Some(mode);
        self
    }

    pub fn role(mut self, role: BeanRole) -> Self {
        self.role = role;
        self
    }

    /// Explicit ordering metadata; lower orders win autowire tie-breaks
    /// among non-primary candidates.
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Force `name` into existence before this bean is constructed.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// Add a named constructor-argument spec.
    pub fn constructor_arg(mut self, name: impl Into<String>, value: BeanValue) -> Self {
        self.constructor_args.push(ConstructorArg {
            name: name.into(),
            value,
        });
        self
    }

    /// Instantiate through a constructor closure.
    pub fn constructor<T, F>(mut self, f: F) -> Self
    where
        T: Bean,
        F: Fn(&ResolvedArgs) -> DiResult<T> + Send + Sync + 'static,
    {
        self.instantiator = Some(Instantiator::Constructor(Arc::new(move |args| {
            f(args).map(|bean| Arc::new(bean) as BeanArc)
        })));
        self
    }

    /// Instantiate through `method` on the bean named `factory_bean`.
    pub fn factory_method(
        mut self,
        factory_bean: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        self.instantiator = Some(Instantiator::FactoryMethod {
            factory_bean: factory_bean.into(),
            method: method.into(),
        });
        self
    }

    /// Configure a property value applied through the matching accessor.
    pub fn property(mut self, name: impl Into<String>, value: BeanValue) -> Self {
        self.properties.push(PropertySpec {
            name: name.into(),
            value,
        });
        self
    }

    /// Register a typed setter in the accessor table.
    pub fn setter<T, V>(
        mut self,
        name: impl Into<String>,
        set: impl Fn(&T, Arc<V>) + Send + Sync + 'static,
    ) -> Self
    where
        T: Bean,
        V: Send + Sync + 'static,
    {
        self.accessors.push(PropertyAccessor::new(name, set));
        self
    }

    /// Custom init callback, run after `after_properties_set`.
    pub fn init_method<T: Bean>(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.init_callback = Some(LifecycleCallback::new(name, f));
        self
    }

    /// Custom destroy callback, run after `Disposable::destroy`.
    pub fn destroy_method<T: Bean>(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.destroy_callback = Some(LifecycleCallback::new(name, f));
        self
    }

    // ----- accessors used by the engine -----

    pub fn type_info(&self) -> Option<&TypeInfo> {
        self.type_info.as_ref()
    }

    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Effective scope name, defaulting to singleton.
    pub fn scope_name(&self) -> &str {
        self.scope.as_deref().unwrap_or(SINGLETON_SCOPE)
    }

    pub fn is_singleton_scoped(&self) -> bool {
        self.scope_name() == SINGLETON_SCOPE
    }

    pub fn is_prototype_scoped(&self) -> bool {
        self.scope_name() == PROTOTYPE_SCOPE
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy_init.unwrap_or(false)
    }

    pub fn is_abstract(&self) -> bool {
        self.abstract_def
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_autowire_candidate(&self) -> bool {
        self.autowire_candidate
    }

    pub fn autowire_mode(&self) -> Autowire {
        self.autowire.unwrap_or(Autowire::No)
    }

    pub fn role_hint(&self) -> BeanRole {
        self.role
    }

    pub fn order_hint(&self) -> Option<i32> {
        self.order
    }

    pub fn depends_on_names(&self) -> &[String] {
        &self.depends_on
    }

    pub fn constructor_args(&self) -> &[ConstructorArg] {
        &self.constructor_args
    }

    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    pub fn accessors(&self) -> &[PropertyAccessor] {
        &self.accessors
    }

    pub fn accessor(&self, name: &str) -> Option<&PropertyAccessor> {
        self.accessors.iter().find(|a| a.name == name)
    }

    pub fn instantiator(&self) -> Option<&Instantiator> {
        self.instantiator.as_ref()
    }

    pub fn init_callback(&self) -> Option<&LifecycleCallback> {
        self.init_callback.as_ref()
    }

    pub fn destroy_callback(&self) -> Option<&LifecycleCallback> {
        self.destroy_callback.as_ref()
    }

    // ----- merging -----

    /// A parentless copy, used as the merged form of a root definition.
    pub(crate) fn flattened(&self) -> BeanDefinition {
        let mut flat = self.clone();
        flat.parent = None;
        flat
    }

    /// Compose this (child) definition onto an already-merged parent.
    ///
    /// Explicitly-set scalar fields override; list-shaped fields are unioned
    /// with child precedence on name collision; a non-empty child
    /// `depends_on` replaces the parent's.
    pub(crate) fn merged_onto(&self, parent: &BeanDefinition) -> BeanDefinition {
        let mut merged = parent.flattened();
        if self.type_info.is_some() {
            merged.type_info = self.type_info;
        }
        if self.scope.is_some() {
            merged.scope = self.scope.clone();
        }
        if self.lazy_init.is_some() {
            merged.lazy_init = self.lazy_init;
        }
        if self.autowire.is_some() {
            merged.autowire = self.autowire;
        }
        merged.abstract_def = self.abstract_def;
        merged.primary = self.primary;
        merged.autowire_candidate = self.autowire_candidate;
        merged.role = self.role;
        merged.order = self.order.or(parent.order);
        if !self.depends_on.is_empty() {
            merged.depends_on = self.depends_on.clone();
        }
        for arg in &self.constructor_args {
            match merged
                .constructor_args
                .iter_mut()
                .find(|a| a.name == arg.name)
            {
                Some(existing) => *existing = arg.clone(),
                None => merged.constructor_args.push(arg.clone()),
            }
        }
        for prop in &self.properties {
            match merged.properties.iter_mut().find(|p| p.name == prop.name) {
                Some(existing) => *existing = prop.clone(),
                None => merged.properties.push(prop.clone()),
            }
        }
        for accessor in &self.accessors {
            match merged
                .accessors
                .iter_mut()
                .find(|a| a.name == accessor.name)
            {
                Some(existing) => *existing = accessor.clone(),
                None => merged.accessors.push(accessor.clone()),
            }
        }
        if self.instantiator.is_some() {
            merged.instantiator = self.instantiator.clone();
        }
        if self.init_callback.is_some() {
            merged.init_callback = self.init_callback.clone();
        }
        if self.destroy_callback.is_some() {
            merged.destroy_callback = self.destroy_callback.clone();
        }
        merged
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("type", &self.type_info.map(|t| t.name))
            .field("parent", &self.parent)
            .field("scope", &self.scope_name())
            .field("abstract", &self.abstract_def)
            .field("primary", &self.primary)
            .field("lazy", &self.is_lazy())
            .field("role", &self.role)
            .field("depends_on", &self.depends_on)
            .field("constructor_args", &self.constructor_args.len())
            .field("properties", &self.properties.len())
            .finish()
    }
}
