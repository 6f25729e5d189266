//! The container: public resolution surface and orchestration
//!
//! `get` ties the pieces together: effective scope and pool lookup, cycle
//! tracking, instantiation, method calls, decoration, and pool writes.
//! Resolution is reentrant through the call stack; every internal lock is
//! released before any recursive step runs.

use std::sync::Arc;

use serde_json::Value as Json;
use tracing::{debug, info, warn};

use crate::definition::{
    DefinitionBundle, DefinitionStore, MethodCall, ServiceBuilder, ServiceDefinition,
    ServiceScope, Target,
};
use crate::error::{DIError, DIResult};
use crate::factory::{BuiltService, Instantiator, Invokable};
use crate::hooks::{DecoratePolicy, DefinitionProvider, Delegator};
use crate::reference::Argument;
use crate::registry::{ClassRegistry, ClassSpec};
use crate::resolver::ReferenceResolver;
use crate::scope;
use crate::tracker::ResolutionTracker;
use crate::value::{Instance, Value};
use parking_lot::RwLock;

/// Tunable container behavior
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Scope applied when a definition declares none
    pub default_scope: ServiceScope,
    /// Upper bound on parameter-reference indirection; chains deeper than
    /// this fail with a reference-loop error
    pub max_reference_depth: usize,
    /// When true, `has` registers a definition on the fly for any id that
    /// names a registered class
    pub autowiring: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            default_scope: ServiceScope::Shared,
            max_reference_depth: 8,
            autowiring: true,
        }
    }
}

/// The service-resolution container
pub struct Container {
    config: ContainerConfig,
    store: DefinitionStore,
    registry: ClassRegistry,
    pool: scope::InstancePool,
    tracker: ResolutionTracker,
    decorator: RwLock<Option<Arc<dyn DecoratePolicy>>>,
    delegator: RwLock<Option<Arc<dyn Delegator>>>,
    providers: RwLock<Vec<Arc<dyn DefinitionProvider>>>,
}

impl Container {
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            config,
            store: DefinitionStore::new(),
            registry: ClassRegistry::new(),
            pool: scope::InstancePool::new(),
            tracker: ResolutionTracker::new(),
            decorator: RwLock::new(None),
            delegator: RwLock::new(None),
            providers: RwLock::new(Vec::new()),
        }
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// The class metadata registry backing construction and typed matching
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub(crate) fn store(&self) -> &DefinitionStore {
        &self.store
    }

    /// Register class metadata with the backing registry
    pub fn register_class(&self, spec: ClassSpec) -> DIResult<()> {
        self.registry.register(spec)
    }

    /// Register a definition whose target defaults to the id itself;
    /// configure the rest through the returned builder
    pub fn add(&self, id: &str) -> ServiceBuilder<'_> {
        self.store
            .add(id, ServiceDefinition::new(Target::Class(id.to_string())))
    }

    /// Register a definition pointing at an explicit target
    pub fn add_target(&self, id: &str, target: impl Into<Target>) -> ServiceBuilder<'_> {
        self.store.add(id, ServiceDefinition::new(target.into()))
    }

    /// Deep-merge a parameter value at a dot-path
    pub fn set(&self, path: &str, value: impl Into<Json>) {
        self.store.set(path, value.into());
    }

    /// Deep-merge a whole object into the parameter tree
    pub fn merge_parameters(&self, map: Json) {
        self.store.merge(map);
    }

    /// Read a parameter by dot-path
    pub fn parameter(&self, path: &str) -> DIResult<Json> {
        self.store.parameter(path)
    }

    /// Map an interface or class name to an autowiring target
    pub fn map(&self, from: &str, to: &str) {
        self.store.map(from, to);
    }

    /// Ingest an in-memory definition bundle
    pub fn load(&self, bundle: DefinitionBundle) -> DIResult<()> {
        match bundle.parameters {
            Json::Null => {}
            parameters @ Json::Object(_) => self.store.merge(parameters),
            other => {
                return Err(DIError::InvalidDefinition {
                    message: format!(
                        "bundle parameters must be an object, found {other}"
                    ),
                })
            }
        }
        for (from, to) in &bundle.mappings {
            self.store.map(from, to);
        }
        let count = bundle.services.len();
        for (id, entry) in bundle.services {
            let mut definition = ServiceDefinition::new(Target::from(entry.class.as_str()));
            definition.arguments = entry.arguments.into_iter().map(Argument::parse).collect();
            for method in entry.methods {
                if method.call.is_empty() {
                    return Err(DIError::MalformedMethodCall { id });
                }
                definition.methods.push(MethodCall {
                    name: method.call,
                    arguments: method.arguments.into_iter().map(Argument::parse).collect(),
                });
            }
            definition.scope = match entry.scope.as_deref() {
                Some(text) => Some(ServiceScope::parse(text)?),
                None => None,
            };
            self.store.add(&id, definition);
        }
        info!(services = count, "loaded definition bundle");
        Ok(())
    }

    /// Resolve a service by id
    pub fn get(&self, id: &str) -> DIResult<Instance> {
        self.get_scoped(id, &[], None)
    }

    /// Resolve with explicit constructor arguments, bypassing the pool
    pub fn get_with(&self, id: &str, arguments: &[Argument]) -> DIResult<Instance> {
        self.get_scoped(id, arguments, None)
    }

    /// Resolve a fresh instance regardless of the declared scope; its
    /// dependencies still honor their own scopes
    pub fn one(&self, id: &str, arguments: &[Argument]) -> DIResult<Instance> {
        self.get_scoped(id, arguments, Some(ServiceScope::Single))
    }

    /// Resolve with optional explicit arguments and scope override
    pub fn get_scoped(
        &self,
        id: &str,
        arguments: &[Argument],
        scope: Option<ServiceScope>,
    ) -> DIResult<Instance> {
        if !self.has(id) {
            return Err(DIError::ServiceNotFound { id: id.to_string() });
        }
        let scope = match scope {
            Some(scope) => scope,
            None => self
                .store
                .definition(id)
                .and_then(|definition| definition.scope)
                .unwrap_or_else(|| self.config.default_scope.clone()),
        };
        let key = scope::effective_key(&scope, &self.tracker);
        let bypass_pool = !arguments.is_empty();

        if !bypass_pool {
            if let Some(instance) = self.pool.get(&key, id) {
                debug!(id, scope = %key, "pool hit");
                return Ok(instance);
            }
        }

        let built = self.build_service(id, arguments)?;
        if !bypass_pool && scope != ServiceScope::Single && !built.alias {
            self.pool.store(key, id, built.instance.clone());
        }
        Ok(built.instance)
    }

    /// True when the id is defined, can be provided lazily, or names a
    /// registered class with autowiring enabled
    pub fn has(&self, id: &str) -> bool {
        if self.store.contains(id) {
            return true;
        }
        let providers: Vec<Arc<dyn DefinitionProvider>> = self.providers.read().clone();
        for provider in providers {
            if provider.provides(id) {
                if let Err(error) = provider.register(self) {
                    warn!(%error, id, "definition provider failed");
                    continue;
                }
                if self.store.contains(id) {
                    debug!(id, "definition provided lazily");
                    return true;
                }
            }
        }
        if self.config.autowiring && self.registry.contains(id) {
            debug!(id, "autowired class as service");
            self.store
                .add(id, ServiceDefinition::new(Target::Class(id.to_string())));
            return true;
        }
        false
    }

    /// Execute a runnable target and return its value
    pub fn run(&self, invokable: &Invokable, arguments: &[Argument]) -> DIResult<Value> {
        Instantiator::new(self).execute(invokable, arguments)
    }

    pub fn service_count(&self) -> usize {
        self.store.service_count()
    }

    pub fn pooled_count(&self) -> usize {
        self.pool.len()
    }

    /// True when no resolution is in flight
    pub fn is_idle(&self) -> bool {
        self.tracker.is_idle()
    }

    pub fn set_decorator(&self, decorator: impl DecoratePolicy + 'static) {
        *self.decorator.write() = Some(Arc::new(decorator));
    }

    pub fn set_delegator(&self, delegator: impl Delegator + 'static) {
        *self.delegator.write() = Some(Arc::new(delegator));
    }

    pub fn add_provider(&self, provider: impl DefinitionProvider + 'static) {
        self.providers.write().push(Arc::new(provider));
    }

    /// Internal lookup used by reference resolution and autowiring; a
    /// configured delegator supersedes the local container here
    pub(crate) fn delegated_get(&self, id: &str) -> DIResult<Instance> {
        let delegator = self.delegator.read().clone();
        match delegator {
            Some(delegator) => delegator.get(id),
            None => self.get(id),
        }
    }

    pub(crate) fn delegated_has(&self, id: &str) -> bool {
        let delegator = self.delegator.read().clone();
        match delegator {
            Some(delegator) => delegator.has(id),
            None => self.has(id),
        }
    }

    /// Read a parameter through the reference machinery, following chains
    pub fn resolve_parameter(&self, path: &str) -> DIResult<Value> {
        ReferenceResolver::new(self)
            .resolve_reference(&crate::reference::Reference::Parameter(path.to_string()))
    }

    fn build_service(&self, id: &str, arguments: &[Argument]) -> DIResult<BuiltService> {
        self.tracker.enter(id)?;
        let result = self.construct_service(id, arguments);
        self.tracker.leave(id);
        result
    }

    fn construct_service(&self, id: &str, arguments: &[Argument]) -> DIResult<BuiltService> {
        let built = Instantiator::new(self).create(id, arguments)?;
        let decorator = self.decorator.read().clone();
        if let Some(decorator) = decorator {
            decorator
                .decorate(self, &built.instance)
                .map_err(|source| DIError::Instantiation {
                    context: format!("decorating service '{id}'"),
                    source,
                })?;
        }
        Ok(built)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent construction of a configured container
pub struct ContainerBuilder {
    config: ContainerConfig,
    decorator: Option<Arc<dyn DecoratePolicy>>,
    delegator: Option<Arc<dyn Delegator>>,
    providers: Vec<Arc<dyn DefinitionProvider>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
            decorator: None,
            delegator: None,
            providers: Vec::new(),
        }
    }

    pub fn default_scope(mut self, scope: ServiceScope) -> Self {
        self.config.default_scope = scope;
        self
    }

    pub fn max_reference_depth(mut self, depth: usize) -> Self {
        self.config.max_reference_depth = depth;
        self
    }

    pub fn autowiring(mut self, enabled: bool) -> Self {
        self.config.autowiring = enabled;
        self
    }

    pub fn decorator(mut self, decorator: impl DecoratePolicy + 'static) -> Self {
        self.decorator = Some(Arc::new(decorator));
        self
    }

    pub fn delegator(mut self, delegator: impl Delegator + 'static) -> Self {
        self.delegator = Some(Arc::new(delegator));
        self
    }

    pub fn provider(mut self, provider: impl DefinitionProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn build(self) -> Container {
        let container = Container::with_config(self.config);
        *container.decorator.write() = self.decorator;
        *container.delegator.write() = self.delegator;
        *container.providers.write() = self.providers;
        container
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
