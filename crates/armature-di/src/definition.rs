//! Service definitions, the parameter tree and type mappings
//!
//! The [`DefinitionStore`] is the container's declarative side: what each
//! service id means, the dot-path parameter tree feeding `%path%` references,
//! and the interface-to-target mappings consulted during autowiring. Nothing
//! here constructs anything; resolution reads the store and acts on it.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::map::Entry;
use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::error::{DIError, DIResult};
use crate::reference::{Argument, Reference};
use crate::registry::Callable;

pub(crate) const SCOPE_SHARED: &str = "__shared__";
pub(crate) const SCOPE_SINGLE: &str = "__single__";

/// How instances of a service are shared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceScope {
    /// One instance per container, reused by every consumer
    Shared,
    /// A fresh instance on every resolution
    Single,
    /// Shared only among instances built during one resolution of the
    /// named ancestor service
    Within(String),
}

impl ServiceScope {
    /// Parse the string form used by definition bundles: `__shared__`,
    /// `__single__` or an `@ancestor@` service reference
    pub fn parse(text: &str) -> DIResult<ServiceScope> {
        match text {
            SCOPE_SHARED => Ok(ServiceScope::Shared),
            SCOPE_SINGLE => Ok(ServiceScope::Single),
            other => match Reference::parse(other) {
                Some(Reference::Service(id)) => Ok(ServiceScope::Within(id)),
                _ => Err(DIError::InvalidScope {
                    value: other.to_string(),
                }),
            },
        }
    }

    /// The pool-key form of this scope
    pub(crate) fn key(&self) -> String {
        match self {
            ServiceScope::Shared => SCOPE_SHARED.to_string(),
            ServiceScope::Single => SCOPE_SINGLE.to_string(),
            ServiceScope::Within(id) => format!("@{id}@"),
        }
    }
}

/// What a service id resolves into
#[derive(Debug, Clone)]
pub enum Target {
    /// Construct the named class from registered metadata
    Class(String),
    /// An alias (`@other@`) or a parameter reference naming a class
    Reference(Reference),
    /// A declared factory producing the instance
    Callable(Callable),
}

impl From<&str> for Target {
    fn from(text: &str) -> Self {
        match Reference::parse(text) {
            Some(reference) => Target::Reference(reference),
            None => Target::Class(text.to_string()),
        }
    }
}

impl From<String> for Target {
    fn from(text: String) -> Self {
        Target::from(text.as_str())
    }
}

impl From<Reference> for Target {
    fn from(reference: Reference) -> Self {
        Target::Reference(reference)
    }
}

impl From<Callable> for Target {
    fn from(callable: Callable) -> Self {
        Target::Callable(callable)
    }
}

/// One post-construction method call
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub name: String,
    pub arguments: Vec<Argument>,
}

/// Everything registered under one service id
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    pub target: Target,
    pub arguments: Vec<Argument>,
    pub methods: Vec<MethodCall>,
    pub scope: Option<ServiceScope>,
}

impl ServiceDefinition {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            arguments: Vec::new(),
            methods: Vec::new(),
            scope: None,
        }
    }
}

/// Definitions, parameters and mappings behind one registration surface
#[derive(Default)]
pub struct DefinitionStore {
    services: RwLock<HashMap<String, ServiceDefinition>>,
    parameters: RwLock<Json>,
    mappings: RwLock<HashMap<String, String>>,
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            parameters: RwLock::new(Json::Object(Map::new())),
            mappings: RwLock::new(HashMap::new()),
        }
    }

    /// Register or replace the definition for `id` and return a builder
    /// for its remaining configuration
    pub fn add(&self, id: &str, definition: ServiceDefinition) -> ServiceBuilder<'_> {
        debug!(id, "registered service definition");
        self.services.write().insert(id.to_string(), definition);
        ServiceBuilder {
            store: self,
            id: id.to_string(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.services.read().contains_key(id)
    }

    /// Snapshot of the definition for `id`; resolution works on this copy,
    /// so concurrent re-registration cannot change an in-flight build
    pub fn definition(&self, id: &str) -> Option<ServiceDefinition> {
        self.services.read().get(id).cloned()
    }

    pub fn service_count(&self) -> usize {
        self.services.read().len()
    }

    pub(crate) fn update(&self, id: &str, f: impl FnOnce(&mut ServiceDefinition)) {
        if let Some(definition) = self.services.write().get_mut(id) {
            f(definition);
        }
    }

    /// Deep-merge a value into the parameter tree at a dot-path: objects
    /// merge recursively, scalars and arrays overwrite
    pub fn set(&self, path: &str, value: Json) {
        let mut wrapped = value;
        for segment in path.rsplit('.') {
            let mut map = Map::new();
            map.insert(segment.to_string(), wrapped);
            wrapped = Json::Object(map);
        }
        deep_merge(&mut self.parameters.write(), wrapped);
    }

    /// Deep-merge a whole object into the parameter tree root
    pub fn merge(&self, map: Json) {
        deep_merge(&mut self.parameters.write(), map);
    }

    /// Walk the parameter tree by dot-path segments
    pub fn parameter(&self, path: &str) -> DIResult<Json> {
        let tree = self.parameters.read();
        let mut node = &*tree;
        for segment in path.split('.') {
            node = match node {
                Json::Object(map) => map.get(segment).ok_or_else(|| DIError::ParameterNotFound {
                    path: path.to_string(),
                })?,
                _ => {
                    return Err(DIError::ParameterNotFound {
                        path: path.to_string(),
                    })
                }
            };
        }
        Ok(node.clone())
    }

    /// Map an interface or class name to a target: a classname, an `@id@`
    /// service reference or a `%path%` parameter reference
    pub fn map(&self, from: &str, to: &str) {
        debug!(from, to, "registered type mapping");
        self.mappings
            .write()
            .insert(from.to_string(), to.to_string());
    }

    pub fn mapping(&self, from: &str) -> Option<String> {
        self.mappings.read().get(from).cloned()
    }
}

fn deep_merge(target: &mut Json, incoming: Json) {
    match incoming {
        Json::Object(entries) => {
            if let Json::Object(existing) = target {
                for (key, value) in entries {
                    match existing.entry(key) {
                        Entry::Occupied(mut slot) => deep_merge(slot.get_mut(), value),
                        Entry::Vacant(slot) => {
                            slot.insert(value);
                        }
                    }
                }
            } else {
                *target = Json::Object(entries);
            }
        }
        other => *target = other,
    }
}

/// Fluent configuration of one registered definition, returned by `add`
pub struct ServiceBuilder<'a> {
    store: &'a DefinitionStore,
    id: String,
}

impl ServiceBuilder<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Point the definition at a class name
    pub fn class(self, name: &str) -> Self {
        self.store.update(&self.id, |definition| {
            definition.target = Target::Class(name.to_string());
        });
        self
    }

    /// Point the definition at any target
    pub fn target(self, target: impl Into<Target>) -> Self {
        let target = target.into();
        self.store.update(&self.id, |definition| {
            definition.target = target;
        });
        self
    }

    /// Point the definition at a declared factory
    pub fn callable(self, callable: Callable) -> Self {
        self.target(Target::Callable(callable))
    }

    /// Set the constructor arguments
    pub fn arguments(self, arguments: Vec<Argument>) -> Self {
        self.store.update(&self.id, |definition| {
            definition.arguments = arguments;
        });
        self
    }

    /// Append a post-construction method call
    pub fn method(self, name: &str, arguments: Vec<Argument>) -> Self {
        self.store.update(&self.id, |definition| {
            definition.methods.push(MethodCall {
                name: name.to_string(),
                arguments,
            });
        });
        self
    }

    /// Set the sharing scope
    pub fn scope(self, scope: ServiceScope) -> Self {
        self.store.update(&self.id, |definition| {
            definition.scope = Some(scope);
        });
        self
    }
}

/// In-memory definition bundle ingested by `Container::load`
///
/// External loaders deserialize their file format into this shape; the
/// container only consumes the parsed structure.
#[derive(Debug, Default, Deserialize)]
pub struct DefinitionBundle {
    #[serde(default)]
    pub services: BTreeMap<String, ServiceEntry>,
    #[serde(default)]
    pub parameters: Json,
    #[serde(default)]
    pub mappings: BTreeMap<String, String>,
}

/// One service entry in a bundle
#[derive(Debug, Deserialize)]
pub struct ServiceEntry {
    /// Class name, `@id@` alias or `%path%` reference to a class name
    pub class: String,
    #[serde(default)]
    pub arguments: Vec<Json>,
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// One method call in a bundle service entry
#[derive(Debug, Deserialize)]
pub struct MethodEntry {
    pub call: String,
    #[serde(default)]
    pub arguments: Vec<Json>,
}
