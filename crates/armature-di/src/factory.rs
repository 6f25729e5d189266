//! Instance construction
//!
//! The [`Instantiator`] turns one service definition into a live instance:
//! alias targets short-circuit to the aliased service, factory targets call
//! their declared closure, class targets go through the registered metadata
//! (nullary build, conventional singleton accessor or matched constructor),
//! and post-construction method calls run in declaration order. Failures
//! from user closures are rewrapped into [`DIError::Instantiation`].

use serde_json::Value as Json;
use tracing::debug;

use crate::container::Container;
use crate::definition::{ServiceDefinition, Target};
use crate::error::{DIError, DIResult};
use crate::matcher::ArgumentMatcher;
use crate::reference::{Argument, Reference};
use crate::registry::Callable;
use crate::resolver::ReferenceResolver;
use crate::value::{Instance, Value};

/// A runnable target for `Container::run`
#[derive(Debug, Clone)]
pub enum Invokable {
    /// A declared factory with its own signature
    Callable(Callable),
    /// A method on a resolvable target (pseudo-callable)
    Method { target: Argument, name: String },
}

impl Invokable {
    pub fn callable(callable: Callable) -> Self {
        Invokable::Callable(callable)
    }

    pub fn method(target: impl Into<Argument>, name: impl Into<String>) -> Self {
        Invokable::Method {
            target: target.into(),
            name: name.into(),
        }
    }
}

impl From<Callable> for Invokable {
    fn from(callable: Callable) -> Self {
        Invokable::Callable(callable)
    }
}

/// Result of building one service
pub(crate) struct BuiltService {
    pub(crate) instance: Instance,
    /// True when the instance came from an alias target; pool bookkeeping
    /// then belongs to the aliased id, not this one
    pub(crate) alias: bool,
}

pub(crate) struct Instantiator<'a> {
    container: &'a Container,
}

impl<'a> Instantiator<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Build the instance for `id`, run its method calls, and report
    /// whether it was an alias resolution
    pub(crate) fn create(&self, id: &str, explicit: &[Argument]) -> DIResult<BuiltService> {
        let definition =
            self.container
                .store()
                .definition(id)
                .ok_or_else(|| DIError::ServiceNotFound {
                    id: id.to_string(),
                })?;
        let arguments: Vec<Argument> = if explicit.is_empty() {
            definition.arguments.clone()
        } else {
            explicit.to_vec()
        };

        let (instance, alias) = match &definition.target {
            Target::Callable(callable) => {
                debug!(id, "building service from factory");
                let value = self.call_factory(id, callable, &arguments)?;
                let instance = value.into_instance().ok_or_else(|| DIError::DefinitionFormat {
                    id: id.to_string(),
                    message: "factory did not produce an instance".to_string(),
                })?;
                (instance, false)
            }
            Target::Reference(Reference::Service(other)) => {
                debug!(id, alias = %other, "resolving alias");
                (self.container.get(other)?, true)
            }
            Target::Reference(reference @ Reference::Parameter(_)) => {
                match ReferenceResolver::new(self.container).resolve_reference(reference)? {
                    Value::Instance(instance) => (instance, true),
                    Value::Json(Json::String(class)) => {
                        (self.construct(id, &class, arguments)?, false)
                    }
                    other => {
                        return Err(DIError::DefinitionFormat {
                            id: id.to_string(),
                            message: format!(
                                "reference target resolved to {}",
                                other.type_label()
                            ),
                        })
                    }
                }
            }
            Target::Class(class) => (self.construct(id, class, arguments)?, false),
        };

        self.run_methods(id, &definition, &instance)?;
        Ok(BuiltService { instance, alias })
    }

    /// Build an instance of `class` from its registered metadata
    fn construct(&self, id: &str, class: &str, arguments: Vec<Argument>) -> DIResult<Instance> {
        let spec = self
            .container
            .registry()
            .get(class)
            .ok_or_else(|| DIError::ClassNotFound {
                name: class.to_string(),
            })?;
        let candidates = ReferenceResolver::new(self.container).resolve_all(&arguments)?;

        if let Some(constructor) = spec.constructor() {
            if constructor.is_public() {
                let matched = ArgumentMatcher::new(self.container)
                    .match_arguments(constructor.params(), candidates)?;
                return constructor
                    .call(self.container, matched)
                    .map_err(|source| DIError::Instantiation {
                        context: format!("constructing '{class}' for service '{id}'"),
                        source,
                    });
            }
        }

        let instance = if spec.constructor().is_some() {
            // Non-public constructor: the class manages its own instance
            let accessor = spec.singleton().ok_or_else(|| DIError::DefinitionFormat {
                id: id.to_string(),
                message: format!(
                    "class '{class}' has a non-public constructor and no singleton accessor"
                ),
            })?;
            (accessor.as_ref())()
        } else if let Some(build) = spec.nullary() {
            (build.as_ref())()
        } else if let Some(accessor) = spec.singleton() {
            (accessor.as_ref())()
        } else {
            return Err(DIError::DefinitionFormat {
                id: id.to_string(),
                message: format!("class '{class}' is not constructible"),
            });
        };

        // Functor convention: arguments supplied to a class resolved
        // without a public constructor go to its invoke method
        if !arguments.is_empty() {
            if let Some(invoke) = spec.invoke() {
                let matched = ArgumentMatcher::new(self.container)
                    .match_arguments(invoke.params(), candidates)?;
                invoke
                    .call(&instance, matched)
                    .map_err(|source| DIError::Instantiation {
                        context: format!("invoking '{class}' for service '{id}'"),
                        source,
                    })?;
            }
        }
        Ok(instance)
    }

    /// Run the definition's method calls against the built instance
    fn run_methods(
        &self,
        id: &str,
        definition: &ServiceDefinition,
        instance: &Instance,
    ) -> DIResult<()> {
        if definition.methods.is_empty() {
            return Ok(());
        }
        let spec = self
            .container
            .registry()
            .get(instance.type_name())
            .ok_or_else(|| DIError::ClassNotFound {
                name: instance.type_name().to_string(),
            })?;

        for call in &definition.methods {
            if call.name.is_empty() {
                return Err(DIError::MalformedMethodCall { id: id.to_string() });
            }
            let method = spec.method(&call.name).ok_or_else(|| DIError::MethodNotFound {
                class: spec.name().to_string(),
                method: call.name.clone(),
            })?;
            let candidates =
                ReferenceResolver::new(self.container).resolve_all(&call.arguments)?;
            let matched =
                ArgumentMatcher::new(self.container).match_arguments(method.params(), candidates)?;
            method
                .call(instance, matched)
                .map_err(|source| DIError::Instantiation {
                    context: format!("calling '{}::{}' for service '{id}'", spec.name(), call.name),
                    source,
                })?;
        }
        Ok(())
    }

    fn call_factory(
        &self,
        id: &str,
        callable: &Callable,
        arguments: &[Argument],
    ) -> DIResult<Value> {
        let candidates = ReferenceResolver::new(self.container).resolve_all(arguments)?;
        let matched =
            ArgumentMatcher::new(self.container).match_arguments(callable.params(), candidates)?;
        callable
            .call(self.container, matched)
            .map_err(|source| DIError::Instantiation {
                context: format!("running factory for service '{id}'"),
                source,
            })
    }

    /// Execute a runnable target for `Container::run`
    pub(crate) fn execute(&self, invokable: &Invokable, arguments: &[Argument]) -> DIResult<Value> {
        let resolver = ReferenceResolver::new(self.container);
        let candidates = resolver.resolve_all(arguments)?;
        match invokable {
            Invokable::Callable(callable) => {
                let matched = ArgumentMatcher::new(self.container)
                    .match_arguments(callable.params(), candidates)?;
                callable
                    .call(self.container, matched)
                    .map_err(|source| DIError::Instantiation {
                        context: "executing callable".to_string(),
                        source,
                    })
            }
            Invokable::Method { target, name } => {
                if name.is_empty() {
                    return Err(DIError::InvalidCallable {
                        message: "empty method name".to_string(),
                    });
                }
                let instance = match resolver.resolve(target)? {
                    Value::Instance(instance) => instance,
                    other => {
                        return Err(DIError::InvalidCallable {
                            message: format!("callable target resolved to {}", other.type_label()),
                        })
                    }
                };
                let spec = self
                    .container
                    .registry()
                    .get(instance.type_name())
                    .ok_or_else(|| DIError::ClassNotFound {
                        name: instance.type_name().to_string(),
                    })?;
                let method = spec.method(name).ok_or_else(|| DIError::MethodNotFound {
                    class: spec.name().to_string(),
                    method: name.clone(),
                })?;
                let matched = ArgumentMatcher::new(self.container)
                    .match_arguments(method.params(), candidates)?;
                method
                    .call(&instance, matched)
                    .map_err(|source| DIError::Instantiation {
                        context: format!("invoking '{}::{name}'", spec.name()),
                        source,
                    })
            }
        }
    }
}
