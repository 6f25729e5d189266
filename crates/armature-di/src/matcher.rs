//! Positional argument matching and autowiring
//!
//! Walks a target's formal parameter list against the already-dereferenced
//! candidate values. Untyped parameters consume positionally; typed
//! parameters consume only a matching instance and are otherwise autowired
//! from the mapping table or by treating the type name as a service id. A
//! candidate skipped by a typed parameter stays available for later formals.

use std::collections::VecDeque;

use serde_json::Value as Json;
use tracing::debug;

use crate::container::Container;
use crate::error::{DIError, DIResult};
use crate::reference::Reference;
use crate::registry::ParamSpec;
use crate::resolver::ReferenceResolver;
use crate::value::{Instance, Value};

pub(crate) struct ArgumentMatcher<'a> {
    container: &'a Container,
}

impl<'a> ArgumentMatcher<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub(crate) fn match_arguments(
        &self,
        params: &[ParamSpec],
        provided: Vec<Value>,
    ) -> DIResult<Vec<Value>> {
        let exact_arity = provided.len() == params.len();
        let mut queue: VecDeque<Value> = provided.into();
        let mut matched = Vec::with_capacity(params.len());

        for spec in params {
            if spec.is_optional() && queue.is_empty() {
                break;
            }
            match spec.class() {
                None => match queue.pop_front() {
                    Some(value) => matched.push(value),
                    None => {
                        return Err(DIError::ArgumentMissing {
                            name: spec.name().to_string(),
                        })
                    }
                },
                Some(class) => {
                    let front_matches = match queue.front() {
                        Some(Value::Instance(instance)) => {
                            self.container.registry().is_instance_of(instance, class)
                        }
                        _ => false,
                    };
                    if front_matches {
                        if let Some(value) = queue.pop_front() {
                            matched.push(value);
                        }
                    } else if exact_arity {
                        let found = queue
                            .front()
                            .map(Value::type_label)
                            .unwrap_or_else(|| "nothing".to_string());
                        return Err(DIError::ParameterTypeWrong {
                            name: spec.name().to_string(),
                            expected: class.to_string(),
                            found,
                        });
                    } else {
                        matched.push(Value::Instance(self.autowire(class)?));
                    }
                }
            }
        }
        Ok(matched)
    }

    /// Synthesize an instance for an unfilled typed parameter: follow the
    /// mapping table if present, else treat the type name as a service id
    fn autowire(&self, class: &str) -> DIResult<Instance> {
        match self.container.store().mapping(class) {
            Some(target) => {
                debug!(class, target, "autowiring through mapping");
                match Reference::parse(&target) {
                    Some(reference) => {
                        match ReferenceResolver::new(self.container)
                            .resolve_reference(&reference)?
                        {
                            Value::Instance(instance) => Ok(instance),
                            Value::Json(Json::String(id)) => self.supply(class, &id),
                            other => Err(DIError::MappingFormat {
                                class: class.to_string(),
                                message: format!("resolved to {}", other.type_label()),
                            }),
                        }
                    }
                    None => self.supply(class, &target),
                }
            }
            None => {
                debug!(class, "autowiring by type name");
                self.supply(class, class)
            }
        }
    }

    fn supply(&self, class: &str, id: &str) -> DIResult<Instance> {
        if self.container.delegated_has(id) {
            self.container.delegated_get(id)
        } else {
            Err(DIError::ClassNotFound {
                name: class.to_string(),
            })
        }
    }
}
