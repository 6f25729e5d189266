//! Reference resolution
//!
//! Turns parsed [`Argument`]s into runtime [`Value`]s. Service references go
//! through the container (or its delegator) and may recursively trigger
//! further resolution; parameter references walk the parameter tree and may
//! chain through further references, bounded by the configured indirection
//! depth.

use std::collections::BTreeMap;

use serde_json::Value as Json;
use tracing::debug;

use crate::container::Container;
use crate::error::{DIError, DIResult};
use crate::reference::{Argument, Reference};
use crate::value::Value;

pub(crate) struct ReferenceResolver<'a> {
    container: &'a Container,
}

impl<'a> ReferenceResolver<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Resolve one argument, recursing into containers
    pub(crate) fn resolve(&self, argument: &Argument) -> DIResult<Value> {
        match argument {
            Argument::Literal(json) => Ok(Value::Json(json.clone())),
            Argument::Instance(instance) => Ok(Value::Instance(instance.clone())),
            Argument::Reference(reference) => self.resolve_reference(reference),
            Argument::List(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for item in items {
                    resolved.push(self.resolve(item)?);
                }
                Ok(Value::List(resolved))
            }
            Argument::Map(entries) => {
                let mut resolved = BTreeMap::new();
                for (key, value) in entries {
                    resolved.insert(key.clone(), self.resolve(value)?);
                }
                Ok(Value::Map(resolved))
            }
        }
    }

    /// Resolve an ordered argument list
    pub(crate) fn resolve_all(&self, arguments: &[Argument]) -> DIResult<Vec<Value>> {
        arguments.iter().map(|argument| self.resolve(argument)).collect()
    }

    /// Resolve a single reference, following parameter indirection chains
    pub(crate) fn resolve_reference(&self, reference: &Reference) -> DIResult<Value> {
        self.follow(reference, 0)
    }

    fn follow(&self, reference: &Reference, depth: usize) -> DIResult<Value> {
        if depth >= self.container.config().max_reference_depth {
            return Err(DIError::ReferenceLoop {
                name: reference.name().to_string(),
                depth,
            });
        }
        match reference {
            Reference::Service(id) => {
                self.container.delegated_get(id).map(Value::Instance)
            }
            Reference::Parameter(path) => {
                let value = self.container.store().parameter(path)?;
                if let Json::String(text) = &value {
                    if let Some(next) = Reference::parse(text) {
                        debug!(from = %reference, to = %next, depth, "following reference chain");
                        return self.follow(&next, depth + 1);
                    }
                }
                Ok(Value::Json(value))
            }
        }
    }
}
