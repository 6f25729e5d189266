//! Extension seams for the container
//!
//! All three hooks are optional; an unconfigured container behaves
//! identically with the hook paths compiled in.

use crate::container::Container;
use crate::error::DIResult;
use crate::value::Instance;

/// Post-construction decoration, offered every freshly built instance
/// after its method calls have run
pub trait DecoratePolicy: Send + Sync {
    fn decorate(&self, container: &Container, instance: &Instance) -> anyhow::Result<()>;
}

/// Supersedes local lookup on the internal reference and autowiring paths,
/// typically backed by a chain of containers
pub trait Delegator: Send + Sync {
    fn has(&self, id: &str) -> bool;
    fn get(&self, id: &str) -> DIResult<Instance>;
}

/// Lazily contributes definitions: asked whether it can provide an id
/// before `has` reports it unknown, then given the container to register
/// into
pub trait DefinitionProvider: Send + Sync {
    fn provides(&self, id: &str) -> bool;
    fn register(&self, container: &Container) -> DIResult<()>;
}
