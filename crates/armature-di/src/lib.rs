//! Definition-driven service resolution for Rust applications
//!
//! This crate resolves named service definitions into fully constructed
//! object graphs. A definition names a constructible target, its arguments
//! (which may reference other services with `"@id@"` or configuration
//! parameters with `"%dot.path%"`), post-construction method calls and a
//! sharing scope. Construction metadata is declared explicitly through the
//! [`ClassRegistry`]; the container never inspects types on its own.
//!
//! Components:
//! 1. [`DefinitionStore`] - service definitions, parameter tree, mappings
//! 2. [`ClassRegistry`] - declared constructor and method signatures
//! 3. Reference resolution - `@id@` / `%path%` indirection with a bounded depth
//! 4. Argument matching - positional consumption plus typed autowiring
//! 5. Scoped instance pool - shared, single and ancestor-scoped sharing
//! 6. Cycle tracking - circular dependencies fail fast, the container stays usable
//!
//! ## Quick Start
//!
//! ```rust
//! use armature_di::{args, ClassSpec, Container, Instance, ParamSpec};
//!
//! struct Database { dsn: String }
//!
//! let container = Container::new();
//! container
//!     .register_class(
//!         ClassSpec::builder("Database")
//!             .constructor(vec![ParamSpec::required("dsn")], |_, args| {
//!                 let dsn = args[0].as_str().unwrap_or_default().to_string();
//!                 Ok(Instance::new("Database", Database { dsn }))
//!             })
//!             .build(),
//!     )
//!     .unwrap();
//!
//! container.set("db.dsn", "sqlite::memory:");
//! container.add("db").class("Database").arguments(args!["%db.dsn%"]);
//!
//! let db = container.get("db").unwrap();
//! assert_eq!(db.downcast::<Database>().unwrap().dsn, "sqlite::memory:");
//! ```

pub mod container;
pub mod definition;
pub mod error;
pub mod factory;
pub mod hooks;
pub mod reference;
pub mod registry;
pub mod value;

mod matcher;
mod resolver;
mod scope;
mod tracker;

pub use container::{Container, ContainerBuilder, ContainerConfig};
pub use definition::{
    DefinitionBundle, DefinitionStore, MethodCall, MethodEntry, ServiceBuilder,
    ServiceDefinition, ServiceEntry, ServiceScope, Target,
};
pub use error::{DIError, DIResult, ErrorKind};
pub use factory::Invokable;
pub use hooks::{DecoratePolicy, DefinitionProvider, Delegator};
pub use reference::{Argument, Reference};
pub use registry::{Callable, ClassRegistry, ClassSpec, ClassSpecBuilder, Method, ParamSpec};
pub use value::{Instance, Value};

/// Convenience macro building a `Vec<Argument>` from mixed literals,
/// reference strings and instances
///
/// ```rust
/// use armature_di::args;
///
/// let arguments = args!["@db@", "%cache.ttl%", 42, "plain"];
/// assert_eq!(arguments.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Argument>::new()
    };
    ($($argument:expr),+ $(,)?) => {
        vec![$($crate::Argument::from($argument)),+]
    };
}
