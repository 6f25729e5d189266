//! Error types for service resolution
//!
//! Every failure surfaced by the container falls into one of three classes
//! (see [`ErrorKind`]): a lookup miss, a bad input to the definition API, or
//! a logic failure during resolution. Errors raised by user-supplied factory
//! and method closures are rewrapped into [`DIError::Instantiation`] so the
//! taxonomy stays closed.

/// Broad classification of a [`DIError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A service id, parameter path or class name could not be found
    NotFound,
    /// A caller handed the definition API something malformed
    InvalidArgument,
    /// Resolution itself went wrong (cycles, bad arguments, failed factories)
    Logic,
}

/// Errors that can occur during dependency injection operations
#[derive(Debug, thiserror::Error)]
pub enum DIError {
    /// No definition exists for the requested service id
    #[error("service not found: {id}")]
    ServiceNotFound { id: String },

    /// The parameter tree has no value at the requested dot-path
    #[error("parameter not found: {path}")]
    ParameterNotFound { path: String },

    /// No class metadata is registered under the given name
    #[error("class not found: {name}")]
    ClassNotFound { name: String },

    /// A scope string was neither a well-known scope nor a service reference
    #[error("invalid scope: {value}")]
    InvalidScope { value: String },

    /// Class metadata was registered twice under the same name
    #[error("class already registered: {name}")]
    ClassAlreadyRegistered { name: String },

    /// A definition bundle or definition entry was structurally malformed
    #[error("invalid definition: {message}")]
    InvalidDefinition { message: String },

    /// The service is already being constructed on the current call chain
    #[error("circular dependency detected for service: {id}")]
    CircularDependency { id: String },

    /// A reference chain exceeded the configured indirection depth
    #[error("reference loop detected resolving '{name}' at depth {depth}")]
    ReferenceLoop { name: String, depth: usize },

    /// A required parameter had no supplied or autowirable value
    #[error("missing argument for parameter: {name}")]
    ArgumentMissing { name: String },

    /// A positional value did not satisfy the parameter's declared type
    #[error("wrong type for parameter '{name}': expected {expected}, found {found}")]
    ParameterTypeWrong {
        name: String,
        expected: String,
        found: String,
    },

    /// A definition resolved to something that cannot produce an instance
    #[error("malformed definition for service '{id}': {message}")]
    DefinitionFormat { id: String, message: String },

    /// A mapping entry resolved to something that names no service or class
    #[error("malformed mapping for class '{class}': {message}")]
    MappingFormat { class: String, message: String },

    /// A method-call entry is missing its method name
    #[error("malformed method call in definition for service: {id}")]
    MalformedMethodCall { id: String },

    /// The instance's class metadata declares no such method
    #[error("method '{method}' not found on class: {class}")]
    MethodNotFound { class: String, method: String },

    /// A runnable target could not be turned into something callable
    #[error("invalid callable: {message}")]
    InvalidCallable { message: String },

    /// A user-supplied constructor, factory or method closure failed
    #[error("instantiation failed while {context}: {source}")]
    Instantiation {
        context: String,
        source: anyhow::Error,
    },
}

impl DIError {
    /// Classify this error into its broad [`ErrorKind`]
    pub fn kind(&self) -> ErrorKind {
        match self {
            DIError::ServiceNotFound { .. }
            | DIError::ParameterNotFound { .. }
            | DIError::ClassNotFound { .. } => ErrorKind::NotFound,
            DIError::InvalidScope { .. }
            | DIError::ClassAlreadyRegistered { .. }
            | DIError::InvalidDefinition { .. } => ErrorKind::InvalidArgument,
            DIError::CircularDependency { .. }
            | DIError::ReferenceLoop { .. }
            | DIError::ArgumentMissing { .. }
            | DIError::ParameterTypeWrong { .. }
            | DIError::DefinitionFormat { .. }
            | DIError::MappingFormat { .. }
            | DIError::MalformedMethodCall { .. }
            | DIError::MethodNotFound { .. }
            | DIError::InvalidCallable { .. }
            | DIError::Instantiation { .. } => ErrorKind::Logic,
        }
    }

    /// True when this is a lookup miss
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// True when this is a resolution-logic failure
    pub fn is_logic(&self) -> bool {
        self.kind() == ErrorKind::Logic
    }

    /// True when this is a malformed input to the definition API
    pub fn is_invalid_argument(&self) -> bool {
        self.kind() == ErrorKind::InvalidArgument
    }
}

pub type DIResult<T> = Result<T, DIError>;
