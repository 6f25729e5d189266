//! Class metadata registry
//!
//! The container never inspects types on its own. Everything it needs to
//! build an object is declared up front as a [`ClassSpec`]: the constructor
//! signature with its build closure, optional conventional accessors, named
//! methods and implemented interface names. The [`ClassRegistry`] answers
//! the two questions resolution asks: "how do I construct this name?" and
//! "is this instance of that type?".

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::container::Container;
use crate::error::{DIError, DIResult};
use crate::value::{Instance, Value};

/// Closure that produces a value, usually an instance, from matched arguments
pub type FactoryFn = Arc<dyn Fn(&Container, Vec<Value>) -> anyhow::Result<Value> + Send + Sync>;

/// Closure that constructs an instance from matched arguments
pub type ConstructFn =
    Arc<dyn Fn(&Container, Vec<Value>) -> anyhow::Result<Instance> + Send + Sync>;

/// Closure returning a conventionally managed instance (no arguments)
pub type AccessorFn = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Closure invoking a named method on an instance with matched arguments
pub type MethodFn = Arc<dyn Fn(&Instance, Vec<Value>) -> anyhow::Result<Value> + Send + Sync>;

/// One formal parameter of a constructor, factory or method
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    class: Option<String>,
    optional: bool,
}

impl ParamSpec {
    /// A required untyped parameter
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: None,
            optional: false,
        }
    }

    /// A required parameter declared with a class or interface type
    pub fn of_class(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: Some(class.into()),
            optional: false,
        }
    }

    /// An optional untyped parameter with a default
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: None,
            optional: true,
        }
    }

    /// An optional typed parameter with a default
    pub fn optional_of_class(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: Some(class.into()),
            optional: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// A standalone factory with a declared signature
#[derive(Clone)]
pub struct Callable {
    params: Vec<ParamSpec>,
    func: FactoryFn,
}

impl Callable {
    pub fn new<F>(params: Vec<ParamSpec>, func: F) -> Self
    where
        F: Fn(&Container, Vec<Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            params,
            func: Arc::new(func),
        }
    }

    /// A factory taking no arguments
    pub fn nullary<F>(func: F) -> Self
    where
        F: Fn(&Container, Vec<Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::new(Vec::new(), func)
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub(crate) fn call(
        &self,
        container: &Container,
        arguments: Vec<Value>,
    ) -> anyhow::Result<Value> {
        (self.func.as_ref())(container, arguments)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A named method declared on a class
#[derive(Clone)]
pub struct Method {
    params: Vec<ParamSpec>,
    func: MethodFn,
}

impl Method {
    pub fn new<F>(params: Vec<ParamSpec>, func: F) -> Self
    where
        F: Fn(&Instance, Vec<Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            params,
            func: Arc::new(func),
        }
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub(crate) fn call(
        &self,
        instance: &Instance,
        arguments: Vec<Value>,
    ) -> anyhow::Result<Value> {
        (self.func.as_ref())(instance, arguments)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A declared constructor with its visibility and signature
#[derive(Clone)]
pub struct Constructor {
    public: bool,
    params: Vec<ParamSpec>,
    func: ConstructFn,
}

impl Constructor {
    pub(crate) fn is_public(&self) -> bool {
        self.public
    }

    pub(crate) fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub(crate) fn call(
        &self,
        container: &Container,
        arguments: Vec<Value>,
    ) -> anyhow::Result<Instance> {
        (self.func.as_ref())(container, arguments)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("public", &self.public)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Everything the container knows about one constructible class
#[derive(Clone)]
pub struct ClassSpec {
    name: String,
    constructor: Option<Constructor>,
    nullary: Option<AccessorFn>,
    singleton: Option<AccessorFn>,
    invoke: Option<Method>,
    methods: HashMap<String, Method>,
    implements: Vec<String>,
}

impl ClassSpec {
    pub fn builder(name: impl Into<String>) -> ClassSpecBuilder {
        ClassSpecBuilder {
            name: name.into(),
            constructor: None,
            nullary: None,
            singleton: None,
            invoke: None,
            methods: HashMap::new(),
            implements: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    pub(crate) fn nullary(&self) -> Option<&AccessorFn> {
        self.nullary.as_ref()
    }

    pub(crate) fn singleton(&self) -> Option<&AccessorFn> {
        self.singleton.as_ref()
    }

    pub(crate) fn invoke(&self) -> Option<&Method> {
        self.invoke.as_ref()
    }

    pub(crate) fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub(crate) fn implements(&self, interface: &str) -> bool {
        self.implements.iter().any(|name| name == interface)
    }
}

impl fmt::Debug for ClassSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassSpec")
            .field("name", &self.name)
            .field("implements", &self.implements)
            .finish_non_exhaustive()
    }
}

/// Fluent construction of a [`ClassSpec`]
pub struct ClassSpecBuilder {
    name: String,
    constructor: Option<Constructor>,
    nullary: Option<AccessorFn>,
    singleton: Option<AccessorFn>,
    invoke: Option<Method>,
    methods: HashMap<String, Method>,
    implements: Vec<String>,
}

impl ClassSpecBuilder {
    /// Declare a public constructor with its signature and build closure
    pub fn constructor<F>(mut self, params: Vec<ParamSpec>, func: F) -> Self
    where
        F: Fn(&Container, Vec<Value>) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        self.constructor = Some(Constructor {
            public: true,
            params,
            func: Arc::new(func),
        });
        self
    }

    /// Declare a non-public constructor; resolution will require a
    /// singleton accessor to obtain instances
    pub fn private_constructor<F>(mut self, params: Vec<ParamSpec>, func: F) -> Self
    where
        F: Fn(&Container, Vec<Value>) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        self.constructor = Some(Constructor {
            public: false,
            params,
            func: Arc::new(func),
        });
        self
    }

    /// Declare that the class has no constructor and is built with no
    /// arguments
    pub fn nullary<F>(mut self, func: F) -> Self
    where
        F: Fn() -> Instance + Send + Sync + 'static,
    {
        self.nullary = Some(Arc::new(func));
        self
    }

    /// Declare a conventional instance accessor for classes that manage
    /// their own single instance
    pub fn singleton<F>(mut self, func: F) -> Self
    where
        F: Fn() -> Instance + Send + Sync + 'static,
    {
        self.singleton = Some(Arc::new(func));
        self
    }

    /// Declare the functor entry point, called when the class is built
    /// without a constructor but the definition supplied arguments
    pub fn invoke<F>(mut self, params: Vec<ParamSpec>, func: F) -> Self
    where
        F: Fn(&Instance, Vec<Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.invoke = Some(Method::new(params, func));
        self
    }

    /// Declare a named method with its signature
    pub fn method<F>(mut self, name: impl Into<String>, params: Vec<ParamSpec>, func: F) -> Self
    where
        F: Fn(&Instance, Vec<Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Method::new(params, func));
        self
    }

    /// Declare an implemented interface name, consulted by typed argument
    /// matching
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.implements.push(interface.into());
        self
    }

    pub fn build(self) -> ClassSpec {
        ClassSpec {
            name: self.name,
            constructor: self.constructor,
            nullary: self.nullary,
            singleton: self.singleton,
            invoke: self.invoke,
            methods: self.methods,
            implements: self.implements,
        }
    }
}

/// Registry of class metadata, the container's injected reflection source
#[derive(Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, ClassSpec>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register class metadata; duplicate names are rejected
    pub fn register(&self, spec: ClassSpec) -> DIResult<()> {
        let mut classes = self.classes.write();
        if classes.contains_key(spec.name()) {
            return Err(DIError::ClassAlreadyRegistered {
                name: spec.name().to_string(),
            });
        }
        debug!(class = spec.name(), "registered class metadata");
        classes.insert(spec.name().to_string(), spec);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<ClassSpec> {
        self.classes.read().get(name).cloned()
    }

    pub fn class_count(&self) -> usize {
        self.classes.read().len()
    }

    /// True when the instance's class is `class` or declares it as an
    /// implemented interface
    pub fn is_instance_of(&self, instance: &Instance, class: &str) -> bool {
        if instance.type_name() == class {
            return true;
        }
        self.classes
            .read()
            .get(instance.type_name())
            .map(|spec| spec.implements(class))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_spec(name: &str) -> ClassSpec {
        ClassSpec::builder(name).nullary(move || Instance::new("X", ())).build()
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = ClassRegistry::new();
        registry.register(empty_spec("Logger")).unwrap();
        let again = registry.register(empty_spec("Logger"));
        assert!(matches!(
            again,
            Err(DIError::ClassAlreadyRegistered { name }) if name == "Logger"
        ));
        assert_eq!(registry.class_count(), 1);
    }

    #[test]
    fn instance_of_follows_declared_interfaces() {
        let registry = ClassRegistry::new();
        registry
            .register(
                ClassSpec::builder("FileLogger")
                    .nullary(|| Instance::new("FileLogger", ()))
                    .implements("Logger")
                    .build(),
            )
            .unwrap();

        let instance = Instance::new("FileLogger", ());
        assert!(registry.is_instance_of(&instance, "FileLogger"));
        assert!(registry.is_instance_of(&instance, "Logger"));
        assert!(!registry.is_instance_of(&instance, "Cache"));
    }
}
