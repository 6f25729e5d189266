//! Runtime values flowing through resolution
//!
//! [`Instance`] is a shared, type-tagged service object; [`Value`] is what an
//! argument becomes once every reference inside it has been dereferenced.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as Json;

/// A constructed service object, shared and tagged with its class name
///
/// The tag is the name the instance's class metadata was registered under;
/// it drives typed argument matching and method dispatch.
#[derive(Clone)]
pub struct Instance {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: Arc<str>,
}

impl Instance {
    /// Wrap a value as a shared instance of the named class
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: type_name.into(),
        }
    }

    /// Wrap an already-shared value as an instance of the named class
    pub fn from_arc<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: type_name.into(),
        }
    }

    /// The class name this instance was tagged with
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Recover the concrete value, if the tag matches the actual type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    /// True when both handles point at the same underlying object
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// A fully dereferenced argument value
#[derive(Debug, Clone)]
pub enum Value {
    /// Plain configuration data
    Json(Json),
    /// A resolved service instance
    Instance(Instance),
    /// An ordered container whose elements were resolved individually
    List(Vec<Value>),
    /// A keyed container whose entries were resolved individually
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn into_instance(self) -> Option<Instance> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Json> {
        match self {
            Value::Json(json) => Some(json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Json(Json::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Json(Json::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Json(Json::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Short label for error messages
    pub fn type_label(&self) -> String {
        match self {
            Value::Instance(instance) => instance.type_name().to_string(),
            Value::Json(json) => match json {
                Json::Null => "null",
                Json::Bool(_) => "boolean",
                Json::Number(_) => "number",
                Json::String(_) => "string",
                Json::Array(_) => "array",
                Json::Object(_) => "object",
            }
            .to_string(),
            Value::List(_) => "list".to_string(),
            Value::Map(_) => "map".to_string(),
        }
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(instance)
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Value::Json(json)
    }
}
