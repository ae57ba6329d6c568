use crate::error::call::CallError;
use crate::value::{Function, Value};

use std::collections::BTreeMap;
use std::future::Future;

/// Builder for the object of methods an API exposes.
///
/// ```ignore
/// let api = MethodSet::new()
///     .sync_method("add", |args| {
///         let a = args.first().and_then(Value::as_f64).unwrap_or_default();
///         let b = args.get(1).and_then(Value::as_f64).unwrap_or_default();
///         Ok(Value::from(a + b))
///     })
///     .value("version", "1.0");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodSet {
    members: BTreeMap<String, Value>,
}

impl MethodSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method<F, Fut>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CallError>> + Send + 'static,
    {
        self.value(name, Function::new(body))
    }

    pub fn sync_method<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.value(name, Function::sync(body))
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.insert(name.into(), value.into());
        self
    }

    pub fn nested(self, name: impl Into<String>, methods: MethodSet) -> Self {
        self.value(name, methods)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }
}

impl From<MethodSet> for Value {
    fn from(methods: MethodSet) -> Self {
        Value::Object(methods.members)
    }
}
