//! Values that cross the bridge.
//!
//! A [`Value`] is the dynamic object graph exchanged between two execution
//! contexts. Most variants are plain data and cross the channel natively.
//! Three do not: [`Function`], [`CustomEvent`] and [`PhpResponse`]. Those are
//! carried by the transfer handlers in [`crate::transfer`].

use crate::error::call::CallError;

use models::PhpResponse;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use uuid::Uuid;

/// Property names from a root object down to a nested member.
pub type PropertyPath = Vec<String>;

/// Build a [`PropertyPath`] from string-like segments.
pub fn path<I, S>(segments: I) -> PropertyPath
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    segments.into_iter().map(Into::into).collect()
}

/// Dotted form of a path, for logs and error messages.
pub fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        String::from("<root>")
    } else {
        path.join(".")
    }
}

type FunctionBody = dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value, CallError>> + Send + Sync;

/// A callable value.
///
/// Functions are compared by identity, not by behavior. A forwarding stub
/// made with [`Function::forwarding`] keeps the identity of its target.
#[derive(Clone)]
pub struct Function {
    id: Uuid,
    body: Arc<FunctionBody>,
}

impl Function {
    /// Wrap an async closure.
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CallError>> + Send + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            body: Arc::new(move |args: Vec<Value>| body(args).boxed()),
        }
    }

    /// Wrap a synchronous closure.
    pub fn sync<F>(body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        let body = Arc::new(body);
        Self::new(move |args: Vec<Value>| {
            let body = Arc::clone(&body);
            async move { body(args) }
        })
    }

    /// Fresh callable that forwards every call, arguments untouched, to `self`.
    pub fn forwarding(&self) -> Self {
        let target = self.clone();
        Self {
            id: self.id,
            body: Arc::new(move |args: Vec<Value>| {
                let target = target.clone();
                async move { target.call(args).await }.boxed()
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn call(&self, args: Vec<Value>) -> Result<Value, CallError> {
        (self.body)(args).await
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.id)
    }
}

/// A UI-style event. Only its `detail` payload is meaningful across contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEvent {
    pub kind: String,
    pub detail: Box<Value>,
}

impl CustomEvent {
    pub fn new(kind: impl Into<String>, detail: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            detail: Box::new(detail.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Function(Function),
    Event(CustomEvent),
    Response(PhpResponse),
}

impl Value {
    /// Object from key/value pairs.
    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Event(_) => "event",
            Value::Response(_) => "response",
        }
    }

    /// Member lookup. Arrays are indexed by decimal position.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Walk a path of member lookups.
    pub fn at(&self, path: &[String]) -> Option<&Value> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_response(&self) -> Option<&PhpResponse> {
        match self {
            Value::Response(r) => Some(r),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(map)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<CustomEvent> for Value {
    fn from(event: CustomEvent) -> Self {
        Value::Event(event)
    }
}

impl From<PhpResponse> for Value {
    fn from(response: PhpResponse) -> Self {
        Value::Response(response)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
