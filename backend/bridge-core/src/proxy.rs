//! Recursive proxy over a value graph.
//!
//! A [`ProxyHandle`] is a root value plus a property path into it. Reading a
//! member classifies what is found there:
//!
//! - functions come back as [`ProxyNode::Callable`], a fresh forwarding stub
//!   that the function transfer handler can pick up if it crosses a channel
//! - arrays and objects come back as [`ProxyNode::Nested`], another handle one
//!   level deeper
//! - `undefined`, `null`, numbers and strings pass through as
//!   [`ProxyNode::Value`]
//! - anything else is handed on as [`ProxyNode::ByReference`] for the channel
//!   to marshal however it marshals that kind
//!
//! Handles never mutate the wrapped graph and never fail; a path that leads
//! nowhere reads as `undefined`.

use crate::error::call::CallError;
use crate::rpc::ApiTarget;
use crate::value::{Function, PropertyPath, Value, display_path};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

static UNDEFINED: Value = Value::Undefined;

/// What a property read through a [`ProxyHandle`] yields.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyNode {
    Value(Value),
    Callable(Function),
    Nested(ProxyHandle),
    ByReference(Value),
}

impl ProxyNode {
    fn classify(handle: &ProxyHandle) -> Self {
        match handle.target() {
            Value::Function(function) => ProxyNode::Callable(function.forwarding()),
            Value::Array(_) | Value::Object(_) => ProxyNode::Nested(handle.clone()),
            value @ (Value::Undefined | Value::Null | Value::Number(_) | Value::String(_)) => {
                ProxyNode::Value(value.clone())
            }
            other => ProxyNode::ByReference(other.clone()),
        }
    }

    /// Plain value behind this node.
    pub fn into_value(self) -> Value {
        match self {
            ProxyNode::Value(value) | ProxyNode::ByReference(value) => value,
            ProxyNode::Callable(function) => Value::Function(function),
            ProxyNode::Nested(handle) => handle.snapshot(),
        }
    }
}

/// A view into a shared value graph at some property path.
#[derive(Debug, Clone)]
pub struct ProxyHandle {
    root: Arc<Value>,
    path: PropertyPath,
}

impl ProxyHandle {
    pub fn wrap(value: impl Into<Value>) -> Self {
        Self {
            root: Arc::new(value.into()),
            path: PropertyPath::new(),
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The value this handle points at, or `undefined` if the path is dead.
    pub fn target(&self) -> &Value {
        self.root.at(&self.path).unwrap_or(&UNDEFINED)
    }

    /// Owned copy of the value this handle points at.
    pub fn snapshot(&self) -> Value {
        self.target().clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.target().has(name)
    }

    /// Read one member.
    pub fn get(&self, name: &str) -> ProxyNode {
        ProxyNode::classify(&self.child(name))
    }

    /// Read a member several levels down.
    pub fn resolve(&self, path: &[String]) -> ProxyNode {
        let mut handle = self.clone();
        handle.path.extend(path.iter().cloned());
        ProxyNode::classify(&handle)
    }

    fn child(&self, name: &str) -> Self {
        let mut path = self.path.clone();
        path.push(name.to_string());
        Self {
            root: Arc::clone(&self.root),
            path,
        }
    }
}

impl PartialEq for ProxyHandle {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.target() == other.target()
    }
}

impl From<ProxyHandle> for Value {
    fn from(handle: ProxyHandle) -> Self {
        handle.snapshot()
    }
}

impl ApiTarget for ProxyHandle {
    fn read<'a>(&'a self, path: &'a [String]) -> BoxFuture<'a, Result<Value, CallError>> {
        async move { Ok(self.resolve(path).into_value()) }.boxed()
    }

    fn invoke<'a>(
        &'a self,
        path: &'a [String],
        args: Vec<Value>,
    ) -> BoxFuture<'a, Result<Value, CallError>> {
        async move {
            match self.resolve(path) {
                ProxyNode::Callable(function) => function.call(args).await,
                other => Err(CallError::NotCallable {
                    message: format!(
                        "{} is a {}, not a function",
                        display_path(path),
                        other.into_value().kind()
                    ),
                    location: ErrorLocation::from(Location::caller()),
                }),
            }
        }
        .boxed()
    }
}
