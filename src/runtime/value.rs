// src/runtime/value.rs
//! Dynamic values observed by module code
//!
//! Modules exchange `Value`s: exports, globals, mock module records and
//! function arguments. Objects are shared by reference (`ObjectRef`), so a
//! wrapper such as a global proxy always sees the wrapped object's current
//! state.

use crate::utils::errors::{HarnessError, Result};
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Read surface of an object-like value
pub trait ObjectLike: Send + Sync {
    /// Read a member; missing members read as `Undefined`
    fn get(&self, key: &str) -> Value;

    /// Write a member
    fn set(&self, key: &str, value: Value);

    /// Remove a member, returning whether it existed
    fn delete(&self, key: &str) -> bool;

    /// Own member names
    fn keys(&self) -> Vec<String>;

    fn has(&self, key: &str) -> bool {
        !self.get(key).is_undefined()
    }
}

/// Shared handle to an object
pub type ObjectRef = Arc<dyn ObjectLike>;

/// Native function signature
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// A callable value
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    call: Arc<NativeFn>,
}

impl Function {
    pub fn new<F>(name: impl AsRef<str>, call: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.as_ref()),
            call: Arc::new(call),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.call)(args)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}

/// A pending asynchronous result produced by module code
///
/// The result can be awaited once.
#[derive(Clone)]
pub struct Task {
    inner: Arc<Mutex<Option<BoxFuture<'static, Result<Value>>>>>,
}

impl Task {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Some(Box::pin(future)))),
        }
    }

    /// Await the task's result
    pub async fn wait(&self) -> Result<Value> {
        let future = self.inner.lock().take().ok_or(HarnessError::TaskConsumed)?;
        future.await
    }

    pub fn is_consumed(&self) -> bool {
        self.inner.lock().is_none()
    }

    pub fn ptr_eq(&self, other: &Task) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_consumed() {
            write!(f, "Task {{ <consumed> }}")
        } else {
            write!(f, "Task {{ <pending> }}")
        }
    }
}

/// A dynamic value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(ObjectRef),
    Function(Function),
    Task(Task),
}

impl Value {
    /// Wrap a fresh empty object
    pub fn object() -> Self {
        Value::Object(Arc::new(PlainObject::new()))
    }

    pub fn from_object(object: impl ObjectLike + 'static) -> Self {
        Value::Object(Arc::new(object))
    }

    pub fn function<F>(name: impl AsRef<str>, call: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Function(Function::new(name, call))
    }

    /// Script-visible type name
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) | Value::Object(_) | Value::Task(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
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

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Value::Task(t) => Some(t),
            _ => None,
        }
    }

    /// Member read; non-objects read every member as `Undefined`
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(o) => o.get(key),
            Value::Array(items) if key == "length" => Value::Number(items.len() as f64),
            Value::Array(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default(),
            Value::String(s) if key == "length" => Value::Number(s.chars().count() as f64),
            Value::Function(f) if key == "name" => Value::String(f.name().to_string()),
            _ => Value::Undefined,
        }
    }

    /// Invoke a function value
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match self {
            Value::Function(f) => f.call(args),
            other => Err(HarnessError::NotCallable {
                type_of: other.type_of(),
            }),
        }
    }

    /// Call a method on an object value
    pub fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.get(name).call(args)
    }

    /// Convert parsed JSON into a value
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let object = PlainObject::new();
                for (key, value) in map {
                    object.set(&key, Value::from_json(value));
                }
                Value::from_object(object)
            }
        }
    }

    /// Convert to JSON; functions, tasks and `undefined` have no JSON form
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Undefined | Value::Function(_) | Value::Task(_) => None,
            Value::Null => Some(serde_json::Value::Null),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            // integral numbers round-trip as integers
            Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                Some(serde_json::Value::from(*n as i64))
            }
            Value::Number(n) => Some(
                serde_json::Number::from_f64(*n)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            ),
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            Value::Array(items) => Some(serde_json::Value::Array(
                items
                    .iter()
                    .map(|v| v.to_json().unwrap_or(serde_json::Value::Null))
                    .collect(),
            )),
            Value::Object(o) => {
                let mut map = serde_json::Map::new();
                for key in o.keys() {
                    if let Some(json) = o.get(&key).to_json() {
                        map.insert(key, json);
                    }
                }
                Some(serde_json::Value::Object(map))
            }
        }
    }
}

/// Strict equality: primitives by value, everything else by identity
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::eq(Arc::as_ptr(a) as *const u8, Arc::as_ptr(b) as *const u8)
            }
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Task(a), Value::Task(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            Value::Object(o) => write!(f, "[Object {{ {} }}]", o.keys().join(", ")),
            Value::Function(func) => write!(f, "{:?}", func),
            Value::Task(task) => write!(f, "{:?}", task),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Function> for Value {
    fn from(value: Function) -> Self {
        Value::Function(value)
    }
}

impl From<Task> for Value {
    fn from(value: Task) -> Self {
        Value::Task(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

/// Ordinary mutable object
#[derive(Default)]
pub struct PlainObject {
    members: RwLock<BTreeMap<String, Value>>,
}

impl PlainObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style member insertion
    pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
        self.members.write().insert(key.to_string(), value.into());
        self
    }
}

impl ObjectLike for PlainObject {
    fn get(&self, key: &str) -> Value {
        self.members.read().get(key).cloned().unwrap_or_default()
    }

    fn set(&self, key: &str, value: Value) {
        self.members.write().insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) -> bool {
        self.members.write().remove(key).is_some()
    }

    fn keys(&self) -> Vec<String> {
        self.members.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_of() {
        assert_eq!(Value::Undefined.type_of(), "undefined");
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::from(1).type_of(), "number");
        assert_eq!(Value::from("x").type_of(), "string");
        assert_eq!(Value::object().type_of(), "object");
        assert_eq!(
            Value::function("noop", |_| Ok(Value::Undefined)).type_of(),
            "function"
        );
    }

    #[test]
    fn test_plain_object_members() {
        let object = Value::from_object(PlainObject::new().with("a", 1).with("b", "two"));
        assert_eq!(object.get("a"), Value::from(1));
        assert_eq!(object.get("b").as_str(), Some("two"));
        assert!(object.get("c").is_undefined());

        let handle = object.as_object().unwrap();
        handle.set("c", Value::Bool(true));
        assert_eq!(object.get("c"), Value::Bool(true));
        assert!(handle.delete("c"));
        assert!(!handle.has("c"));
    }

    #[test]
    fn test_identity_equality() {
        let a = Value::object();
        let b = Value::object();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);

        let f = Function::new("f", |_| Ok(Value::Null));
        assert_eq!(Value::from(f.clone()), Value::from(f));
    }

    #[test]
    fn test_call_non_function() {
        let err = Value::from(3).call(&[]).unwrap_err();
        assert!(matches!(err, HarnessError::NotCallable { type_of: "number" }));
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"name": "demo", "native": {"port": 8080}, "tags": ["a", "b"]});
        let value = Value::from_json(json.clone());
        assert_eq!(value.get("name").as_str(), Some("demo"));
        assert_eq!(value.get("native").get("port").as_f64(), Some(8080.0));
        assert_eq!(value.get("tags").get("length").as_f64(), Some(2.0));
        assert_eq!(value.to_json(), Some(json));
    }

    #[tokio::test]
    async fn test_task_is_awaited_once() {
        let task = Task::new(async { Ok(Value::from("ready")) });
        assert_eq!(task.wait().await.unwrap().as_str(), Some("ready"));
        assert!(task.is_consumed());
        assert!(matches!(task.wait().await, Err(HarnessError::TaskConsumed)));
    }
}
