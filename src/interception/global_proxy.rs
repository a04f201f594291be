// src/interception/global_proxy.rs
//! Read-redirecting wrapper around a global object
//!
//! Reads of overridden members return the override; every other read goes to
//! the wrapped object at the time of the read. Writes, deletions and
//! enumeration are forwarded untouched.

use crate::runtime::value::{ObjectLike, ObjectRef, Value};
use crate::utils::errors::{HarnessError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Member name → replacement value
pub type Overrides = BTreeMap<String, Value>;

/// Wrapper exposing a global's read surface with selected members replaced
pub struct GlobalProxy {
    target: ObjectRef,
    overrides: Arc<Overrides>,
}

impl GlobalProxy {
    pub fn new(target: ObjectRef, overrides: impl Into<Arc<Overrides>>) -> Self {
        Self {
            target,
            overrides: overrides.into(),
        }
    }

    /// Build a proxy over the global `name`, which must be an object
    ///
    /// Function values carry no member table, so a function-valued global
    /// such as `setTimeout` is rejected with `ProxyTarget` like any other
    /// non-object. Patch the object holding the function instead.
    pub fn wrap(name: &str, global: Value, overrides: impl Into<Arc<Overrides>>) -> Result<Value> {
        match global {
            Value::Object(target) => Ok(Value::from_object(Self::new(target, overrides))),
            other => Err(HarnessError::ProxyTarget {
                name: name.to_string(),
                type_of: other.type_of(),
            }),
        }
    }

    pub fn target(&self) -> &ObjectRef {
        &self.target
    }

    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }
}

impl ObjectLike for GlobalProxy {
    fn get(&self, key: &str) -> Value {
        match self.overrides.get(key) {
            Some(value) => value.clone(),
            None => self.target.get(key),
        }
    }

    fn set(&self, key: &str, value: Value) {
        self.target.set(key, value);
    }

    fn delete(&self, key: &str) -> bool {
        self.target.delete(key)
    }

    fn keys(&self) -> Vec<String> {
        self.target.keys()
    }
}
