//! # hostjson
//!
//! An environment-independent JSON serializer for dynamically-typed host
//! values.
//!
//! ## Why this exists
//!
//! Automation systems that drive embedded script engines need to ship
//! command arguments and results as JSON, but the values they get back come
//! from hosts where a native, standards-compliant serializer may be absent,
//! broken, or inconsistent, and where the value model is full of semantic
//! traps: array-likes from foreign realms that identity checks don't
//! recognize, boxed primitives, callables, window-like globals, `NaN` and
//! the infinities, `undefined`. This crate serializes that value model
//! directly, producing valid JSON whenever the input is JSON-representable
//! and well-defined best-effort output otherwise.
//!
//! ## Key behaviors
//!
//! - **Structural classification**: composites are classified by duck-typed
//!   probing (numeric `length` plus a native splice capability makes an
//!   array; a native call capability makes a function), not identity, so
//!   foreign-realm values serialize correctly. See [`classify`].
//! - **Best-effort normalization**: `NaN`/`±Infinity` and `undefined`
//!   become `null`, function-valued object members are dropped, functions
//!   elsewhere become `null`, boxed primitives unwrap.
//! - **Transform hooks**: a per-call `(container, key, value)` hook can
//!   substitute any value before it is serialized, the root included.
//! - **Pluggable escaping policy**: one boolean, resolved once, selects the
//!   numeric-escape threshold for hosts with broken wide-character
//!   indexing. See [`env`].
//! - **Guarded recursion**: cyclic structures and runaway nesting fail with
//!   clean errors instead of exhausting the stack.
//!
//! ## Quick Start
//!
//! ```rust
//! use hostjson::{jsval, to_json};
//!
//! let value = jsval!({
//!     "id": 7,
//!     "name": "element",
//!     "tags": ["a", "b"],
//!     "missing": null
//! });
//!
//! let json = to_json(&value).unwrap();
//! assert_eq!(json, r#"{"id":7,"name":"element","tags":["a","b"],"missing":null}"#);
//! ```
//!
//! ### Transform hooks
//!
//! ```rust
//! use hostjson::{jsval, to_json_with, Value};
//!
//! let json = to_json_with(&jsval!([1, 2, 3]), |_container, _key, value| {
//!     match value {
//!         Value::Number(n) => Value::Number(n * 2.0),
//!         other => other.clone(),
//!     }
//! })
//! .unwrap();
//! assert_eq!(json, "[2,4,6]");
//! ```
//!
//! ### From ordinary Rust types
//!
//! ```rust
//! use hostjson::{to_json, to_value};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Click {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let value = to_value(&Click { x: 10, y: 20 }).unwrap();
//! assert_eq!(to_json(&value).unwrap(), r#"{"x":10,"y":20}"#);
//! ```
//!
//! ## What this crate does not do
//!
//! No parsing (serialization only), no streaming, no pretty-printing, no
//! schema validation. Environment detection exists only to answer the one
//! escaping question the serializer asks; see [`env`] for the full story.

pub mod classify;
pub mod env;
pub mod error;
mod escape;
pub mod macros;
pub mod ser;
pub mod value;

pub use classify::{classify, Kind};
pub use env::{EscapePolicy, FixedPolicy, UserAgentPolicy};
pub use error::{Error, Result};
pub use ser::{
    Serializer, TransformHook, ValueSerializer, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ELEMENTS,
};
pub use value::{Capabilities, Object, ObjectClass, ObjectRef, Property, Value};

use serde::Serialize;

/// Serializes a host value to JSON text with the default (modern) escaping
/// policy.
///
/// # Errors
///
/// Fails on cyclic structures, nesting beyond [`DEFAULT_MAX_DEPTH`], an
/// array-like `length` beyond [`DEFAULT_MAX_ELEMENTS`], or a classifier
/// contract violation.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_json(value: &Value) -> Result<String> {
    Serializer::new().serialize(value)
}

/// Serializes a host value with a transform hook applied to every
/// `(container, key, value)` triple, the root included (container `None`,
/// key `""`).
///
/// # Errors
///
/// Same failure modes as [`to_json`]; the hook itself is infallible.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_json_with<F>(value: &Value, hook: F) -> Result<String>
where
    F: Fn(Option<&Value>, &str, &Value) -> Value,
{
    let hook: &TransformHook = &hook;
    Serializer::new().hook(hook).serialize(value)
}

/// Serializes a host value under an explicit escaping policy.
///
/// # Errors
///
/// Same failure modes as [`to_json`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_json_with_policy(value: &Value, policy: &dyn EscapePolicy) -> Result<String> {
    Serializer::with_policy(policy).serialize(value)
}

/// Converts anything serde can serialize into a host [`Value`].
///
/// # Errors
///
/// Fails on shapes the host value model cannot represent (non-string map
/// keys, tuple/struct enum variants).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(to_json(&Value::Null).unwrap(), "null");
        assert_eq!(to_json(&Value::Undefined).unwrap(), "null");
        assert_eq!(to_json(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(to_json(&Value::Bool(false)).unwrap(), "false");
    }

    #[test]
    fn test_non_finite_numbers() {
        assert_eq!(to_json(&Value::Number(f64::NAN)).unwrap(), "null");
        assert_eq!(to_json(&Value::Number(f64::INFINITY)).unwrap(), "null");
        assert_eq!(to_json(&Value::Number(f64::NEG_INFINITY)).unwrap(), "null");
    }

    #[test]
    fn test_function_at_root() {
        assert_eq!(to_json(&Value::function()).unwrap(), "null");
    }

    #[test]
    fn test_to_value_roundtrip() {
        #[derive(serde::Serialize)]
        struct Command {
            name: String,
            args: Vec<i32>,
        }

        let value = to_value(&Command {
            name: "click".to_string(),
            args: vec![10, 20],
        })
        .unwrap();
        assert_eq!(
            to_json(&value).unwrap(),
            r#"{"name":"click","args":[10,20]}"#
        );
    }

    #[test]
    fn test_policy_selection() {
        let s = Value::from("caf\u{e9}");
        assert_eq!(
            to_json_with_policy(&s, &FixedPolicy::extended()).unwrap(),
            "\"caf\\u00e9\""
        );
        assert_eq!(
            to_json_with_policy(&s, &FixedPolicy::legacy()).unwrap(),
            "\"caf\\u00e9\""
        );
    }
}
