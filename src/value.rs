//! Dynamic representation of host values.
//!
//! Values handed to the serializer come from a dynamically-typed host
//! environment (an embedded script engine driven by an automation system),
//! so the model mirrors that world rather than Rust's: a small set of
//! primitives plus a single composite variant, [`Value::Object`], that
//! covers plain objects, native arrays, callables, boxed primitives and
//! window-like globals alike. Which of those a composite *really* is gets
//! decided by [`crate::classify`], not by the variant: foreign-realm
//! array-likes, for instance, are `Plain` objects that only structural
//! probing recognizes as arrays.
//!
//! Composites are shared through [`Rc`], so reference identity is
//! observable and cyclic structures are expressible (the serializer detects
//! and rejects them).
//!
//! ## Core Types
//!
//! - [`Value`]: any host value
//! - [`Object`]: a composite with a class tag, own properties, and a set of
//!   native capabilities
//! - [`Capabilities`]: native, non-enumerable capabilities (`SPLICE`,
//!   `CALL`) used by the duck-typed classifier
//!
//! ## Examples
//!
//! ```rust
//! use hostjson::{Value, Object, Capabilities};
//!
//! // A native array
//! let arr = Value::array(vec![Value::from(1), Value::from("two")]);
//!
//! // A foreign-realm array-like: plain object, numeric length, native splice
//! let mut obj = Object::plain();
//! obj.set("length", Value::from(0));
//! obj.capabilities |= Capabilities::SPLICE;
//! let array_like = Value::from(obj);
//!
//! assert!(arr.is_object());
//! assert!(array_like.is_object());
//! ```

use bitflags::bitflags;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a composite value.
pub type ObjectRef = Rc<RefCell<Object>>;

/// A dynamically-typed host value.
///
/// Primitives are stored inline; every composite (object, array, function,
/// boxed primitive, global) is a shared [`Object`]. Numbers are IEEE-754
/// doubles, so `NaN` and the infinities are representable; the serializer
/// normalizes them to `null`.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(ObjectRef),
}

bitflags! {
    /// Native capabilities of a composite value.
    ///
    /// A capability models a built-in method inherited from the host (a
    /// native `splice` or `call`), which is never an own enumerable
    /// property of the instance. A user-defined own enumerable property of
    /// the same name does *not* grant the capability; the classifier
    /// checks provenance explicitly (see [`crate::classify`]).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capabilities: u8 {
        /// Array-splice-like capability.
        const SPLICE = 1 << 0;
        /// Invocation capability.
        const CALL = 1 << 1;
    }
}

/// What a composite fundamentally is, as reported by the host.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ObjectClass {
    /// An ordinary object. May still classify as an array or function
    /// through structural probing.
    #[default]
    Plain,
    /// A native array with its backing elements.
    Array(Vec<Value>),
    /// A function-tagged value. Some hosts report `callable: false`
    /// objects as functions; the classifier demotes those to objects.
    Function { callable: bool },
    /// Boxed string wrapper (`new String("x")`).
    BoxedString(String),
    /// Boxed number wrapper.
    BoxedNumber(f64),
    /// Boxed boolean wrapper.
    BoxedBool(bool),
    /// A window-like global. Enumeration over these is non-standard, so
    /// classification never treats them as arrays or functions.
    Global,
}

/// An own property of an [`Object`].
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub value: Value,
    /// Whether the property shows up during enumeration. Only enumerable
    /// members are serialized.
    pub enumerable: bool,
}

/// A composite host value: class tag, own properties in enumeration order,
/// and native capabilities.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Object {
    pub class: ObjectClass,
    pub capabilities: Capabilities,
    properties: IndexMap<String, Property>,
}

impl Object {
    /// Creates an ordinary object with no properties.
    #[must_use]
    pub fn plain() -> Self {
        Object::default()
    }

    /// Creates an object with the given class tag.
    #[must_use]
    pub fn with_class(class: ObjectClass) -> Self {
        Object {
            class,
            ..Object::default()
        }
    }

    /// Sets an own enumerable property, preserving insertion order.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(
            key.into(),
            Property {
                value,
                enumerable: true,
            },
        );
    }

    /// Sets an own non-enumerable property. Never serialized, but visible
    /// to [`Object::get_own`].
    pub fn set_hidden(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(
            key.into(),
            Property {
                value,
                enumerable: false,
            },
        );
    }

    /// Looks up an own property, enumerable or not. Native arrays also
    /// answer `length` and decimal indices here.
    #[must_use]
    pub fn get_own(&self, key: &str) -> Option<Value> {
        if let Some(prop) = self.properties.get(key) {
            return Some(prop.value.clone());
        }
        if let ObjectClass::Array(elements) = &self.class {
            if key == "length" {
                return Some(Value::Number(elements.len() as f64));
            }
            if let Ok(idx) = key.parse::<usize>() {
                return elements.get(idx).cloned();
            }
        }
        None
    }

    /// Whether the object has an own *enumerable* property with this name.
    /// Used by the classifier to tell a shadowing user property from a
    /// native capability.
    #[must_use]
    pub fn has_own_enumerable(&self, key: &str) -> bool {
        self.properties
            .get(key)
            .map(|p| p.enumerable)
            .unwrap_or(false)
    }

    /// The numeric `length` of the object, if it has one. For native arrays
    /// this is the element count; for array-likes it is the own `length`
    /// property when that property is a number.
    #[must_use]
    pub fn length(&self) -> Option<f64> {
        match &self.class {
            ObjectClass::Array(elements) => Some(elements.len() as f64),
            _ => match self.get_own("length") {
                Some(Value::Number(n)) => Some(n),
                _ => None,
            },
        }
    }

    /// Iterates own enumerable properties in insertion order.
    pub fn own_enumerable(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties
            .iter()
            .filter(|(_, p)| p.enumerable)
            .map(|(k, p)| (k.as_str(), &p.value))
    }

    /// Number of own properties (enumerable or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the object has no own properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Value {
    /// Creates a native array value.
    #[must_use]
    pub fn array(elements: Vec<Value>) -> Value {
        Value::from(Object::with_class(ObjectClass::Array(elements)))
    }

    /// Creates a plain object value from key/value pairs, preserving order.
    #[must_use]
    pub fn object<K, I>(props: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut obj = Object::plain();
        for (k, v) in props {
            obj.set(k, v);
        }
        Value::from(obj)
    }

    /// Creates a callable native function value.
    #[must_use]
    pub fn function() -> Value {
        let mut obj = Object::with_class(ObjectClass::Function { callable: true });
        obj.capabilities |= Capabilities::CALL;
        Value::from(obj)
    }

    /// Creates a function-tagged value that cannot be invoked. Some hosts
    /// produce these; they serialize as objects.
    #[must_use]
    pub fn uncallable_function() -> Value {
        Value::from(Object::with_class(ObjectClass::Function {
            callable: false,
        }))
    }

    /// Creates a boxed string wrapper.
    #[must_use]
    pub fn boxed_string(s: impl Into<String>) -> Value {
        Value::from(Object::with_class(ObjectClass::BoxedString(s.into())))
    }

    /// Creates a boxed number wrapper.
    #[must_use]
    pub fn boxed_number(n: f64) -> Value {
        Value::from(Object::with_class(ObjectClass::BoxedNumber(n)))
    }

    /// Creates a boxed boolean wrapper.
    #[must_use]
    pub fn boxed_bool(b: bool) -> Value {
        Value::from(Object::with_class(ObjectClass::BoxedBool(b)))
    }

    /// Creates a window-like global value.
    #[must_use]
    pub fn global() -> Value {
        Value::from(Object::with_class(ObjectClass::Global))
    }

    /// Returns `true` if the value is `undefined`.
    #[inline]
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns `true` if the value is `null`.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if the value is any composite.
    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// If the value is a boolean, returns it.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a number, returns it.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is a composite, returns its shared handle.
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Host-style textual form, for diagnostics. This is not JSON; use
    /// [`crate::to_json`] for that.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    write!(f, "{}", if *n > 0.0 { "Infinity" } else { "-Infinity" })
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Object(obj) => match &obj.borrow().class {
                ObjectClass::Array(elements) => {
                    let parts: Vec<String> = elements.iter().map(|v| v.to_string()).collect();
                    write!(f, "{}", parts.join(","))
                }
                ObjectClass::Function { .. } => write!(f, "[Function]"),
                ObjectClass::BoxedString(s) => write!(f, "{}", s),
                ObjectClass::BoxedNumber(n) => write!(f, "{}", Value::Number(*n)),
                ObjectClass::BoxedBool(b) => write!(f, "{}", b),
                ObjectClass::Global => write!(f, "[object Window]"),
                ObjectClass::Plain => write!(f, "[object Object]"),
            },
        }
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(Rc::new(RefCell::new(obj)))
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
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

impl From<Vec<Value>> for Value {
    fn from(elements: Vec<Value>) -> Self {
        Value::array(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_preserves_insertion_order() {
        let mut obj = Object::plain();
        obj.set("zebra", Value::from(1));
        obj.set("apple", Value::from(2));
        obj.set("mango", Value::from(3));

        let keys: Vec<&str> = obj.own_enumerable().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_hidden_properties_skip_enumeration() {
        let mut obj = Object::plain();
        obj.set("visible", Value::from(1));
        obj.set_hidden("hidden", Value::from(2));

        assert_eq!(obj.own_enumerable().count(), 1);
        assert!(obj.get_own("hidden").is_some());
        assert!(!obj.has_own_enumerable("hidden"));
        assert!(obj.has_own_enumerable("visible"));
    }

    #[test]
    fn test_native_array_length_and_index() {
        let arr = Value::array(vec![Value::from(10), Value::from(20)]);
        let obj = arr.as_object().unwrap().borrow();
        assert_eq!(obj.length(), Some(2.0));
        assert_eq!(obj.get_own("1"), Some(Value::from(20)));
        assert_eq!(obj.get_own("2"), None);
        assert_eq!(obj.get_own("length"), Some(Value::from(2)));
    }

    #[test]
    fn test_array_like_length() {
        let mut obj = Object::plain();
        obj.set("length", Value::from(3));
        assert_eq!(obj.length(), Some(3.0));

        let mut not_numeric = Object::plain();
        not_numeric.set("length", Value::from("3"));
        assert_eq!(not_numeric.length(), None);
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(Value::Undefined.to_string(), "undefined");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::global().to_string(), "[object Window]");
        assert_eq!(
            Value::array(vec![Value::from(1), Value::from(2)]).to_string(),
            "1,2"
        );
    }

    #[test]
    fn test_from_primitives() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42), Value::Number(42.0));
        assert_eq!(Value::from(2.5), Value::Number(2.5));
        assert_eq!(Value::from("x"), Value::String("x".to_string()));
    }
}
