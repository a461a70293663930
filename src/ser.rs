//! Recursive JSON serialization of host values.
//!
//! [`Serializer`] walks a [`Value`] by classified kind, appending lexical
//! JSON fragments to an output buffer that is joined once at the end. The
//! semantics are best-effort JSON rather than strict validation: non-finite
//! numbers become `null`, functions become `null` at value positions and
//! are dropped from object members, boxed primitives unwrap, and duck-typed
//! array-likes serialize as real arrays.
//!
//! An optional per-call transform hook sees every `(container, key, value)`
//! triple (the root included, with no container and key `""`), and its
//! return value is what gets classified and recursed into. That is the
//! extension point callers use to inject custom serialization for domain
//! objects without touching the walk itself.
//!
//! The walk refuses cyclic structures ([`Error::CyclicStructure`]) and caps
//! nesting depth ([`Error::RecursionLimit`]) instead of exhausting the
//! stack.
//!
//! ## Usage
//!
//! Most callers want the free functions in the crate root:
//!
//! ```rust
//! use hostjson::{jsval, to_json, to_json_with, Value};
//!
//! let value = jsval!({ "a": [1, 2], "b": "x" });
//! assert_eq!(to_json(&value).unwrap(), r#"{"a":[1,2],"b":"x"}"#);
//!
//! // A hook that doubles every number
//! let doubled = to_json_with(&jsval!([1, 2, 3]), |_container, _key, v| match v {
//!     Value::Number(n) => Value::Number(n * 2.0),
//!     other => other.clone(),
//! })
//! .unwrap();
//! assert_eq!(doubled, "[2,4,6]");
//! ```

use crate::classify::{classify, Kind};
use crate::env::{EscapePolicy, FixedPolicy};
use crate::error::{Error, Result};
use crate::escape::escape_into;
use crate::value::{Object, ObjectClass, ObjectRef, Value};
use serde::{ser, Serialize};
use std::borrow::Cow;
use std::rc::Rc;

/// Per-call value substitution hook.
///
/// Invoked as `(container, key, value)`: `container` is the array or object
/// being walked (`None` at the root), `key` the member name or decimal
/// element index (`""` at the root). Whatever it returns replaces the value
/// for classification and recursion.
pub type TransformHook<'a> = dyn Fn(Option<&Value>, &str, &Value) -> Value + 'a;

/// Default nesting cap. Deep enough for any sane command payload, shallow
/// enough to fail long before the stack does.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default cap on elements snapshotted from a duck-typed array-like. Its
/// `length` is an arbitrary double the host controls, so the snapshot
/// allocation must be bounded.
pub const DEFAULT_MAX_ELEMENTS: usize = 1 << 20;

/// The host-value JSON serializer.
///
/// One instance serves one call: it owns the fragment buffer and the
/// cycle-detection state. The escaping policy is evaluated once at
/// construction, never per character.
pub struct Serializer<'h> {
    fragments: Vec<Cow<'static, str>>,
    hook: Option<&'h TransformHook<'h>>,
    extended_unicode: bool,
    max_depth: usize,
    max_elements: usize,
    depth: usize,
    /// Identities of composites currently on the walk path.
    active: Vec<usize>,
}

impl<'h> Serializer<'h> {
    /// Creates a serializer with the modern escaping policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(&FixedPolicy::extended())
    }

    /// Creates a serializer with an explicit escaping policy.
    #[must_use]
    pub fn with_policy(policy: &dyn EscapePolicy) -> Self {
        Serializer {
            fragments: Vec::with_capacity(16),
            hook: None,
            extended_unicode: policy.extended_unicode_safe(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_elements: DEFAULT_MAX_ELEMENTS,
            depth: 0,
            active: Vec::new(),
        }
    }

    /// Installs a transform hook for this call.
    #[must_use]
    pub fn hook(mut self, hook: &'h TransformHook<'h>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Overrides the nesting cap.
    #[must_use]
    pub fn max_depth(mut self, limit: usize) -> Self {
        self.max_depth = limit;
        self
    }

    /// Overrides the array-like element cap.
    #[must_use]
    pub fn max_elements(mut self, limit: usize) -> Self {
        self.max_elements = limit;
        self
    }

    /// Serializes a value, consuming the serializer.
    ///
    /// # Errors
    ///
    /// Fails on cyclic structures, on nesting beyond the cap, or on a
    /// classifier contract violation. Everything else is normalized, not
    /// rejected.
    pub fn serialize(mut self, value: &Value) -> Result<String> {
        let root = self.transformed(None, "", value);
        self.emit(&root)?;
        Ok(self.fragments.concat())
    }

    fn transformed(&self, container: Option<&Value>, key: &str, value: &Value) -> Value {
        match self.hook {
            Some(hook) => hook(container, key, value),
            None => value.clone(),
        }
    }

    fn push(&mut self, fragment: &'static str) {
        self.fragments.push(Cow::Borrowed(fragment));
    }

    fn push_owned(&mut self, fragment: String) {
        self.fragments.push(Cow::Owned(fragment));
    }

    fn push_string(&mut self, s: &str) {
        let mut buf = String::with_capacity(s.len() + 2);
        escape_into(&mut buf, s, self.extended_unicode);
        self.push_owned(buf);
    }

    fn push_number(&mut self, n: f64) {
        if n.is_finite() {
            self.push_owned(n.to_string());
        } else {
            self.push("null");
        }
    }

    fn emit(&mut self, value: &Value) -> Result<()> {
        match classify(value) {
            // Functions at value positions normalize to null, same as
            // undefined.
            Kind::Null | Kind::Undefined | Kind::Function => {
                self.push("null");
                Ok(())
            }
            Kind::Array => self.emit_array(value),
            Kind::Object => self.emit_object(value),
            kind => self.emit_scalar(kind, value),
        }
    }

    fn emit_scalar(&mut self, kind: Kind, value: &Value) -> Result<()> {
        match (kind, value) {
            (Kind::String, Value::String(s)) => self.push_string(s),
            (Kind::Number, Value::Number(n)) => self.push_number(*n),
            (Kind::Boolean, Value::Bool(b)) => self.push(if *b { "true" } else { "false" }),
            // A kind reaching this point that is not a scalar means the
            // classifier and serializer disagree about the closed set.
            (kind, _) => return Err(Error::unsupported(kind)),
        }
        Ok(())
    }

    fn emit_array(&mut self, value: &Value) -> Result<()> {
        let Value::Object(obj) = value else {
            return Err(Error::unsupported(Kind::Array));
        };
        // Snapshot before walking so hooks see a stable element list even
        // if they mutate the container.
        let elements = snapshot_elements(&obj.borrow(), self.max_elements)?;
        self.enter(obj)?;
        self.push("[");
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                self.push(",");
            }
            let child = self.transformed(Some(value), &i.to_string(), element);
            self.emit(&child)?;
        }
        self.push("]");
        self.exit();
        Ok(())
    }

    fn emit_object(&mut self, value: &Value) -> Result<()> {
        let Value::Object(obj) = value else {
            return Err(Error::unsupported(Kind::Object));
        };

        // Boxed primitives unwrap and serialize as their primitive kind.
        let unboxed = match &obj.borrow().class {
            ObjectClass::BoxedString(s) => Some(Value::String(s.clone())),
            ObjectClass::BoxedNumber(n) => Some(Value::Number(*n)),
            ObjectClass::BoxedBool(b) => Some(Value::Bool(*b)),
            _ => None,
        };
        if let Some(primitive) = unboxed {
            return self.emit_scalar(classify(&primitive), &primitive);
        }

        let members: Vec<(String, Value)> = obj
            .borrow()
            .own_enumerable()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();

        self.enter(obj)?;
        self.push("{");
        let mut first = true;
        for (key, member) in &members {
            let child = self.transformed(Some(value), key, member);
            // Function-valued members are silently dropped.
            if classify(&child) == Kind::Function {
                continue;
            }
            if !first {
                self.push(",");
            }
            first = false;
            self.push_string(key);
            self.push(":");
            self.emit(&child)?;
        }
        self.push("}");
        self.exit();
        Ok(())
    }

    fn enter(&mut self, obj: &ObjectRef) -> Result<()> {
        let id = Rc::as_ptr(obj) as usize;
        if self.active.contains(&id) {
            return Err(Error::CyclicStructure);
        }
        if self.depth >= self.max_depth {
            return Err(Error::RecursionLimit(self.max_depth));
        }
        self.active.push(id);
        self.depth += 1;
        Ok(())
    }

    fn exit(&mut self) {
        self.active.pop();
        self.depth -= 1;
    }
}

impl Default for Serializer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Element list of a native array or duck-typed array-like. Array-likes are
/// read through `length` and decimal index properties; a fractional length
/// rounds up (index `2` is still below a length of `2.5`), and holes come
/// back as `undefined` and serialize as `null`.
fn snapshot_elements(obj: &Object, max_elements: usize) -> Result<Vec<Value>> {
    match &obj.class {
        ObjectClass::Array(elements) => Ok(elements.clone()),
        _ => {
            let length = match obj.length() {
                Some(n) if n.is_finite() && n > 0.0 => n.ceil(),
                _ => 0.0,
            };
            // The length is host-supplied; never trust it to fit.
            if length > max_elements as f64 {
                return Err(Error::ElementLimit(max_elements));
            }
            Ok((0..length as usize)
                .map(|i| obj.get_own(&i.to_string()).unwrap_or(Value::Undefined))
                .collect())
        }
    }
}

/// Builds a [`Value`] from anything serde can serialize.
///
/// The bridge the automation layer uses to hand ordinary Rust command
/// arguments to the host-value serializer. Used through
/// [`crate::to_value`].
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
}

pub struct SerializeObject {
    obj: Object,
    current_key: Option<String>,
}

fn bridge<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeObject;
    type SerializeStruct = SerializeObject;
    type SerializeStructVariant = SerializeObject;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Number(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::array(
            v.iter().map(|&b| Value::Number(b as f64)).collect(),
        ))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let mut obj = Object::plain();
        obj.set(variant, bridge(value)?);
        Ok(Value::from(obj))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec {
            vec: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<SerializeVec> {
        Err(Error::custom("tuple variants are not representable"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeObject> {
        Ok(SerializeObject {
            obj: Object::plain(),
            current_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeObject> {
        self.serialize_map(None)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<SerializeObject> {
        Err(Error::custom("struct variants are not representable"))
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(bridge(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::array(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(bridge(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::array(self.vec))
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(bridge(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::array(self.vec))
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(bridge(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::array(self.vec))
    }
}

impl ser::SerializeMap for SerializeObject {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match bridge(key)? {
            Value::String(s) => {
                self.current_key = Some(s);
                Ok(())
            }
            other => Err(Error::custom(format!(
                "map keys must be strings, got {}",
                other
            ))),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.obj.set(key, bridge(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::from(self.obj))
    }
}

impl ser::SerializeStruct for SerializeObject {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.obj.set(key, bridge(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::from(self.obj))
    }
}

impl ser::SerializeStructVariant for SerializeObject {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.obj.set(key, bridge(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::from(self.obj))
    }
}
