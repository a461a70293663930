//! Structural type classification.
//!
//! Given an arbitrary [`Value`], [`classify`] returns one of a closed set of
//! semantic kinds that drive the serializer's state machine. Identity-based
//! checks are useless for values that crossed an execution-context boundary
//! (an array built in another realm is not `instanceof` this realm's
//! `Array`), so composites are probed structurally: a numeric `length` plus
//! a native splice capability makes an array, a native call capability makes
//! a function.
//!
//! The provenance of a capability matters. A built-in `splice` or `call` is
//! never an own enumerable property of the instance, so a same-named
//! property the user attached enumerably must *not* count; that is what
//! [`Capabilities`](crate::Capabilities) versus
//! [`Object::has_own_enumerable`](crate::Object::has_own_enumerable)
//! encodes.

use crate::value::{Capabilities, Object, ObjectClass, Value};
use std::fmt;

/// The closed set of semantic kinds a value can classify as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Null,
    Array,
    Object,
    Function,
    String,
    Number,
    Boolean,
    Undefined,
}

impl Kind {
    /// Lowercase name, matching the host's `typeof` vocabulary.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Function => "function",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a value into its semantic [`Kind`].
#[must_use]
pub fn classify(value: &Value) -> Kind {
    match value {
        Value::Undefined => Kind::Undefined,
        Value::Null => Kind::Null,
        Value::Bool(_) => Kind::Boolean,
        Value::Number(_) => Kind::Number,
        Value::String(_) => Kind::String,
        Value::Object(obj) => classify_object(&obj.borrow()),
    }
}

fn classify_object(obj: &Object) -> Kind {
    match &obj.class {
        // Globals have non-standard enumeration semantics; never treat them
        // as arrays or functions no matter what they look like.
        ObjectClass::Global => Kind::Object,
        ObjectClass::Array(_) => Kind::Array,
        // Function-tagged but not invocable: demote to object.
        ObjectClass::Function { callable } => {
            if *callable {
                Kind::Function
            } else {
                Kind::Object
            }
        }
        // Boxed primitives are objects; the serializer unwraps them.
        ObjectClass::BoxedString(_) | ObjectClass::BoxedNumber(_) | ObjectClass::BoxedBool(_) => {
            Kind::Object
        }
        ObjectClass::Plain => classify_plain(obj),
    }
}

/// Duck-typed probe for plain composites, in load-bearing order: array-like
/// before callable, both requiring capability provenance (native, not a
/// shadowing own enumerable property).
fn classify_plain(obj: &Object) -> Kind {
    let has_numeric_length = matches!(obj.get_own("length"), Some(Value::Number(_)));
    if has_numeric_length
        && obj.capabilities.contains(Capabilities::SPLICE)
        && !obj.has_own_enumerable("splice")
    {
        return Kind::Array;
    }
    if obj.capabilities.contains(Capabilities::CALL) && !obj.has_own_enumerable("call") {
        return Kind::Function;
    }
    Kind::Object
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array_like(len: f64) -> Object {
        let mut obj = Object::plain();
        obj.set("length", Value::Number(len));
        obj.capabilities |= Capabilities::SPLICE;
        obj
    }

    #[test]
    fn test_primitive_kinds() {
        assert_eq!(classify(&Value::Undefined), Kind::Undefined);
        assert_eq!(classify(&Value::Null), Kind::Null);
        assert_eq!(classify(&Value::Bool(true)), Kind::Boolean);
        assert_eq!(classify(&Value::Number(1.0)), Kind::Number);
        assert_eq!(classify(&Value::from("s")), Kind::String);
    }

    #[test]
    fn test_native_array() {
        assert_eq!(classify(&Value::array(vec![])), Kind::Array);
    }

    #[test]
    fn test_duck_typed_array_like() {
        assert_eq!(classify(&Value::from(array_like(2.0))), Kind::Array);
    }

    #[test]
    fn test_shadowed_splice_is_not_an_array() {
        let mut obj = array_like(2.0);
        obj.set("splice", Value::from("not the real one"));
        assert_eq!(classify(&Value::from(obj)), Kind::Object);
    }

    #[test]
    fn test_length_without_splice_capability() {
        let mut obj = Object::plain();
        obj.set("length", Value::from(2));
        obj.set("splice", Value::function());
        // splice is an own enumerable property, not a native capability
        assert_eq!(classify(&Value::from(obj)), Kind::Object);
    }

    #[test]
    fn test_non_numeric_length() {
        let mut obj = Object::plain();
        obj.set("length", Value::from("2"));
        obj.capabilities |= Capabilities::SPLICE;
        assert_eq!(classify(&Value::from(obj)), Kind::Object);
    }

    #[test]
    fn test_functions() {
        assert_eq!(classify(&Value::function()), Kind::Function);
        assert_eq!(classify(&Value::uncallable_function()), Kind::Object);
    }

    #[test]
    fn test_duck_typed_callable() {
        let mut obj = Object::plain();
        obj.capabilities |= Capabilities::CALL;
        assert_eq!(classify(&Value::from(obj)), Kind::Function);

        let mut shadowed = Object::plain();
        shadowed.capabilities |= Capabilities::CALL;
        shadowed.set("call", Value::from(1));
        assert_eq!(classify(&Value::from(shadowed)), Kind::Object);
    }

    #[test]
    fn test_global_is_always_an_object() {
        let mut obj = Object::with_class(crate::ObjectClass::Global);
        obj.set("length", Value::from(0));
        obj.capabilities |= Capabilities::SPLICE | Capabilities::CALL;
        assert_eq!(classify(&Value::from(obj)), Kind::Object);
    }

    #[test]
    fn test_boxed_primitives_are_objects() {
        assert_eq!(classify(&Value::boxed_string("x")), Kind::Object);
        assert_eq!(classify(&Value::boxed_number(1.0)), Kind::Object);
        assert_eq!(classify(&Value::boxed_bool(true)), Kind::Object);
    }
}
