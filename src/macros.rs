//! The [`jsval!`] macro for building host values from JSON-like literals.

/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Objects become plain composites with properties in written order; arrays
/// become native arrays. `undefined` is accepted alongside the JSON
/// literals, since the host value model has it.
///
/// # Examples
///
/// ```rust
/// use hostjson::{jsval, to_json};
///
/// let value = jsval!({
///     "name": "element-42",
///     "visible": true,
///     "rect": { "x": 10, "y": 20 },
///     "classes": ["btn", "active"]
/// });
/// assert!(to_json(&value).unwrap().starts_with("{\"name\""));
/// ```
#[macro_export]
macro_rules! jsval {
    (null) => {
        $crate::Value::Null
    };

    (undefined) => {
        $crate::Value::Undefined
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::array(vec![$($crate::jsval!($elem)),*])
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        #[allow(unused_mut)]
        let mut object = $crate::Object::plain();
        $(
            object.set($key, $crate::jsval!($value));
        )*
        $crate::Value::from(object)
    }};

    // Fallback for any other expression with a From impl.
    ($other:expr) => {
        $crate::Value::from($other)
    };
}
