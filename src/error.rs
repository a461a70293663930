//! Error types for host-value serialization.
//!
//! Serialization is deliberately forgiving: non-finite numbers and function
//! values are normalized rather than rejected (see [`crate::ser`]). The
//! errors that remain are contract violations and the structural guards that
//! replace the unbounded recursion a cyclic input would otherwise cause.
//!
//! ## Examples
//!
//! ```rust
//! use hostjson::{jsval, to_json, Error, Value};
//!
//! let obj = jsval!({ "a": 1 });
//! if let Value::Object(inner) = &obj {
//!     // Make the object its own member.
//!     inner
//!         .borrow_mut()
//!         .set("self", Value::Object(inner.clone()));
//! }
//! assert!(matches!(to_json(&obj), Err(Error::CyclicStructure)));
//! ```

use crate::classify::Kind;
use std::fmt;
use thiserror::Error;

/// All errors that can occur while building or serializing host values.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A value's classified kind fell outside the set the serializer
    /// handles. Indicates a classifier/serializer contract violation, not
    /// bad input data.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A composite value was reached a second time along the same reference
    /// path. The walk fails cleanly instead of recursing until the stack
    /// runs out.
    #[error("cyclic structure detected during serialization")]
    CyclicStructure,

    /// Nesting exceeded the configured depth limit. Catches unbounded fresh
    /// nesting that a transform hook can manufacture, which the reference
    /// identity check cannot see.
    #[error("recursion limit of {0} exceeded")]
    RecursionLimit(usize),

    /// An array-like claimed a `length` beyond the configured element
    /// limit. The length is an arbitrary double under host control; the
    /// limit keeps the element snapshot allocation bounded.
    #[error("array-like length exceeds the element limit of {0}")]
    ElementLimit(usize),

    /// Custom message raised through the serde bridge.
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Creates an unsupported-type error for a classified kind.
    pub(crate) fn unsupported(kind: Kind) -> Self {
        Error::UnsupportedType(kind.as_str().to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
