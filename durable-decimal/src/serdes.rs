//! Payload serialization between orchestration stages.
//!
//! Every value that crosses a stage boundary (orchestrator to activity and
//! back, instance output to the client) is turned into a string payload by a
//! [`SerDes`] implementation. [`JsonSerDes`] is the default; field-level
//! overrides such as [`crate::decimal::as_string`] live inside the record's
//! serde derive, so the JSON strategy stays generic.
//!
//! # Example
//!
//! ```rust
//! use durable_decimal::serdes::{JsonSerDes, SerDes, SerDesContext};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Payload {
//!     value: i32,
//! }
//!
//! let serdes = JsonSerDes::<Payload>::new();
//! let context = SerDesContext::new("instance-1:0", "instance-1");
//!
//! let text = serdes.serialize(&Payload { value: 42 }, &context).unwrap();
//! let back = serdes.deserialize(&text, &context).unwrap();
//! assert_eq!(back, Payload { value: 42 });
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Which side of a stage boundary a payload failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerDesErrorKind {
    /// Writing the payload handed to the next stage
    Serialization,
    /// Reading a payload another stage produced
    Deserialization,
}

impl fmt::Display for SerDesErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Serialization => "cannot write payload",
            Self::Deserialization => "cannot read payload",
        })
    }
}

/// A value that could not be turned into a payload, or a payload that could
/// not be turned back into a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct SerDesError {
    pub kind: SerDesErrorKind,
    pub message: String,
}

impl SerDesError {
    pub fn serialization(message: impl Into<String>) -> Self {
        Self {
            kind: SerDesErrorKind::Serialization,
            message: message.into(),
        }
    }

    pub fn deserialization(message: impl Into<String>) -> Self {
        Self {
            kind: SerDesErrorKind::Deserialization,
            message: message.into(),
        }
    }

    /// True when a received payload was rejected, as opposed to a local value
    /// that could not be written.
    pub fn is_deserialization(&self) -> bool {
        self.kind == SerDesErrorKind::Deserialization
    }
}

/// Where a payload is being produced or consumed.
#[derive(Debug, Clone)]
pub struct SerDesContext {
    /// Identifier of the call within the instance, `"{instance_id}:{sequence}"`
    pub operation_id: String,
    /// The orchestration instance the payload belongs to
    pub instance_id: String,
}

impl SerDesContext {
    /// Creates a new SerDesContext.
    pub fn new(operation_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            instance_id: instance_id.into(),
        }
    }
}

/// Converts values of `T` to and from string payloads.
///
/// Implementations must be `Send + Sync`; one instance is shared by every call
/// an orchestration makes.
pub trait SerDes<T>: Send + Sync {
    /// Serializes a value to its payload.
    fn serialize(&self, value: &T, context: &SerDesContext) -> Result<String, SerDesError>;

    /// Reads a payload back into a value.
    fn deserialize(&self, data: &str, context: &SerDesContext) -> Result<T, SerDesError>;
}

/// Default JSON payloads using serde_json.
///
/// Numbers without a field-level override are written as native JSON numbers,
/// which is exactly the lossy path [`crate::decimal::as_string`] exists to avoid.
pub struct JsonSerDes<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonSerDes<T> {
    /// Creates a new JsonSerDes instance.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonSerDes<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonSerDes<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonSerDes<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSerDes").finish()
    }
}

impl<T> SerDes<T> for JsonSerDes<T>
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &T, _context: &SerDesContext) -> Result<String, SerDesError> {
        serde_json::to_string(value).map_err(|e| SerDesError::serialization(e.to_string()))
    }

    fn deserialize(&self, data: &str, _context: &SerDesContext) -> Result<T, SerDesError> {
        serde_json::from_str(data).map_err(|e| SerDesError::deserialization(e.to_string()))
    }
}

/// A [`SerDes`] built from a pair of closures. See [`custom_serdes`].
pub struct CustomSerDes<T, S, D> {
    serialize_fn: S,
    deserialize_fn: D,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S, D> SerDes<T> for CustomSerDes<T, S, D>
where
    S: Fn(&T, &SerDesContext) -> Result<String, SerDesError> + Send + Sync,
    D: Fn(&str, &SerDesContext) -> Result<T, SerDesError> + Send + Sync,
{
    fn serialize(&self, value: &T, context: &SerDesContext) -> Result<String, SerDesError> {
        (self.serialize_fn)(value, context)
    }

    fn deserialize(&self, data: &str, context: &SerDesContext) -> Result<T, SerDesError> {
        (self.deserialize_fn)(data, context)
    }
}

/// Builds a [`SerDes`] from a serialize and a deserialize closure.
///
/// ```rust
/// use durable_decimal::serdes::{custom_serdes, SerDes, SerDesContext, SerDesError};
///
/// let serdes = custom_serdes::<u32, _, _>(
///     |value, _ctx| Ok(format!("n={value}")),
///     |data, _ctx| {
///         data.strip_prefix("n=")
///             .and_then(|n| n.parse().ok())
///             .ok_or_else(|| SerDesError::deserialization("missing n= prefix"))
///     },
/// );
///
/// let context = SerDesContext::new("op-1", "instance-1");
/// assert_eq!(serdes.serialize(&7, &context).unwrap(), "n=7");
/// assert_eq!(serdes.deserialize("n=7", &context).unwrap(), 7);
/// ```
pub fn custom_serdes<T, S, D>(serialize_fn: S, deserialize_fn: D) -> CustomSerDes<T, S, D>
where
    S: Fn(&T, &SerDesContext) -> Result<String, SerDesError> + Send + Sync,
    D: Fn(&str, &SerDesContext) -> Result<T, SerDesError> + Send + Sync,
{
    CustomSerDes {
        serialize_fn,
        deserialize_fn,
        _marker: PhantomData,
    }
}
