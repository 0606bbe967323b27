//! JSON wire codec for [`State`].
//!
//! The wire shape is a two-field object: `{"tag": <variant>, "value":
//! <payload>}`. `Empty` omits `value` entirely and a `Pending` slot with no
//! previous value encodes `"value": null`. Payload encoding is delegated to
//! the payload types' serde implementations so hosts plug in their own shapes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::State;

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Failures produced while encoding or decoding a [`State`].
#[derive(Debug, Error)]
pub enum CodecError {
    /// The object carried a `tag` no variant answers to.
    #[error("Unknown tag: {0}")]
    UnknownTag(String),
    /// The object was not shaped like an encoded state at all.
    #[error("malformed state object: {0}")]
    Malformed(&'static str),
    /// Payload (de)serialization failed.
    #[error("payload codec error: {0}")]
    Json(#[from] serde_json::Error),
}

const TAG_EMPTY: &str = "Empty";
const TAG_PENDING: &str = "Pending";
const TAG_STALE: &str = "Stale";
const TAG_DONE: &str = "Done";
const TAG_ERROR: &str = "Error";

/// Encodes a state into its JSON object form.
pub fn to_json<A, E>(state: &State<A, E>) -> CodecResult<Value>
where
    A: Serialize,
    E: Serialize,
{
    let mut object = Map::new();
    match state {
        State::Empty => {
            object.insert("tag".into(), Value::String(TAG_EMPTY.into()));
        }
        State::Pending(prev) => {
            object.insert("tag".into(), Value::String(TAG_PENDING.into()));
            object.insert("value".into(), serde_json::to_value(prev)?);
        }
        State::Stale(value) => {
            object.insert("tag".into(), Value::String(TAG_STALE.into()));
            object.insert("value".into(), serde_json::to_value(value)?);
        }
        State::Done(value) => {
            object.insert("tag".into(), Value::String(TAG_DONE.into()));
            object.insert("value".into(), serde_json::to_value(value)?);
        }
        State::Error(err) => {
            object.insert("tag".into(), Value::String(TAG_ERROR.into()));
            object.insert("value".into(), serde_json::to_value(err)?);
        }
    }
    Ok(Value::Object(object))
}

/// Decodes a state from its JSON object form.
///
/// Fails with [`CodecError::UnknownTag`] when the `tag` field names no
/// variant, and [`CodecError::Malformed`] when the object shape itself is
/// wrong (not an object, missing `tag`, missing a required `value`).
pub fn from_json<A, E>(value: Value) -> CodecResult<State<A, E>>
where
    A: DeserializeOwned,
    E: DeserializeOwned,
{
    let Value::Object(mut object) = value else {
        return Err(CodecError::Malformed("expected an object"));
    };
    let tag = match object.get("tag") {
        Some(Value::String(tag)) => tag.clone(),
        Some(_) => return Err(CodecError::Malformed("tag must be a string")),
        None => return Err(CodecError::Malformed("missing tag")),
    };
    match tag.as_str() {
        TAG_EMPTY => Ok(State::Empty),
        TAG_PENDING => {
            let prev = object.remove("value").unwrap_or(Value::Null);
            Ok(State::Pending(serde_json::from_value(prev)?))
        }
        TAG_STALE => Ok(State::Stale(decode_payload(&mut object)?)),
        TAG_DONE => Ok(State::Done(decode_payload(&mut object)?)),
        TAG_ERROR => Ok(State::Error(decode_payload(&mut object)?)),
        _ => Err(CodecError::UnknownTag(tag)),
    }
}

/// Encodes a state to a JSON string.
pub fn to_string<A, E>(state: &State<A, E>) -> CodecResult<String>
where
    A: Serialize,
    E: Serialize,
{
    Ok(serde_json::to_string(&to_json(state)?)?)
}

/// Decodes a state from a JSON string.
pub fn from_str<A, E>(input: &str) -> CodecResult<State<A, E>>
where
    A: DeserializeOwned,
    E: DeserializeOwned,
{
    from_json(serde_json::from_str(input)?)
}

fn decode_payload<T: DeserializeOwned>(object: &mut Map<String, Value>) -> CodecResult<T> {
    let payload = object
        .remove("value")
        .ok_or(CodecError::Malformed("missing value"))?;
    Ok(serde_json::from_value(payload)?)
}
