//! Message Envelope
//!
//! The generic `{type, id?, payload?}` wrapper around every protocol message.
//!
//! The envelope is decoded eagerly by the transport; the payload is kept as
//! raw JSON text and only decoded by the handler for its type. This keeps the
//! transport free of any knowledge about individual message shapes.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Opaque token linking a blocking request to its response
///
/// Never interpreted by the core: stored when a request arrives and echoed
/// verbatim on the response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    /// Create a correlation id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Generic protocol envelope
///
/// `payload` holds the undecoded JSON object. An absent payload is treated as
/// an empty object when decoding, so payload types whose fields are all
/// optional accept a bare envelope.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    /// Wire type name (`text`, `form_response`, ...)
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Correlation id, present only on blocking requests and their responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CorrelationId>,
    /// Type-specific payload, decoded lazily
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Box<RawValue>>,
}

const EMPTY_OBJECT: &str = "{}";

impl Envelope {
    /// Build an envelope with a serialized payload
    pub fn new<T: Serialize>(
        msg_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            msg_type: msg_type.into(),
            id: None,
            payload: Some(serde_json::value::to_raw_value(payload)?),
        })
    }

    /// Build an envelope that carries no payload
    pub fn bare(msg_type: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            id: None,
            payload: None,
        }
    }

    /// Attach a correlation id
    #[must_use]
    pub fn with_id(mut self, id: Option<CorrelationId>) -> Self {
        self.id = id;
        self
    }

    /// Raw JSON text of the payload, if any
    #[must_use]
    pub fn payload_json(&self) -> Option<&str> {
        self.payload.as_deref().map(RawValue::get)
    }

    /// Decode the payload into a concrete type
    ///
    /// A missing payload decodes as `{}`.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(self.payload_json().unwrap_or(EMPTY_OBJECT))
    }
}

impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.msg_type == other.msg_type
            && self.id == other.id
            && self.payload_json() == other.payload_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_serializes_without_optional_fields() {
        let env = Envelope::bare("quit");
        assert_eq!(serde_json::to_string(&env).unwrap(), r#"{"type":"quit"}"#);
    }

    #[test]
    fn test_envelope_with_id_and_payload() {
        let env = Envelope::new("select_response", &json!({"value": "b"}))
            .unwrap()
            .with_id(Some(CorrelationId::new("req-1")));
        let text = serde_json::to_string(&env).unwrap();
        assert_eq!(
            text,
            r#"{"type":"select_response","id":"req-1","payload":{"value":"b"}}"#
        );
    }

    #[test]
    fn test_payload_is_kept_raw() {
        let env: Envelope =
            serde_json::from_str(r#"{"type":"update","payload":{"id":"x","rows":[[1,2]]}}"#)
                .unwrap();
        assert_eq!(env.payload_json(), Some(r#"{"id":"x","rows":[[1,2]]}"#));
    }

    #[test]
    fn test_missing_payload_decodes_as_empty_object() {
        #[derive(Deserialize, Default)]
        struct Optional {
            #[serde(default)]
            summary: Option<String>,
        }

        let env: Envelope = serde_json::from_str(r#"{"type":"done"}"#).unwrap();
        let decoded: Optional = env.decode_payload().unwrap();
        assert!(decoded.summary.is_none());
    }

    #[test]
    fn test_null_payload_is_absent() {
        let env: Envelope = serde_json::from_str(r#"{"type":"done","payload":null}"#).unwrap();
        assert!(env.payload.is_none());
    }

    #[test]
    fn test_envelope_requires_type() {
        let result: Result<Envelope, _> = serde_json::from_str(r#"{"payload":{}}"#);
        assert!(result.is_err());
    }
}
