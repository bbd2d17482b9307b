//! Envelope Dispatch
//!
//! Maps a decoded envelope to exactly one session event. The envelope is
//! decoded eagerly by the transport; only the payload decoder for the
//! envelope's type runs here.

use tracing::debug;

use crate::protocol::{Envelope, PeerMessage, PeerMessageType};
use crate::session::SessionEvent;

/// Route an inbound envelope
///
/// Returns `None` for types this surface does not know, which are ignored
/// for forward compatibility. A known type with a malformed payload becomes
/// [`SessionEvent::SchemaError`].
#[must_use]
pub fn dispatch(envelope: &Envelope) -> Option<SessionEvent> {
    let Some(msg_type) = PeerMessageType::from_wire(&envelope.msg_type) else {
        debug!(msg_type = %envelope.msg_type, "Ignoring unknown message type");
        return None;
    };

    Some(match PeerMessage::decode_as(msg_type, envelope) {
        Ok(msg) => SessionEvent::Peer(msg),
        Err(e) => SessionEvent::SchemaError(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CorrelationId, TextPayload};

    fn envelope(line: &str) -> Envelope {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_unknown_type_ignored() {
        assert_eq!(dispatch(&envelope(r#"{"type":"hologram","payload":{"x":1}}"#)), None);
    }

    #[test]
    fn test_known_type_decoded() {
        let event = dispatch(&envelope(r#"{"type":"text","payload":{"content":"Hi"}}"#));
        assert_eq!(
            event,
            Some(SessionEvent::Peer(PeerMessage::Text(TextPayload {
                content: "Hi".into(),
                done: false,
            })))
        );
    }

    #[test]
    fn test_schema_error_becomes_event() {
        let event = dispatch(&envelope(
            r#"{"type":"form","payload":{"fields":"not-an-array"}}"#,
        ));
        match event {
            Some(SessionEvent::SchemaError(e)) => assert_eq!(e.msg_type, "form"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_blocking_request_keeps_id() {
        let event = dispatch(&envelope(
            r#"{"type":"select","id":"s9","payload":{"label":"Pick","options":["a"]}}"#,
        ));
        match event {
            Some(SessionEvent::Peer(PeerMessage::Select { id, .. })) => {
                assert_eq!(id, Some(CorrelationId::new("s9")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_payload_is_schema_error() {
        let event = dispatch(&envelope(r#"{"type":"confirm","id":"c"}"#));
        assert!(matches!(event, Some(SessionEvent::SchemaError(_))));
    }
}
