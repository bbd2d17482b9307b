//! Typed Messages
//!
//! [`PeerMessage`] is what dispatch produces from an inbound envelope;
//! [`SurfaceMessage`] is what the session emits toward the peer. Both convert
//! to and from [`Envelope`] so either side of the pipe can be driven in tests.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::envelope::{CorrelationId, Envelope};
use super::payloads::{
    AlertPayload, ClearPayload, CodePayload, ComponentUpdate, ConfirmPayload,
    ConfirmResponsePayload, DonePayload, FormPayload, FormResponsePayload, InputPayload,
    MarkdownPayload, ProgressPayload, ResizePayload, ResponseFlags, SelectPayload,
    SelectResponsePayload, SpinnerPayload, StatusPayload, TablePayload, TextPayload,
};
use super::types::{PeerMessageType, SurfaceMessageType};

/// A recognized message type whose payload has the wrong shape
///
/// Signals a protocol or version mismatch rather than a transient glitch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {msg_type} payload: {cause}")]
pub struct PayloadSchemaError {
    /// Wire type whose payload failed to decode
    pub msg_type: String,
    /// Decoder message
    pub cause: String,
}

impl PayloadSchemaError {
    /// Build from a type name and any displayable cause
    pub fn new(msg_type: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self {
            msg_type: msg_type.into(),
            cause: cause.to_string(),
        }
    }
}

/// Decoded message from the peer
#[derive(Clone, Debug, PartialEq)]
pub enum PeerMessage {
    /// Streaming text chunk
    Text(TextPayload),
    /// Markdown block
    Markdown(MarkdownPayload),
    /// Progress overlay
    Progress(ProgressPayload),
    /// Blocking form request
    Form {
        /// Correlation id to echo on the response
        id: Option<CorrelationId>,
        /// Form definition
        payload: FormPayload,
    },
    /// Data table
    Table(TablePayload),
    /// Code block
    Code(CodePayload),
    /// Blocking confirm request
    Confirm {
        /// Correlation id to echo on the response
        id: Option<CorrelationId>,
        /// Dialog definition
        payload: ConfirmPayload,
    },
    /// Blocking select request
    Select {
        /// Correlation id to echo on the response
        id: Option<CorrelationId>,
        /// Menu definition
        payload: SelectPayload,
    },
    /// Notification
    Alert(AlertPayload),
    /// Busy indicator
    Spinner(SpinnerPayload),
    /// Status line
    Status(StatusPayload),
    /// Clear part of the session
    Clear(ClearPayload),
    /// Agent finished its turn
    Done(DonePayload),
    /// Opaque component update
    Update(ComponentUpdate),
}

fn decode<T: DeserializeOwned>(
    envelope: &Envelope,
    msg_type: PeerMessageType,
) -> Result<T, PayloadSchemaError> {
    envelope
        .decode_payload()
        .map_err(|e| PayloadSchemaError::new(msg_type.as_str(), e))
}

fn encode<T: Serialize>(
    msg_type: &str,
    payload: &T,
    id: Option<CorrelationId>,
) -> Result<Envelope, serde_json::Error> {
    Ok(Envelope::new(msg_type, payload)?.with_id(id))
}

impl PeerMessage {
    /// Wire type of this message
    #[must_use]
    pub fn msg_type(&self) -> PeerMessageType {
        match self {
            Self::Text(_) => PeerMessageType::Text,
            Self::Markdown(_) => PeerMessageType::Markdown,
            Self::Progress(_) => PeerMessageType::Progress,
            Self::Form { .. } => PeerMessageType::Form,
            Self::Table(_) => PeerMessageType::Table,
            Self::Code(_) => PeerMessageType::Code,
            Self::Confirm { .. } => PeerMessageType::Confirm,
            Self::Select { .. } => PeerMessageType::Select,
            Self::Alert(_) => PeerMessageType::Alert,
            Self::Spinner(_) => PeerMessageType::Spinner,
            Self::Status(_) => PeerMessageType::Status,
            Self::Clear(_) => PeerMessageType::Clear,
            Self::Done(_) => PeerMessageType::Done,
            Self::Update(_) => PeerMessageType::Update,
        }
    }

    /// Decode the payload of an envelope whose type is already known
    ///
    /// Only the decoder for `msg_type` runs.
    pub fn decode_as(
        msg_type: PeerMessageType,
        envelope: &Envelope,
    ) -> Result<Self, PayloadSchemaError> {
        let id = envelope.id.clone();
        Ok(match msg_type {
            PeerMessageType::Text => Self::Text(decode(envelope, msg_type)?),
            PeerMessageType::Markdown => Self::Markdown(decode(envelope, msg_type)?),
            PeerMessageType::Progress => Self::Progress(decode(envelope, msg_type)?),
            PeerMessageType::Form => Self::Form {
                id,
                payload: decode(envelope, msg_type)?,
            },
            PeerMessageType::Table => Self::Table(decode(envelope, msg_type)?),
            PeerMessageType::Code => Self::Code(decode(envelope, msg_type)?),
            PeerMessageType::Confirm => Self::Confirm {
                id,
                payload: decode(envelope, msg_type)?,
            },
            PeerMessageType::Select => Self::Select {
                id,
                payload: decode(envelope, msg_type)?,
            },
            PeerMessageType::Alert => Self::Alert(decode(envelope, msg_type)?),
            PeerMessageType::Spinner => Self::Spinner(decode(envelope, msg_type)?),
            PeerMessageType::Status => Self::Status(decode(envelope, msg_type)?),
            PeerMessageType::Clear => Self::Clear(decode(envelope, msg_type)?),
            PeerMessageType::Done => Self::Done(decode(envelope, msg_type)?),
            PeerMessageType::Update => Self::Update(decode(envelope, msg_type)?),
        })
    }

    /// Encode into an envelope (the peer's direction)
    pub fn to_envelope(&self) -> Result<Envelope, serde_json::Error> {
        let t = self.msg_type().as_str();
        match self {
            Self::Text(p) => encode(t, p, None),
            Self::Markdown(p) => encode(t, p, None),
            Self::Progress(p) => encode(t, p, None),
            Self::Form { id, payload } => encode(t, payload, id.clone()),
            Self::Table(p) => encode(t, p, None),
            Self::Code(p) => encode(t, p, None),
            Self::Confirm { id, payload } => encode(t, payload, id.clone()),
            Self::Select { id, payload } => encode(t, payload, id.clone()),
            Self::Alert(p) => encode(t, p, None),
            Self::Spinner(p) => encode(t, p, None),
            Self::Status(p) => encode(t, p, None),
            Self::Clear(p) => encode(t, p, None),
            Self::Done(p) => encode(t, p, None),
            Self::Update(p) => encode(t, p, None),
        }
    }
}

/// Message from the surface to the peer
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceMessage {
    /// User typed a message
    Input {
        /// Message text
        content: String,
    },
    /// Answer to a form request
    FormResponse {
        /// Id of the request being answered
        id: Option<CorrelationId>,
        /// Field values, `None` when cancelled
        values: Option<Map<String, Value>>,
        /// Non-user outcome markers
        flags: ResponseFlags,
    },
    /// Answer to a confirm request
    ConfirmResponse {
        /// Id of the request being answered
        id: Option<CorrelationId>,
        /// User chose the affirmative option
        confirmed: bool,
        /// Non-user outcome markers
        flags: ResponseFlags,
    },
    /// Answer to a select request
    SelectResponse {
        /// Id of the request being answered
        id: Option<CorrelationId>,
        /// Chosen option, empty when cancelled
        value: String,
        /// Non-user outcome markers
        flags: ResponseFlags,
    },
    /// Stop the current generation (fire and forget)
    Cancel,
    /// Surface is exiting
    Quit,
    /// Terminal size changed
    Resize {
        /// Columns
        width: u16,
        /// Rows
        height: u16,
    },
}

impl SurfaceMessage {
    /// Wire type of this message
    #[must_use]
    pub fn msg_type(&self) -> SurfaceMessageType {
        match self {
            Self::Input { .. } => SurfaceMessageType::Input,
            Self::FormResponse { .. } => SurfaceMessageType::FormResponse,
            Self::ConfirmResponse { .. } => SurfaceMessageType::ConfirmResponse,
            Self::SelectResponse { .. } => SurfaceMessageType::SelectResponse,
            Self::Cancel => SurfaceMessageType::Cancel,
            Self::Quit => SurfaceMessageType::Quit,
            Self::Resize { .. } => SurfaceMessageType::Resize,
        }
    }

    /// Correlation id carried by responses
    #[must_use]
    pub fn correlation_id(&self) -> Option<&CorrelationId> {
        match self {
            Self::FormResponse { id, .. }
            | Self::ConfirmResponse { id, .. }
            | Self::SelectResponse { id, .. } => id.as_ref(),
            _ => None,
        }
    }

    /// Encode into an envelope (the surface's direction)
    pub fn to_envelope(&self) -> Result<Envelope, serde_json::Error> {
        let t = self.msg_type().as_str();
        match self {
            Self::Input { content } => encode(
                t,
                &InputPayload {
                    content: content.clone(),
                },
                None,
            ),
            Self::FormResponse { id, values, flags } => encode(
                t,
                &FormResponsePayload {
                    values: values.clone(),
                    flags: *flags,
                },
                id.clone(),
            ),
            Self::ConfirmResponse {
                id,
                confirmed,
                flags,
            } => encode(
                t,
                &ConfirmResponsePayload {
                    confirmed: *confirmed,
                    flags: *flags,
                },
                id.clone(),
            ),
            Self::SelectResponse { id, value, flags } => encode(
                t,
                &SelectResponsePayload {
                    value: value.clone(),
                    flags: *flags,
                },
                id.clone(),
            ),
            Self::Cancel | Self::Quit => Ok(Envelope::bare(t)),
            Self::Resize { width, height } => encode(
                t,
                &ResizePayload {
                    width: *width,
                    height: *height,
                },
                None,
            ),
        }
    }

    /// Decode an envelope written by a surface (the peer's reading side)
    ///
    /// Returns `Ok(None)` for types that are not surface messages.
    pub fn from_envelope(envelope: &Envelope) -> Result<Option<Self>, PayloadSchemaError> {
        let Some(msg_type) = SurfaceMessageType::from_wire(&envelope.msg_type) else {
            return Ok(None);
        };
        let schema = |e: serde_json::Error| PayloadSchemaError::new(msg_type.as_str(), e);
        let id = envelope.id.clone();
        let msg = match msg_type {
            SurfaceMessageType::Input => {
                let p: InputPayload = envelope.decode_payload().map_err(schema)?;
                Self::Input { content: p.content }
            }
            SurfaceMessageType::FormResponse => {
                let p: FormResponsePayload = envelope.decode_payload().map_err(schema)?;
                Self::FormResponse {
                    id,
                    values: p.values,
                    flags: p.flags,
                }
            }
            SurfaceMessageType::ConfirmResponse => {
                let p: ConfirmResponsePayload = envelope.decode_payload().map_err(schema)?;
                Self::ConfirmResponse {
                    id,
                    confirmed: p.confirmed,
                    flags: p.flags,
                }
            }
            SurfaceMessageType::SelectResponse => {
                let p: SelectResponsePayload = envelope.decode_payload().map_err(schema)?;
                Self::SelectResponse {
                    id,
                    value: p.value,
                    flags: p.flags,
                }
            }
            SurfaceMessageType::Cancel => Self::Cancel,
            SurfaceMessageType::Quit => Self::Quit,
            SurfaceMessageType::Resize => {
                let p: ResizePayload = envelope.decode_payload().map_err(schema)?;
                Self::Resize {
                    width: p.width,
                    height: p.height,
                }
            }
        };
        Ok(Some(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::payloads::{
        ClearScope, FieldKind, FormField, ProgressStep, Severity, StepStatus, TableColumn,
        TokenUsage,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn peer_roundtrip(msg: &PeerMessage) -> PeerMessage {
        let line = serde_json::to_string(&msg.to_envelope().unwrap()).unwrap();
        let envelope: Envelope = serde_json::from_str(&line).unwrap();
        let msg_type = PeerMessageType::from_wire(&envelope.msg_type).unwrap();
        PeerMessage::decode_as(msg_type, &envelope).unwrap()
    }

    fn surface_roundtrip(msg: &SurfaceMessage) -> SurfaceMessage {
        let line = serde_json::to_string(&msg.to_envelope().unwrap()).unwrap();
        let envelope: Envelope = serde_json::from_str(&line).unwrap();
        SurfaceMessage::from_envelope(&envelope).unwrap().unwrap()
    }

    fn representative_peer_messages() -> Vec<PeerMessage> {
        vec![
            PeerMessage::Text(TextPayload {
                content: "Hel".into(),
                done: false,
            }),
            PeerMessage::Markdown(MarkdownPayload {
                content: "# Title".into(),
                title: Some("Notes".into()),
            }),
            PeerMessage::Progress(ProgressPayload {
                message: "Indexing".into(),
                percent: Some(42.5),
                steps: vec![ProgressStep {
                    label: "scan".into(),
                    status: StepStatus::Running,
                    detail: Some("src/".into()),
                }],
            }),
            PeerMessage::Form {
                id: Some("abc123".into()),
                payload: FormPayload {
                    title: Some("Deploy".into()),
                    fields: vec![FormField {
                        name: "env".into(),
                        label: "Environment".into(),
                        kind: FieldKind::Select,
                        options: vec!["dev".into(), "prod".into()],
                        required: true,
                        default: Some(json!("dev")),
                        description: None,
                        placeholder: None,
                    }],
                    ..FormPayload::default()
                },
            },
            PeerMessage::Table(TablePayload {
                title: Some("Files".into()),
                columns: vec![TableColumn::Name("name".into())],
                rows: vec![vec!["a.rs".into()]],
                footer: Some("1 file".into()),
            }),
            PeerMessage::Code(CodePayload {
                code: "fn main() {}".into(),
                language: Some("rust".into()),
                title: None,
                line_numbers: true,
            }),
            PeerMessage::Confirm {
                id: Some("c1".into()),
                payload: ConfirmPayload {
                    message: "Delete?".into(),
                    destructive: true,
                    ..ConfirmPayload::default()
                },
            },
            PeerMessage::Select {
                id: Some("s1".into()),
                payload: SelectPayload {
                    label: "Pick".into(),
                    options: vec!["a".into(), "b".into()],
                    default: Some("b".into()),
                },
            },
            PeerMessage::Alert(AlertPayload {
                message: "Disk low".into(),
                title: None,
                severity: Severity::Warning,
            }),
            PeerMessage::Spinner(SpinnerPayload {
                message: "Working".into(),
            }),
            PeerMessage::Status(StatusPayload {
                message: "Ready".into(),
                tokens: Some(TokenUsage {
                    input: 10,
                    output: 20,
                }),
            }),
            PeerMessage::Clear(ClearPayload {
                scope: ClearScope::Progress,
            }),
            PeerMessage::Done(DonePayload {
                summary: Some("All set".into()),
            }),
            PeerMessage::Update(ComponentUpdate {
                target: "t1".into(),
                fields: json!({"percent": 50}).as_object().cloned().unwrap(),
            }),
        ]
    }

    #[test]
    fn test_every_peer_type_roundtrips() {
        let messages = representative_peer_messages();
        assert_eq!(messages.len(), PeerMessageType::ALL.len());
        for msg in &messages {
            assert_eq!(&peer_roundtrip(msg), msg);
        }
    }

    #[test]
    fn test_every_surface_type_roundtrips() {
        let messages = vec![
            SurfaceMessage::Input {
                content: "hi".into(),
            },
            SurfaceMessage::FormResponse {
                id: Some("abc123".into()),
                values: json!({"env": "dev", "ok": true}).as_object().cloned(),
                flags: ResponseFlags::default(),
            },
            SurfaceMessage::ConfirmResponse {
                id: Some("c1".into()),
                confirmed: true,
                flags: ResponseFlags::default(),
            },
            SurfaceMessage::SelectResponse {
                id: Some("s1".into()),
                value: String::new(),
                flags: ResponseFlags::busy(),
            },
            SurfaceMessage::Cancel,
            SurfaceMessage::Quit,
            SurfaceMessage::Resize {
                width: 120,
                height: 40,
            },
        ];
        assert_eq!(messages.len(), SurfaceMessageType::ALL.len());
        for msg in &messages {
            assert_eq!(&surface_roundtrip(msg), msg);
        }
    }

    #[test]
    fn test_schema_error_names_the_type() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"type":"form","payload":{"fields":"not-an-array"}}"#)
                .unwrap();
        let err = PeerMessage::decode_as(PeerMessageType::Form, &envelope).unwrap_err();
        assert_eq!(err.msg_type, "form");
        assert!(err.to_string().starts_with("invalid form payload"));
    }

    #[test]
    fn test_response_echoes_request_id() {
        let msg = SurfaceMessage::ConfirmResponse {
            id: Some("xyz".into()),
            confirmed: false,
            flags: ResponseFlags::default(),
        };
        let envelope = msg.to_envelope().unwrap();
        assert_eq!(envelope.id, Some(CorrelationId::new("xyz")));
        assert_eq!(msg.correlation_id().map(CorrelationId::as_str), Some("xyz"));
    }

    #[test]
    fn test_cancel_and_quit_have_no_payload() {
        let line = serde_json::to_string(&SurfaceMessage::Cancel.to_envelope().unwrap()).unwrap();
        assert_eq!(line, r#"{"type":"cancel"}"#);
    }

    #[test]
    fn test_non_surface_type_is_not_decoded() {
        let envelope = Envelope::bare("text");
        assert_eq!(SurfaceMessage::from_envelope(&envelope).unwrap(), None);
    }
}
