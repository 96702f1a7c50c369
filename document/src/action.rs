//! The action algebra (§4.4, §4.8, §6.1): a tagged sum type the reducer
//! consumes, serializable to the wire envelope `{"type": ..., ...fields}`.
//! Matches the teacher's preference for plain enums with data over trait
//! objects (`Node`, `BufferKind` are never `dyn Trait` either).

use serde::{Deserialize, Serialize};

use crate::error::ActionError;
use crate::selection::SelectionRange;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DocumentAction {
    #[serde(rename = "INSERT")]
    Insert { start: usize, text: String },
    #[serde(rename = "DELETE")]
    Delete { start: usize, end: usize },
    #[serde(rename = "REPLACE")]
    Replace {
        start: usize,
        end: usize,
        text: String,
    },
    #[serde(rename = "SET_SELECTION")]
    SetSelection { ranges: Vec<SelectionRange> },
    #[serde(rename = "UNDO")]
    Undo,
    #[serde(rename = "REDO")]
    Redo,
    #[serde(rename = "HISTORY_CLEAR")]
    HistoryClear,
    #[serde(rename = "APPLY_REMOTE")]
    ApplyRemote { changes: Vec<RemoteChange> },
    #[serde(rename = "TRANSACTION_START")]
    TransactionStart,
    #[serde(rename = "TRANSACTION_COMMIT")]
    TransactionCommit,
    #[serde(rename = "TRANSACTION_ROLLBACK")]
    TransactionRollback,
    #[serde(rename = "LOAD_CHUNK")]
    LoadChunk {
        #[serde(rename = "chunkIndex")]
        chunk_index: usize,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
    #[serde(rename = "EVICT_CHUNK")]
    EvictChunk {
        #[serde(rename = "chunkIndex")]
        chunk_index: usize,
    },
}

/// A single change inside an `APPLY_REMOTE` batch (§6.1). Byte offsets, like
/// everywhere else on the wire, are UTF-8 byte positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RemoteChange {
    #[serde(rename = "insert")]
    Insert { start: usize, text: String },
    #[serde(rename = "delete")]
    Delete { start: usize, length: usize },
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(de)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| serde::de::Error::custom(format!("invalid base64: {e}")))
    }
}

/// Serialize an action to its JSON wire envelope.
pub fn serialize_action(action: &DocumentAction) -> Result<String, serde_json::Error> {
    serde_json::to_string(action)
}

/// Deserialize a JSON wire envelope, turning serde's generic parse errors
/// into the spec's descriptive `ActionError` variants.
pub fn deserialize_action(json: &str) -> Result<DocumentAction, ActionError> {
    serde_json::from_str::<DocumentAction>(json).map_err(|e| classify(json, &e))
}

fn classify(json: &str, e: &serde_json::Error) -> ActionError {
    let message = e.to_string();
    if message.contains("invalid base64") {
        return ActionError::InvalidBase64(message);
    }
    if message.contains("unknown variant") {
        return ActionError::UnknownType(type_tag(json).unwrap_or_else(|| message.clone()));
    }
    if message.contains("missing field") {
        let field = message
            .split('`')
            .nth(1)
            .unwrap_or("?")
            .to_string();
        return ActionError::MissingField {
            action_type: type_tag(json).unwrap_or_default(),
            field,
        };
    }
    ActionError::MistypedField {
        action_type: type_tag(json).unwrap_or_default(),
        field: "?".to_string(),
        reason: message,
    }
}

fn type_tag(json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    value.get("type")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_insert() {
        let action = DocumentAction::Insert {
            start: 3,
            text: "hi".to_string(),
        };
        let json = serialize_action(&action).unwrap();
        assert_eq!(action, deserialize_action(&json).unwrap());
    }

    #[test]
    fn load_chunk_round_trips_through_base64() {
        let action = DocumentAction::LoadChunk {
            chunk_index: 3,
            data: vec![65, 66, 67, 68],
        };
        let json = serialize_action(&action).unwrap();
        assert!(json.contains("QUJDRA=="));
        let back = deserialize_action(&json).unwrap();
        assert_eq!(action, back);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = deserialize_action(r#"{"type":"NOT_A_THING"}"#).unwrap_err();
        assert!(matches!(err, ActionError::UnknownType(_)));
    }

    #[test]
    fn missing_field_is_rejected() {
        let err = deserialize_action(r#"{"type":"INSERT","start":0}"#).unwrap_err();
        assert!(matches!(err, ActionError::MissingField { .. }));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let err =
            deserialize_action(r#"{"type":"LOAD_CHUNK","chunkIndex":0,"data":"not-base64!"}"#)
                .unwrap_err();
        assert!(matches!(err, ActionError::InvalidBase64(_)));
    }

    #[test]
    fn set_selection_round_trips() {
        let action = DocumentAction::SetSelection {
            ranges: vec![SelectionRange::new(1, 4)],
        };
        let json = serialize_action(&action).unwrap();
        assert_eq!(action, deserialize_action(&json).unwrap());
    }
}
