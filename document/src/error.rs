//! Error kinds and the diagnostic sink. Per the fail-soft/fail-strict split:
//! the action-deserialization boundary is fail-strict (`ActionError`), the
//! transaction manager's own invariant checks are internal (`TransactionError`),
//! and everything else (clamping, no-ops) returns ordinary values.

use std::fmt;

/// Raised when an action fails to deserialize or validate structurally.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("unknown action type: {0}")]
    UnknownType(String),
    #[error("missing required field `{field}` on action `{action_type}`")]
    MissingField {
        action_type: String,
        field: String,
    },
    #[error("mistyped field `{field}` on action `{action_type}`: {reason}")]
    MistypedField {
        action_type: String,
        field: String,
        reason: String,
    },
    #[error("malformed base64 payload: {0}")]
    InvalidBase64(String),
}

/// Internal invariant violations in the transaction manager. These should
/// never surface to a well-behaved caller; they exist so `begin`/`commit`/
/// `rollback` can assert their own depth/stack invariants in debug builds.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("commit with no active transaction (depth=0)")]
    CommitWithoutBegin,
    #[error("rollback with no active transaction (depth=0)")]
    RollbackWithoutBegin,
}

/// Everything a reducer/store can go fail-soft about but still wants heard.
/// Not an error type in the `Result` sense: diagnostics never prevent a
/// mutation from completing, they just get reported somewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A non-finite or otherwise unusable numeric input was coerced to 0.
    InvalidInput { message: String },
    /// A listener callback panicked/failed; isolated, other listeners still ran.
    ListenerFault { message: String },
    /// An event handler failed; isolated.
    EventHandlerFault { message: String },
    /// `batch`'s rollback itself failed; an emergency reset was performed.
    TransactionRollbackFault { message: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::InvalidInput { message } => write!(f, "invalid input: {message}"),
            Diagnostic::ListenerFault { message } => write!(f, "listener fault: {message}"),
            Diagnostic::EventHandlerFault { message } => {
                write!(f, "event handler fault: {message}")
            }
            Diagnostic::TransactionRollbackFault { message } => {
                write!(f, "transaction rollback fault: {message}")
            }
        }
    }
}

/// Injectable sink for diagnostics raised at observer boundaries. An embedder
/// can install its own to capture these instead of (or alongside) the `log`
/// facade the default sink uses.
pub trait DiagnosticSink: fmt::Debug {
    fn report(&self, diagnostic: Diagnostic);
}

/// Best-effort text out of a `std::panic::catch_unwind` payload, used to
/// describe a listener/event-handler fault without depending on the panic
/// carrying a particular type.
pub(crate) fn describe_panic(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "listener panicked with a non-string payload".to_string()
    }
}

/// Default sink: routes to `log::warn!`/`log::error!` depending on severity.
#[derive(Debug, Default)]
pub struct LogDiagnosticSink;

impl DiagnosticSink for LogDiagnosticSink {
    fn report(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::InvalidInput { .. } => log::warn!("{diagnostic}"),
            Diagnostic::ListenerFault { .. } | Diagnostic::EventHandlerFault { .. } => {
                log::warn!("{diagnostic}")
            }
            Diagnostic::TransactionRollbackFault { .. } => log::error!("{diagnostic}"),
        }
    }
}
