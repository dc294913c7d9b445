use thiserror::Error;

/// Errors surfaced synchronously to the command adapter.
///
/// Everything else (probe transport failures, sink writes, notification
/// deliveries) is absorbed inside the engine and only logged.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no target provided")]
    MissingTarget,

    #[error("invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
}
