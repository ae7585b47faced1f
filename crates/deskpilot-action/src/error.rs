//! Error types for action dispatch.


/// Errors raised by an adapter while carrying out an action.
///
/// The router never lets these escape: they are turned into failure
/// results at the dispatch boundary.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Action handler failed: {0}")]
    HandlerFailed(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Command `{program}` failed: {reason}")]
    CommandFailed { program: String, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
