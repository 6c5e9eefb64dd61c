//! Notification delivery errors.
//!
//! Callers log and swallow these; they never roll back a committed transition.

/// Notification failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum NotifyErrorKind {
    /// The recipient could not be resolved (unknown channel, DMs closed).
    #[display("Recipient unreachable: {}", _0)]
    Unreachable(String),
    /// The transport refused the message.
    #[display("Message rejected: {}", _0)]
    Rejected(String),
    /// Underlying transport failure.
    #[display("Transport failure: {}", _0)]
    Transport(String),
}

/// Notification error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Notify Error: {} at line {} in {}", kind, line, file)]
pub struct NotifyError {
    /// The kind of error that occurred
    pub kind: NotifyErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl NotifyError {
    /// Create a new NotifyError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: NotifyErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
