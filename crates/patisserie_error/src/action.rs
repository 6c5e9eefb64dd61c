//! Rejections reported synchronously to the actor that issued a command.

use chrono::{DateTime, Utc};

/// Reasons an actor's request is refused.
///
/// None of these are retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ActionErrorKind {
    /// The record's current status does not allow the action.
    #[display("Invalid state: {}", _0)]
    InvalidState(String),

    /// The actor does not own the claim-scoped record.
    #[display("Not your claim: {}", _0)]
    NotOwner(String),

    /// The customer already has an active order, or the staff member an
    /// active vacation.
    #[display("Already active: {}", _0)]
    AlreadyActive(String),

    /// The customer is permanently banned.
    #[display("Permanent ban in effect")]
    Banned,

    /// The customer is suspended until the given instant.
    #[display("Temporary ban in effect until {}", _0)]
    TemporarilyBanned(DateTime<Utc>),

    /// Unknown order, code or member.
    #[display("Not found: {}", _0)]
    NotFound(String),

    /// The premium code was already redeemed.
    #[display("Code already redeemed: {}", _0)]
    DuplicateRedemption(String),

    /// A numeric input fell outside its allowed bounds.
    #[display("{} must be between {} and {} (got {})", field, min, max, value)]
    OutOfRange {
        /// Name of the offending input.
        field: String,
        /// Value that was supplied.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// The actor lacks the capability required by the command.
    #[display("Unauthorized: {}", _0)]
    Unauthorized(String),

    /// The command text could not be understood.
    #[display("Invalid input: {}", _0)]
    InvalidInput(String),
}

impl ActionErrorKind {
    /// Convenience constructor for [`ActionErrorKind::OutOfRange`].
    pub fn out_of_range(field: impl Into<String>, value: i64, min: i64, max: i64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        }
    }
}

/// Action rejection with source location tracking.
///
/// # Examples
///
/// ```
/// use patisserie_error::{ActionError, ActionErrorKind};
///
/// let err = ActionError::new(ActionErrorKind::out_of_range("stars", 7, 1, 5));
/// assert_eq!(err.reason(), "stars must be between 1 and 5 (got 7)");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Action rejected: {} at line {} in {}", kind, line, file)]
pub struct ActionError {
    /// The kind of rejection
    pub kind: ActionErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ActionError {
    /// Create a new ActionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ActionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Human-readable reason, without source location.
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }
}
