//! Top-level error wrapper types.

use crate::{
    ActionError, ActionErrorKind, ConfigError, NotifyError, ScheduleError, StoreError,
    StoreErrorKind,
};

/// Every error the workspace can produce.
///
/// # Examples
///
/// ```
/// use patisserie_error::{PatisserieError, StoreError, StoreErrorKind};
///
/// let store_err = StoreError::new(StoreErrorKind::NotFound);
/// let err: PatisserieError = store_err.into();
/// assert!(format!("{}", err).contains("Store Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum PatisserieErrorKind {
    /// Action rejected by a guard
    #[from(ActionError)]
    Action(ActionError),
    /// Persistent store failure
    #[from(StoreError)]
    Store(StoreError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Notification delivery failure
    #[from(NotifyError)]
    Notify(NotifyError),
    /// Schedule definition error
    #[from(ScheduleError)]
    Schedule(ScheduleError),
}

/// Patisserie error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Patisserie Error: {}", _0)]
pub struct PatisserieError(Box<PatisserieErrorKind>);

impl PatisserieError {
    /// Create a new error from a kind.
    pub fn new(kind: PatisserieErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &PatisserieErrorKind {
        &self.0
    }

    /// The rejection kind, when this error is an action rejection.
    pub fn action_kind(&self) -> Option<&ActionErrorKind> {
        match self.kind() {
            PatisserieErrorKind::Action(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// The store failure kind, when this error came from a store.
    pub fn store_kind(&self) -> Option<&StoreErrorKind> {
        match self.kind() {
            PatisserieErrorKind::Store(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// Human-readable reason for rejections; a generic message otherwise.
    pub fn user_message(&self) -> String {
        match self.kind() {
            PatisserieErrorKind::Action(e) => e.reason(),
            _ => "Something went wrong, please try again later.".to_string(),
        }
    }
}

// Generic From implementation for any type that converts to PatisserieErrorKind
impl<T> From<T> for PatisserieError
where
    T: Into<PatisserieErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Patisserie operations.
pub type PatisserieResult<T> = std::result::Result<T, PatisserieError>;
