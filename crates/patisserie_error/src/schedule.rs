//! Schedule parsing errors.

/// Invalid schedule definition (for example a malformed cron expression).
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Schedule Error: {} at line {} in {}", message, line, file)]
pub struct ScheduleError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ScheduleError {
    /// Create a new ScheduleError at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
