// Error types for the voice separation core.
//
// No `thiserror`/`anyhow` dependency: matches the rest of this codebase's
// convention of small hand-rolled error enums with a manual `Display` impl.

use std::fmt;

/// Failure modes for [`crate::separate::separate_voices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeparationError {
    /// Input arrays were empty, mismatched in length, or contained a
    /// non-positive duration.
    InvalidInput(String),
    /// A scratch allocation could not be satisfied. Not reachable from this
    /// crate's own code paths on ordinary input sizes; kept for parity with
    /// host bindings that may call through an allocator with a hard cap.
    ResourceExhausted(String),
    /// The monitor callback returned an error. The separation it interrupted
    /// still ran to completion with further monitor calls suppressed; this
    /// variant only carries the callback's own message back to the caller.
    MonitorFailed(String),
}

impl fmt::Display for SeparationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeparationError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            SeparationError::ResourceExhausted(msg) => write!(f, "resource exhausted: {msg}"),
            SeparationError::MonitorFailed(msg) => write!(f, "monitor failed: {msg}"),
        }
    }
}

impl std::error::Error for SeparationError {}

/// Error type returned by a user-supplied monitor callback.
///
/// Kept distinct from [`SeparationError`] so callbacks don't need to
/// construct a full separation error just to signal "stop calling me".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorError(pub String);

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MonitorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_include_detail() {
        let e = SeparationError::InvalidInput("onset/offset length mismatch".to_string());
        assert!(e.to_string().contains("onset/offset length mismatch"));
    }

    #[test]
    fn monitor_error_displays_inner_message() {
        let e = MonitorError("callback raised".to_string());
        assert_eq!(e.to_string(), "callback raised");
    }
}
