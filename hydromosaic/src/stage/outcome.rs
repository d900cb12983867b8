//! Result of one per-tile task.

use std::any::Any;
use std::fmt;

/// Outcome of running one stage on one tile.
///
/// Failures are values, never errors: a failed tile is logged and recorded
/// in the success table while the rest of the batch continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub success: bool,
    /// Human-readable summary, the diagnostic text on failure
    pub message: String,
}

impl TaskOutcome {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Outcome for a task whose function panicked.
    pub fn from_panic(context: &str, payload: &(dyn Any + Send)) -> Self {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::failed(format!("{}: panicked: {}", context, reason))
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
