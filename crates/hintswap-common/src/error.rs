use crate::protocol::ElementHandle;

/// Errors raised by browser backends.
#[derive(thiserror::Error, Debug, Clone)]
pub enum BackendError {
    // ============================================================
    // Session Errors
    // ============================================================
    #[error("Failed to start browser session: {0}")]
    LaunchFailed(String),

    #[error("Not ready")]
    NotReady,

    // ============================================================
    // Navigation Errors
    // ============================================================
    #[error("Navigation failed: {0}")]
    Navigation(String),

    // ============================================================
    // Element Errors
    // ============================================================
    #[error("Element {0} not found")]
    ElementNotFound(ElementHandle),

    #[error("Element {0} is stale (page changed since it was located)")]
    ElementStale(ElementHandle),

    #[error("Invalid selector: {selector}")]
    SelectorInvalid { selector: String },

    // ============================================================
    // Execution Errors
    // ============================================================
    #[error("Script execution error: {0}")]
    ScriptError(String),

    // ============================================================
    // System Errors
    // ============================================================
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Other: {0}")]
    Other(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Serialization(err.to_string())
    }
}

impl BackendError {
    /// Stable error code, used in structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::LaunchFailed(_) => "LAUNCH_FAILED",
            BackendError::NotReady => "NOT_READY",
            BackendError::Navigation(_) => "NAVIGATION_ERROR",
            BackendError::ElementNotFound(_) => "ELEMENT_NOT_FOUND",
            BackendError::ElementStale(_) => "ELEMENT_STALE",
            BackendError::SelectorInvalid { .. } => "SELECTOR_INVALID",
            BackendError::ScriptError(_) => "SCRIPT_ERROR",
            BackendError::Io(_) => "IO_ERROR",
            BackendError::Serialization(_) => "SERIALIZATION_ERROR",
            BackendError::Other(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(BackendError::NotReady.code(), "NOT_READY");
        assert_eq!(
            BackendError::SelectorInvalid {
                selector: "xpath://[".into()
            }
            .code(),
            "SELECTOR_INVALID"
        );
        assert_eq!(
            BackendError::ElementStale(ElementHandle(3)).to_string(),
            "Element #3 is stale (page changed since it was located)"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: BackendError = std::io::Error::other("disk gone").into();
        assert!(matches!(err, BackendError::Io(ref msg) if msg.contains("disk gone")));
        assert_eq!(err.code(), "IO_ERROR");
    }
}
