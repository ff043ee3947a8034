use hintswap_common::error::BackendError;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Outcome of resolving a username.
///
/// `success` is true exactly when a non-empty identifier is present; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    identifier: Option<String>,
    success: bool,
}

impl ResolutionResult {
    /// A successful result, or `None` for an empty identifier.
    pub fn resolved(identifier: String) -> Option<Self> {
        if identifier.is_empty() {
            return None;
        }
        Some(Self {
            identifier: Some(identifier),
            success: true,
        })
    }

    pub fn failed() -> Self {
        Self {
            identifier: None,
            success: false,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn into_identifier(self) -> Option<String> {
        self.identifier
    }
}

/// Why a resolution failed. Only ever logged; callers see [`ResolutionResult`].
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Browser session could not be started: {0}")]
    SessionStart(BackendError),

    #[error("Search input not found (tried {})", tried.join(", "))]
    LocatorNotFound { tried: Vec<String> },

    #[error("No profile link matched and fallback navigation ended on '{url}'")]
    NoCandidate { url: String },

    #[error("Navigation was not confirmed within {0:?}")]
    NavigationTimeout(Duration),

    #[error("Final URL '{url}' is not a profile URL")]
    ExtractionMismatch { url: String },

    #[error("Resolution did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Backend panicked during resolution")]
    Panicked,
}

impl ResolveError {
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::SessionStart(_) => "SESSION_START_FAILED",
            ResolveError::LocatorNotFound { .. } => "LOCATOR_NOT_FOUND",
            ResolveError::NoCandidate { .. } => "NO_CANDIDATE",
            ResolveError::NavigationTimeout(_) => "NAVIGATION_TIMEOUT",
            ResolveError::ExtractionMismatch { .. } => "EXTRACTION_MISMATCH",
            ResolveError::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
            ResolveError::Backend(_) => "BACKEND_ERROR",
            ResolveError::Panicked => "PANICKED",
        }
    }
}
