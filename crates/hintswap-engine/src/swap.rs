//! Resolve, discover, update: the whole flow behind one region change.

use crate::backend::Backend;
use crate::resolution::ResolutionEngine;
use crate::settings::{SettingsLocator, update_server_setting};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Which accounts a region change applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapTarget {
    /// The account behind a username, resolved through the search page.
    Username(String),
    /// Every account found on disk; no lookup.
    AllAccounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub updated: bool,
}

/// What happened, in the terms a user cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwapReport {
    /// No identifier could be resolved for the username.
    Unresolved { username: String },
    /// No settings file exists for the identifier (or for any account).
    NoSettingsFiles { identifier: Option<String> },
    /// Files were attempted; each has its own outcome.
    Applied {
        identifier: Option<String>,
        token: String,
        files: Vec<FileOutcome>,
    },
}

impl SwapReport {
    pub fn updated_count(&self) -> usize {
        match self {
            SwapReport::Applied { files, .. } => files.iter().filter(|f| f.updated).count(),
            _ => 0,
        }
    }

    /// At least one file now carries the new token.
    pub fn is_success(&self) -> bool {
        self.updated_count() > 0
    }
}

/// Update each file in turn. A failure on one file does not stop the rest.
pub fn apply_to_files(paths: &[PathBuf], token: &str) -> Vec<FileOutcome> {
    paths
        .iter()
        .map(|path| {
            let updated = update_server_setting(path, token);
            if updated {
                info!("Updated {}", path.display());
            } else {
                warn!("Failed to update {}", path.display());
            }
            FileOutcome {
                path: path.clone(),
                updated,
            }
        })
        .collect()
}

/// Point the target accounts at `token`.
///
/// The backend is only used (and launched) for [`SwapTarget::Username`].
pub async fn swap_region<B, L>(
    engine: &ResolutionEngine,
    backend: &mut B,
    locator: &L,
    target: &SwapTarget,
    token: &str,
) -> SwapReport
where
    B: Backend + ?Sized,
    L: SettingsLocator + ?Sized,
{
    let identifier = match target {
        SwapTarget::Username(username) => {
            info!("Looking up identifier for username '{}'", username);
            let result = engine.resolve(backend, username).await;
            match result.into_identifier() {
                Some(id) => {
                    info!("Resolved identifier {}", id);
                    Some(id)
                }
                None => {
                    return SwapReport::Unresolved {
                        username: username.clone(),
                    };
                }
            }
        }
        SwapTarget::AllAccounts => None,
    };

    let files = locator.locate(identifier.as_deref());
    if files.is_empty() {
        return SwapReport::NoSettingsFiles { identifier };
    }
    info!("Updating {} settings file(s) to {}", files.len(), token);

    SwapReport::Applied {
        identifier,
        token: token.to_string(),
        files: apply_to_files(&files, token),
    }
}
