//! Locating per-account settings files on disk.

use crate::config::SettingsConfig;
use hintswap_common::grammar::is_identifier;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Supplies candidate settings files.
pub trait SettingsLocator {
    /// With an identifier, the file of that account only; without, every
    /// account's file.
    fn locate(&self, identifier: Option<&str>) -> Vec<PathBuf>;
}

/// Searches `My Games/<game folder>/<account>/<file>` under Documents folders.
#[derive(Debug, Clone)]
pub struct DocumentsLocator {
    roots: Vec<PathBuf>,
    game_folder: String,
    file_name: String,
}

impl DocumentsLocator {
    /// Configured extra roots followed by the platform's Documents folders.
    pub fn from_config(config: &SettingsConfig) -> Self {
        let mut roots = config.extra_roots.clone();
        roots.extend(documents_roots());
        Self::with_roots(roots, config)
    }

    /// Only the given roots, deduplicated.
    pub fn with_roots(roots: Vec<PathBuf>, config: &SettingsConfig) -> Self {
        Self {
            roots: dedup_existing(roots),
            game_folder: config.game_folder.clone(),
            file_name: config.file_name.clone(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn game_dir(&self, root: &Path) -> PathBuf {
        root.join("My Games").join(&self.game_folder)
    }

    fn account_files(&self, game_dir: &Path) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(game_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not list {}: {}", game_dir.display(), e);
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|dir| dir.is_dir())
            .map(|dir| dir.join(&self.file_name))
            .filter(|file| file.is_file())
            .collect();
        files.sort();
        files
    }
}

impl SettingsLocator for DocumentsLocator {
    fn locate(&self, identifier: Option<&str>) -> Vec<PathBuf> {
        if let Some(id) = identifier
            && !is_identifier(id)
        {
            warn!("Refusing to look up settings for malformed identifier '{}'", id);
            return Vec::new();
        }

        let mut found = Vec::new();
        for root in &self.roots {
            let game_dir = self.game_dir(root);
            if !game_dir.is_dir() {
                continue;
            }
            match identifier {
                Some(id) => {
                    let file = game_dir.join(id).join(&self.file_name);
                    if file.is_file() {
                        found.push(file);
                    }
                }
                None => found.extend(self.account_files(&game_dir)),
            }
        }
        debug!("Found {} settings file(s)", found.len());
        found
    }
}

/// A fixed list of files, for callers that already know where to look.
impl SettingsLocator for Vec<PathBuf> {
    fn locate(&self, _identifier: Option<&str>) -> Vec<PathBuf> {
        self.clone()
    }
}

/// Documents folders in search order, before deduplication.
pub fn documents_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Some(docs) = dirs::document_dir() {
        roots.push(docs);
    }
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join("Documents"));
        roots.push(home.join("OneDrive").join("Documents"));
    }
    if let Some(profile) = std::env::var_os("USERPROFILE") {
        let profile = PathBuf::from(profile);
        roots.push(profile.join("Documents"));
        roots.push(profile.join("OneDrive").join("Documents"));
    }

    if cfg!(windows) {
        let user = std::env::var("USERNAME")
            .or_else(|_| std::env::var("USER"))
            .unwrap_or_default();
        for drive in 'C'..='Z' {
            let drive_root = PathBuf::from(format!("{}:/", drive));
            roots.push(drive_root.join("Documents"));
            if !user.is_empty() {
                let user_dir = drive_root.join("Users").join(&user);
                roots.push(user_dir.join("Documents"));
                roots.push(user_dir.join("OneDrive").join("Documents"));
            }
        }
    }

    roots
}

/// Keep existing directories, first occurrence of each canonical path.
fn dedup_existing(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    roots
        .into_iter()
        .filter(|root| root.is_dir())
        .filter(|root| {
            let key = root.canonicalize().unwrap_or_else(|_| root.clone());
            seen.insert(key)
        })
        .collect()
}
