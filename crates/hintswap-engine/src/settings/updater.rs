//! `DataCenterHint` rewrite for per-account settings files.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const DATA_CENTER_HINT_KEY: &str = "DataCenterHint";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid UTF-8", .path.display())]
    InvalidEncoding { path: PathBuf },
}

/// Point the settings file at `region_token`. Returns `false` on any fault.
pub fn update_server_setting(path: &Path, region_token: &str) -> bool {
    match try_update_server_setting(path, region_token) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %path.display(), "Error updating settings file: {}", e);
            false
        }
    }
}

pub fn try_update_server_setting(path: &Path, region_token: &str) -> Result<(), SettingsError> {
    let content = read_settings(path)?;
    let updated = rewrite_hint(&content, region_token);
    std::fs::write(path, updated).map_err(|source| SettingsError::Io {
        action: "write",
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Set {}={} in {}", DATA_CENTER_HINT_KEY, region_token, path.display());
    Ok(())
}

/// Current hint of the file at `path`, if it has one.
pub fn read_server_setting(path: &Path) -> Result<Option<String>, SettingsError> {
    let content = read_settings(path)?;
    Ok(read_hint(&content).map(str::to_string))
}

fn read_settings(path: &Path) -> Result<String, SettingsError> {
    let bytes = std::fs::read(path).map_err(|source| SettingsError::Io {
        action: "read",
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| SettingsError::InvalidEncoding {
        path: path.to_path_buf(),
    })
}

fn hint_value(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix(DATA_CENTER_HINT_KEY)
        .and_then(|rest| rest.strip_prefix('='))
}

/// Value of the first `DataCenterHint=` line.
pub fn read_hint(content: &str) -> Option<&str> {
    content.lines().find_map(hint_value)
}

/// Return `content` with exactly one `DataCenterHint=<token>` line.
///
/// The first existing hint line is replaced in place and any later ones are
/// dropped. Without one, trailing blank lines are removed and the hint is
/// appended. Other lines keep their content and order. New lines use CRLF when
/// the file already does.
pub fn rewrite_hint(content: &str, token: &str) -> String {
    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let hint_line = format!("{}={}{}", DATA_CENTER_HINT_KEY, token, newline);

    let mut lines: Vec<Cow<'_, str>> = Vec::new();
    let mut replaced = false;
    for line in content.split_inclusive('\n') {
        if hint_value(line).is_some() {
            if !replaced {
                lines.push(Cow::Owned(hint_line.clone()));
                replaced = true;
            }
            continue;
        }
        lines.push(Cow::Borrowed(line));
    }

    if !replaced {
        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        if let Some(last) = lines.last_mut()
            && !last.ends_with('\n')
        {
            last.to_mut().push_str(newline);
        }
        lines.push(Cow::Owned(hint_line));
    }

    lines.concat()
}
