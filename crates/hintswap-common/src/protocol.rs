use serde::{Deserialize, Serialize};
use std::fmt;

/// How a [`Locator`] value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    Css,
    Xpath,
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorKind::Css => write!(f, "css"),
            SelectorKind::Xpath => write!(f, "xpath"),
        }
    }
}

/// One way of finding an element on a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub kind: SelectorKind,
    pub value: String,
}

impl Locator {
    pub fn css(value: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Css,
            value: value.into(),
        }
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Xpath,
            value: value.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

/// Opaque reference to an element located by a backend.
///
/// Handles index into a table the backend keeps for the current page. The
/// table is reset whenever the backend navigates, so a handle from a previous
/// page resolves to [`BackendError::ElementStale`](crate::error::BackendError::ElementStale)
/// or `ElementNotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub u32);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Keys the resolver needs to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
}

impl Key {
    /// DOM `KeyboardEvent.key` name.
    pub fn name(self) -> &'static str {
        match self {
            Key::Enter => "Enter",
        }
    }

    /// Code point used by the WebDriver "send keys" command.
    pub fn webdriver_code(self) -> char {
        match self {
            Key::Enter => '\u{E007}',
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
    pub status: u16, // generic status code (e.g. 200)
}
