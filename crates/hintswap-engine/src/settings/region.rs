use serde::{Deserialize, Serialize};

/// A selectable region: what the user picks and what the game client reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEntry {
    pub label: String,
    pub token: String,
}

impl RegionEntry {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

pub fn default_regions() -> Vec<RegionEntry> {
    [
        ("Default", "default"),
        ("US-West", "playfab/westus"),
        ("US-Central", "playfab/centralus"),
        ("US-South-Central", "playfab/southcentralus"),
        ("East-US", "playfab/eastus"),
        ("Brazil", "playfab/brazilsouth"),
        ("EU-North", "playfab/northeurope"),
        ("EU-West", "playfab/westeurope"),
        ("UAE", "playfab/uaenorth"),
        ("South Africa", "playfab/southafricanorth"),
        ("Asia-East", "playfab/eastasia"),
        ("Asia-Southeast", "playfab/southeastasia"),
        ("Japan", "playfab/japaneast"),
        ("Australia", "playfab/australiaeast"),
    ]
    .into_iter()
    .map(|(label, token)| RegionEntry::new(label, token))
    .collect()
}

/// Ordered label to token lookup.
#[derive(Debug, Clone)]
pub struct RegionTable {
    entries: Vec<RegionEntry>,
}

impl RegionTable {
    pub fn new(entries: Vec<RegionEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RegionEntry] {
        &self.entries
    }

    /// Look up by label (ignoring case) or by exact token.
    pub fn lookup(&self, label_or_token: &str) -> Option<&RegionEntry> {
        let wanted = label_or_token.trim();
        self.entries
            .iter()
            .find(|e| e.label.eq_ignore_ascii_case(wanted))
            .or_else(|| self.entries.iter().find(|e| e.token == wanted))
    }

    pub fn token_for(&self, label_or_token: &str) -> Option<&str> {
        self.lookup(label_or_token).map(|e| e.token.as_str())
    }
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::new(default_regions())
    }
}
