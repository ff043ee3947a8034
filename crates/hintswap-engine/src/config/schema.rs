use crate::settings::region::{RegionEntry, default_regions};
use hintswap_common::grammar::ProfileUrlGrammar;
use hintswap_common::protocol::Locator;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use super::loader::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintswapConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default = "default_regions")]
    pub regions: Vec<RegionEntry>,
}

impl Default for HintswapConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            session: SessionConfig::default(),
            settings: SettingsConfig::default(),
            regions: default_regions(),
        }
    }
}

impl HintswapConfig {
    /// Check the values serde cannot: URLs, the profile grammar, and the
    /// region table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.resolver.search_url).map_err(|e| {
            ConfigError::Invalid(format!(
                "resolver.search_url '{}': {}",
                self.resolver.search_url, e
            ))
        })?;
        ProfileUrlGrammar::new(&self.resolver.profile_base_url)
            .map_err(|e| ConfigError::Invalid(format!("resolver.profile_base_url: {}", e)))?;

        if self.resolver.locators.is_empty() {
            return Err(ConfigError::Invalid(
                "resolver.locators must name at least one locator".into(),
            ));
        }
        if let Some(blank) = self.resolver.locators.iter().find(|l| l.value.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "resolver.locators contains an empty {} selector",
                blank.kind
            )));
        }
        if self.resolver.candidate_selector.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "resolver.candidate_selector must not be empty".into(),
            ));
        }

        if self.regions.is_empty() {
            return Err(ConfigError::Invalid("regions must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for region in &self.regions {
            if !seen.insert(region.label.to_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate region label '{}'",
                    region.label
                )));
            }
        }
        Ok(())
    }
}

/// How much of the resolution protocol is narrated in the logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnostics {
    /// Stage narration at debug level.
    #[default]
    Quiet,
    /// Stage narration at info level.
    Narrated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_search_url")]
    pub search_url: String,
    /// `scheme://host/segment` prefix shared by every profile URL.
    #[serde(default = "default_profile_base_url")]
    pub profile_base_url: String,
    /// CSS selector for suggestion links.
    #[serde(default = "default_candidate_selector")]
    pub candidate_selector: String,
    /// Search input locators, tried in order.
    #[serde(default = "default_locators")]
    pub locators: Vec<Locator>,
    #[serde(default = "default_locate_timeout_ms")]
    pub locate_timeout_ms: u64,
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,
    #[serde(default = "default_focus_settle_ms")]
    pub focus_settle_ms: u64,
    #[serde(default = "default_suggestion_settle_ms")]
    pub suggestion_settle_ms: u64,
    #[serde(default = "default_navigation_settle_ms")]
    pub navigation_settle_ms: u64,
    #[serde(default = "default_confirm_timeout_ms")]
    pub confirm_timeout_ms: u64,
    #[serde(default = "default_confirm_settle_ms")]
    pub confirm_settle_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Wall-clock limit for a whole resolution. `null` disables it.
    #[serde(default = "default_overall_timeout_ms")]
    pub overall_timeout_ms: Option<u64>,
    /// Limit for closing the browser session once resolution is over.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
    #[serde(default)]
    pub diagnostics: Diagnostics,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            profile_base_url: default_profile_base_url(),
            candidate_selector: default_candidate_selector(),
            locators: default_locators(),
            locate_timeout_ms: default_locate_timeout_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
            focus_settle_ms: default_focus_settle_ms(),
            suggestion_settle_ms: default_suggestion_settle_ms(),
            navigation_settle_ms: default_navigation_settle_ms(),
            confirm_timeout_ms: default_confirm_timeout_ms(),
            confirm_settle_ms: default_confirm_settle_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            overall_timeout_ms: default_overall_timeout_ms(),
            close_timeout_ms: default_close_timeout_ms(),
            diagnostics: Diagnostics::default(),
        }
    }
}

impl ResolverConfig {
    pub fn locate_timeout(&self) -> Duration {
        Duration::from_millis(self.locate_timeout_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn focus_settle(&self) -> Duration {
        Duration::from_millis(self.focus_settle_ms)
    }

    pub fn suggestion_settle(&self) -> Duration {
        Duration::from_millis(self.suggestion_settle_ms)
    }

    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn confirm_settle(&self) -> Duration {
        Duration::from_millis(self.confirm_settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        // A zero interval would spin the confirmation poll.
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn overall_timeout(&self) -> Option<Duration> {
        self.overall_timeout_ms.map(Duration::from_millis)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}

fn default_search_url() -> String {
    "https://stats.cc/siege".to_string()
}

fn default_profile_base_url() -> String {
    "https://stats.cc/siege".to_string()
}

fn default_candidate_selector() -> String {
    "a[href*='/siege/']".to_string()
}

fn default_locators() -> Vec<Locator> {
    vec![
        Locator::xpath("//input[@placeholder='Search a profile...']"),
        Locator::xpath("/html/body/div[1]/div[1]/div/div[2]/div[2]/main/div/div/div[1]/div[2]/input"),
        Locator::css("input[placeholder='Search a profile...']"),
    ]
}

fn default_locate_timeout_ms() -> u64 {
    15000
}

fn default_scroll_settle_ms() -> u64 {
    500
}

fn default_focus_settle_ms() -> u64 {
    300
}

fn default_suggestion_settle_ms() -> u64 {
    2000
}

fn default_navigation_settle_ms() -> u64 {
    2000
}

fn default_confirm_timeout_ms() -> u64 {
    15000
}

fn default_confirm_settle_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_overall_timeout_ms() -> Option<u64> {
    Some(90000)
}

fn default_close_timeout_ms() -> u64 {
    10000
}

/// Options used when a backend creates its browser session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_true")]
    pub no_sandbox: bool,
    #[serde(default = "default_true")]
    pub disable_dev_shm_usage: bool,
    #[serde(default = "default_true")]
    pub disable_gpu: bool,
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Browser executable. Headless backend also honours `CHROME_BIN`.
    #[serde(default)]
    pub browser_binary: Option<PathBuf>,
    /// External WebDriver server. When unset the WebDriver backend spawns
    /// `chromedriver` on `driver_port`.
    #[serde(default)]
    pub webdriver_url: Option<String>,
    #[serde(default)]
    pub driver_binary: Option<PathBuf>,
    #[serde(default = "default_driver_port")]
    pub driver_port: u16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            no_sandbox: true,
            disable_dev_shm_usage: true,
            disable_gpu: true,
            extra_args: Vec::new(),
            browser_binary: None,
            webdriver_url: None,
            driver_binary: None,
            driver_port: default_driver_port(),
        }
    }
}

impl SessionConfig {
    /// Chromium command-line switches implied by this configuration.
    pub fn browser_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headless {
            args.push("--headless".to_string());
        }
        if self.no_sandbox {
            args.push("--no-sandbox".to_string());
        }
        if self.disable_dev_shm_usage {
            args.push("--disable-dev-shm-usage".to_string());
        }
        if self.disable_gpu {
            args.push("--disable-gpu".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

fn default_true() -> bool {
    true
}

fn default_driver_port() -> u16 {
    9515
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Folder under `My Games` holding one directory per account.
    #[serde(default = "default_game_folder")]
    pub game_folder: String,
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// Documents folders searched before the platform defaults.
    #[serde(default)]
    pub extra_roots: Vec<PathBuf>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            game_folder: default_game_folder(),
            file_name: default_file_name(),
            extra_roots: Vec::new(),
        }
    }
}

fn default_game_folder() -> String {
    "Rainbow Six - Siege".to_string()
}

fn default_file_name() -> String {
    "GameSettings.ini".to_string()
}
