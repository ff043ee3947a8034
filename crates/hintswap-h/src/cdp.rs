use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use hintswap_engine::backend::BackendError;
use hintswap_engine::config::SessionConfig;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

pub const USER_DATA_DIR_ENV: &str = "HINTSWAP_USER_DATA_DIR";

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    user_data_dir: PathBuf,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    pub async fn launch(session: &SessionConfig) -> Result<Self, BackendError> {
        let mut config_builder = BrowserConfig::builder();
        if session.no_sandbox {
            config_builder = config_builder.no_sandbox();
        }
        let (user_data_dir, cleanup_user_data_dir) =
            resolve_user_data_dir().map_err(|e| BackendError::LaunchFailed(e.to_string()))?;
        config_builder = config_builder.user_data_dir(&user_data_dir);

        if session.headless {
            tracing::info!("Launching browser in headless mode");
        } else {
            tracing::info!("Launching browser in visible mode");
            config_builder = config_builder.with_head();
        }

        // CHROME_BIN wins over the configured binary
        let chrome_bin = std::env::var_os("CHROME_BIN")
            .map(PathBuf::from)
            .or_else(|| session.browser_binary.clone());
        if let Some(chrome_bin) = chrome_bin {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin.display());
            config_builder = config_builder.chrome_executable(chrome_bin);
        }

        config_builder = config_builder.args(launch_args(session));

        let config = config_builder.build().map_err(|e| {
            BackendError::LaunchFailed(format!("Failed to build browser config: {}", e))
        })?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BackendError::LaunchFailed(format!("Failed to launch browser: {}", e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::debug!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::debug!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BackendError::LaunchFailed(format!("Failed to create page: {}", e)))?;

        let mut console_events = page
            .event_listener::<EventConsoleApiCalled>()
            .await
            .map_err(|e| BackendError::LaunchFailed(format!("Failed to subscribe to console events: {}", e)))?;
        tokio::spawn(async move {
            while let Some(event) = console_events.next().await {
                let args: Vec<String> = event
                    .args
                    .iter()
                    .map(|arg| {
                        arg.description
                            .clone()
                            .or_else(|| arg.value.as_ref().map(|v| v.to_string()))
                            .unwrap_or_else(|| "unknown".to_string())
                    })
                    .collect();
                tracing::debug!("Page console [{:?}]: {}", event.r#type, args.join(" "));
            }
        });

        // A modal dialog would block every later command; accept it.
        let mut dialog_events = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| BackendError::LaunchFailed(format!("Failed to subscribe to dialog events: {}", e)))?;
        let dialog_page = page.clone();
        tokio::spawn(async move {
            while let Some(event) = dialog_events.next().await {
                tracing::info!("Accepting page dialog: {} ({:?})", event.message, event.r#type);
                if let Err(e) = dialog_page
                    .execute(HandleJavaScriptDialogParams::new(true))
                    .await
                {
                    tracing::warn!("Failed to accept dialog: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            page,
            user_data_dir,
            cleanup_user_data_dir,
        })
    }

    pub async fn close(mut self) -> Result<(), BackendError> {
        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BackendError::Other(format!("Error closing browser: {}", e)));
        if closed.is_ok() {
            let _ = self.browser.wait().await;
        }
        self.handler_task.abort();

        if self.cleanup_user_data_dir
            && let Err(e) = std::fs::remove_dir_all(&self.user_data_dir)
        {
            tracing::debug!(
                "Failed to clean up user-data-dir {}: {}",
                self.user_data_dir.display(),
                e
            );
        }

        closed
    }
}

/// Switches passed on top of chromiumoxide's defaults. Headless and sandbox
/// are set through the builder instead.
pub fn launch_args(session: &SessionConfig) -> Vec<String> {
    session
        .browser_args()
        .into_iter()
        .filter(|arg| arg != "--headless" && arg != "--no-sandbox")
        .collect()
}

fn resolve_user_data_dir() -> std::io::Result<(PathBuf, bool)> {
    if let Some(dir) = std::env::var_os(USER_DATA_DIR_ENV) {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path)?;
        tracing::info!(
            "Using user data dir from {}: {}",
            USER_DATA_DIR_ENV,
            path.display()
        );
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let unique = format!("hintswap-chromium-profile-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path)?;
    tracing::debug!("Using isolated user data dir: {}", path.display());
    Ok((path, true))
}
