use async_trait::async_trait;
pub use hintswap_common::error::BackendError;
use hintswap_common::protocol::{ElementHandle, Key, Locator, NavigationResult};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Interval between lookups in the default [`Backend::find_element`].
pub const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The Backend trait is the unified interface every browser driver implements.
///
/// Element handles are only valid for the page they were located on.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Launch the backend (start browser, connect to WebDriver, etc.)
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Close the backend and cleanup resources. Safe to call when not launched.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Check if the backend is ready to accept commands.
    async fn is_ready(&self) -> bool;

    /// Navigate to a specific URL.
    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError>;

    /// URL of the page currently loaded.
    async fn current_url(&mut self) -> Result<String, BackendError>;

    /// Look up an element once, without waiting.
    async fn query_element(
        &mut self,
        locator: &Locator,
    ) -> Result<Option<ElementHandle>, BackendError>;

    /// Wait up to `timeout` for an element to be present.
    ///
    /// Returns `Ok(None)` when the element never appeared. Lookup errors other
    /// than an invalid selector are treated as "not there yet".
    async fn find_element(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, BackendError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.query_element(locator).await {
                Ok(Some(handle)) => return Ok(Some(handle)),
                Ok(None) => {}
                Err(e @ BackendError::SelectorInvalid { .. }) => return Err(e),
                Err(e) => debug!("Lookup of {} failed, retrying: {}", locator, e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(ELEMENT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// All elements currently matching `locator`, in document order.
    async fn find_all(&mut self, locator: &Locator) -> Result<Vec<ElementHandle>, BackendError>;

    /// Read a property of the element, falling back to the attribute of the
    /// same name. For `href` this yields the resolved absolute URL.
    async fn attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BackendError>;

    /// Clear the value of an input element.
    async fn clear(&mut self, element: ElementHandle) -> Result<(), BackendError>;

    /// Simulate a user click on the element.
    async fn click(&mut self, element: ElementHandle) -> Result<(), BackendError>;

    /// Type text into the element.
    async fn send_keys(&mut self, element: ElementHandle, text: &str) -> Result<(), BackendError>;

    /// Press a key while the element has focus.
    async fn press_key(&mut self, element: ElementHandle, key: Key) -> Result<(), BackendError>;

    /// Execute a script in the page.
    ///
    /// `script` is a function body; when `element` is given it is passed as
    /// `arguments[0]`. The body's return value is returned as JSON.
    async fn execute_script(
        &mut self,
        script: &str,
        element: Option<ElementHandle>,
    ) -> Result<serde_json::Value, BackendError>;
}
