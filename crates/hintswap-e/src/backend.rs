use crate::driver::{self, DriverProcess};
use crate::webdriver::{WebDriverClient, chrome_capabilities};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use hintswap_engine::backend::{Backend, BackendError};
use hintswap_engine::config::SessionConfig;
use hintswap_engine::protocol::{ElementHandle, Key, Locator, NavigationResult, SelectorKind};
use tracing::{debug, info};

pub struct WebDriverBackend {
    session: SessionConfig,
    client: Option<WebDriverClient>,
    driver: Option<DriverProcess>,
    /// Elements located on the current page, indexed by `ElementHandle`.
    elements: Vec<Element>,
}

impl WebDriverBackend {
    pub fn new(session: SessionConfig) -> Self {
        Self {
            session,
            client: None,
            driver: None,
            elements: Vec::new(),
        }
    }

    fn client(&self) -> Result<&fantoccini::Client, BackendError> {
        self.client
            .as_ref()
            .map(|c| &c.client)
            .ok_or(BackendError::NotReady)
    }

    fn element(&self, handle: ElementHandle) -> Result<&Element, BackendError> {
        self.elements
            .get(handle.0 as usize)
            .ok_or(BackendError::ElementNotFound(handle))
    }

    fn register(&mut self, element: Element) -> ElementHandle {
        self.elements.push(element);
        ElementHandle((self.elements.len() - 1) as u32)
    }

    async fn locate_all(&self, locator: &Locator) -> Result<Vec<Element>, BackendError> {
        let client = self.client()?;
        let target = match locator.kind {
            SelectorKind::Css => fantoccini::Locator::Css(locator.value.as_str()),
            SelectorKind::Xpath => fantoccini::Locator::XPath(locator.value.as_str()),
        };
        client
            .find_all(target)
            .await
            .map_err(|e| lookup_error(locator, e))
    }
}

fn lookup_error(locator: &Locator, e: CmdError) -> BackendError {
    let message = e.to_string();
    if message.contains("invalid selector") {
        BackendError::SelectorInvalid {
            selector: locator.to_string(),
        }
    } else {
        BackendError::Other(message)
    }
}

/// WebDriver reports detached elements as "stale element reference".
fn element_error(handle: ElementHandle, e: CmdError) -> BackendError {
    let message = e.to_string();
    if message.contains("stale element") {
        BackendError::ElementStale(handle)
    } else {
        BackendError::Other(message)
    }
}

#[async_trait]
impl Backend for WebDriverBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        let url = match &self.session.webdriver_url {
            Some(url) => {
                info!("Connecting to external WebDriver at {}...", url);
                url.clone()
            }
            None => {
                let binary = driver::find_driver_binary(self.session.driver_binary.as_deref())
                    .ok_or_else(|| {
                        BackendError::LaunchFailed(
                            "chromedriver not found. Install it or set CHROMEDRIVER".into(),
                        )
                    })?;
                let process = driver::launch_driver(&binary, self.session.driver_port)
                    .await
                    .map_err(BackendError::LaunchFailed)?;
                let url = process.webdriver_url();
                self.driver = Some(process);
                url
            }
        };

        let client = WebDriverClient::connect(&url, chrome_capabilities(&self.session)).await?;
        self.client = Some(client);
        self.elements.clear();
        info!("WebDriver session ready");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.elements.clear();
        let closed = match self.client.take() {
            Some(client) => client.close().await,
            None => Ok(()),
        };
        // Dropping the process stops chromedriver if we started it.
        self.driver = None;
        closed
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let client = self.client()?.clone();
        self.elements.clear();

        info!("Navigating to: {}", url);
        client
            .goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        let title = client.title().await.unwrap_or_default();
        let url = client
            .current_url()
            .await
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(NavigationResult {
            url,
            title,
            status: 200,
        })
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let url = self
            .client()?
            .current_url()
            .await
            .map_err(|e| BackendError::Other(format!("current_url failed: {}", e)))?;
        Ok(url.to_string())
    }

    async fn query_element(
        &mut self,
        locator: &Locator,
    ) -> Result<Option<ElementHandle>, BackendError> {
        let found = self.locate_all(locator).await?.into_iter().next();
        Ok(found.map(|element| self.register(element)))
    }

    async fn find_all(&mut self, locator: &Locator) -> Result<Vec<ElementHandle>, BackendError> {
        let found = self.locate_all(locator).await?;
        debug!("{} matched {} element(s)", locator, found.len());
        Ok(found.into_iter().map(|e| self.register(e)).collect())
    }

    async fn attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        let el = self.element(element)?;
        // The property is the resolved value (absolute href); fall back to the raw attribute.
        if let Some(value) = el.prop(name).await.map_err(|e| element_error(element, e))? {
            return Ok(Some(value));
        }
        el.attr(name).await.map_err(|e| element_error(element, e))
    }

    async fn clear(&mut self, element: ElementHandle) -> Result<(), BackendError> {
        self.element(element)?
            .clear()
            .await
            .map_err(|e| element_error(element, e))
    }

    async fn click(&mut self, element: ElementHandle) -> Result<(), BackendError> {
        self.element(element)?
            .click()
            .await
            .map_err(|e| element_error(element, e))
    }

    async fn send_keys(&mut self, element: ElementHandle, text: &str) -> Result<(), BackendError> {
        self.element(element)?
            .send_keys(text)
            .await
            .map_err(|e| element_error(element, e))
    }

    async fn press_key(&mut self, element: ElementHandle, key: Key) -> Result<(), BackendError> {
        let code = key.webdriver_code().to_string();
        self.element(element)?
            .send_keys(&code)
            .await
            .map_err(|e| element_error(element, e))
    }

    async fn execute_script(
        &mut self,
        script: &str,
        element: Option<ElementHandle>,
    ) -> Result<serde_json::Value, BackendError> {
        let args = match element {
            Some(handle) => vec![serde_json::to_value(self.element(handle)?)?],
            None => Vec::new(),
        };
        self.client()?
            .execute(script, args)
            .await
            .map_err(|e| BackendError::ScriptError(e.to_string()))
    }
}
