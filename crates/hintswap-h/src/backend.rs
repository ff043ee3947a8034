use crate::cdp::CdpClient;
use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use hintswap_engine::backend::{Backend, BackendError};
use hintswap_engine::config::SessionConfig;
use hintswap_engine::protocol::{ElementHandle, Key, Locator, NavigationResult, SelectorKind};
use serde_json::Value;
use tracing::{debug, info};

/// Attribute used to hand XPath matches over to a CSS query.
const XPATH_MARK: &str = "data-hintswap-ref";

pub struct HeadlessBackend {
    session: SessionConfig,
    client: Option<CdpClient>,
    /// Elements located on the current page, indexed by `ElementHandle`.
    elements: Vec<Element>,
    xpath_queries: u32,
}

impl HeadlessBackend {
    pub fn new(session: SessionConfig) -> Self {
        Self {
            session,
            client: None,
            elements: Vec::new(),
            xpath_queries: 0,
        }
    }

    fn page(&self) -> Result<&Page, BackendError> {
        self.client
            .as_ref()
            .map(|c| &c.page)
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

    async fn locate_all(&mut self, locator: &Locator) -> Result<Vec<Element>, BackendError> {
        let selector = match locator.kind {
            SelectorKind::Css => locator.value.clone(),
            SelectorKind::Xpath => {
                self.xpath_queries += 1;
                let tag = self.xpath_queries.to_string();
                let script = mark_xpath_matches(&locator.value, &tag)?;
                self.page()?
                    .evaluate_expression(script)
                    .await
                    .map_err(|e| lookup_error(locator, e))?;
                format!("[{}=\"{}\"]", XPATH_MARK, tag)
            }
        };
        self.page()?
            .find_elements(selector)
            .await
            .map_err(|e| lookup_error(locator, e))
    }

    async fn call_on(
        &self,
        handle: ElementHandle,
        function: String,
    ) -> Result<Option<Value>, BackendError> {
        let returns = self
            .element(handle)?
            .call_js_fn(function, true)
            .await
            .map_err(|e| element_error(handle, e))?;
        Ok(returns.result.value)
    }
}

/// Expression that tags every element matched by `xpath` with `tag`.
fn mark_xpath_matches(xpath: &str, tag: &str) -> Result<String, BackendError> {
    Ok(format!(
        r#"(() => {{
            const found = document.evaluate({xpath}, document, null,
                XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
            for (let i = 0; i < found.snapshotLength; i++) {{
                const node = found.snapshotItem(i);
                if (node.nodeType === Node.ELEMENT_NODE) node.setAttribute({mark}, {tag});
            }}
            return found.snapshotLength;
        }})()"#,
        xpath = serde_json::to_string(xpath)?,
        mark = serde_json::to_string(XPATH_MARK)?,
        tag = serde_json::to_string(tag)?,
    ))
}

/// Wrap a script body that reads its element from `arguments[0]` into a
/// function the element is called with.
fn element_function(script: &str) -> String {
    format!(
        "function() {{ return (function() {{ {} }}).call(this, this); }}",
        script
    )
}

fn lookup_error(locator: &Locator, e: CdpError) -> BackendError {
    let message = e.to_string();
    if message.contains("XPath") || message.contains("not a valid selector") {
        BackendError::SelectorInvalid {
            selector: locator.to_string(),
        }
    } else {
        BackendError::Other(message)
    }
}

/// CDP reports detached nodes as unknown object or node ids.
fn element_error(handle: ElementHandle, e: CdpError) -> BackendError {
    let message = e.to_string();
    if message.contains("Could not find") || message.contains("No node") {
        BackendError::ElementStale(handle)
    } else {
        BackendError::Other(message)
    }
}

#[async_trait]
impl Backend for HeadlessBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!("Launching headless backend (Chromium)...");
        let client = CdpClient::launch(&self.session).await?;
        self.client = Some(client);
        self.elements.clear();
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.elements.clear();
        match self.client.take() {
            Some(client) => client.close().await,
            None => Ok(()),
        }
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        let page = self.page()?.clone();
        self.elements.clear();

        info!("Navigating to: {}", url);
        page.goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;

        let title = page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult {
            url,
            title,
            status: 200,
        })
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let url = self
            .page()?
            .url()
            .await
            .map_err(|e| BackendError::Other(format!("current_url failed: {}", e)))?;
        Ok(url.unwrap_or_default())
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
        // The property is the resolved value (absolute href); fall back to the raw attribute.
        let read_property = format!(
            "function() {{ const v = this[{}]; return v == null ? null : String(v); }}",
            serde_json::to_string(name)?
        );
        if let Some(Value::String(value)) = self.call_on(element, read_property).await? {
            return Ok(Some(value));
        }
        self.element(element)?
            .attribute(name)
            .await
            .map_err(|e| element_error(element, e))
    }

    async fn clear(&mut self, element: ElementHandle) -> Result<(), BackendError> {
        let clear = "function() { \
            this.value = ''; \
            this.dispatchEvent(new Event('input', { bubbles: true })); \
        }";
        self.call_on(element, clear.to_string()).await.map(|_| ())
    }

    async fn click(&mut self, element: ElementHandle) -> Result<(), BackendError> {
        self.element(element)?
            .click()
            .await
            .map(|_| ())
            .map_err(|e| element_error(element, e))
    }

    async fn send_keys(&mut self, element: ElementHandle, text: &str) -> Result<(), BackendError> {
        self.element(element)?
            .type_str(text)
            .await
            .map(|_| ())
            .map_err(|e| element_error(element, e))
    }

    async fn press_key(&mut self, element: ElementHandle, key: Key) -> Result<(), BackendError> {
        self.element(element)?
            .press_key(key.name())
            .await
            .map(|_| ())
            .map_err(|e| element_error(element, e))
    }

    async fn execute_script(
        &mut self,
        script: &str,
        element: Option<ElementHandle>,
    ) -> Result<Value, BackendError> {
        match element {
            Some(handle) => Ok(self
                .call_on(handle, element_function(script))
                .await?
                .unwrap_or(Value::Null)),
            None => {
                let result = self
                    .page()?
                    .evaluate_expression(format!("(function() {{ {} }})()", script))
                    .await
                    .map_err(|e| BackendError::ScriptError(e.to_string()))?;
                Ok(result.value().cloned().unwrap_or(Value::Null))
            }
        }
    }
}
