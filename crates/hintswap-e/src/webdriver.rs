use fantoccini::{Client, ClientBuilder};
use hintswap_engine::backend::BackendError;
use hintswap_engine::config::SessionConfig;
use serde_json::{Map, Value, json};

pub struct WebDriverClient {
    pub client: Client,
}

impl WebDriverClient {
    pub async fn connect(url: &str, capabilities: Map<String, Value>) -> Result<Self, BackendError> {
        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(url)
            .await
            .map_err(|e| {
                BackendError::LaunchFailed(format!("Failed to connect to WebDriver at {}: {}", url, e))
            })?;

        Ok(Self { client })
    }

    pub async fn close(self) -> Result<(), BackendError> {
        self.client
            .close()
            .await
            .map_err(|e| BackendError::Other(format!("Failed to close session: {}", e)))
    }
}

/// W3C capabilities asking for Chrome with the session's switches.
pub fn chrome_capabilities(session: &SessionConfig) -> Map<String, Value> {
    let mut options = Map::new();
    options.insert("args".into(), json!(session.browser_args()));
    if let Some(binary) = &session.browser_binary {
        options.insert("binary".into(), json!(binary.display().to_string()));
    }

    let mut caps = Map::new();
    caps.insert("browserName".into(), json!("chrome"));
    caps.insert("goog:chromeOptions".into(), Value::Object(options));
    caps
}
