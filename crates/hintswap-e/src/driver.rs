use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Common places chromedriver gets installed
const DRIVER_PATHS: &[&str] = &[
    "/usr/bin/chromedriver",
    "/usr/local/bin/chromedriver",
    "/usr/lib/chromium/chromedriver",
    "/usr/lib/chromium-browser/chromedriver",
    "/snap/bin/chromium.chromedriver",
    "/opt/homebrew/bin/chromedriver",
];

const READY_ATTEMPTS: u32 = 30;
const READY_INTERVAL: Duration = Duration::from_millis(200);

pub fn driver_url(port: u16) -> String {
    format!("http://localhost:{}", port)
}

/// Find chromedriver: the configured path, then `CHROMEDRIVER`, then `PATH`,
/// then the usual install locations.
pub fn find_driver_binary(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return path.exists().then(|| path.to_path_buf());
    }

    if let Some(path) = std::env::var_os("CHROMEDRIVER").map(PathBuf::from)
        && path.exists()
    {
        return Some(path);
    }

    let lookup = if cfg!(windows) { "where" } else { "which" };
    if let Ok(output) = Command::new(lookup).arg("chromedriver").output()
        && output.status.success()
        && let Ok(stdout) = String::from_utf8(output.stdout)
        && let Some(first) = stdout.lines().map(str::trim).find(|l| !l.is_empty())
    {
        return Some(PathBuf::from(first));
    }

    DRIVER_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// A chromedriver process we started. Killed on drop.
pub struct DriverProcess {
    child: Child,
    port: u16,
}

impl DriverProcess {
    pub fn webdriver_url(&self) -> String {
        driver_url(self.port)
    }
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        info!("Shutting down chromedriver (pid {})", self.child.id());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Spawn chromedriver on `port` and wait until `/status` reports ready.
pub async fn launch_driver(binary: &Path, port: u16) -> Result<DriverProcess, String> {
    info!("Launching chromedriver from: {}", binary.display());

    let child = Command::new(binary)
        .arg(format!("--port={}", port))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("Failed to launch chromedriver: {}", e))?;

    info!("chromedriver launched with PID: {}", child.id());
    // From here on, dropping `process` stops the driver on every error path.
    let process = DriverProcess { child, port };

    let url = format!("{}/status", driver_url(port));
    let client = reqwest::Client::new();

    for attempt in 1..=READY_ATTEMPTS {
        sleep(READY_INTERVAL).await;

        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("chromedriver ready after {} attempts", attempt);
                return Ok(process);
            }
            Ok(resp) => {
                warn!(
                    "chromedriver answered {} (attempt {})",
                    resp.status(),
                    attempt
                );
            }
            Err(_) => {
                if attempt % 5 == 0 {
                    info!("Waiting for chromedriver... (attempt {})", attempt);
                }
            }
        }
    }

    Err(format!(
        "chromedriver did not become ready on port {} within {:?}",
        port,
        READY_INTERVAL * READY_ATTEMPTS
    ))
}
