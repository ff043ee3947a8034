//! Headless Chromium backend over the DevTools protocol (chromiumoxide).

pub mod backend;
pub mod cdp;

pub use backend::HeadlessBackend;
