//! WebDriver backend: drives Chrome through `chromedriver` (or any W3C
//! WebDriver server) using fantoccini.

pub mod backend;
pub mod driver;
pub mod webdriver;

pub use backend::WebDriverBackend;
