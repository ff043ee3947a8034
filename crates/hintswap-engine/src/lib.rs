pub mod backend;
pub mod config;
pub mod resolution;
pub mod settings;
pub mod swap;

pub use hintswap_common::grammar;
pub use hintswap_common::protocol;
