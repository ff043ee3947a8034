pub mod discovery;
pub mod region;
pub mod updater;

pub use discovery::{DocumentsLocator, SettingsLocator};
pub use region::{RegionEntry, RegionTable};
pub use updater::{
    DATA_CENTER_HINT_KEY, SettingsError, read_hint, read_server_setting, rewrite_hint,
    try_update_server_setting, update_server_setting,
};
