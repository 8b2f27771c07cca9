pub mod logging;
mod protocol;
pub mod settings;
mod store;

pub use protocol::client::*;
pub use protocol::color::{Hsb, HueSat, hex_to_hsb, hsb_to_hex, hsb_to_rgb, is_hex_color};
pub use protocol::models::*;
pub use store::{
    BridgeStore, ConnectionInfo, DEFAULT_DEBOUNCE, DEFAULT_REFRESH_INTERVAL, MISSING_LIGHTS,
    MISSING_NAME, RefreshMode, RoomForm, Selection, SendMode, StoreConfig,
};
