mod bridge_store;
mod debounce;
mod forms;
#[cfg(test)]
pub(crate) mod testing;

pub use bridge_store::{
    BridgeStore, ConnectionInfo, DEFAULT_DEBOUNCE, DEFAULT_REFRESH_INTERVAL, RefreshMode,
    SendMode, StoreConfig,
};
pub use forms::{MISSING_LIGHTS, MISSING_NAME, RoomForm, Selection};
