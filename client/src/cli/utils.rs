use iris_client_rs::settings::Settings;
use iris_client_rs::{
    BridgeStore, HttpBridgeClient, HueSat, IrisClientError, RefreshMode, hex_to_hsb, is_hex_color,
};

use crate::Params;

/// Settings file contents, with `--api-url` taking precedence.
pub fn load_settings(params: &Params) -> Settings {
    let mut settings = Settings::load(params.settings.as_deref());
    if let Some(api_url) = &params.api_url {
        settings.api_url = api_url.clone();
    }
    settings
}

pub fn create_store(params: &Params) -> Result<BridgeStore<HttpBridgeClient>, IrisClientError> {
    let settings = load_settings(params);
    let client = HttpBridgeClient::new(settings.bridge_options()?)?;
    Ok(BridgeStore::new(client, settings.store_config()))
}

/// Store over a connected bridge, loaded with the current lights and rooms.
pub async fn connected_store(
    params: &Params,
) -> Result<BridgeStore<HttpBridgeClient>, IrisClientError> {
    let store = create_store(params)?;
    if !store.check_status().await {
        return Err(IrisClientError::InvalidState);
    }
    store.refresh(RefreshMode::Silent).await?;
    Ok(store)
}

pub fn parse_color(hex: &str) -> Result<HueSat, IrisClientError> {
    if !is_hex_color(hex) {
        return Err(IrisClientError::Validation(format!(
            "Invalid color '{hex}', expected #rrggbb"
        )));
    }
    Ok(hex_to_hsb(hex))
}

pub fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}
