use futures::future::join_all;
use iris_client_rs::{Hsb, IrisClientError, Light, LightUpdate, RefreshMode, SendMode};

use crate::Params;
use crate::utils::{connected_store, on_off, parse_color};

fn describe(light: &Light) -> String {
    let mut line = format!(
        "Light '{}' ({}) status: {}, brightness {}",
        light.name,
        light.id,
        on_off(light.on),
        light.brightness
    );
    if light.has_color {
        line.push_str(&format!(", color {}", Hsb::of_light(light).to_hex()));
    }
    if !light.reachable {
        line.push_str(", unreachable");
    }
    line
}

pub async fn list_lights(params: Params) -> Result<(), IrisClientError> {
    let store = connected_store(&params).await?;
    for light in store.lights() {
        println!("{}", describe(&light));
    }
    Ok(())
}

pub async fn toggle_lights(params: Params, ids: &[String]) -> Result<(), IrisClientError> {
    let store = connected_store(&params).await?;
    let mut handles = Vec::with_capacity(ids.len());
    for id in ids {
        match store.toggle_light(id) {
            Some(handle) => handles.push(handle),
            None => println!("Unknown light {id}"),
        }
    }
    for result in join_all(handles).await {
        result.map_err(|e| IrisClientError::Generic(e.to_string()))?;
    }

    for id in ids {
        if let Some(light) = store.light(id) {
            println!("Light '{}' ({}) is now {}", light.name, id, on_off(light.on));
        }
    }
    Ok(())
}

pub async fn set_light(
    params: Params,
    id: &str,
    brightness: Option<u8>,
    color: Option<&str>,
) -> Result<(), IrisClientError> {
    let color = color.map(parse_color).transpose()?;
    let update = LightUpdate {
        brightness,
        hue: color.map(|c| c.hue),
        sat: color.map(|c| c.sat),
        ..Default::default()
    };
    if update.is_empty() {
        return Err(IrisClientError::Validation(
            "Nothing to change, pass --brightness or --color".to_string(),
        ));
    }

    let store = connected_store(&params).await?;
    let Some(handle) = store.update_light(id, update, SendMode::Immediate) else {
        return Err(IrisClientError::Validation(format!("Unknown light {id}")));
    };
    handle
        .await
        .map_err(|e| IrisClientError::Generic(e.to_string()))?;

    store.refresh(RefreshMode::Silent).await?;
    if let Some(light) = store.light(id) {
        println!("{}", describe(&light));
    }
    Ok(())
}
