use futures::future::join_all;
use iris_client_rs::{
    Group, GroupUpdate, Hsb, IrisClientError, NEW_ROOM_CLASS, RefreshMode, RoomForm, SendMode,
};

use crate::Params;
use crate::utils::{connected_store, on_off, parse_color};

fn describe(group: &Group) -> String {
    let mut line = format!(
        "Room '{}' ({}, {}) status: {}, brightness {}, lights [{}]",
        group.name,
        group.id,
        group.room_class,
        on_off(group.on),
        group.brightness,
        group.lights.join(", ")
    );
    if group.has_color {
        line.push_str(&format!(", color {}", Hsb::of_group(group).to_hex()));
    }
    line
}

pub async fn list_rooms(params: Params) -> Result<(), IrisClientError> {
    let store = connected_store(&params).await?;
    for group in store.groups() {
        println!("{}", describe(&group));
    }
    Ok(())
}

pub async fn list_room_classes(params: Params) -> Result<(), IrisClientError> {
    let store = connected_store(&params).await?;
    for class in store.room_classes() {
        println!("{class}");
    }
    Ok(())
}

pub async fn toggle_rooms(params: Params, ids: &[String]) -> Result<(), IrisClientError> {
    let store = connected_store(&params).await?;
    let mut handles = Vec::with_capacity(ids.len());
    for id in ids {
        match store.toggle_group(id) {
            Some(handle) => handles.push(handle),
            None => println!("Unknown room {id}"),
        }
    }
    for result in join_all(handles).await {
        result.map_err(|e| IrisClientError::Generic(e.to_string()))?;
    }

    for id in ids {
        if let Some(group) = store.group(id) {
            println!("Room '{}' ({}) is now {}", group.name, id, on_off(group.on));
        }
    }
    Ok(())
}

pub async fn set_room(
    params: Params,
    id: &str,
    brightness: Option<u8>,
    color: Option<&str>,
) -> Result<(), IrisClientError> {
    let color = color.map(parse_color).transpose()?;
    if brightness.is_none() && color.is_none() {
        return Err(IrisClientError::Validation(
            "Nothing to change, pass --brightness or --color".to_string(),
        ));
    }
    let update = GroupUpdate {
        brightness,
        hue: color.map(|c| c.hue),
        sat: color.map(|c| c.sat),
        ..Default::default()
    };

    let store = connected_store(&params).await?;
    let Some(handle) = store.update_group(id, update, SendMode::Immediate) else {
        return Err(IrisClientError::Validation(format!("Unknown room {id}")));
    };
    handle
        .await
        .map_err(|e| IrisClientError::Generic(e.to_string()))?;

    store.refresh(RefreshMode::Silent).await?;
    if let Some(group) = store.group(id) {
        println!("{}", describe(&group));
    }
    Ok(())
}

pub async fn create_room(
    params: Params,
    name: &str,
    lights: &[String],
    room_class: Option<&str>,
) -> Result<(), IrisClientError> {
    let store = connected_store(&params).await?;
    let form = RoomForm {
        name: name.to_string(),
        room_class: room_class.unwrap_or(NEW_ROOM_CLASS).to_string(),
        lights: lights.to_vec(),
    };
    store.create_group(form.create_request()).await?;
    println!("Room '{}' created", form.name.trim());
    Ok(())
}

pub async fn edit_room(
    params: Params,
    id: &str,
    name: Option<&str>,
    lights: Option<&[String]>,
    room_class: Option<&str>,
) -> Result<(), IrisClientError> {
    let store = connected_store(&params).await?;
    let Some(group) = store.group(id) else {
        return Err(IrisClientError::Validation(format!("Unknown room {id}")));
    };

    let mut form = RoomForm::for_group(&group);
    if let Some(name) = name {
        form.name = name.to_string();
    }
    if let Some(lights) = lights {
        form.lights = lights.to_vec();
    }
    if let Some(room_class) = room_class {
        form.room_class = room_class.to_string();
    }

    store
        .update_group_settings(id, form.settings(&group))
        .await?;
    if let Some(group) = store.group(id) {
        println!("{}", describe(&group));
    }
    Ok(())
}

pub async fn delete_room(params: Params, id: &str) -> Result<(), IrisClientError> {
    let store = connected_store(&params).await?;
    let name = store.group(id).map(|g| g.name).unwrap_or_else(|| id.to_string());
    store.delete_group(id).await?;
    println!("Room '{name}' deleted");
    Ok(())
}
