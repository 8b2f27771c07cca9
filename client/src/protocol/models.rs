use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Room class used when the service does not report one.
pub const DEFAULT_ROOM_CLASS: &str = "Other";
/// Room class preselected when creating a new room.
pub const NEW_ROOM_CLASS: &str = "Living room";

pub type LightMap = BTreeMap<String, Light>;
pub type GroupMap = BTreeMap<String, Group>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub on: bool,
    #[serde(default = "default_brightness")]
    pub brightness: u8,
    #[serde(default)]
    pub reachable: bool,
    #[serde(default)]
    pub has_color: bool,
    #[serde(default)]
    pub hue: Option<u16>,
    #[serde(default)]
    pub sat: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default = "default_group_type")]
    pub group_type: String,
    #[serde(rename = "class", default = "default_room_class")]
    pub room_class: String,
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub lights: Vec<String>,
    #[serde(default)]
    pub on: bool,
    #[serde(default = "default_brightness")]
    pub brightness: u8,
    #[serde(default)]
    pub has_color: bool,
    #[serde(default)]
    pub hue: Option<u16>,
    #[serde(default)]
    pub sat: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStatus {
    pub connected: bool,
    #[serde(default)]
    pub bridge_ip: Option<String>,
    #[serde(default)]
    pub saved_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub ip: String,
}

/// Partial light state sent with `PUT /api/lights/{id}`. Absent fields are
/// left untouched by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sat: Option<u8>,
}

impl LightUpdate {
    pub fn power(on: bool) -> Self {
        Self {
            on: Some(on),
            ..Default::default()
        }
    }

    pub fn brightness(brightness: u8) -> Self {
        Self {
            brightness: Some(brightness),
            ..Default::default()
        }
    }

    pub fn color(hue: u16, sat: u8) -> Self {
        Self {
            hue: Some(hue),
            sat: Some(sat),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.on.is_none() && self.brightness.is_none() && self.hue.is_none() && self.sat.is_none()
    }
}

/// Partial group state sent with `PUT /api/groups/{id}`. Carries both the
/// live state (power, brightness, color) and the room settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sat: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lights: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_class: Option<String>,
}

impl GroupUpdate {
    /// Both hue and sat are needed for the service to change a color.
    pub fn color(&self) -> Option<(u16, u8)> {
        self.hue.zip(self.sat)
    }
}

impl From<LightUpdate> for GroupUpdate {
    fn from(update: LightUpdate) -> Self {
        Self {
            on: update.on,
            brightness: update.brightness,
            hue: update.hue,
            sat: update.sat,
            ..Default::default()
        }
    }
}

/// Room membership and type, as edited in the room settings form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSettings {
    pub name: Option<String>,
    pub lights: Vec<String>,
    pub room_class: String,
}

impl From<RoomSettings> for GroupUpdate {
    fn from(settings: RoomSettings) -> Self {
        Self {
            name: settings.name,
            lights: Some(settings.lights),
            room_class: Some(settings.room_class),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub lights: Vec<String>,
    pub room_class: String,
}

impl Light {
    pub fn apply(&mut self, update: &LightUpdate) {
        if let Some(on) = update.on {
            self.on = on;
        }
        if let Some(brightness) = update.brightness {
            self.brightness = brightness;
        }
        if let Some(hue) = update.hue {
            self.hue = Some(hue);
        }
        if let Some(sat) = update.sat {
            self.sat = Some(sat);
        }
    }
}

impl Group {
    pub fn apply(&mut self, update: &GroupUpdate) {
        if let Some(on) = update.on {
            self.on = on;
        }
        if let Some(brightness) = update.brightness {
            self.brightness = brightness;
        }
        if let Some(hue) = update.hue {
            self.hue = Some(hue);
        }
        if let Some(sat) = update.sat {
            self.sat = Some(sat);
        }
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(lights) = &update.lights {
            self.lights = lights.clone();
        }
        if let Some(room_class) = &update.room_class {
            self.room_class = room_class.clone();
        }
    }
}

/// Orders ids the way the service lists them: numeric ids by value, anything
/// else after them, lexicographically.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn default_brightness() -> u8 {
    254
}

fn default_group_type() -> String {
    "LightGroup".to_string()
}

fn default_room_class() -> String {
    DEFAULT_ROOM_CLASS.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

// Light ids come back as numbers from some bridge firmwares, group member
// lists as strings. Both are normalized to strings.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn deserialize_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<RawId>::deserialize(deserializer).map(|ids| ids.into_iter().map(String::from).collect())
}
