use crate::protocol::client::IrisClientError;
use crate::protocol::models::{CreateGroupRequest, Group, NEW_ROOM_CLASS, RoomSettings};

pub const MISSING_NAME: &str = "Enter a room name";
pub const MISSING_LIGHTS: &str = "Select at least one light";

/// The entity a detail view currently acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Light(String),
    Group(String),
}

/// Editable state of the create-room and room-settings forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomForm {
    pub name: String,
    pub room_class: String,
    pub lights: Vec<String>,
}

impl Default for RoomForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            room_class: NEW_ROOM_CLASS.to_string(),
            lights: Vec::new(),
        }
    }
}

impl RoomForm {
    pub fn for_group(group: &Group) -> Self {
        Self {
            name: group.name.clone(),
            room_class: group.room_class.clone(),
            lights: group.lights.clone(),
        }
    }

    pub fn contains(&self, light_id: &str) -> bool {
        self.lights.iter().any(|id| id == light_id)
    }

    /// Adds the light to the room, or removes it when already a member.
    pub fn toggle_light(&mut self, light_id: &str) {
        if let Some(at) = self.lights.iter().position(|id| id == light_id) {
            self.lights.remove(at);
        } else {
            self.lights.push(light_id.to_string());
        }
    }

    /// Moves to the next (or previous) entry of `classes`, wrapping around.
    pub fn cycle_room_class(&mut self, classes: &[String], forward: bool) {
        if classes.is_empty() {
            return;
        }
        let next = match classes.iter().position(|c| *c == self.room_class) {
            Some(at) if forward => (at + 1) % classes.len(),
            Some(at) => (at + classes.len() - 1) % classes.len(),
            None => 0,
        };
        self.room_class = classes[next].clone();
    }

    pub fn create_request(&self) -> CreateGroupRequest {
        CreateGroupRequest {
            name: self.name.trim().to_string(),
            lights: self.lights.clone(),
            room_class: self.room_class.clone(),
        }
    }

    /// Settings payload. The name is sent only when it changed.
    pub fn settings(&self, group: &Group) -> RoomSettings {
        let name = self.name.trim();
        RoomSettings {
            name: (name != group.name).then(|| name.to_string()),
            lights: self.lights.clone(),
            room_class: self.room_class.clone(),
        }
    }
}

pub(crate) fn validate_create(request: &CreateGroupRequest) -> Result<(), IrisClientError> {
    if request.name.trim().is_empty() {
        return Err(IrisClientError::Validation(MISSING_NAME.to_string()));
    }
    if request.lights.is_empty() {
        return Err(IrisClientError::Validation(MISSING_LIGHTS.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_settings(settings: &RoomSettings) -> Result<(), IrisClientError> {
    if settings
        .name
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        return Err(IrisClientError::Validation(MISSING_NAME.to_string()));
    }
    if settings.lights.is_empty() {
        return Err(IrisClientError::Validation(MISSING_LIGHTS.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<String> {
        ["Living room", "Kitchen", "Other"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn test_toggle_light_membership_keeps_order() {
        let mut form = RoomForm::default();
        form.toggle_light("3");
        form.toggle_light("1");
        form.toggle_light("2");
        form.toggle_light("1");
        assert_eq!(form.lights, vec!["3".to_string(), "2".to_string()]);
        assert!(form.contains("2"));
        assert!(!form.contains("1"));
    }

    #[test]
    fn test_room_class_cycles_both_ways() {
        let mut form = RoomForm::default();
        form.cycle_room_class(&classes(), true);
        assert_eq!(form.room_class, "Kitchen");
        form.cycle_room_class(&classes(), false);
        form.cycle_room_class(&classes(), false);
        assert_eq!(form.room_class, "Other");

        form.room_class = "Garage".to_string();
        form.cycle_room_class(&classes(), true);
        assert_eq!(form.room_class, "Living room");
    }

    #[test]
    fn test_create_validation() {
        let mut form = RoomForm {
            name: "   ".to_string(),
            ..Default::default()
        };
        let err = validate_create(&form.create_request()).unwrap_err();
        assert_eq!(err.detail(), MISSING_NAME);

        form.name = " Office ".to_string();
        let err = validate_create(&form.create_request()).unwrap_err();
        assert_eq!(err.detail(), MISSING_LIGHTS);

        form.toggle_light("5");
        let request = form.create_request();
        assert!(validate_create(&request).is_ok());
        assert_eq!(request.name, "Office");
        assert_eq!(request.room_class, NEW_ROOM_CLASS);
    }

    #[test]
    fn test_settings_only_send_changed_name() {
        let group: Group = serde_json::from_value(serde_json::json!({
            "id": "4", "name": "Office", "class": "Office", "lights": ["1", "2"]
        }))
        .unwrap();

        let mut form = RoomForm::for_group(&group);
        assert_eq!(form.settings(&group).name, None);

        form.name = "Study".to_string();
        assert_eq!(form.settings(&group).name.as_deref(), Some("Study"));

        form.toggle_light("1");
        form.toggle_light("2");
        let err = validate_settings(&form.settings(&group)).unwrap_err();
        assert_eq!(err.detail(), MISSING_LIGHTS);
    }
}
