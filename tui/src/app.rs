use std::time::Instant;

use iris_client_rs::{
    BridgeClientTrait, BridgeStore, Group, IrisClientError, Light, LightUpdate, RefreshMode,
    RoomForm, Selection, SendMode, hex_to_hsb,
};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::idle::IdleTracker;

pub const BRIGHTNESS_STEP: u8 = 16;
pub const MIN_BRIGHTNESS: u8 = 1;
pub const MAX_BRIGHTNESS: u8 = 254;

/// Colors offered by the color keys, in cycling order.
pub const PALETTE: [&str; 8] = [
    "#ffffff", "#ffb46b", "#ffe066", "#ff4d4d", "#ff4dd2", "#9b59ff", "#4d8cff", "#4dffb8",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Lights,
    Rooms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    RoomClass,
    Lights,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Name => FormField::RoomClass,
            FormField::RoomClass => FormField::Lights,
            FormField::Lights => FormField::Name,
        }
    }

    fn previous(self) -> Self {
        match self {
            FormField::Name => FormField::Lights,
            FormField::RoomClass => FormField::Name,
            FormField::Lights => FormField::RoomClass,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectDialog {
    pub ip: String,
    pub error: Option<String>,
}

/// Create-room form when `group_id` is `None`, room settings otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEditor {
    pub group_id: Option<String>,
    pub form: RoomForm,
    pub field: FormField,
    /// Highlighted row of the light checklist.
    pub cursor: usize,
    pub error: Option<String>,
}

impl RoomEditor {
    fn new(group: Option<&Group>) -> Self {
        Self {
            group_id: group.map(|g| g.id.clone()),
            form: group.map(RoomForm::for_group).unwrap_or_default(),
            field: FormField::Name,
            cursor: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Connect(ConnectDialog),
    Room(RoomEditor),
    ConfirmDelete(String),
}

pub struct App<C: BridgeClientTrait> {
    pub store: BridgeStore<C>,
    pub focus: Focus,
    pub lights_state: ListState,
    pub rooms_state: ListState,
    pub selection: Selection,
    pub mode: Mode,
    pub idle: IdleTracker,
    /// Outcome of the last room action that failed outside a form.
    pub notice: Option<String>,
    pub should_exit: bool,
    palette_index: usize,
    poller: Option<JoinHandle<()>>,
}

impl<C: BridgeClientTrait> App<C> {
    pub fn new(store: BridgeStore<C>, idle: IdleTracker) -> Self {
        Self {
            store,
            focus: Focus::Lights,
            lights_state: ListState::default(),
            rooms_state: ListState::default(),
            selection: Selection::None,
            mode: Mode::Browse,
            idle,
            notice: None,
            should_exit: false,
            palette_index: 0,
            poller: None,
        }
    }

    /// Checks the bridge connection once. When connected the data is loaded
    /// and background refresh starts; otherwise the connect dialog opens.
    pub async fn start(&mut self) {
        if self.store.check_status().await {
            self.spawn_refresh();
            self.start_poller();
        } else {
            self.open_connect_dialog();
        }
    }

    fn start_poller(&mut self) {
        if self.poller.is_none() {
            self.poller = Some(self.store.spawn_poller());
        }
    }

    fn spawn_refresh(&self) {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.refresh(RefreshMode::Visible).await {
                debug!("Manual refresh failed: {e}");
            }
        });
    }

    fn open_connect_dialog(&mut self) {
        let connection = self.store.connection();
        let ip = connection
            .bridge_ip
            .or(connection.saved_ip)
            .unwrap_or_default();
        self.mode = Mode::Connect(ConnectDialog { ip, error: None });
    }

    pub async fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.idle.touch(now) {
            debug!("Woken up by key press");
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_exit = true;
            return;
        }

        match self.mode {
            Mode::Browse => self.handle_browse_key(key),
            Mode::Connect(_) => self.handle_connect_key(key).await,
            Mode::Room(_) => self.handle_room_key(key).await,
            Mode::ConfirmDelete(_) => self.handle_delete_key(key).await,
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_exit = true,
            KeyCode::Tab => self.switch_focus(),
            KeyCode::Char('j') | KeyCode::Down => {
                self.list_state().select_next();
                self.sync_selection();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.list_state().select_previous();
                self.sync_selection();
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.list_state().select_first();
                self.sync_selection();
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.list_state().select_last();
                self.sync_selection();
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.store.toggle_selection(&self.selection);
            }
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => self.step_brightness(true),
            KeyCode::Char('-') | KeyCode::Left => self.step_brightness(false),
            KeyCode::Char('c') => self.cycle_color(true),
            KeyCode::Char('C') => self.cycle_color(false),
            KeyCode::Char('r') => self.spawn_refresh(),
            KeyCode::Char('b') => self.open_connect_dialog(),
            KeyCode::Char('n') if self.store.connection().connected => {
                self.mode = Mode::Room(RoomEditor::new(None));
            }
            KeyCode::Char('e') => {
                if let Selection::Group(id) = &self.selection
                    && let Some(group) = self.store.group(id)
                {
                    self.mode = Mode::Room(RoomEditor::new(Some(&group)));
                }
            }
            KeyCode::Char('d') => {
                if let Selection::Group(id) = &self.selection {
                    self.mode = Mode::ConfirmDelete(id.clone());
                }
            }
            _ => {}
        }
    }

    fn list_state(&mut self) -> &mut ListState {
        match self.focus {
            Focus::Lights => &mut self.lights_state,
            Focus::Rooms => &mut self.rooms_state,
        }
    }

    fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Lights => Focus::Rooms,
            Focus::Rooms => Focus::Lights,
        };
        self.sync_selection();
    }

    /// Points the selection at the highlighted row of the focused list.
    /// Indices past the end clamp to the last row.
    fn sync_selection(&mut self) {
        let ids: Vec<String> = match self.focus {
            Focus::Lights => self.store.lights().into_iter().map(|l| l.id).collect(),
            Focus::Rooms => self.store.groups().into_iter().map(|g| g.id).collect(),
        };
        let focus = self.focus;
        let state = self.list_state();
        let Some(index) = state.selected() else {
            self.selection = Selection::None;
            return;
        };
        let Some(last) = ids.len().checked_sub(1) else {
            state.select(None);
            self.selection = Selection::None;
            return;
        };
        let index = index.min(last);
        state.select(Some(index));

        let id = ids[index].clone();
        self.selection = match focus {
            Focus::Lights => Selection::Light(id),
            Focus::Rooms => Selection::Group(id),
        };
    }

    pub fn selected_light(&self) -> Option<Light> {
        match &self.selection {
            Selection::Light(id) => self.store.light(id),
            _ => None,
        }
    }

    pub fn selected_group(&self) -> Option<Group> {
        match &self.selection {
            Selection::Group(id) => self.store.group(id),
            _ => None,
        }
    }

    /// Brightness and color capability of the selected entity.
    fn selected_traits(&self) -> Option<(u8, bool)> {
        match &self.selection {
            Selection::None => None,
            Selection::Light(_) => self.selected_light().map(|l| (l.brightness, l.has_color)),
            Selection::Group(_) => self.selected_group().map(|g| (g.brightness, g.has_color)),
        }
    }

    fn step_brightness(&mut self, up: bool) {
        let Some((current, _)) = self.selected_traits() else {
            return;
        };
        let next = if up {
            current.saturating_add(BRIGHTNESS_STEP).min(MAX_BRIGHTNESS)
        } else {
            current
                .saturating_sub(BRIGHTNESS_STEP)
                .max(MIN_BRIGHTNESS)
        };
        if next != current {
            self.store.update_selection(
                &self.selection,
                LightUpdate::brightness(next),
                SendMode::Debounced,
            );
        }
    }

    fn cycle_color(&mut self, forward: bool) {
        let Some((_, true)) = self.selected_traits() else {
            return;
        };
        self.palette_index = if forward {
            (self.palette_index + 1) % PALETTE.len()
        } else {
            (self.palette_index + PALETTE.len() - 1) % PALETTE.len()
        };
        let color = hex_to_hsb(PALETTE[self.palette_index]);
        self.store.update_selection(
            &self.selection,
            LightUpdate::color(color.hue, color.sat),
            SendMode::Debounced,
        );
    }

    async fn handle_connect_key(&mut self, key: KeyEvent) {
        let Mode::Connect(dialog) = &mut self.mode else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Backspace => {
                dialog.ip.pop();
            }
            KeyCode::Char(c) if !c.is_whitespace() => dialog.ip.push(c),
            KeyCode::Enter => {
                let ip = dialog.ip.trim().to_string();
                if ip.is_empty() {
                    dialog.error = Some("Enter the bridge address".to_string());
                    return;
                }
                match self.store.connect(&ip).await {
                    Ok(()) => {
                        self.mode = Mode::Browse;
                        self.start_poller();
                    }
                    Err(e) => {
                        warn!("Connection to {ip} failed: {e}");
                        if let Mode::Connect(dialog) = &mut self.mode {
                            dialog.error = Some(e.detail());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    async fn handle_room_key(&mut self, key: KeyEvent) {
        let light_count = self.store.lights().len();
        let room_classes = self.store.room_classes();
        let Mode::Room(editor) = &mut self.mode else {
            return;
        };

        match (editor.field, key.code) {
            (_, KeyCode::Esc) => self.mode = Mode::Browse,
            (_, KeyCode::Tab) => editor.field = editor.field.next(),
            (_, KeyCode::BackTab) => editor.field = editor.field.previous(),
            (_, KeyCode::Enter) => self.submit_room().await,
            (FormField::Name, KeyCode::Backspace) => {
                editor.form.name.pop();
            }
            (FormField::Name, KeyCode::Char(c)) => editor.form.name.push(c),
            (FormField::RoomClass, KeyCode::Left) => {
                editor.form.cycle_room_class(&room_classes, false);
            }
            (FormField::RoomClass, KeyCode::Right | KeyCode::Char(' ')) => {
                editor.form.cycle_room_class(&room_classes, true);
            }
            (FormField::Lights, KeyCode::Up | KeyCode::Char('k')) => {
                editor.cursor = editor.cursor.saturating_sub(1);
            }
            (FormField::Lights, KeyCode::Down | KeyCode::Char('j')) => {
                if editor.cursor + 1 < light_count {
                    editor.cursor += 1;
                }
            }
            (FormField::Lights, KeyCode::Char(' ')) => {
                if let Some(light) = self.store.lights().get(editor.cursor) {
                    editor.form.toggle_light(&light.id);
                }
            }
            _ => {}
        }
    }

    async fn submit_room(&mut self) {
        let Mode::Room(editor) = &self.mode else {
            return;
        };
        let result = match &editor.group_id {
            None => self.store.create_group(editor.form.create_request()).await,
            Some(id) => match self.store.group(id) {
                Some(group) => {
                    self.store
                        .update_group_settings(id, editor.form.settings(&group))
                        .await
                }
                None => Err(IrisClientError::Validation(
                    "This room no longer exists".to_string(),
                )),
            },
        };

        match result {
            Ok(()) => {
                info!("Room form saved");
                self.mode = Mode::Browse;
                self.sync_selection();
            }
            Err(e) => {
                if let Mode::Room(editor) = &mut self.mode {
                    editor.error = Some(e.detail());
                }
            }
        }
    }

    async fn handle_delete_key(&mut self, key: KeyEvent) {
        let Mode::ConfirmDelete(id) = &self.mode else {
            return;
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                let id = id.clone();
                self.mode = Mode::Browse;
                match self.store.delete_group(&id).await {
                    Ok(()) => {
                        self.notice = None;
                        self.sync_selection();
                    }
                    Err(e) => {
                        warn!("Failed to delete room {id}: {e}");
                        self.notice = Some(e.detail());
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => self.mode = Mode::Browse,
            _ => {}
        }
    }
}

impl<C: BridgeClientTrait> Drop for App<C> {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use iris_client_rs::{
        BridgeStatus, CreateGroupRequest, GroupMap, GroupUpdate, LightMap, MISSING_NAME,
        StoreConfig,
    };

    use super::*;

    trait SelectionExt {
        fn is_none(&self) -> bool;
    }

    impl SelectionExt for Selection {
        fn is_none(&self) -> bool {
            matches!(self, Selection::None)
        }
    }

    #[derive(Clone, Default)]
    struct FakeClient {
        lights: Arc<Mutex<LightMap>>,
        groups: Arc<Mutex<GroupMap>>,
        created: Arc<Mutex<Vec<CreateGroupRequest>>>,
        light_calls: Arc<Mutex<Vec<(String, LightUpdate)>>>,
    }

    #[async_trait]
    impl BridgeClientTrait for FakeClient {
        async fn status(&self) -> Result<BridgeStatus, IrisClientError> {
            Ok(BridgeStatus {
                connected: true,
                bridge_ip: Some("10.0.0.2".to_string()),
                saved_ip: None,
            })
        }

        async fn connect(&self, _ip: &str) -> Result<(), IrisClientError> {
            Ok(())
        }

        async fn lights(&self) -> Result<LightMap, IrisClientError> {
            Ok(self.lights.lock().unwrap().clone())
        }

        async fn groups(&self) -> Result<GroupMap, IrisClientError> {
            Ok(self.groups.lock().unwrap().clone())
        }

        async fn room_classes(&self) -> Result<Vec<String>, IrisClientError> {
            Ok(vec!["Living room".to_string(), "Kitchen".to_string()])
        }

        async fn update_light(&self, id: &str, update: &LightUpdate) -> Result<(), IrisClientError> {
            self.light_calls
                .lock()
                .unwrap()
                .push((id.to_string(), update.clone()));
            Ok(())
        }

        async fn update_group(&self, _id: &str, _update: &GroupUpdate) -> Result<(), IrisClientError> {
            Ok(())
        }

        async fn create_group(&self, request: &CreateGroupRequest) -> Result<(), IrisClientError> {
            self.created.lock().unwrap().push(request.clone());
            Ok(())
        }

        async fn delete_group(&self, id: &str) -> Result<(), IrisClientError> {
            self.groups.lock().unwrap().remove(id);
            Ok(())
        }
    }

    fn light(id: &str, brightness: u8, has_color: bool) -> Light {
        Light {
            id: id.to_string(),
            name: format!("Light {id}"),
            on: false,
            brightness,
            reachable: true,
            has_color,
            hue: has_color.then_some(0),
            sat: has_color.then_some(0),
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn app(start: Instant) -> (App<FakeClient>, FakeClient) {
        let client = FakeClient::default();
        *client.lights.lock().unwrap() = BTreeMap::from([
            ("1".to_string(), light("1", 100, true)),
            ("2".to_string(), light("2", 250, false)),
        ]);
        let store = BridgeStore::new(client.clone(), StoreConfig::default());
        store.check_status().await;
        store.refresh(RefreshMode::Silent).await.unwrap();
        let idle = IdleTracker::new(Duration::from_secs(120), Duration::from_secs(600), start);
        (App::new(store, idle), client)
    }

    #[tokio::test]
    async fn test_navigation_selects_and_toggles() {
        let now = Instant::now();
        let (mut app, _client) = app(now).await;

        app.handle_key(press(KeyCode::Down), now).await;
        assert_eq!(app.selection, Selection::Light("1".to_string()));
        app.handle_key(press(KeyCode::Down), now).await;
        app.handle_key(press(KeyCode::Down), now).await;
        assert_eq!(app.selection, Selection::Light("2".to_string()));

        app.handle_key(press(KeyCode::Enter), now).await;
        assert!(app.store.light("2").unwrap().on);

        app.handle_key(press(KeyCode::Tab), now).await;
        assert_eq!(app.focus, Focus::Rooms);
        assert!(app.selection.is_none());
    }

    #[tokio::test]
    async fn test_key_in_dark_mode_only_wakes() {
        let start = Instant::now();
        let (mut app, _client) = app(start).await;
        app.handle_key(press(KeyCode::Down), start).await;

        let later = start + Duration::from_secs(601);
        app.handle_key(press(KeyCode::Enter), later).await;
        assert!(!app.store.light("1").unwrap().on);

        app.handle_key(press(KeyCode::Enter), later).await;
        assert!(app.store.light("1").unwrap().on);
    }

    #[tokio::test(start_paused = true)]
    async fn test_brightness_keys_are_debounced() {
        let now = Instant::now();
        let (mut app, client) = app(now).await;
        app.handle_key(press(KeyCode::Down), now).await;

        app.handle_key(press(KeyCode::Char('+')), now).await;
        app.handle_key(press(KeyCode::Char('+')), now).await;
        assert_eq!(app.store.light("1").unwrap().brightness, 132);
        assert!(app.store.has_pending_send());
        assert!(client.light_calls.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let calls = client.light_calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("1".to_string(), LightUpdate::brightness(132))]);
    }

    #[tokio::test]
    async fn test_brightness_is_clamped_and_color_needs_capability() {
        let now = Instant::now();
        let (mut app, _client) = app(now).await;
        app.handle_key(press(KeyCode::End), now).await;
        assert_eq!(app.selection, Selection::Light("2".to_string()));

        app.handle_key(press(KeyCode::Char('+')), now).await;
        assert_eq!(app.store.light("2").unwrap().brightness, MAX_BRIGHTNESS);

        app.handle_key(press(KeyCode::Char('c')), now).await;
        assert_eq!(app.store.light("2").unwrap().hue, None);
    }

    #[tokio::test]
    async fn test_room_form_validates_then_creates() {
        let now = Instant::now();
        let (mut app, client) = app(now).await;

        app.handle_key(press(KeyCode::Char('n')), now).await;
        app.handle_key(press(KeyCode::Enter), now).await;
        let Mode::Room(editor) = &app.mode else {
            panic!("room form closed");
        };
        assert_eq!(editor.error.as_deref(), Some(MISSING_NAME));
        assert!(client.created.lock().unwrap().is_empty());

        for c in "Den".chars() {
            app.handle_key(press(KeyCode::Char(c)), now).await;
        }
        app.handle_key(press(KeyCode::Tab), now).await;
        app.handle_key(press(KeyCode::Right), now).await;
        app.handle_key(press(KeyCode::Tab), now).await;
        app.handle_key(press(KeyCode::Down), now).await;
        app.handle_key(press(KeyCode::Char(' ')), now).await;
        app.handle_key(press(KeyCode::Enter), now).await;

        assert_eq!(app.mode, Mode::Browse);
        let created = client.created.lock().unwrap().clone();
        assert_eq!(
            created,
            vec![CreateGroupRequest {
                name: "Den".to_string(),
                lights: vec!["2".to_string()],
                room_class: "Kitchen".to_string(),
            }]
        );
    }
}
