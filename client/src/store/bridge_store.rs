use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::protocol::client::{BridgeClientTrait, IrisClientError};
use crate::protocol::models::{
    CreateGroupRequest, Group, GroupMap, GroupUpdate, Light, LightMap, LightUpdate, RoomSettings,
    compare_ids,
};
use crate::store::debounce::Debouncer;
use crate::store::forms::{Selection, validate_create, validate_settings};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Quiet interval before a debounced update is sent.
    pub debounce: Duration,
    /// Period of the background refresh while connected.
    pub refresh_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// How an update reaches the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    Immediate,
    /// Coalesced with other debounced updates; only the last one is sent.
    Debounced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Raises the loading flag while fetching.
    Visible,
    Silent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub connected: bool,
    pub bridge_ip: Option<String>,
    pub saved_ip: Option<String>,
    /// Set once the first status check completed, whatever its outcome.
    pub initial_checked: bool,
}

#[derive(Debug, Default)]
struct BridgeCache {
    lights: LightMap,
    groups: GroupMap,
    room_classes: Vec<String>,
    connection: ConnectionInfo,
    loading: bool,
    last_error: Option<String>,
}

/// Local view of the bridge's lights and rooms.
///
/// Power, brightness and color changes are applied to the cache before the
/// service confirms them. Failed power changes are reverted; failed
/// brightness and color changes are only logged and get corrected by the
/// next refresh. Room creation, deletion and settings are not applied
/// locally: they trigger a full refresh once the service accepted them.
///
/// The handle is cheap to clone; all clones share the same cache.
pub struct BridgeStore<C: BridgeClientTrait> {
    client: C,
    cache: Arc<RwLock<BridgeCache>>,
    debouncer: Arc<Debouncer>,
    config: StoreConfig,
}

impl<C: BridgeClientTrait> Clone for BridgeStore<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            cache: Arc::clone(&self.cache),
            debouncer: Arc::clone(&self.debouncer),
            config: self.config,
        }
    }
}

impl<C: BridgeClientTrait> BridgeStore<C> {
    pub fn new(client: C, config: StoreConfig) -> Self {
        Self {
            client,
            cache: Arc::new(RwLock::new(BridgeCache::default())),
            debouncer: Arc::new(Debouncer::new(config.debounce)),
            config,
        }
    }

    pub fn lights(&self) -> Vec<Light> {
        let mut lights: Vec<Light> = self.cache.read().lights.values().cloned().collect();
        lights.sort_by(|a, b| compare_ids(&a.id, &b.id));
        lights
    }

    pub fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.cache.read().groups.values().cloned().collect();
        groups.sort_by(|a, b| compare_ids(&a.id, &b.id));
        groups
    }

    pub fn light(&self, id: &str) -> Option<Light> {
        self.cache.read().lights.get(id).cloned()
    }

    pub fn group(&self, id: &str) -> Option<Group> {
        self.cache.read().groups.get(id).cloned()
    }

    pub fn room_classes(&self) -> Vec<String> {
        self.cache.read().room_classes.clone()
    }

    pub fn connection(&self) -> ConnectionInfo {
        self.cache.read().connection.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.cache.read().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.cache.read().last_error.clone()
    }

    pub fn has_pending_send(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Asks the service whether it is connected to a bridge. A failing
    /// status call counts as not connected.
    pub async fn check_status(&self) -> bool {
        let status = self.client.status().await;
        let mut cache = self.cache.write();
        cache.connection.initial_checked = true;
        match status {
            Ok(status) => {
                debug!(?status, "Bridge status");
                cache.connection.connected = status.connected;
                cache.connection.bridge_ip = status.bridge_ip;
                cache.connection.saved_ip = status.saved_ip;
                status.connected
            }
            Err(e) => {
                warn!("Status check failed: {e}");
                false
            }
        }
    }

    pub async fn connect(&self, ip: &str) -> Result<(), IrisClientError> {
        self.client.connect(ip).await?;
        {
            let mut cache = self.cache.write();
            cache.connection.connected = true;
            cache.connection.bridge_ip = Some(ip.to_string());
        }
        info!("Connected to bridge at {ip}");
        self.refresh_after_change().await;
        Ok(())
    }

    /// Fetches lights, rooms and room classes and replaces the cache with
    /// them.
    pub async fn refresh(&self, mode: RefreshMode) -> Result<(), IrisClientError> {
        {
            let mut cache = self.cache.write();
            if mode == RefreshMode::Visible {
                cache.loading = true;
            }
            cache.last_error = None;
        }

        let result = tokio::try_join!(
            self.client.lights(),
            self.client.groups(),
            self.client.room_classes()
        );

        let mut cache = self.cache.write();
        if mode == RefreshMode::Visible {
            cache.loading = false;
        }
        match result {
            Ok((lights, groups, room_classes)) => {
                debug!(
                    "Refreshed {} lights, {} rooms",
                    lights.len(),
                    groups.len()
                );
                cache.lights = lights;
                cache.groups = groups;
                cache.room_classes = room_classes;
                Ok(())
            }
            Err(e) => {
                error!("Failed to load data: {e}");
                cache.last_error = Some(e.detail());
                Err(e)
            }
        }
    }

    /// The error is already recorded in `last_error` by `refresh`.
    async fn refresh_after_change(&self) {
        if let Err(e) = self.refresh(RefreshMode::Visible).await {
            warn!("Refresh after change failed: {e}");
        }
    }

    /// Flips the power of a light. The returned task reverts the flip when
    /// the service rejects it. Unknown lights are ignored.
    pub fn toggle_light(&self, id: &str) -> Option<JoinHandle<()>> {
        let previous = {
            let mut cache = self.cache.write();
            let light = cache.lights.get_mut(id)?;
            let previous = light.on;
            light.on = !previous;
            previous
        };

        let store = self.clone();
        let id = id.to_string();
        Some(tokio::spawn(async move {
            let update = LightUpdate::power(!previous);
            if let Err(e) = store.client.update_light(&id, &update).await {
                warn!("Failed to switch light {id}, reverting: {e}");
                if let Some(light) = store.cache.write().lights.get_mut(&id) {
                    light.on = previous;
                }
            }
        }))
    }

    /// Flips the power of a room and shows the new state on its member
    /// lights right away. Only the room is sent to the service.
    pub fn toggle_group(&self, id: &str) -> Option<JoinHandle<()>> {
        let (previous, members) = {
            let mut guard = self.cache.write();
            let cache = &mut *guard;
            let group = cache.groups.get_mut(id)?;
            let previous = group.on;
            group.on = !previous;

            let mut members = Vec::with_capacity(group.lights.len());
            for light_id in &group.lights {
                if let Some(light) = cache.lights.get_mut(light_id) {
                    members.push((light_id.clone(), light.on));
                    light.on = !previous;
                }
            }
            (previous, members)
        };

        let store = self.clone();
        let id = id.to_string();
        Some(tokio::spawn(async move {
            let update = GroupUpdate::from(LightUpdate::power(!previous));
            if let Err(e) = store.client.update_group(&id, &update).await {
                warn!("Failed to switch room {id}, reverting: {e}");
                let mut guard = store.cache.write();
                let cache = &mut *guard;
                if let Some(group) = cache.groups.get_mut(&id) {
                    group.on = previous;
                }
                for (light_id, on) in members {
                    if let Some(light) = cache.lights.get_mut(&light_id) {
                        light.on = on;
                    }
                }
            }
        }))
    }

    /// Applies `update` to the cached light and sends it. Immediate sends
    /// return their task; debounced sends return `None`.
    pub fn update_light(
        &self,
        id: &str,
        update: LightUpdate,
        mode: SendMode,
    ) -> Option<JoinHandle<()>> {
        self.cache.write().lights.get_mut(id)?.apply(&update);

        let store = self.clone();
        let id = id.to_string();
        let send = async move {
            if let Err(e) = store.client.update_light(&id, &update).await {
                warn!("Failed to update light {id}: {e}");
            }
        };
        self.dispatch(send, mode)
    }

    /// Applies `update` to the cached room and sends it. A color change is
    /// also shown on every color-capable member light, without sending
    /// anything for them.
    pub fn update_group(
        &self,
        id: &str,
        update: GroupUpdate,
        mode: SendMode,
    ) -> Option<JoinHandle<()>> {
        {
            let mut guard = self.cache.write();
            let cache = &mut *guard;
            let group = cache.groups.get_mut(id)?;
            group.apply(&update);

            if let Some((hue, sat)) = update.color() {
                for light_id in &group.lights {
                    if let Some(light) = cache.lights.get_mut(light_id)
                        && light.has_color
                    {
                        light.hue = Some(hue);
                        light.sat = Some(sat);
                    }
                }
            }
        }

        let store = self.clone();
        let id = id.to_string();
        let send = async move {
            if let Err(e) = store.client.update_group(&id, &update).await {
                warn!("Failed to update room {id}: {e}");
            }
        };
        self.dispatch(send, mode)
    }

    /// Routes an update to the light or room behind `selection`.
    pub fn update_selection(
        &self,
        selection: &Selection,
        update: LightUpdate,
        mode: SendMode,
    ) -> Option<JoinHandle<()>> {
        match selection {
            Selection::None => None,
            Selection::Light(id) => self.update_light(id, update, mode),
            Selection::Group(id) => self.update_group(id, update.into(), mode),
        }
    }

    pub fn toggle_selection(&self, selection: &Selection) -> Option<JoinHandle<()>> {
        match selection {
            Selection::None => None,
            Selection::Light(id) => self.toggle_light(id),
            Selection::Group(id) => self.toggle_group(id),
        }
    }

    fn dispatch<F>(&self, send: F, mode: SendMode) -> Option<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match mode {
            SendMode::Immediate => Some(tokio::spawn(send)),
            SendMode::Debounced => {
                self.debouncer.schedule(send);
                None
            }
        }
    }

    pub async fn create_group(
        &self,
        request: CreateGroupRequest,
    ) -> Result<(), IrisClientError> {
        validate_create(&request)?;
        self.client.create_group(&request).await?;
        info!("Room '{}' created", request.name);
        self.refresh_after_change().await;
        Ok(())
    }

    pub async fn update_group_settings(
        &self,
        id: &str,
        settings: RoomSettings,
    ) -> Result<(), IrisClientError> {
        validate_settings(&settings)?;
        self.client.update_group(id, &settings.into()).await?;
        info!("Room {id} settings saved");
        self.refresh_after_change().await;
        Ok(())
    }

    pub async fn delete_group(&self, id: &str) -> Result<(), IrisClientError> {
        self.client.delete_group(id).await?;
        info!("Room {id} deleted");
        self.refresh_after_change().await;
        Ok(())
    }

    /// One background refresh cycle. Returns whether a refresh ran: it is
    /// skipped while disconnected and while a debounced update waits to be
    /// sent, so the refresh cannot overwrite that update with stale data.
    pub async fn poll_once(&self) -> bool {
        if !self.cache.read().connection.connected {
            return false;
        }
        if self.debouncer.is_pending() {
            debug!("Skipping refresh, debounced update pending");
            return false;
        }
        if let Err(e) = self.refresh(RefreshMode::Silent).await {
            debug!("Background refresh failed: {e}");
        }
        true
    }

    /// Runs `poll_once` every refresh interval, starting one interval from
    /// now. A zero interval polls at the default period. Abort the returned
    /// task to stop polling.
    pub fn spawn_poller(&self) -> JoinHandle<()> {
        let store = self.clone();
        let period = if self.config.refresh_interval.is_zero() {
            warn!("Zero refresh interval, polling every {DEFAULT_REFRESH_INTERVAL:?}");
            DEFAULT_REFRESH_INTERVAL
        } else {
            self.config.refresh_interval
        };
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                store.poll_once().await;
            }
        })
    }
}
