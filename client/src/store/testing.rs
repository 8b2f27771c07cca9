use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::protocol::client::{BridgeClientTrait, IrisClientError};
use crate::protocol::models::{
    BridgeStatus, CreateGroupRequest, Group, GroupMap, GroupUpdate, Light, LightMap, LightUpdate,
};

pub fn light(id: &str, on: bool, has_color: bool) -> Light {
    Light {
        id: id.to_string(),
        name: format!("Light {id}"),
        on,
        brightness: 254,
        reachable: true,
        has_color,
        hue: has_color.then_some(0),
        sat: has_color.then_some(0),
    }
}

pub fn group(id: &str, members: &[&str]) -> Group {
    Group {
        id: id.to_string(),
        name: format!("Room {id}"),
        group_type: "Room".to_string(),
        room_class: "Living room".to_string(),
        lights: members.iter().map(|m| m.to_string()).collect(),
        on: false,
        brightness: 254,
        has_color: true,
        hue: Some(0),
        sat: Some(0),
    }
}

/// In-memory service double. Writes are recorded; `should_fail` makes every
/// write fail and `fail_reads` every read.
#[derive(Clone, Default)]
pub struct FakeBridgeClient {
    pub status: Arc<RwLock<BridgeStatus>>,
    pub lights: Arc<RwLock<LightMap>>,
    pub groups: Arc<RwLock<GroupMap>>,
    pub connect_calls: Arc<RwLock<Vec<String>>>,
    pub light_calls: Arc<RwLock<Vec<(String, LightUpdate)>>>,
    pub group_calls: Arc<RwLock<Vec<(String, GroupUpdate)>>>,
    pub created: Arc<RwLock<Vec<CreateGroupRequest>>>,
    pub fetch_count: Arc<AtomicUsize>,
    pub should_fail: Arc<AtomicBool>,
    pub fail_reads: Arc<AtomicBool>,
}

impl FakeBridgeClient {
    pub fn with_index(lights: Vec<Light>, groups: Vec<Group>) -> Self {
        Self {
            status: Arc::new(RwLock::new(BridgeStatus {
                connected: true,
                bridge_ip: Some("10.0.0.2".to_string()),
                saved_ip: Some("10.0.0.2".to_string()),
            })),
            lights: Arc::new(RwLock::new(
                lights.into_iter().map(|l| (l.id.clone(), l)).collect(),
            )),
            groups: Arc::new(RwLock::new(
                groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
            )),
            ..Default::default()
        }
    }

    fn fail() -> IrisClientError {
        IrisClientError::Api {
            status: 500,
            detail: "Fake error".to_string(),
        }
    }

    fn check_write(&self) -> Result<(), IrisClientError> {
        if self.should_fail.load(Ordering::SeqCst) {
            Err(Self::fail())
        } else {
            Ok(())
        }
    }

    fn check_read(&self) -> Result<(), IrisClientError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(Self::fail())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BridgeClientTrait for FakeBridgeClient {
    async fn status(&self) -> Result<BridgeStatus, IrisClientError> {
        self.check_read()?;
        Ok(self.status.read().await.clone())
    }

    async fn connect(&self, ip: &str) -> Result<(), IrisClientError> {
        self.check_write()?;
        self.connect_calls.write().await.push(ip.to_string());
        let mut status = self.status.write().await;
        status.connected = true;
        status.bridge_ip = Some(ip.to_string());
        Ok(())
    }

    async fn lights(&self) -> Result<LightMap, IrisClientError> {
        self.check_read()?;
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.lights.read().await.clone())
    }

    async fn groups(&self) -> Result<GroupMap, IrisClientError> {
        self.check_read()?;
        Ok(self.groups.read().await.clone())
    }

    async fn room_classes(&self) -> Result<Vec<String>, IrisClientError> {
        self.check_read()?;
        Ok(vec!["Living room".to_string(), "Other".to_string()])
    }

    async fn update_light(&self, id: &str, update: &LightUpdate) -> Result<(), IrisClientError> {
        self.check_write()?;
        self.light_calls
            .write()
            .await
            .push((id.to_string(), update.clone()));
        if let Some(light) = self.lights.write().await.get_mut(id) {
            light.apply(update);
        }
        Ok(())
    }

    async fn update_group(&self, id: &str, update: &GroupUpdate) -> Result<(), IrisClientError> {
        self.check_write()?;
        self.group_calls
            .write()
            .await
            .push((id.to_string(), update.clone()));
        if let Some(group) = self.groups.write().await.get_mut(id) {
            group.apply(update);
        }
        Ok(())
    }

    async fn create_group(&self, request: &CreateGroupRequest) -> Result<(), IrisClientError> {
        self.check_write()?;
        self.created.write().await.push(request.clone());
        let mut groups = self.groups.write().await;
        let id = (groups.len() + 100).to_string();
        let mut created = group(&id, &[]);
        created.name = request.name.clone();
        created.lights = request.lights.clone();
        created.room_class = request.room_class.clone();
        groups.insert(id, created);
        Ok(())
    }

    async fn delete_group(&self, id: &str) -> Result<(), IrisClientError> {
        self.check_write()?;
        self.groups.write().await.remove(id);
        Ok(())
    }
}
