use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::Config;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::models::{Appointment, Category, Client, Employee, EntityId};
use crate::screens::{AttendanceScreen, EntityScreen, ScreenRegistry};

pub const EVENT_RELOADED: &str = "reloaded";
pub const EVENT_CREATED: &str = "created";
pub const EVENT_UPDATED: &str = "updated";
pub const EVENT_STATUS_CHANGED: &str = "status_changed";
pub const EVENT_DELETED: &str = "deleted";
pub const EVENT_ROLLED_BACK: &str = "rolled_back";
pub const EVENT_TOGGLED: &str = "toggled";

pub const ATTENDANCE: &str = "asistencia";

#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    pub events: broadcast::Sender<StoreEvent>,
    pub clients: ScreenRegistry<EntityScreen<Client>>,
    pub employees: ScreenRegistry<EntityScreen<Employee>>,
    pub categories: ScreenRegistry<EntityScreen<Category>>,
    pub appointments: ScreenRegistry<EntityScreen<Appointment>>,
    pub attendance: ScreenRegistry<AttendanceScreen>,
}

impl AppState {
    pub fn new(gateway: Gateway, events_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(events_capacity);
        Self {
            gateway,
            events,
            clients: ScreenRegistry::default(),
            employees: ScreenRegistry::default(),
            categories: ScreenRegistry::default(),
            appointments: ScreenRegistry::default(),
            attendance: ScreenRegistry::default(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let gateway = Gateway::new(&config.gateway_url, config.gateway_timeout)?;
        Ok(Self::new(gateway, config.events_capacity))
    }

    pub fn publish(&self, event: StoreEvent) {
        // No subscribers is the normal case when no SSE client is connected.
        let _ = self.events.send(event);
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StoreEvent {
    pub kind: String,
    pub entity: String,
    pub screen_id: Option<Uuid>,
    pub item_id: Option<EntityId>,
    pub status: Option<String>,
}

impl StoreEvent {
    pub fn new(kind: &str, entity: &str, screen_id: Uuid) -> Self {
        Self {
            kind: kind.to_string(),
            entity: entity.to_string(),
            screen_id: Some(screen_id),
            item_id: None,
            status: None,
        }
    }

    pub fn with_item(mut self, item_id: &EntityId) -> Self {
        self.item_id = Some(item_id.clone());
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }
}
