//! # Maintenance Mode
//!
//! Process-lifetime flag the front end polls to gate the site behind a maintenance page.
//!
//! - Lives in [`crate::state::AppState`], not a global
//! - Resets to "off, updated by system" on every restart
//! - The browser mirrors it into local storage on its own
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceState {
    pub is_maintenance_activated: bool,
    pub last_updated: DateTime<Utc>,
    pub updated_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceUpdate {
    pub is_maintenance_activated: bool,
    pub updated_by: String,
}

impl MaintenanceUpdate {
    pub fn from_json(body: &Value) -> Result<Self, AppError> {
        let is_maintenance_activated = body
            .get("isMaintenanceActivated")
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                AppError::MalformedPayload("isMaintenanceActivated must be a boolean".to_string())
            })?;

        let updated_by = body
            .get("updatedBy")
            .and_then(Value::as_str)
            .unwrap_or("admin")
            .to_string();

        Ok(Self {
            is_maintenance_activated,
            updated_by,
        })
    }
}

pub struct MaintenanceStore {
    state: RwLock<MaintenanceState>,
}

impl Default for MaintenanceStore {
    fn default() -> Self {
        Self {
            state: RwLock::new(MaintenanceState {
                is_maintenance_activated: false,
                last_updated: Utc::now(),
                updated_by: "system".to_string(),
            }),
        }
    }
}

impl MaintenanceStore {
    pub async fn get(&self) -> MaintenanceState {
        self.state.read().await.clone()
    }

    pub async fn set(&self, update: MaintenanceUpdate) -> MaintenanceState {
        let next = MaintenanceState {
            is_maintenance_activated: update.is_maintenance_activated,
            last_updated: Utc::now(),
            updated_by: update.updated_by,
        };

        info!(
            "Maintenance mode {} by {}",
            if next.is_maintenance_activated { "enabled" } else { "disabled" },
            next.updated_by
        );

        *self.state.write().await = next.clone();
        next
    }
}
