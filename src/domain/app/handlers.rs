use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::events::{AppInstallEvent, AppUninstallEvent};
use crate::events::{EventHandler, HandlerError};

// ============================================================================
// App Event Handlers
// ============================================================================

pub struct AppInstallHandler;

#[async_trait]
impl EventHandler for AppInstallHandler {
    type Payload = AppInstallEvent;

    async fn handle(&self, event: AppInstallEvent) -> Result<(), HandlerError> {
        if event.app_id.is_empty() {
            return Err(HandlerError::Rejected("app_id is empty".to_string()));
        }

        tracing::info!(
            app_id = %event.app_id,
            channel_id = %event.channel_id,
            manager_id = %event.manager_id,
            "Handling app install event"
        );

        Ok(())
    }
}

pub struct AppUninstallHandler;

#[async_trait]
impl EventHandler for AppUninstallHandler {
    type Payload = AppUninstallEvent;

    async fn handle(&self, event: AppUninstallEvent) -> Result<(), HandlerError> {
        if event.app_id.is_empty() {
            return Err(HandlerError::Rejected("app_id is empty".to_string()));
        }

        let uninstalled_at = event
            .uninstalled_at
            .as_ref()
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts.seconds, ts.nanos.max(0) as u32));

        tracing::info!(
            app_id = %event.app_id,
            device_id = %event.device_id,
            uninstalled_at = ?uninstalled_at,
            reason = %event.reason,
            "Handling app uninstall event"
        );

        Ok(())
    }
}
