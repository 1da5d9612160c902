use prost_types::Timestamp;

use crate::events::DomainEvent;

// ============================================================================
// App Events - protobuf payloads registered with the schema registry
// ============================================================================

pub const APP_AGGREGATE: &str = "app";

/// App installed into a channel.
#[derive(Clone, PartialEq, prost::Message)]
pub struct AppInstallEvent {
    #[prost(string, tag = "1")]
    pub app_id: String,
    #[prost(string, tag = "2")]
    pub channel_id: String,
    #[prost(string, tag = "3")]
    pub manager_id: String,
}

impl DomainEvent for AppInstallEvent {
    fn event_type() -> &'static str {
        "AppInstallEvent"
    }
    fn aggregate_type() -> &'static str {
        APP_AGGREGATE
    }
}

/// App removed from a channel or device.
#[derive(Clone, PartialEq, prost::Message)]
pub struct AppUninstallEvent {
    #[prost(string, tag = "1")]
    pub app_id: String,
    #[prost(string, tag = "2")]
    pub channel_id: String,
    #[prost(string, tag = "3")]
    pub manager_id: String,
    #[prost(string, tag = "4")]
    pub device_id: String,
    #[prost(message, optional, tag = "5")]
    pub uninstalled_at: Option<Timestamp>,
    #[prost(string, tag = "6")]
    pub reason: String,
}

impl DomainEvent for AppUninstallEvent {
    fn event_type() -> &'static str {
        "AppUninstallEvent"
    }
    fn aggregate_type() -> &'static str {
        APP_AGGREGATE
    }
}
