pub mod config;
pub mod domain;
pub mod events;
pub mod messaging;
pub mod metrics;
pub mod outbox;
pub mod schema;
