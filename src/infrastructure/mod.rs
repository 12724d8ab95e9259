pub mod backend_client;
pub mod config;
pub mod credential_store;
pub mod error;
pub mod event_cache;
pub mod notifier;
pub mod plan_mapper;
