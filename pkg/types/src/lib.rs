pub mod config;
pub mod event;
pub mod secret;
pub mod ttl;
pub mod validate;
pub mod vault;
