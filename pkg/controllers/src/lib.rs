//! Refresh reconciliation engine.
//!
//! [`scheduled::ScheduledRefresh`] walks every binding on a fixed interval,
//! asks the binding's [`refresh::RefreshStrategy`] whether its secret is due,
//! and hands due bindings to the [`handler::EventHandler`]. Failures are
//! isolated per binding and recorded through [`notification::EventNotification`].

pub mod error;
pub mod handler;
pub mod keyvalue;
pub mod notification;
pub mod pki;
pub mod refresh;
pub mod scheduled;
pub mod staleness;

#[cfg(test)]
mod testutil;

pub use error::RefreshError;
