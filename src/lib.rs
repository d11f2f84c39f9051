//! ticketd - support-ticket channels for chat communities.
//!
//! Users pick a category from a panel, get a private channel, and the owner
//! or an administrator closes, reopens or deletes it with buttons. The
//! [`tickets::LifecycleController`] keeps those transitions race-free per
//! channel.

pub mod audit;
pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod platform;
pub mod state;
pub mod telemetry;
pub mod tickets;
