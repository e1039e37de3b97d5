//! Transit deviation push server.
//!
//! Ingests realtime public-transport feed messages (estimated-timetable
//! journey updates and situation-exchange disruption notices), matches them
//! against standing subscriptions, and pushes notifications to each affected
//! subscriber's webhook.

pub mod config;
pub mod domain;
pub mod feed;
pub mod matching;
pub mod push;
pub mod stops;
pub mod store;
pub mod web;
