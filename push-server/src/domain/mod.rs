//! Domain types for the push server.
//!
//! This module contains the core model types shared by the matchers and the
//! delivery engine: stop identifiers at both granularities, subscriptions
//! with their scope filters, and per-stop deviations.

mod deviation;
mod stop;
mod subscription;

pub use deviation::{Deviation, DeviationKinds};
pub use stop::StopRef;
pub use subscription::{DeviationType, MessageKind, Subscription, SubscriptionId};
