//! Subscription model.
//!
//! A subscription describes which feed events a subscriber cares about and
//! where to push them. Every scope filter is either empty (no constraint)
//! or a non-empty set that an event must satisfy.

use std::collections::HashSet;
use std::fmt;

use chrono::Duration;

use super::{Deviation, DeviationKinds, StopRef};

/// Opaque subscription identifier, assigned by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub fn new(id: impl Into<String>) -> Self {
        SubscriptionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriptionId {
    fn from(value: &str) -> Self {
        SubscriptionId::new(value)
    }
}

/// Which deviation kinds a subscription wants to be told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviationType {
    /// Any deviation kind.
    #[default]
    All,
    /// Delayed arrivals or departures only.
    Delayed,
    /// Cancellations only.
    Cancelled,
    /// Platform/track reassignments only.
    TrackChange,
}

/// The feed message kind a subscription is scoped to.
///
/// A subscription listens to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageKind {
    /// Vehicle-journey timing/status updates.
    #[default]
    EstimatedTimetable,
    /// Disruption/incident notices.
    SituationExchange,
}

/// A standing subscription with scope filters and delivery state.
///
/// A subscription with empty `from_stops`/`to_stops` is unscoped by stop and
/// matches purely by line/vehicle/codespace. One with both stop sets
/// non-empty additionally requires direction validation: the declared origin
/// must be reached before the declared destination on the specific journey
/// being evaluated.
///
/// `from_stops` and `to_stops` are ordered: the direction resolver scans
/// candidates in declaration order and the first usable one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub name: String,
    pub from_stops: Vec<StopRef>,
    pub to_stops: Vec<StopRef>,
    pub line_refs: HashSet<String>,
    pub vehicle_refs: HashSet<String>,
    pub codespaces: HashSet<String>,
    pub deviation_type: DeviationType,
    /// Below this threshold a delay-only deviation is not pushed.
    pub minimum_delay: Option<Duration>,
    /// Receive matching updates even when no deviation was detected.
    pub push_all_data: bool,
    pub message_kind: MessageKind,
    pub push_address: String,
    /// Consecutive delivery failures; reset on success.
    pub failed_push_count: u32,
}

impl Subscription {
    /// Create a subscription with no scope constraints.
    pub fn new(
        id: impl Into<SubscriptionId>,
        name: impl Into<String>,
        push_address: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            from_stops: Vec::new(),
            to_stops: Vec::new(),
            line_refs: HashSet::new(),
            vehicle_refs: HashSet::new(),
            codespaces: HashSet::new(),
            deviation_type: DeviationType::All,
            minimum_delay: None,
            push_all_data: false,
            message_kind: MessageKind::EstimatedTimetable,
            push_address: push_address.into(),
            failed_push_count: 0,
        }
    }

    /// Set the origin stops, in declaration order.
    pub fn with_from_stops(mut self, stops: impl IntoIterator<Item = StopRef>) -> Self {
        self.from_stops = stops.into_iter().collect();
        self
    }

    /// Set the destination stops, in declaration order.
    pub fn with_to_stops(mut self, stops: impl IntoIterator<Item = StopRef>) -> Self {
        self.to_stops = stops.into_iter().collect();
        self
    }

    /// Constrain to a set of line refs.
    pub fn with_lines(mut self, lines: impl IntoIterator<Item = String>) -> Self {
        self.line_refs = lines.into_iter().collect();
        self
    }

    /// Constrain to a set of vehicle refs.
    pub fn with_vehicles(mut self, vehicles: impl IntoIterator<Item = String>) -> Self {
        self.vehicle_refs = vehicles.into_iter().collect();
        self
    }

    /// Constrain to a set of codespaces.
    pub fn with_codespaces(mut self, codespaces: impl IntoIterator<Item = String>) -> Self {
        self.codespaces = codespaces.into_iter().collect();
        self
    }

    /// Set the wanted deviation kind.
    pub fn with_deviation_type(mut self, deviation_type: DeviationType) -> Self {
        self.deviation_type = deviation_type;
        self
    }

    /// Set the minimum delay threshold.
    pub fn with_minimum_delay(mut self, minimum_delay: Duration) -> Self {
        self.minimum_delay = Some(minimum_delay);
        self
    }

    /// Receive matching updates even without a deviation.
    pub fn with_push_all_data(mut self) -> Self {
        self.push_all_data = true;
        self
    }

    /// Scope to a message kind.
    pub fn with_message_kind(mut self, kind: MessageKind) -> Self {
        self.message_kind = kind;
        self
    }

    /// True if at least one stop set is non-empty.
    pub fn is_stop_scoped(&self) -> bool {
        !self.from_stops.is_empty() || !self.to_stops.is_empty()
    }

    /// True if both stop sets are non-empty, which requires direction
    /// validation before a stop-scoped event can match.
    pub fn needs_direction_check(&self) -> bool {
        !self.from_stops.is_empty() && !self.to_stops.is_empty()
    }

    /// All stops the subscription is registered on, in declaration order.
    pub fn stops(&self) -> impl Iterator<Item = &StopRef> {
        self.from_stops.iter().chain(self.to_stops.iter())
    }

    /// True if the journey's line ref satisfies the line filter.
    ///
    /// An empty filter passes anything; a non-empty filter requires a line
    /// ref that is a member of the set.
    pub fn matches_line(&self, line_ref: Option<&str>) -> bool {
        self.line_refs.is_empty() || line_ref.is_some_and(|l| self.line_refs.contains(l))
    }

    /// True if the journey's vehicle ref satisfies the vehicle filter.
    pub fn matches_vehicle(&self, vehicle_ref: Option<&str>) -> bool {
        self.vehicle_refs.is_empty() || vehicle_ref.is_some_and(|v| self.vehicle_refs.contains(v))
    }

    /// True if the event's codespace satisfies the codespace filter.
    pub fn matches_codespace(&self, codespace: Option<&str>) -> bool {
        self.codespaces.is_empty() || codespace.is_some_and(|c| self.codespaces.contains(c))
    }

    /// True if the deviation carries a kind the subscription wants.
    pub fn wants_deviation(&self, kinds: DeviationKinds) -> bool {
        match self.deviation_type {
            DeviationType::All => true,
            DeviationType::Delayed => kinds.delayed_arrival || kinds.delayed_departure,
            DeviationType::Cancelled => kinds.cancelled,
            DeviationType::TrackChange => kinds.track_change,
        }
    }

    /// True if the deviation clears the minimum-delay threshold.
    ///
    /// The threshold only applies when the deviation is a delay and its
    /// magnitude is known; subscriptions with no threshold always pass.
    pub fn passes_minimum_delay(&self, deviation: &Deviation) -> bool {
        match (self.minimum_delay, deviation.delay) {
            (Some(min), Some(delay)) if deviation.kinds.is_delay() => delay >= min,
            _ => true,
        }
    }
}
