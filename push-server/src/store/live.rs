//! Live-journey cache.
//!
//! Records the ordered call sequence of recently seen vehicle journeys.
//! Consumed read-only by the disruption matcher as a fallback when a notice
//! references a journey without supplying its own complete stop ordering.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::domain::StopRef;
use crate::feed::EstimatedVehicleJourney;

/// Entries are evicted this long after the journey's last known arrival.
pub const LIVE_JOURNEY_TTL: Duration = Duration::minutes(15);

/// One stop on a live journey with its arrival time, when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveCall {
    pub stop: StopRef,
    pub arrival: Option<DateTime<Utc>>,
}

/// The persisted call sequence of one vehicle journey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveJourney {
    pub calls: Vec<LiveCall>,
    /// Arrival time at the final stop, when known.
    pub last_arrival: Option<DateTime<Utc>>,
}

impl LiveJourney {
    /// Build an entry from a journey update, expected times winning over
    /// aimed ones. Returns `None` for a journey with no calls.
    pub fn from_journey(journey: &EstimatedVehicleJourney) -> Option<Self> {
        let mut calls: Vec<LiveCall> = journey
            .recorded_calls
            .iter()
            .map(|c| LiveCall {
                stop: c.stop_point_ref.clone(),
                arrival: c.actual_arrival_time.or(c.aimed_arrival_time),
            })
            .collect();
        calls.extend(journey.estimated_calls.iter().map(|c| LiveCall {
            stop: c.stop_point_ref.clone(),
            arrival: c.expected_arrival_time.or(c.aimed_arrival_time),
        }));

        if calls.is_empty() {
            return None;
        }

        let last_arrival = calls.iter().rev().find_map(|c| c.arrival);
        Some(Self {
            calls,
            last_arrival,
        })
    }

    /// The ordered stop refs of the journey.
    pub fn stop_refs(&self) -> Vec<StopRef> {
        self.calls.iter().map(|c| c.stop.clone()).collect()
    }
}

/// Concurrent journey-ref → live-journey map.
#[derive(Default)]
pub struct LiveJourneyStore {
    entries: DashMap<String, LiveJourney>,
}

impl LiveJourneyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, journey_ref: impl Into<String>, journey: LiveJourney) {
        self.entries.insert(journey_ref.into(), journey);
    }

    pub fn get(&self, journey_ref: &str) -> Option<LiveJourney> {
        self.entries.get(journey_ref).map(|e| e.value().clone())
    }

    pub fn all(&self) -> Vec<LiveJourney> {
        self.entries.iter().map(|e| e.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries whose last arrival is before the cutoff. Entries with
    /// no arrival time yet are kept. Returns the number evicted.
    pub fn evict_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, journey| journey.last_arrival.is_none_or(|t| t >= cutoff));
        before - self.entries.len()
    }
}
