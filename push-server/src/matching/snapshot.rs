//! Message-local stop snapshot.
//!
//! Built fresh for every estimated-timetable update and never persisted.
//! Covers the already-occurred portion of the journey as well as its future
//! portion, so direction resolution can see the whole calling pattern.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::StopRef;
use crate::feed::{
    ArrivalBoardingActivity, CallStatus, DepartureBoardingActivity, EstimatedVehicleJourney,
};
use crate::stops::AliasSnapshot;

/// What the snapshot knows about one stop on the journey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTimes {
    /// Aimed departure, falling back to aimed arrival. The reference time
    /// for direction ordering.
    pub time: DateTime<Utc>,
    pub arrival_status: Option<CallStatus>,
    pub arrival_activity: Option<ArrivalBoardingActivity>,
    pub departure_status: Option<CallStatus>,
    pub departure_activity: Option<DepartureBoardingActivity>,
}

/// Stop → timing/status mapping for one journey update.
///
/// When a stop is known at quay granularity and an alias exists, the same
/// entry is present under the resolved stop-place identifier too, so lookups
/// succeed regardless of which granularity a subscription used. For stops
/// called at more than once (loops), the first call wins.
#[derive(Debug, Default, Clone)]
pub struct StopSnapshot {
    entries: HashMap<StopRef, StopTimes>,
}

impl StopSnapshot {
    /// Build the snapshot for a whole journey, recorded calls first.
    pub fn from_journey(journey: &EstimatedVehicleJourney, aliases: &AliasSnapshot) -> Self {
        let mut entries: HashMap<StopRef, StopTimes> = HashMap::new();
        let mut aliased: Vec<(StopRef, StopTimes)> = Vec::new();

        let mut insert = |stop: &StopRef, times: StopTimes| {
            if let Some(parent) = aliases.quay_to_parent(stop) {
                aliased.push((parent.clone(), times.clone()));
            }
            entries.entry(stop.clone()).or_insert(times);
        };

        for call in &journey.recorded_calls {
            let Some(time) = call.aimed_departure_time.or(call.aimed_arrival_time) else {
                continue;
            };
            insert(
                &call.stop_point_ref,
                StopTimes {
                    time,
                    arrival_status: None,
                    arrival_activity: None,
                    departure_status: None,
                    departure_activity: None,
                },
            );
        }

        for call in &journey.estimated_calls {
            let Some(time) = call.aimed_departure_time.or(call.aimed_arrival_time) else {
                continue;
            };
            insert(
                &call.stop_point_ref,
                StopTimes {
                    time,
                    arrival_status: call.arrival_status,
                    arrival_activity: call.arrival_boarding_activity,
                    departure_status: call.departure_status,
                    departure_activity: call.departure_boarding_activity,
                },
            );
        }

        // Direct entries win over alias entries when both granularities
        // genuinely appear on the journey.
        for (stop, times) in aliased {
            entries.entry(stop).or_insert(times);
        }

        Self { entries }
    }

    pub fn get(&self, stop: &StopRef) -> Option<&StopTimes> {
        self.entries.get(stop)
    }

    pub fn contains(&self, stop: &StopRef) -> bool {
        self.entries.contains_key(stop)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
