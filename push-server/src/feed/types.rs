//! Feed message DTOs.
//!
//! These types map to the two inbound message kinds: estimated-timetable
//! journey updates and situation-exchange disruption notices. They use
//! `Option` liberally because feeds omit fields rather than sending nulls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::StopRef;

/// Service feature tag marking a freight journey.
const FREIGHT_SERVICE_FEATURE: &str = "freightTrain";

/// Progress status of an arrival or departure at one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallStatus {
    OnTime,
    Early,
    Delayed,
    Cancelled,
}

/// Whether passengers may leave the vehicle at a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrivalBoardingActivity {
    Alighting,
    NoAlighting,
    PassThru,
}

/// Whether passengers may board the vehicle at a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DepartureBoardingActivity {
    Boarding,
    NoBoarding,
    PassThru,
}

/// Platform assignment for one side of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopAssignment {
    /// The platform the timetable planned.
    pub aimed_quay_ref: Option<String>,
    /// The platform currently expected.
    pub expected_quay_ref: Option<String>,
}

impl StopAssignment {
    /// True if an expected platform is present and differs from the aimed one.
    pub fn is_reassigned(&self) -> bool {
        match (&self.aimed_quay_ref, &self.expected_quay_ref) {
            (Some(aimed), Some(expected)) => aimed != expected,
            _ => false,
        }
    }
}

/// A call the vehicle has not yet completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedCall {
    pub stop_point_ref: StopRef,

    #[serde(default)]
    pub cancellation: bool,

    pub aimed_arrival_time: Option<DateTime<Utc>>,
    pub expected_arrival_time: Option<DateTime<Utc>>,
    pub aimed_departure_time: Option<DateTime<Utc>>,
    pub expected_departure_time: Option<DateTime<Utc>>,

    pub arrival_status: Option<CallStatus>,
    pub departure_status: Option<CallStatus>,
    pub arrival_boarding_activity: Option<ArrivalBoardingActivity>,
    pub departure_boarding_activity: Option<DepartureBoardingActivity>,

    pub arrival_stop_assignment: Option<StopAssignment>,
    pub departure_stop_assignment: Option<StopAssignment>,
}

impl EstimatedCall {
    /// Reference time used to decide whether the call is already in the
    /// past: expected-or-aimed departure, falling back to arrival.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.expected_departure_time
            .or(self.aimed_departure_time)
            .or(self.expected_arrival_time)
            .or(self.aimed_arrival_time)
    }

    /// The platform assignment to inspect for a track change: arrival,
    /// falling back to departure.
    pub fn stop_assignment(&self) -> Option<&StopAssignment> {
        self.arrival_stop_assignment
            .as_ref()
            .or(self.departure_stop_assignment.as_ref())
    }
}

/// A call the vehicle has already completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedCall {
    pub stop_point_ref: StopRef,

    #[serde(default)]
    pub cancellation: bool,

    pub aimed_arrival_time: Option<DateTime<Utc>>,
    pub actual_arrival_time: Option<DateTime<Utc>>,
    pub aimed_departure_time: Option<DateTime<Utc>>,
    pub actual_departure_time: Option<DateTime<Utc>>,
}

/// An estimated-timetable update for one vehicle journey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedVehicleJourney {
    pub line_ref: Option<String>,
    pub dated_vehicle_journey_ref: Option<String>,
    pub vehicle_ref: Option<String>,
    pub operator_ref: Option<String>,

    /// Codespace of the producing data source.
    pub data_source: Option<String>,

    /// Journey-level cancellation.
    #[serde(default)]
    pub cancellation: bool,

    #[serde(default)]
    pub service_feature_refs: Vec<String>,

    #[serde(default)]
    pub recorded_calls: Vec<RecordedCall>,

    #[serde(default)]
    pub estimated_calls: Vec<EstimatedCall>,
}

impl EstimatedVehicleJourney {
    /// Identifier under which the journey is recorded in the live-journey
    /// store: the dated journey ref, falling back to the vehicle ref.
    pub fn journey_key(&self) -> Option<&str> {
        self.dated_vehicle_journey_ref
            .as_deref()
            .or(self.vehicle_ref.as_deref())
    }

    /// True if the journey carries the freight service-feature tag.
    pub fn is_freight(&self) -> bool {
        self.service_feature_refs
            .iter()
            .any(|f| f == FREIGHT_SERVICE_FEATURE)
    }

    /// All stop refs touched by the journey, recorded portion first.
    pub fn stop_refs(&self) -> impl Iterator<Item = &StopRef> {
        self.recorded_calls
            .iter()
            .map(|c| &c.stop_point_ref)
            .chain(self.estimated_calls.iter().map(|c| &c.stop_point_ref))
    }
}

/// One period during which a situation applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityPeriod {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// A vehicle journey affected by a situation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedJourney {
    pub vehicle_journey_ref: Option<String>,
    pub line_ref: Option<String>,

    /// Route stop points in order. Complete when `affected_only` is false;
    /// otherwise only the stops the notice singles out.
    #[serde(default)]
    pub route_stop_refs: Vec<StopRef>,

    #[serde(default)]
    pub affected_only: bool,
}

/// The scope a situation applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affects {
    #[serde(default)]
    pub stop_points: Vec<StopRef>,

    #[serde(default)]
    pub stop_places: Vec<StopRef>,

    #[serde(default)]
    pub vehicle_journeys: Vec<AffectedJourney>,
}

/// A situation-exchange disruption notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SituationNotice {
    /// Codespace of the participant that issued the notice.
    pub participant_ref: Option<String>,

    pub situation_number: String,

    /// Workflow progress, e.g. "open" or "closed".
    pub progress: Option<String>,

    pub summary: Option<String>,
    pub description: Option<String>,

    #[serde(default)]
    pub validity_periods: Vec<ValidityPeriod>,

    #[serde(default)]
    pub affects: Affects,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freight_detection() {
        let mut journey = EstimatedVehicleJourney {
            line_ref: None,
            dated_vehicle_journey_ref: None,
            vehicle_ref: None,
            operator_ref: None,
            data_source: None,
            cancellation: false,
            service_feature_refs: vec![],
            recorded_calls: vec![],
            estimated_calls: vec![],
        };
        assert!(!journey.is_freight());

        journey.service_feature_refs = vec!["passengerTrain".to_string()];
        assert!(!journey.is_freight());

        journey.service_feature_refs.push("freightTrain".to_string());
        assert!(journey.is_freight());
    }

    #[test]
    fn journey_key_prefers_dated_ref() {
        let mut journey = EstimatedVehicleJourney {
            line_ref: None,
            dated_vehicle_journey_ref: Some("2026-08-05:1234".to_string()),
            vehicle_ref: Some("1234".to_string()),
            operator_ref: None,
            data_source: None,
            cancellation: false,
            service_feature_refs: vec![],
            recorded_calls: vec![],
            estimated_calls: vec![],
        };
        assert_eq!(journey.journey_key(), Some("2026-08-05:1234"));

        journey.dated_vehicle_journey_ref = None;
        assert_eq!(journey.journey_key(), Some("1234"));

        journey.vehicle_ref = None;
        assert_eq!(journey.journey_key(), None);
    }

    #[test]
    fn reassignment_requires_both_quays() {
        let assignment = StopAssignment {
            aimed_quay_ref: Some("NSR:Quay:1".to_string()),
            expected_quay_ref: None,
        };
        assert!(!assignment.is_reassigned());

        let assignment = StopAssignment {
            aimed_quay_ref: Some("NSR:Quay:1".to_string()),
            expected_quay_ref: Some("NSR:Quay:2".to_string()),
        };
        assert!(assignment.is_reassigned());

        let assignment = StopAssignment {
            aimed_quay_ref: Some("NSR:Quay:1".to_string()),
            expected_quay_ref: Some("NSR:Quay:1".to_string()),
        };
        assert!(!assignment.is_reassigned());
    }

    #[test]
    fn estimated_call_deserializes_with_defaults() {
        let call: EstimatedCall = serde_json::from_str(
            r#"{"stopPointRef": "NSR:Quay:1", "aimedDepartureTime": "2026-08-05T10:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(call.stop_point_ref.as_str(), "NSR:Quay:1");
        assert!(!call.cancellation);
        assert!(call.expected_departure_time.is_none());
        assert_eq!(
            call.reference_time(),
            call.aimed_departure_time,
        );
    }
}
