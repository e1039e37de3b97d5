//! Deviation extraction from an estimated-timetable update.
//!
//! Pure over the journey, the current time, and the configuration; only
//! future calls are inspected unless the replay switch is set.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Deviation, DeviationKinds};
use crate::feed::{CallStatus, EstimatedCall, EstimatedVehicleJourney};

/// Extractor configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractConfig {
    /// Also inspect calls whose reference time is already in the past.
    /// Off in normal operation; used for replay and testing.
    pub include_past_calls: bool,
}

/// Extract the per-stop deviations from one journey update.
///
/// Each estimated call yields at most one [`Deviation`], evaluated in call
/// order:
///
/// 1. journey or call cancelled → cancelled, nothing else is computed;
/// 2. platform reassignment with differing aimed/expected tracks → track
///    change;
/// 3. delayed departure or arrival (status says so, or expected later than
///    aimed) → delayed, carrying the arrival delay magnitude when known.
///
/// An early arrival is never reported as delayed, and the magnitude is
/// absent when only an aimed time is available.
pub fn extract_deviations(
    journey: &EstimatedVehicleJourney,
    now: DateTime<Utc>,
    config: &ExtractConfig,
) -> Vec<Deviation> {
    journey
        .estimated_calls
        .iter()
        .filter(|call| config.include_past_calls || !is_past(call, now))
        .filter_map(|call| deviation_for_call(journey, call))
        .collect()
}

/// A call is past when its reference time (expected-or-aimed departure,
/// falling back to arrival) is before `now`. Calls with no time at all are
/// kept.
fn is_past(call: &EstimatedCall, now: DateTime<Utc>) -> bool {
    call.reference_time().is_some_and(|t| t < now)
}

fn deviation_for_call(
    journey: &EstimatedVehicleJourney,
    call: &EstimatedCall,
) -> Option<Deviation> {
    if journey.cancellation || call.cancellation {
        return Some(Deviation {
            stop: call.stop_point_ref.clone(),
            kinds: DeviationKinds {
                cancelled: true,
                ..Default::default()
            },
            delay: None,
        });
    }

    if call.stop_assignment().is_some_and(|a| a.is_reassigned()) {
        return Some(Deviation {
            stop: call.stop_point_ref.clone(),
            kinds: DeviationKinds {
                track_change: true,
                ..Default::default()
            },
            delay: None,
        });
    }

    let delayed_departure = call.departure_status == Some(CallStatus::Delayed)
        || is_later(call.expected_departure_time, call.aimed_departure_time);
    let delayed_arrival = call.arrival_status == Some(CallStatus::Delayed)
        || is_later(call.expected_arrival_time, call.aimed_arrival_time);

    if delayed_departure || delayed_arrival {
        return Some(Deviation {
            stop: call.stop_point_ref.clone(),
            kinds: DeviationKinds {
                delayed_departure,
                delayed_arrival,
                ..Default::default()
            },
            delay: arrival_delay(call),
        });
    }

    None
}

fn is_later(expected: Option<DateTime<Utc>>, aimed: Option<DateTime<Utc>>) -> bool {
    matches!((expected, aimed), (Some(e), Some(a)) if e > a)
}

/// Expected minus aimed arrival, only when both are present and expected is
/// strictly later.
fn arrival_delay(call: &EstimatedCall) -> Option<Duration> {
    match (call.expected_arrival_time, call.aimed_arrival_time) {
        (Some(expected), Some(aimed)) if expected > aimed => Some(expected - aimed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 10, minute, 0).unwrap()
    }

    fn call(stop: &str) -> EstimatedCall {
        EstimatedCall {
            stop_point_ref: stop.into(),
            cancellation: false,
            aimed_arrival_time: None,
            expected_arrival_time: None,
            aimed_departure_time: None,
            expected_departure_time: None,
            arrival_status: None,
            departure_status: None,
            arrival_boarding_activity: None,
            departure_boarding_activity: None,
            arrival_stop_assignment: None,
            departure_stop_assignment: None,
        }
    }

    fn journey(calls: Vec<EstimatedCall>) -> EstimatedVehicleJourney {
        EstimatedVehicleJourney {
            line_ref: Some("L1".to_string()),
            dated_vehicle_journey_ref: Some("J1".to_string()),
            vehicle_ref: Some("1234".to_string()),
            operator_ref: None,
            data_source: Some("C1".to_string()),
            cancellation: false,
            service_feature_refs: vec![],
            recorded_calls: vec![],
            estimated_calls: calls,
        }
    }

    #[test]
    fn journey_cancellation_marks_every_future_call() {
        let mut c1 = call("NSR:Quay:1");
        c1.aimed_departure_time = Some(t(30));
        let mut c2 = call("NSR:Quay:2");
        c2.aimed_arrival_time = Some(t(40));

        let mut j = journey(vec![c1, c2]);
        j.cancellation = true;

        let deviations = extract_deviations(&j, t(0), &ExtractConfig::default());
        assert_eq!(deviations.len(), 2);
        assert!(deviations.iter().all(|d| d.kinds.cancelled));
        assert!(deviations.iter().all(|d| d.delay.is_none()));
    }

    #[test]
    fn cancelled_call_suppresses_other_kinds() {
        let mut c = call("NSR:Quay:1");
        c.cancellation = true;
        c.aimed_arrival_time = Some(t(30));
        c.expected_arrival_time = Some(t(45));

        let deviations = extract_deviations(&journey(vec![c]), t(0), &ExtractConfig::default());
        assert_eq!(deviations.len(), 1);
        assert!(deviations[0].kinds.cancelled);
        assert!(!deviations[0].kinds.delayed_arrival);
        assert!(deviations[0].delay.is_none());
    }

    #[test]
    fn track_change_on_differing_quays() {
        let mut c = call("NSR:Quay:1");
        c.aimed_departure_time = Some(t(30));
        c.arrival_stop_assignment = Some(crate::feed::StopAssignment {
            aimed_quay_ref: Some("NSR:Quay:1".to_string()),
            expected_quay_ref: Some("NSR:Quay:2".to_string()),
        });

        let deviations = extract_deviations(&journey(vec![c]), t(0), &ExtractConfig::default());
        assert_eq!(deviations.len(), 1);
        assert!(deviations[0].kinds.track_change);
    }

    #[test]
    fn delayed_arrival_with_magnitude() {
        let mut c = call("NSR:Quay:1");
        c.aimed_arrival_time = Some(t(30));
        c.expected_arrival_time = Some(t(36));

        let deviations = extract_deviations(&journey(vec![c]), t(0), &ExtractConfig::default());
        assert_eq!(deviations.len(), 1);
        assert!(deviations[0].kinds.delayed_arrival);
        assert!(!deviations[0].kinds.delayed_departure);
        assert_eq!(deviations[0].delay, Some(Duration::minutes(6)));
    }

    #[test]
    fn delayed_status_without_times_has_unknown_magnitude() {
        let mut c = call("NSR:Quay:1");
        c.aimed_departure_time = Some(t(30));
        c.departure_status = Some(CallStatus::Delayed);

        let deviations = extract_deviations(&journey(vec![c]), t(0), &ExtractConfig::default());
        assert_eq!(deviations.len(), 1);
        assert!(deviations[0].kinds.delayed_departure);
        assert_eq!(deviations[0].delay, None);
    }

    #[test]
    fn early_arrival_is_not_a_delay() {
        let mut c = call("NSR:Quay:1");
        c.aimed_arrival_time = Some(t(30));
        c.expected_arrival_time = Some(t(25));
        c.aimed_departure_time = Some(t(31));

        let deviations = extract_deviations(&journey(vec![c]), t(0), &ExtractConfig::default());
        assert!(deviations.is_empty());
    }

    #[test]
    fn past_calls_are_skipped_unless_replaying() {
        let mut past = call("NSR:Quay:1");
        past.aimed_departure_time = Some(t(10));
        past.expected_departure_time = Some(t(15));
        let mut future = call("NSR:Quay:2");
        future.aimed_departure_time = Some(t(40));
        future.expected_departure_time = Some(t(45));

        let j = journey(vec![past, future]);
        let now = t(20);

        let live = extract_deviations(&j, now, &ExtractConfig::default());
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].stop.as_str(), "NSR:Quay:2");

        let replay = extract_deviations(
            &j,
            now,
            &ExtractConfig {
                include_past_calls: true,
            },
        );
        assert_eq!(replay.len(), 2);
    }

    #[test]
    fn on_time_journey_yields_nothing() {
        let mut c = call("NSR:Quay:1");
        c.aimed_departure_time = Some(t(30));
        c.expected_departure_time = Some(t(30));

        let deviations = extract_deviations(&journey(vec![c]), t(0), &ExtractConfig::default());
        assert!(deviations.is_empty());
    }
}
