//! Direction validation.
//!
//! A subscription that declares both origin and destination stops only
//! matches a journey when a declared origin is genuinely reached before a
//! declared destination on that journey. Absence of either stop, equal or
//! reversed order, or a boarding/alighting exclusion is a normal "not
//! valid" outcome, never an error.
//!
//! Candidate sets are scanned in declaration order and the first usable
//! candidate wins. This makes the result sensitive to the order subscribers
//! declared their stops in; that sensitivity is documented behavior, kept
//! explicit here rather than left to incidental set iteration order.

use chrono::{DateTime, Utc};

use crate::domain::StopRef;
use crate::feed::{ArrivalBoardingActivity, CallStatus, DepartureBoardingActivity};
use crate::stops::AliasSnapshot;

use super::StopSnapshot;

/// Reference time of the first "from" candidate present in the snapshot
/// that can be boarded.
///
/// A candidate is rejected when its departure status is present and not
/// cancelled while its departure boarding activity is present and is not
/// boarding.
pub fn first_usable_from(
    snapshot: &StopSnapshot,
    candidates: &[StopRef],
) -> Option<DateTime<Utc>> {
    candidates.iter().find_map(|candidate| {
        let entry = snapshot.get(candidate)?;
        let boardable = !(entry
            .departure_status
            .is_some_and(|s| s != CallStatus::Cancelled)
            && entry
                .departure_activity
                .is_some_and(|a| a != DepartureBoardingActivity::Boarding));
        boardable.then_some(entry.time)
    })
}

/// Reference time of the first "to" candidate present in the snapshot that
/// can be alighted at. Symmetric to [`first_usable_from`] using arrival
/// status and activity.
pub fn first_usable_to(snapshot: &StopSnapshot, candidates: &[StopRef]) -> Option<DateTime<Utc>> {
    candidates.iter().find_map(|candidate| {
        let entry = snapshot.get(candidate)?;
        let alightable = !(entry
            .arrival_status
            .is_some_and(|s| s != CallStatus::Cancelled)
            && entry
                .arrival_activity
                .is_some_and(|a| a != ArrivalBoardingActivity::Alighting));
        alightable.then_some(entry.time)
    })
}

/// True when a usable origin is reached strictly before a usable
/// destination on this journey.
pub fn valid_direction(snapshot: &StopSnapshot, from: &[StopRef], to: &[StopRef]) -> bool {
    match (
        first_usable_from(snapshot, from),
        first_usable_to(snapshot, to),
    ) {
        (Some(from_time), Some(to_time)) => from_time < to_time,
        _ => false,
    }
}

/// Ordered-list variant for disruption matching against an explicit
/// affected-stop sequence.
///
/// Boarding/alighting activity is not available in this representation and
/// is ignored; the rule degrades to index ordering. Alias resolution still
/// applies, so a subscription declared at stop-place granularity matches a
/// route listed at quay granularity and vice versa.
pub fn valid_direction_in_route(
    route: &[StopRef],
    from: &[StopRef],
    to: &[StopRef],
    aliases: &AliasSnapshot,
) -> bool {
    match (
        first_route_index(route, from, aliases),
        first_route_index(route, to, aliases),
    ) {
        (Some(from_idx), Some(to_idx)) => from_idx < to_idx,
        _ => false,
    }
}

/// First route index holding any of the candidates, directly or via alias.
fn first_route_index(
    route: &[StopRef],
    candidates: &[StopRef],
    aliases: &AliasSnapshot,
) -> Option<usize> {
    route
        .iter()
        .position(|stop| candidates.iter().any(|c| aliases.same_stop(stop, c)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{EstimatedCall, EstimatedVehicleJourney};
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn t(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 10, minute, 0).unwrap()
    }

    fn stop(id: &str) -> StopRef {
        StopRef::new(id)
    }

    fn call(id: &str, departure_minute: u32) -> EstimatedCall {
        EstimatedCall {
            stop_point_ref: id.into(),
            cancellation: false,
            aimed_arrival_time: None,
            expected_arrival_time: None,
            aimed_departure_time: Some(t(departure_minute)),
            expected_departure_time: None,
            arrival_status: None,
            departure_status: None,
            arrival_boarding_activity: None,
            departure_boarding_activity: None,
            arrival_stop_assignment: None,
            departure_stop_assignment: None,
        }
    }

    fn snapshot_of(calls: Vec<EstimatedCall>) -> StopSnapshot {
        let journey = EstimatedVehicleJourney {
            line_ref: None,
            dated_vehicle_journey_ref: None,
            vehicle_ref: None,
            operator_ref: None,
            data_source: None,
            cancellation: false,
            service_feature_refs: vec![],
            recorded_calls: vec![],
            estimated_calls: calls,
        };
        StopSnapshot::from_journey(&journey, &AliasSnapshot::default())
    }

    #[test]
    fn forward_direction_is_valid_and_reverse_is_not() {
        let snapshot = snapshot_of(vec![call("NSR:Quay:A", 0), call("NSR:Quay:B", 10)]);
        let a = vec![stop("NSR:Quay:A")];
        let b = vec![stop("NSR:Quay:B")];

        assert!(valid_direction(&snapshot, &a, &b));
        assert!(!valid_direction(&snapshot, &b, &a));
    }

    #[test]
    fn missing_stop_fails_closed() {
        let snapshot = snapshot_of(vec![call("NSR:Quay:A", 0)]);

        assert!(!valid_direction(
            &snapshot,
            &[stop("NSR:Quay:A")],
            &[stop("NSR:Quay:X")]
        ));
        assert!(!valid_direction(
            &snapshot,
            &[stop("NSR:Quay:X")],
            &[stop("NSR:Quay:A")]
        ));
    }

    #[test]
    fn equal_times_are_not_valid() {
        let snapshot = snapshot_of(vec![call("NSR:Quay:A", 5), call("NSR:Quay:B", 5)]);

        assert!(!valid_direction(
            &snapshot,
            &[stop("NSR:Quay:A")],
            &[stop("NSR:Quay:B")]
        ));
    }

    #[test]
    fn non_boarding_from_candidate_is_skipped() {
        let mut blocked = call("NSR:Quay:A", 0);
        blocked.departure_status = Some(CallStatus::OnTime);
        blocked.departure_boarding_activity = Some(DepartureBoardingActivity::NoBoarding);

        let snapshot = snapshot_of(vec![blocked, call("NSR:Quay:B", 10), call("NSR:Quay:C", 20)]);

        // A cannot be boarded; the scan continues to B.
        let found = first_usable_from(&snapshot, &[stop("NSR:Quay:A"), stop("NSR:Quay:B")]);
        assert_eq!(found, Some(t(10)));

        // With A as the only candidate, direction fails closed.
        assert!(!valid_direction(
            &snapshot,
            &[stop("NSR:Quay:A")],
            &[stop("NSR:Quay:C")]
        ));
    }

    #[test]
    fn cancelled_departure_status_does_not_exclude() {
        // Rejection requires a live status together with a non-boarding
        // activity; a cancelled status leaves the candidate usable.
        let mut cancelled = call("NSR:Quay:A", 0);
        cancelled.departure_status = Some(CallStatus::Cancelled);
        cancelled.departure_boarding_activity = Some(DepartureBoardingActivity::NoBoarding);

        let snapshot = snapshot_of(vec![cancelled, call("NSR:Quay:B", 10)]);
        assert!(valid_direction(
            &snapshot,
            &[stop("NSR:Quay:A")],
            &[stop("NSR:Quay:B")]
        ));
    }

    #[test]
    fn non_alighting_to_candidate_is_skipped() {
        let mut blocked = call("NSR:Quay:B", 10);
        blocked.arrival_status = Some(CallStatus::OnTime);
        blocked.arrival_boarding_activity = Some(ArrivalBoardingActivity::NoAlighting);

        let snapshot = snapshot_of(vec![call("NSR:Quay:A", 0), blocked]);
        assert!(!valid_direction(
            &snapshot,
            &[stop("NSR:Quay:A")],
            &[stop("NSR:Quay:B")]
        ));
    }

    #[test]
    fn declaration_order_decides_among_candidates() {
        let snapshot = snapshot_of(vec![
            call("NSR:Quay:A", 0),
            call("NSR:Quay:B", 10),
            call("NSR:Quay:C", 20),
        ]);

        // B declared before A: B's time wins, so B→C is the pair examined.
        let from = vec![stop("NSR:Quay:B"), stop("NSR:Quay:A")];
        assert_eq!(first_usable_from(&snapshot, &from), Some(t(10)));
        assert!(valid_direction(&snapshot, &from, &[stop("NSR:Quay:C")]));
        // ...and B declared first also means A→B no longer validates when B
        // is the from-candidate and A the to-candidate.
        assert!(!valid_direction(&snapshot, &from, &[stop("NSR:Quay:A")]));
    }

    #[test]
    fn route_variant_orders_by_index() {
        let route = vec![stop("NSR:Quay:A"), stop("NSR:Quay:B"), stop("NSR:Quay:C")];
        let aliases = AliasSnapshot::default();

        assert!(valid_direction_in_route(
            &route,
            &[stop("NSR:Quay:A")],
            &[stop("NSR:Quay:C")],
            &aliases
        ));
        assert!(!valid_direction_in_route(
            &route,
            &[stop("NSR:Quay:C")],
            &[stop("NSR:Quay:A")],
            &aliases
        ));
        assert!(!valid_direction_in_route(
            &route,
            &[stop("NSR:Quay:A")],
            &[stop("NSR:Quay:X")],
            &aliases
        ));
    }

    #[test]
    fn route_variant_resolves_aliases() {
        let aliases = AliasSnapshot::from_pairs(HashMap::from([
            (stop("NSR:Quay:1"), stop("NSR:StopPlace:100")),
            (stop("NSR:Quay:2"), stop("NSR:StopPlace:200")),
        ]));
        let route = vec![stop("NSR:Quay:1"), stop("NSR:Quay:2")];

        // Subscription declared at stop-place granularity.
        assert!(valid_direction_in_route(
            &route,
            &[stop("NSR:StopPlace:100")],
            &[stop("NSR:StopPlace:200")],
            &aliases
        ));
        assert!(!valid_direction_in_route(
            &route,
            &[stop("NSR:StopPlace:200")],
            &[stop("NSR:StopPlace:100")],
            &aliases
        ));
    }
}
