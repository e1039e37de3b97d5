//! Subscription matching for situation-exchange notices.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::{MessageKind, StopRef, Subscription, SubscriptionId};
use crate::feed::SituationNotice;
use crate::stops::AliasSnapshot;
use crate::store::{LiveJourneyStore, SubscriptionStore};

use super::valid_direction_in_route;

/// Notices whose validity lies entirely beyond this horizon are deferred:
/// the feed will redeliver them closer to relevance.
const DEFERRAL_HORIZON: Duration = Duration::hours(24);

/// Match one disruption notice against the subscription index.
///
/// Every match receives the full notice, so the outcome is a single set
/// keyed by subscription identity.
pub fn match_situation(
    store: &dyn SubscriptionStore,
    aliases: &AliasSnapshot,
    live: &LiveJourneyStore,
    notice: &SituationNotice,
    now: DateTime<Utc>,
) -> Vec<Subscription> {
    if is_deferred(notice, now) {
        debug!(
            situation = %notice.situation_number,
            "deferring situation valid only beyond the delivery horizon"
        );
        return Vec::new();
    }

    let participant = notice.participant_ref.as_deref();
    let mut matched: BTreeMap<SubscriptionId, Subscription> = BTreeMap::new();
    let admit = |subscription: Subscription,
                 matched: &mut BTreeMap<SubscriptionId, Subscription>| {
        if subscription.message_kind == MessageKind::SituationExchange
            && passes_participant(&subscription, participant)
            && !matched.contains_key(&subscription.id)
        {
            matched.insert(subscription.id.clone(), subscription);
        }
    };

    // Directly named stops are in scope unconditionally: no line, vehicle,
    // or direction constraint applies to them.
    for stop in notice
        .affects
        .stop_points
        .iter()
        .chain(notice.affects.stop_places.iter())
    {
        for subscription in candidates_for_stop(store, aliases, stop) {
            admit(subscription, &mut matched);
        }
    }

    for journey in &notice.affects.vehicle_journeys {
        let complete_route = resolve_route(journey, live);

        match complete_route {
            Some(route) => {
                for stop in &route {
                    if !stop.is_national() {
                        continue;
                    }
                    for subscription in candidates_for_stop(store, aliases, stop) {
                        if !subscription.matches_line(journey.line_ref.as_deref()) {
                            continue;
                        }
                        if subscription.needs_direction_check()
                            && !valid_direction_in_route(
                                &route,
                                &subscription.from_stops,
                                &subscription.to_stops,
                                aliases,
                            )
                        {
                            continue;
                        }
                        admit(subscription, &mut matched);
                    }
                }
            }
            None => {
                // No usable ordering exists: match everything on the named
                // stops rather than silently dropping the notice.
                debug!(
                    situation = %notice.situation_number,
                    journey = journey.vehicle_journey_ref.as_deref().unwrap_or("-"),
                    "no live route for partial stop list, matching loosely"
                );
                for stop in &journey.route_stop_refs {
                    for subscription in candidates_for_stop(store, aliases, stop) {
                        admit(subscription, &mut matched);
                    }
                }
            }
        }

        // Line-wide subscribers (no stop constraint) on this journey's line.
        if let Some(line) = journey.line_ref.as_deref() {
            for subscription in store.find_by_line(line) {
                if !subscription.is_stop_scoped() {
                    admit(subscription, &mut matched);
                }
            }
        }
    }

    let matched: Vec<Subscription> = matched.into_values().collect();
    debug!(
        situation = %notice.situation_number,
        matched = matched.len(),
        "matched situation notice"
    );
    matched
}

/// A notice is deferred when it has validity periods and every one of them
/// starts more than 24 hours from now.
fn is_deferred(notice: &SituationNotice, now: DateTime<Utc>) -> bool {
    let horizon = now + DEFERRAL_HORIZON;
    !notice.validity_periods.is_empty()
        && notice
            .validity_periods
            .iter()
            .all(|p| p.start_time.is_some_and(|start| start > horizon))
}

/// The participant/codespace rule: a named participant admits subscriptions
/// with no codespace filter or one containing it; an anonymous notice only
/// admits unfiltered subscriptions.
fn passes_participant(subscription: &Subscription, participant: Option<&str>) -> bool {
    match participant {
        Some(participant) => {
            subscription.codespaces.is_empty() || subscription.codespaces.contains(participant)
        }
        None => subscription.codespaces.is_empty(),
    }
}

/// The ordered stop list to validate direction against, when one exists.
///
/// A route the notice claims complete is used as given. A partial
/// (affected-only) list with a journey reference falls back to the live
/// journey's persisted call sequence.
fn resolve_route(
    journey: &crate::feed::AffectedJourney,
    live: &LiveJourneyStore,
) -> Option<Vec<StopRef>> {
    if !journey.affected_only && !journey.route_stop_refs.is_empty() {
        return Some(journey.route_stop_refs.clone());
    }
    journey
        .vehicle_journey_ref
        .as_deref()
        .and_then(|journey_ref| live.get(journey_ref))
        .map(|entry| entry.stop_refs())
}

/// Subscriptions registered on a stop under any granularity it resolves to.
///
/// Notices name stops at both granularities, so a stop place is expanded to
/// its quays as well as the other way around. Only national identifiers are
/// consulted.
fn candidates_for_stop(
    store: &dyn SubscriptionStore,
    aliases: &AliasSnapshot,
    stop: &StopRef,
) -> Vec<Subscription> {
    let mut lookups: Vec<StopRef> = Vec::new();
    if stop.is_national() {
        lookups.push(stop.clone());
    }
    if let Some(parent) = aliases.quay_to_parent(stop)
        && parent.is_national()
    {
        lookups.push(parent.clone());
    }
    for quay in aliases.parent_to_quays(stop) {
        if quay.is_national() {
            lookups.push(quay.clone());
        }
    }

    let mut seen: HashSet<SubscriptionId> = HashSet::new();
    let mut candidates = Vec::new();
    for lookup in &lookups {
        for subscription in store.find(lookup) {
            if seen.insert(subscription.id.clone()) {
                candidates.push(subscription);
            }
        }
    }
    candidates
}
