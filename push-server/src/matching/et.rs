//! Subscription matching for estimated-timetable updates.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::domain::{Deviation, MessageKind, StopRef, Subscription, SubscriptionId};
use crate::feed::EstimatedVehicleJourney;
use crate::stops::AliasSnapshot;
use crate::store::SubscriptionStore;

use super::{StopSnapshot, valid_direction};

/// The notify-set for one journey update, partitioned by delivery group.
///
/// Stop-scoped subscriptions receive a per-stop deviation summary; line- and
/// codespace-wide subscriptions receive the full message. The groups are
/// disjoint: a subscription is stop-scoped or it is not.
#[derive(Debug, Default)]
pub struct EtMatchOutcome {
    pub stop_matched: Vec<Subscription>,
    pub full_matched: Vec<Subscription>,
}

impl EtMatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.stop_matched.is_empty() && self.full_matched.is_empty()
    }
}

/// Match one journey update against the subscription index.
///
/// `deviations` is the extractor's output for this journey and `snapshot`
/// the journey's stop snapshot. Freight journeys are excluded by the caller
/// before extraction.
pub fn match_estimated_journey(
    store: &dyn SubscriptionStore,
    aliases: &AliasSnapshot,
    journey: &EstimatedVehicleJourney,
    deviations: &[Deviation],
    snapshot: &StopSnapshot,
) -> EtMatchOutcome {
    let mut stop_matched: BTreeMap<SubscriptionId, Subscription> = BTreeMap::new();

    // Deviated stops: everything registered there that survives direction
    // validation and the filter chain.
    for deviation in deviations {
        for subscription in candidates_for_stop(store, aliases, &deviation.stop) {
            if stop_matched.contains_key(&subscription.id) {
                continue;
            }
            if !admit_stop_scoped(&subscription, journey, snapshot)
                || !subscription.passes_minimum_delay(deviation)
                || !subscription.wants_deviation(deviation.kinds)
            {
                continue;
            }
            stop_matched.insert(subscription.id.clone(), subscription);
        }
    }

    // Untouched stops: subscribers who asked for every update still get a
    // stop-scoped delivery even though nothing went wrong there.
    let deviated: HashSet<&StopRef> = deviations.iter().map(|d| &d.stop).collect();
    for stop in journey.stop_refs() {
        if deviated.contains(stop) {
            continue;
        }
        for subscription in candidates_for_stop(store, aliases, stop) {
            if stop_matched.contains_key(&subscription.id) {
                continue;
            }
            if subscription.push_all_data && admit_stop_scoped(&subscription, journey, snapshot) {
                stop_matched.insert(subscription.id.clone(), subscription);
            }
        }
    }

    // Line- and codespace-wide subscribers (no stop constraint) get the
    // full message. An uneventful journey only goes to those who asked for
    // every update.
    let mut full_matched: BTreeMap<SubscriptionId, Subscription> = BTreeMap::new();
    let mut wide_candidates = Vec::new();
    if let Some(line) = journey.line_ref.as_deref() {
        wide_candidates.extend(store.find_by_line(line));
    }
    if let Some(codespace) = journey.data_source.as_deref() {
        wide_candidates.extend(store.find_by_codespace(codespace));
    }
    for subscription in wide_candidates {
        if full_matched.contains_key(&subscription.id) || subscription.is_stop_scoped() {
            continue;
        }
        if subscription.message_kind != MessageKind::EstimatedTimetable
            || !matches_journey_scope(&subscription, journey)
        {
            continue;
        }
        if deviations.is_empty() && !subscription.push_all_data {
            continue;
        }
        full_matched.insert(subscription.id.clone(), subscription);
    }

    let outcome = EtMatchOutcome {
        stop_matched: stop_matched.into_values().collect(),
        full_matched: full_matched.into_values().collect(),
    };
    debug!(
        line = journey.line_ref.as_deref().unwrap_or("-"),
        journey = journey.journey_key().unwrap_or("-"),
        deviations = deviations.len(),
        stop_matched = outcome.stop_matched.len(),
        full_matched = outcome.full_matched.len(),
        "matched estimated-timetable update"
    );
    outcome
}

/// Subscriptions registered on a stop under either granularity.
///
/// Only national identifiers are consulted; foreign and operator-local ones
/// are ignored.
fn candidates_for_stop(
    store: &dyn SubscriptionStore,
    aliases: &AliasSnapshot,
    stop: &StopRef,
) -> Vec<Subscription> {
    let mut lookups: Vec<&StopRef> = Vec::with_capacity(2);
    if stop.is_national() {
        lookups.push(stop);
    }
    let parent = aliases.quay_to_parent(stop);
    if let Some(parent) = parent
        && parent.is_national()
        && Some(parent) != lookups.first().copied()
    {
        lookups.push(parent);
    }

    let mut seen: HashSet<SubscriptionId> = HashSet::new();
    let mut candidates = Vec::new();
    for lookup in lookups {
        for subscription in store.find(lookup) {
            if seen.insert(subscription.id.clone()) {
                candidates.push(subscription);
            }
        }
    }
    candidates
}

/// Message-kind, direction, and journey-scope gate for stop-scoped
/// candidates.
fn admit_stop_scoped(
    subscription: &Subscription,
    journey: &EstimatedVehicleJourney,
    snapshot: &StopSnapshot,
) -> bool {
    if subscription.message_kind != MessageKind::EstimatedTimetable {
        return false;
    }
    if subscription.needs_direction_check()
        && !valid_direction(snapshot, &subscription.from_stops, &subscription.to_stops)
    {
        return false;
    }
    matches_journey_scope(subscription, journey)
}

fn matches_journey_scope(subscription: &Subscription, journey: &EstimatedVehicleJourney) -> bool {
    subscription.matches_line(journey.line_ref.as_deref())
        && subscription.matches_vehicle(journey.vehicle_ref.as_deref())
        && subscription.matches_codespace(journey.data_source.as_deref())
}
