//! Notification payloads.
//!
//! What actually lands on a subscriber's webhook: either a per-stop
//! deviation summary for stop-scoped subscriptions, or the full original
//! message for line- and codespace-wide ones. Summaries are built per
//! subscription, restricted to the stops and deviation kinds that
//! subscription declared, which is also what the dedup fingerprint hashes.

use serde::Serialize;

use crate::domain::{Deviation, DeviationType, StopRef, Subscription};
use crate::feed::{EstimatedVehicleJourney, SituationNotice};
use crate::stops::AliasSnapshot;

/// One deviation as presented to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviationSummary {
    pub stop_ref: StopRef,
    pub cancelled: bool,
    pub track_change: bool,
    pub delayed_arrival: bool,
    pub delayed_departure: bool,
    pub delay_seconds: Option<i64>,
}

/// Stop-scoped summary of one journey update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyAlert {
    pub line_ref: Option<String>,
    pub vehicle_ref: Option<String>,
    pub dated_vehicle_journey_ref: Option<String>,
    pub data_source: Option<String>,
    pub deviations: Vec<DeviationSummary>,
}

impl JourneyAlert {
    /// Build the summary for one subscription.
    ///
    /// Stop-scoped subscriptions only see deviations at their declared
    /// stops (alias-resolved); subscriptions wanting a specific deviation
    /// kind only see that kind. A deviation whose every relevant flag is
    /// filtered away is dropped entirely.
    pub fn for_subscription(
        subscription: &Subscription,
        journey: &EstimatedVehicleJourney,
        deviations: &[Deviation],
        aliases: &AliasSnapshot,
    ) -> Self {
        let deviations = deviations
            .iter()
            .filter(|d| {
                !subscription.is_stop_scoped()
                    || subscription
                        .stops()
                        .any(|declared| aliases.same_stop(&d.stop, declared))
            })
            .filter_map(|d| summarize(subscription.deviation_type, d))
            .collect();

        Self {
            line_ref: journey.line_ref.clone(),
            vehicle_ref: journey.vehicle_ref.clone(),
            dated_vehicle_journey_ref: journey.dated_vehicle_journey_ref.clone(),
            data_source: journey.data_source.clone(),
            deviations,
        }
    }
}

fn summarize(wanted: DeviationType, deviation: &Deviation) -> Option<DeviationSummary> {
    let kinds = deviation.kinds;
    let summary = match wanted {
        DeviationType::All => DeviationSummary {
            stop_ref: deviation.stop.clone(),
            cancelled: kinds.cancelled,
            track_change: kinds.track_change,
            delayed_arrival: kinds.delayed_arrival,
            delayed_departure: kinds.delayed_departure,
            delay_seconds: deviation.delay.map(|d| d.num_seconds()),
        },
        DeviationType::Delayed => DeviationSummary {
            stop_ref: deviation.stop.clone(),
            cancelled: false,
            track_change: false,
            delayed_arrival: kinds.delayed_arrival,
            delayed_departure: kinds.delayed_departure,
            delay_seconds: deviation.delay.map(|d| d.num_seconds()),
        },
        DeviationType::Cancelled => DeviationSummary {
            stop_ref: deviation.stop.clone(),
            cancelled: kinds.cancelled,
            track_change: false,
            delayed_arrival: false,
            delayed_departure: false,
            delay_seconds: None,
        },
        DeviationType::TrackChange => DeviationSummary {
            stop_ref: deviation.stop.clone(),
            cancelled: false,
            track_change: kinds.track_change,
            delayed_arrival: false,
            delayed_departure: false,
            delay_seconds: None,
        },
    };

    let relevant = summary.cancelled
        || summary.track_change
        || summary.delayed_arrival
        || summary.delayed_departure;
    relevant.then_some(summary)
}

/// A payload addressed to one subscriber.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "messageType", rename_all = "camelCase")]
pub enum Notification {
    /// Per-stop deviation summary for stop-scoped subscriptions.
    JourneyAlert(JourneyAlert),
    /// The full journey update for line- and codespace-wide subscriptions.
    EstimatedJourney(EstimatedVehicleJourney),
    /// The full disruption notice.
    Situation(SituationNotice),
}
