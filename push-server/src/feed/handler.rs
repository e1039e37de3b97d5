//! Feed message processing.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::debug;

use crate::domain::Subscription;
use crate::matching::{
    ExtractConfig, StopSnapshot, extract_deviations, match_estimated_journey, match_situation,
};
use crate::push::{JourneyAlert, Notification, PushEngine};
use crate::stops::StopAliases;
use crate::store::{LiveJourney, LiveJourneyStore, SubscriptionStore};

use super::{EstimatedVehicleJourney, SituationNotice};

/// Processes one feed message end to end: extract, match, record, deliver.
///
/// Has no opinion about where messages come from; a queue poll loop, an
/// HTTP handler, or a stream consumer all invoke the same entry points.
pub struct FeedHandler {
    store: Arc<dyn SubscriptionStore>,
    live: Arc<LiveJourneyStore>,
    aliases: StopAliases,
    engine: Arc<PushEngine>,
    extract: ExtractConfig,
}

impl FeedHandler {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        live: Arc<LiveJourneyStore>,
        aliases: StopAliases,
        engine: Arc<PushEngine>,
        extract: ExtractConfig,
    ) -> Self {
        Self {
            store,
            live,
            aliases,
            engine,
            extract,
        }
    }

    /// Process one estimated-timetable update.
    pub async fn handle_et(&self, journey: EstimatedVehicleJourney) {
        if journey.is_freight() {
            debug!(
                journey = journey.journey_key().unwrap_or("-"),
                "skipping freight journey"
            );
            return;
        }

        let now = Utc::now();
        let deviations = extract_deviations(&journey, now, &self.extract);
        let aliases = self.aliases.snapshot().await;
        let snapshot = StopSnapshot::from_journey(&journey, &aliases);
        let outcome = match_estimated_journey(
            self.store.as_ref(),
            &aliases,
            &journey,
            &deviations,
            &snapshot,
        );

        // Record the call sequence for later disruption matching.
        if let Some(journey_ref) = journey.journey_key()
            && let Some(entry) = LiveJourney::from_journey(&journey)
        {
            self.live.put(journey_ref, entry);
        }

        let mut targets: Vec<(Subscription, Notification)> = outcome
            .stop_matched
            .into_iter()
            .map(|subscription| {
                let alert = JourneyAlert::for_subscription(
                    &subscription,
                    &journey,
                    &deviations,
                    &aliases,
                );
                (subscription, Notification::JourneyAlert(alert))
            })
            .collect();
        targets.extend(
            outcome
                .full_matched
                .into_iter()
                .map(|subscription| (subscription, Notification::EstimatedJourney(journey.clone()))),
        );

        join_all(
            targets
                .iter()
                .map(|(subscription, notification)| self.engine.submit(subscription, notification)),
        )
        .await;
    }

    /// Process one situation-exchange notice.
    pub async fn handle_sx(&self, notice: SituationNotice) {
        let now = Utc::now();
        let aliases = self.aliases.snapshot().await;
        let matched = match_situation(self.store.as_ref(), &aliases, &self.live, &notice, now);

        let notification = Notification::Situation(notice);
        join_all(
            matched
                .iter()
                .map(|subscription| self.engine.submit(subscription, &notification)),
        )
        .await;
    }
}
