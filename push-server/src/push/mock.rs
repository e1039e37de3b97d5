//! Mock push gateway for testing without a network.
//!
//! Records every delivery and replays scripted outcomes: queued outcomes
//! are consumed first, then the default applies.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{PushError, PushGateway, PushOutcome};

pub struct MockPushGateway {
    default_outcome: PushOutcome,
    queued: Mutex<VecDeque<PushOutcome>>,
    deliveries: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MockPushGateway {
    /// A gateway where every delivery succeeds.
    pub fn delivering() -> Self {
        Self::with_default(PushOutcome::Delivered)
    }

    /// A gateway where every delivery fails with a 500.
    pub fn failing() -> Self {
        Self::with_default(PushOutcome::Failed { status: Some(500) })
    }

    pub fn with_default(default_outcome: PushOutcome) -> Self {
        Self {
            default_outcome,
            queued: Mutex::new(VecDeque::new()),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    /// Queue outcomes to be returned before the default kicks in.
    pub fn queue(&self, outcomes: impl IntoIterator<Item = PushOutcome>) {
        self.queued.lock().unwrap().extend(outcomes);
    }

    /// Every delivery attempt so far, in order.
    pub fn deliveries(&self) -> Vec<(String, serde_json::Value)> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }
}

#[async_trait]
impl PushGateway for MockPushGateway {
    async fn deliver(
        &self,
        address: &str,
        body: &serde_json::Value,
    ) -> Result<PushOutcome, PushError> {
        self.deliveries
            .lock()
            .unwrap()
            .push((address.to_string(), body.clone()));

        let outcome = self
            .queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_outcome);
        Ok(outcome)
    }
}
