//! Application state for the web layer.

use std::sync::Arc;

use crate::feed::FeedHandler;
use crate::push::PushEngine;
use crate::store::{LiveJourneyStore, SubscriptionStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Feed message processor.
    pub handler: Arc<FeedHandler>,

    /// Subscription index, for the status endpoint.
    pub store: Arc<dyn SubscriptionStore>,

    /// Live-journey cache, for the status endpoint.
    pub live: Arc<LiveJourneyStore>,

    /// Delivery engine, for the in-flight gauge.
    pub engine: Arc<PushEngine>,
}

impl AppState {
    pub fn new(
        handler: Arc<FeedHandler>,
        store: Arc<dyn SubscriptionStore>,
        live: Arc<LiveJourneyStore>,
        engine: Arc<PushEngine>,
    ) -> Self {
        Self {
            handler,
            store,
            live,
            engine,
        }
    }
}
