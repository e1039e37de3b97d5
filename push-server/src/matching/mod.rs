//! Subscription matching.
//!
//! The pipeline for one message: extract per-stop deviations (estimated
//! timetable only), build a message-local stop snapshot, then run the
//! matcher for the message kind against the subscription index. Every step
//! here is a pure function over message-local data; shared state lives in
//! the stores.

mod direction;
mod et;
mod extract;
mod snapshot;
mod sx;

pub use direction::{first_usable_from, first_usable_to, valid_direction, valid_direction_in_route};
pub use et::{EtMatchOutcome, match_estimated_journey};
pub use extract::{ExtractConfig, extract_deviations};
pub use snapshot::{StopSnapshot, StopTimes};
pub use sx::match_situation;
