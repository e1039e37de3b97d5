//! Inbound feed message shapes and the processing entry point.
//!
//! The wire layer (SIRI XML parsing, queue plumbing) is owned elsewhere;
//! these types define the shape a message has by the time it reaches the
//! matcher, and `FeedHandler` is the plain handler function any consumption
//! mechanism invokes.

mod handler;
mod types;

pub use handler::FeedHandler;
pub use types::{
    AffectedJourney, Affects, ArrivalBoardingActivity, CallStatus, DepartureBoardingActivity,
    EstimatedCall, EstimatedVehicleJourney, RecordedCall, SituationNotice, StopAssignment,
    ValidityPeriod,
};
