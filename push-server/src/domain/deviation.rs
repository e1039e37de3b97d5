//! Per-stop deviation types.

use chrono::Duration;

use super::StopRef;

/// The deviation kinds detected at one stop.
///
/// A call yields at most one `Deviation`, but a delayed call may carry both
/// the arrival and departure flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviationKinds {
    pub cancelled: bool,
    pub track_change: bool,
    pub delayed_departure: bool,
    pub delayed_arrival: bool,
}

impl DeviationKinds {
    /// True if no kind was detected.
    pub fn is_empty(&self) -> bool {
        !(self.cancelled || self.track_change || self.delayed_departure || self.delayed_arrival)
    }

    /// True if either the arrival or the departure is delayed.
    pub fn is_delay(&self) -> bool {
        self.delayed_departure || self.delayed_arrival
    }
}

/// A detected abnormal condition at one stop on one journey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deviation {
    pub stop: StopRef,
    pub kinds: DeviationKinds,
    /// Arrival delay magnitude. Absent when unknown, e.g. when only an
    /// aimed time is available without an expected time.
    pub delay: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_kinds() {
        assert!(DeviationKinds::default().is_empty());
        assert!(!DeviationKinds::default().is_delay());
    }

    #[test]
    fn delay_kinds() {
        let arrival = DeviationKinds {
            delayed_arrival: true,
            ..Default::default()
        };
        assert!(arrival.is_delay());
        assert!(!arrival.is_empty());

        let departure = DeviationKinds {
            delayed_departure: true,
            ..Default::default()
        };
        assert!(departure.is_delay());

        let cancelled = DeviationKinds {
            cancelled: true,
            ..Default::default()
        };
        assert!(!cancelled.is_delay());
        assert!(!cancelled.is_empty());
    }
}
