//! Stop identifier types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace prefix for identifiers in the national stop register.
///
/// Feed messages may carry identifiers from foreign or operator-local
/// namespaces; only national identifiers participate in subscription
/// matching.
const NATIONAL_NAMESPACE: &str = "NSR:";

/// Prefix for fine-grained identifiers (a single platform or berth).
const QUAY_PREFIX: &str = "NSR:Quay:";

/// Prefix for coarse-grained identifiers grouping multiple quays.
const STOP_PLACE_PREFIX: &str = "NSR:StopPlace:";

/// A stop identifier at either granularity.
///
/// A `StopRef` may name a quay (one platform) or a stop place (the group of
/// quays around it). Construction never fails: foreign identifiers are
/// representable and simply filtered out at match time.
///
/// # Examples
///
/// ```
/// use push_server::domain::StopRef;
///
/// let quay = StopRef::new("NSR:Quay:123");
/// assert!(quay.is_quay());
/// assert!(quay.is_national());
///
/// let place = StopRef::new("NSR:StopPlace:45");
/// assert!(place.is_stop_place());
///
/// let foreign = StopRef::new("XXX:Quay:9");
/// assert!(!foreign.is_national());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopRef(String);

impl StopRef {
    /// Create a stop reference from any identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        StopRef(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identifier belongs to the national stop register.
    pub fn is_national(&self) -> bool {
        self.0.starts_with(NATIONAL_NAMESPACE)
    }

    /// True if this is a fine-grained (quay) identifier.
    pub fn is_quay(&self) -> bool {
        self.0.starts_with(QUAY_PREFIX)
    }

    /// True if this is a coarse-grained (stop place) identifier.
    pub fn is_stop_place(&self) -> bool {
        self.0.starts_with(STOP_PLACE_PREFIX)
    }
}

impl fmt::Debug for StopRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopRef({})", self.0)
    }
}

impl fmt::Display for StopRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StopRef {
    fn from(value: &str) -> Self {
        StopRef::new(value)
    }
}

impl From<String> for StopRef {
    fn from(value: String) -> Self {
        StopRef(value)
    }
}
