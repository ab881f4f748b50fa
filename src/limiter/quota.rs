//! Quota values governing per-key admissions.

use std::time::Duration;

/// The allowance granted to a key for one window cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    /// Length of the fixed window. Always greater than zero.
    pub window: Duration,
    /// Admissions permitted per window.
    pub credits: u64,
}

impl Quota {
    /// Create a new quota.
    pub fn new(window: Duration, credits: u64) -> Self {
        Self { window, credits }
    }
}

/// The outcome of quota resolution for a single request.
///
/// Resolution never fails outward: any problem with a per-caller override
/// collapses to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedQuota {
    /// The statically configured quota applies.
    Default(Quota),
    /// A per-caller override carried in a verified token applies.
    Overridden(Quota),
}

impl ResolvedQuota {
    /// The effective quota, regardless of where it came from.
    pub fn quota(&self) -> Quota {
        match self {
            ResolvedQuota::Default(q) | ResolvedQuota::Overridden(q) => *q,
        }
    }

    /// Whether a per-caller override is in effect.
    pub fn is_override(&self) -> bool {
        matches!(self, ResolvedQuota::Overridden(_))
    }
}
