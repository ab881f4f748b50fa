//! Admission control logic: identity derivation, quota resolution, and the
//! fixed-window limiter engine.

mod engine;
mod identity;
mod quota;
mod resolver;

pub use engine::LimiterEngine;
pub use identity::ClientIdentity;
pub use quota::{Quota, ResolvedQuota};
pub use resolver::{QuotaResolver, ResolverPolicy};
