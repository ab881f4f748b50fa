//! Quota resolution.
//!
//! Determines the effective quota for a request. The `TokenOverride` policy
//! reads a per-caller quota from a signed token presented as the caller
//! credential; the `CredentialSplit` policy keeps two static quotas and
//! selects by credential presence. Both are implementations of the same
//! contract: resolution never fails outward, it only ever degrades to the
//! default quota.

use std::collections::HashSet;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::{debug, trace};

use super::quota::{Quota, ResolvedQuota};

/// Quota resolution policy.
#[derive(Debug, Clone)]
pub enum ResolverPolicy {
    /// Verify the credential as a signed token and read the quota from its
    /// claims. An empty secret disables overrides entirely.
    TokenOverride {
        secret: String,
        window_claim: String,
        credits_claim: String,
    },
    /// Select between two static quotas by credential presence.
    CredentialSplit {
        authenticated: Quota,
        anonymous: Quota,
    },
}

/// Resolves the effective quota for each request.
pub struct QuotaResolver {
    default_quota: Quota,
    policy: ResolverPolicy,
}

impl QuotaResolver {
    /// Create a resolver with the given default quota and policy.
    pub fn new(default_quota: Quota, policy: ResolverPolicy) -> Self {
        Self {
            default_quota,
            policy,
        }
    }

    /// Resolve the quota applicable to a request carrying `credential`.
    pub fn resolve(&self, credential: Option<&str>) -> ResolvedQuota {
        match &self.policy {
            ResolverPolicy::TokenOverride {
                secret,
                window_claim,
                credits_claim,
            } => {
                if secret.is_empty() {
                    return ResolvedQuota::Default(self.default_quota);
                }
                match credential.and_then(|token| {
                    decode_override(token, secret, window_claim, credits_claim)
                }) {
                    Some(quota) => {
                        debug!(
                            window = ?quota.window,
                            credits = quota.credits,
                            "Applying per-caller quota override"
                        );
                        ResolvedQuota::Overridden(quota)
                    }
                    None => {
                        trace!("No usable quota override, using default");
                        ResolvedQuota::Default(self.default_quota)
                    }
                }
            }
            ResolverPolicy::CredentialSplit {
                authenticated,
                anonymous,
            } => {
                let quota = if credential.is_some_and(|c| !c.is_empty()) {
                    *authenticated
                } else {
                    *anonymous
                };
                ResolvedQuota::Default(quota)
            }
        }
    }
}

/// Verify a token and extract the override quota from its claims.
///
/// Returns `None` on any failure: bad signature, missing or malformed
/// claims, unparseable duration, or a zero-length window.
fn decode_override(
    token: &str,
    secret: &str,
    window_claim: &str,
    credits_claim: &str,
) -> Option<Quota> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Override tokens are long-lived quota grants, not sessions
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = false;

    let data = decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()?;

    let window_str = data.claims.get(window_claim)?.as_str()?;
    let window = humantime::parse_duration(window_str).ok()?;
    if window.is_zero() {
        return None;
    }

    let credits_value = data.claims.get(credits_claim)?;
    let credits = credits_value
        .as_u64()
        .or_else(|| credits_value.as_f64().map(|f| f as u64))?;

    Some(Quota::new(window, credits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use std::time::Duration;

    const SECRET: &str = "test-secret";

    fn default_quota() -> Quota {
        Quota::new(Duration::from_secs(10), 10)
    }

    fn token_resolver(secret: &str) -> QuotaResolver {
        QuotaResolver::new(
            default_quota(),
            ResolverPolicy::TokenOverride {
                secret: secret.to_string(),
                window_claim: "rateLimiterTimeWindow".to_string(),
                credits_claim: "rateLimiterCreditsPerTimeWindow".to_string(),
            },
        )
    }

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_overrides_quota() {
        let token = sign(
            json!({
                "rateLimiterTimeWindow": "30s",
                "rateLimiterCreditsPerTimeWindow": 100,
            }),
            SECRET,
        );

        let resolved = token_resolver(SECRET).resolve(Some(&token));
        assert!(resolved.is_override());
        assert_eq!(resolved.quota(), Quota::new(Duration::from_secs(30), 100));
    }

    #[test]
    fn test_missing_credential_uses_default() {
        let resolved = token_resolver(SECRET).resolve(None);
        assert!(!resolved.is_override());
        assert_eq!(resolved.quota(), default_quota());
    }

    #[test]
    fn test_malformed_token_uses_default() {
        let resolved = token_resolver(SECRET).resolve(Some("not-a-jwt"));
        assert_eq!(resolved.quota(), default_quota());
    }

    #[test]
    fn test_wrong_signature_uses_default() {
        let token = sign(
            json!({
                "rateLimiterTimeWindow": "30s",
                "rateLimiterCreditsPerTimeWindow": 100,
            }),
            "other-secret",
        );

        let resolved = token_resolver(SECRET).resolve(Some(&token));
        assert!(!resolved.is_override());
        assert_eq!(resolved.quota(), default_quota());
    }

    #[test]
    fn test_missing_claims_use_default() {
        let token = sign(json!({ "sub": "somebody" }), SECRET);
        let resolved = token_resolver(SECRET).resolve(Some(&token));
        assert_eq!(resolved.quota(), default_quota());
    }

    #[test]
    fn test_malformed_duration_claim_uses_default() {
        let token = sign(
            json!({
                "rateLimiterTimeWindow": "soon",
                "rateLimiterCreditsPerTimeWindow": 100,
            }),
            SECRET,
        );

        let resolved = token_resolver(SECRET).resolve(Some(&token));
        assert_eq!(resolved.quota(), default_quota());
    }

    #[test]
    fn test_zero_window_claim_uses_default() {
        let token = sign(
            json!({
                "rateLimiterTimeWindow": "0s",
                "rateLimiterCreditsPerTimeWindow": 100,
            }),
            SECRET,
        );

        let resolved = token_resolver(SECRET).resolve(Some(&token));
        assert_eq!(resolved.quota(), default_quota());
    }

    #[test]
    fn test_empty_secret_disables_overrides() {
        let token = sign(
            json!({
                "rateLimiterTimeWindow": "30s",
                "rateLimiterCreditsPerTimeWindow": 100,
            }),
            "",
        );

        let resolved = token_resolver("").resolve(Some(&token));
        assert!(!resolved.is_override());
        assert_eq!(resolved.quota(), default_quota());
    }

    #[test]
    fn test_float_credits_claim_accepted() {
        let token = sign(
            json!({
                "rateLimiterTimeWindow": "30s",
                "rateLimiterCreditsPerTimeWindow": 100.0,
            }),
            SECRET,
        );

        let resolved = token_resolver(SECRET).resolve(Some(&token));
        assert_eq!(resolved.quota().credits, 100);
    }

    #[test]
    fn test_credential_split_selects_by_presence() {
        let authenticated = Quota::new(Duration::from_secs(10), 100);
        let anonymous = Quota::new(Duration::from_secs(10), 20);
        let resolver = QuotaResolver::new(
            default_quota(),
            ResolverPolicy::CredentialSplit {
                authenticated,
                anonymous,
            },
        );

        assert_eq!(resolver.resolve(Some("any-key")).quota(), authenticated);
        assert_eq!(resolver.resolve(None).quota(), anonymous);
        assert_eq!(resolver.resolve(Some("")).quota(), anonymous);
    }
}
