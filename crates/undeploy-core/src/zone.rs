//! Hosted zone selection

use crate::error::{Result, TeardownError};
use crate::model::HostedZone;
use serde::{Deserialize, Serialize};

/// Wrapper Route 53 puts around zone identifiers
pub const HOSTED_ZONE_ID_PREFIX: &str = "/hostedzone/";

/// The zone that owns a subdomain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedZone {
    /// Zone name without the trailing dot
    pub name: String,

    /// Bare zone identifier
    pub id: String,
}

/// Pick the most specific zone whose name is a suffix of `subdomain`.
///
/// Ties keep the first zone listed.
pub fn resolve(zones: &[HostedZone], subdomain: &str) -> Result<ResolvedZone> {
    let mut best: Option<(&str, &str)> = None;

    for zone in zones {
        let domain = zone.name.trim_end_matches('.');
        if !subdomain.ends_with(domain) {
            continue;
        }
        let longer = best.is_none_or(|(name, _)| domain.len() > name.len());
        if longer && !domain.is_empty() {
            best = Some((domain, zone.id.as_str()));
        }
    }

    let (name, id) = best.ok_or_else(|| TeardownError::NoMatchingZone(subdomain.to_string()))?;
    Ok(ResolvedZone {
        name: name.to_string(),
        id: id.replace(HOSTED_ZONE_ID_PREFIX, ""),
    })
}
