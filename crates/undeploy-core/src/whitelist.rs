//! Firewall coverage check for the operator's address

use crate::model::IngressRule;

/// Ports the director must be reachable on: SSH, the BOSH agent and the
/// director API.
pub const REQUIRED_PORTS: [u16; 3] = [22, 6868, 25555];

/// Whether `rules` open every port in [`REQUIRED_PORTS`] to `target_ip/32`.
pub fn evaluate(rules: &[IngressRule], target_ip: &str) -> bool {
    evaluate_ports(rules, target_ip, &REQUIRED_PORTS)
}

/// Like [`evaluate`] but against a caller-supplied port set.
///
/// Each port may be satisfied by a different rule. An empty port set is
/// trivially satisfied.
pub fn evaluate_ports(rules: &[IngressRule], target_ip: &str, ports: &[u16]) -> bool {
    let cidr = format!("{}/32", target_ip);
    ports.iter().all(|port| {
        rules
            .iter()
            .any(|rule| rule.port == *port && rule.source_cidr == cidr)
    })
}
