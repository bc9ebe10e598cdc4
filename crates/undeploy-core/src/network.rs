//! Address derivation for the director network
//!
//! The director lives at a fixed offset inside the public CIDR it was
//! created with. Teardown recomputes those addresses from the CIDR instead of
//! trusting stored outputs.

use crate::error::{Result, TeardownError};
use ipnet::IpNet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Offset of the network gateway
pub const GATEWAY_OFFSET: u32 = 1;

/// Offset of the director's internal address
pub const DIRECTOR_OFFSET: u32 = 6;

/// Return the host address `offset` positions past the network address of
/// `prefix`.
///
/// Host bits in `prefix` are ignored (`10.0.0.9/24` behaves like
/// `10.0.0.0/24`). Offsets at or beyond the size of the range are rejected.
pub fn derive(prefix: &str, offset: u32) -> Result<IpAddr> {
    let net: IpNet = prefix
        .trim()
        .parse()
        .map_err(|e| TeardownError::InvalidNetworkInput(format!("{}: {}", prefix, e)))?;
    host(&net, offset)
}

/// Gateway address of `prefix`
pub fn gateway(prefix: &str) -> Result<IpAddr> {
    derive(prefix, GATEWAY_OFFSET)
}

/// The director's internal address within `prefix`
pub fn director_internal_ip(prefix: &str) -> Result<IpAddr> {
    derive(prefix, DIRECTOR_OFFSET)
}

fn host(net: &IpNet, offset: u32) -> Result<IpAddr> {
    let host_bits = u32::from(net.max_prefix_len() - net.prefix_len());
    if host_bits < 32 && offset >= (1u32 << host_bits) {
        return Err(TeardownError::InvalidNetworkInput(format!(
            "offset {} is outside {} ({} addresses)",
            offset,
            net,
            1u64 << host_bits
        )));
    }

    let address = match net.network() {
        IpAddr::V4(base) => IpAddr::V4(Ipv4Addr::from(u32::from(base) + offset)),
        IpAddr::V6(base) => IpAddr::V6(Ipv6Addr::from(u128::from(base) + u128::from(offset))),
    };
    Ok(address)
}

/// Addresses derived from the director's public CIDR
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalNetwork {
    pub cidr: String,
    pub gateway: IpAddr,
    pub director_ip: IpAddr,
}

impl InternalNetwork {
    pub fn derive(cidr: &str) -> Result<Self> {
        Ok(Self {
            cidr: cidr.to_string(),
            gateway: gateway(cidr)?,
            director_ip: director_internal_ip(cidr)?,
        })
    }
}
