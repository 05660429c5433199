// Interface inspector: enumerates the local machine's IPv4 interfaces and
// derives the set of directly connected subnets, used both to populate an
// LSA's subnet set and to suppress reconciler operations on those subnets.

use std::collections::HashSet;
use std::str::FromStr;

use pnet::datalink;
use pnet::ipnetwork::Ipv4Network;

use crate::lsa::is_excluded_subnet;

/// Normalize a list of interface (address, prefix) networks down to the set
/// of connected subnet CIDRs, dropping loopback and link-local.
pub fn subnets_from_networks(networks: &[Ipv4Network]) -> HashSet<String> {
    networks
        .iter()
        .filter(|net| !is_excluded_subnet(net))
        .map(|net| format!("{}/{}", net.network(), net.prefix()))
        .collect()
}

/// Enumerate the host's IPv4 interfaces and return their connected subnets.
pub fn local_subnets() -> HashSet<String> {
    let networks: Vec<Ipv4Network> = datalink::interfaces()
        .into_iter()
        .flat_map(|iface| iface.ips)
        .filter_map(|ip_network| match ip_network {
            pnet::ipnetwork::IpNetwork::V4(net) => Some(net),
            pnet::ipnetwork::IpNetwork::V6(_) => None,
        })
        .collect();
    subnets_from_networks(&networks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_loopback_and_link_local() {
        let networks = vec![
            Ipv4Network::from_str("127.0.0.1/8").unwrap(),
            Ipv4Network::from_str("169.254.1.2/16").unwrap(),
            Ipv4Network::from_str("172.20.2.3/24").unwrap(),
        ];
        let subnets = subnets_from_networks(&networks);
        assert_eq!(subnets.len(), 1);
        assert!(subnets.contains("172.20.2.0/24"));
    }

    #[test]
    fn normalizes_to_network_address() {
        let networks = vec![Ipv4Network::from_str("10.0.5.42/24").unwrap()];
        let subnets = subnets_from_networks(&networks);
        assert!(subnets.contains("10.0.5.0/24"));
    }
}
