// Link-State Advertisement: domain type, wire format (names fixed for
// compatibility with deployed peers: id/seq/vizinhos/subnets) and codec.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use pnet::ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoutingError};

pub const PORT: u16 = 5000;
pub const MAX_DATAGRAM_BYTES: usize = 4096;

/// One router's view of its direct neighbors and directly connected subnets.
/// Neighbor cost is a link cost in seconds: a configured integer before the
/// first successful probe, the measured RTT afterwards (see `prober`).
#[derive(Debug, Clone, PartialEq)]
pub struct Lsa {
    pub originator: String,
    pub sequence: u32,
    /// display name -> (neighbor ip, cost)
    pub neighbors: HashMap<String, (String, f64)>,
    pub subnets: HashSet<String>,
}

impl Lsa {
    pub fn new(
        originator: String,
        sequence: u32,
        neighbors: HashMap<String, (String, f64)>,
        subnets: HashSet<String>,
    ) -> Self {
        Lsa {
            originator,
            sequence,
            neighbors,
            subnets,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let wire = LsaWire {
            id: self.originator.clone(),
            seq: self.sequence,
            vizinhos: self.neighbors.clone(),
            subnets: self.subnets.iter().cloned().collect(),
        };
        let bytes = serde_json::to_vec(&wire)?;
        if bytes.len() > MAX_DATAGRAM_BYTES {
            return Err(RoutingError::Decode(format!(
                "encoded LSA is {} bytes, exceeds the {}-byte datagram limit",
                bytes.len(),
                MAX_DATAGRAM_BYTES
            )));
        }
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let wire: LsaWire = serde_json::from_slice(bytes)?;

        for (name, (_ip, cost)) in &wire.vizinhos {
            if *cost < 0.0 {
                return Err(RoutingError::Decode(format!(
                    "neighbor {} in LSA from {} has negative cost {}",
                    name, wire.id, cost
                )));
            }
        }

        let mut subnets = HashSet::with_capacity(wire.subnets.len());
        for cidr in wire.subnets {
            validate_cidr(&cidr)?;
            subnets.insert(cidr);
        }

        Ok(Lsa {
            originator: wire.id,
            sequence: wire.seq,
            neighbors: wire.vizinhos,
            subnets,
        })
    }
}

/// Wire representation. Field names are fixed for on-the-wire compatibility.
#[derive(Debug, Serialize, Deserialize)]
struct LsaWire {
    id: String,
    seq: u32,
    vizinhos: HashMap<String, (String, f64)>,
    #[serde(default)]
    subnets: Vec<String>,
}

fn validate_cidr(cidr: &str) -> Result<()> {
    Ipv4Network::from_str(cidr)
        .map(|_| ())
        .map_err(|e| RoutingError::Decode(format!("invalid subnet CIDR {}: {}", cidr, e)))
}

/// 127.0.0.0/8 and 169.254.0.0/16 are never carried as connected subnets.
pub fn is_excluded_subnet(network: &Ipv4Network) -> bool {
    let ip = network.ip();
    ip.is_loopback() || (ip.octets()[0] == 169 && ip.octets()[1] == 254)
}
