// Startup configuration: identity and the static initial neighbor table,
// read entirely from environment variables (no config file format).

use std::collections::HashMap;
use std::env;

use crate::error::{Result, RoutingError};

#[derive(Debug, Clone)]
pub struct NeighborConfig {
    pub name: String,
    pub ip: String,
    pub cost: u32,
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub my_name: String,
    pub my_ip: String,
    pub neighbors: Vec<NeighborConfig>,
}

impl RouterConfig {
    /// Reads `my_name`, `my_ip` and the neighbor table from the process
    /// environment. The neighbor table comes from either `vizinhos`
    /// (`[name,ip,cost],[name,ip,cost]...`) or, if absent, `router_links`
    /// (a comma-separated list of names, each resolved via a per-name
    /// `<name>_ip` variable, cost defaulting to 1).
    pub fn from_env() -> Result<Self> {
        let my_name = require_var("my_name")?;
        let my_ip = require_var("my_ip")?;

        let neighbors = if let Ok(raw) = env::var("vizinhos") {
            parse_vizinhos(&raw)?
        } else if let Ok(raw) = env::var("router_links") {
            parse_router_links(&raw)
        } else {
            Vec::new()
        };

        Ok(RouterConfig {
            my_name,
            my_ip,
            neighbors,
        })
    }
}

fn require_var(name: &str) -> Result<String> {
    env::var(name).map_err(|_| RoutingError::Config(format!("missing required environment variable {}", name)))
}

/// Parses `[name,ip,cost],[name,ip,cost]...`.
fn parse_vizinhos(raw: &str) -> Result<Vec<NeighborConfig>> {
    let mut neighbors = Vec::new();
    for entry in split_bracketed(raw) {
        let fields: Vec<&str> = entry.split(',').map(str::trim).collect();
        let [name, ip, cost] = fields.as_slice() else {
            return Err(RoutingError::Config(format!(
                "malformed vizinhos entry {:?}, expected [name,ip,cost]",
                entry
            )));
        };
        let cost: u32 = cost
            .parse()
            .map_err(|_| RoutingError::Config(format!("non-integer cost {:?} in vizinhos entry {:?}", cost, entry)))?;
        neighbors.push(NeighborConfig {
            name: name.to_string(),
            ip: ip.to_string(),
            cost,
        });
    }
    Ok(neighbors)
}

/// Splits `[a,b,c],[d,e,f]` into `["a,b,c", "d,e,f"]`.
fn split_bracketed(raw: &str) -> Vec<String> {
    raw.split('[')
        .filter_map(|chunk| chunk.strip_suffix(']').or_else(|| chunk.strip_suffix("],")))
        .map(|s| s.trim_end_matches(',').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolves each name in a comma-separated list via a `<name>_ip`
/// environment variable. A name with no matching variable is logged and
/// skipped rather than treated as fatal, matching the original's
/// "AVISO: IP para {nome} não encontrado" behavior.
fn parse_router_links(raw: &str) -> Vec<NeighborConfig> {
    let mut neighbors = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match env::var(format!("{}_ip", name)) {
            Ok(ip) => neighbors.push(NeighborConfig {
                name: name.to_string(),
                ip,
                cost: 1,
            }),
            Err(_) => {
                log::warn!("no IP override found for router_links entry {}, skipping", name);
            }
        }
    }
    neighbors
}

/// name -> (ip, configured cost), used to seed the neighbor active-set.
pub fn neighbor_map(neighbors: &[NeighborConfig]) -> HashMap<String, NeighborConfig> {
    neighbors.iter().map(|n| (n.name.clone(), n.clone())).collect()
}
