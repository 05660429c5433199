// Flooder: owns the origination cycle and the receive/re-flood path. Both
// duties share the same UDP socket; sends are routed through one function
// so originator and re-flooder never interleave partial writes.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::interfaces;
use crate::lsa::{Lsa, PORT};
use crate::prober::{self, RealPinger};
use crate::state::AppState;

async fn send_to(state: &Arc<AppState>, bytes: &[u8], ip: &str) {
    let addr = format!("{}:{}", ip, PORT);
    if let Err(e) = state.socket.send_to(bytes, &addr).await {
        warn!("failed to send LSA to {}: {}", addr, e);
    }
}

/// Runs one origination cycle: probe, build a fresh LSA, merge it locally,
/// and send it to every configured neighbor. Returns whether the LSDB
/// actually changed (used to decide whether to trigger a recompute).
pub async fn originate_once(state: &Arc<AppState>) -> bool {
    let configured: Vec<_> = {
        let neighbors = state.neighbors.lock().await;
        neighbors.values().cloned().collect()
    };

    let probe_results = tokio::task::spawn_blocking(move || prober::probe_all(&RealPinger, &configured))
        .await
        .unwrap_or_default();

    let mut active_ips = HashSet::new();
    let mut neighbor_map = HashMap::new();
    {
        let neighbors = state.neighbors.lock().await;
        for (name, cfg) in neighbors.iter() {
            if let Some(result) = probe_results.get(name) {
                if result.active {
                    active_ips.insert(cfg.ip.clone());
                    neighbor_map.insert(name.clone(), (cfg.ip.clone(), result.cost));
                }
            }
        }
    }
    *state.active_neighbor_ips.lock().await = active_ips;

    let subnets = interfaces::local_subnets();
    let sequence = state.next_sequence();
    let lsa = Lsa::new(state.config.my_ip.clone(), sequence, neighbor_map, subnets);

    let changed = {
        let mut lsdb = state.lsdb.lock().await;
        lsdb.merge(lsa.clone())
    };

    match lsa.encode() {
        Ok(bytes) => {
            let targets: Vec<String> = {
                let neighbors = state.neighbors.lock().await;
                neighbors.values().map(|n| n.ip.clone()).collect()
            };
            if targets.is_empty() {
                debug!("{} has no configured neighbors to originate to", state.config.my_name);
            }
            for ip in targets {
                send_to(state, &bytes, &ip).await;
            }
            info!("{} originated LSA seq {}", state.config.my_name, sequence);
        }
        Err(e) => warn!("failed to encode originated LSA: {}", e),
    }

    changed
}

/// Handles one received datagram: decode, merge, and on a successful merge
/// re-flood the exact received bytes to every active neighbor except the
/// sender (split-horizon by sender IP). Returns whether a recompute should
/// be triggered.
pub async fn handle_datagram(state: &Arc<AppState>, bytes: &[u8], sender: SocketAddr) -> bool {
    let lsa = match Lsa::decode(bytes) {
        Ok(lsa) => lsa,
        Err(e) => {
            warn!("dropping malformed LSA from {}: {}", sender, e);
            return false;
        }
    };

    debug!("received LSA from {} (originator {} seq {})", sender, lsa.originator, lsa.sequence);

    let merged = {
        let mut lsdb = state.lsdb.lock().await;
        lsdb.merge(lsa)
    };

    if !merged {
        return false;
    }

    let active_neighbors: Vec<String> = {
        let active = state.active_neighbor_ips.lock().await;
        active.iter().cloned().collect()
    };
    let sender_ip = sender.ip().to_string();

    for ip in active_neighbors {
        if ip == sender_ip {
            continue;
        }
        send_to(state, bytes, &ip).await;
    }

    true
}
