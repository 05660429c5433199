// Shortest-Path-First engine: builds a weighted undirected graph from an
// LSDB snapshot and runs Dijkstra from the local origin, producing
// destination-subnet -> next-hop-router mappings.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use log::warn;

use crate::error::{Result, RoutingError};
use crate::lsa::Lsa;

type Graph = HashMap<String, Vec<(String, f64)>>;

/// f64 isn't Ord, so wrap it for the binary heap. NaN never occurs here:
/// costs come from either a configured integer or a measured `Duration`.
#[derive(Debug, Clone, PartialEq)]
struct HeapEntry(f64, String);

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for a min-heap: BinaryHeap is a max-heap by default.
        other
            .0
            .partial_cmp(&self.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.1.cmp(&self.1))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Build the adjacency list. Nodes are router IPs (LSDB keys) and subnet
/// CIDRs appearing in any LSA. A router-to-router edge is added only if the
/// claimed neighbor IP is itself an LSDB originator (one-sided claims are
/// dropped to avoid black holes). Router-to-subnet edges always cost 0.
fn build_graph(lsdb: &HashMap<String, Lsa>) -> Result<Graph> {
    let mut graph: Graph = HashMap::new();

    for (id, lsa) in lsdb {
        graph.entry(id.clone()).or_default();
        for subnet in &lsa.subnets {
            graph.entry(subnet.clone()).or_default();
        }
    }

    for (id, lsa) in lsdb {
        for (name, (ip, cost)) in &lsa.neighbors {
            if *cost < 0.0 {
                return Err(RoutingError::InvalidGraph(format!(
                    "{} advertises neighbor {} ({}) with negative cost {}",
                    id, name, ip, cost
                )));
            }
            if lsdb.contains_key(ip) {
                graph.entry(id.clone()).or_default().push((ip.clone(), *cost));
                graph.entry(ip.clone()).or_default().push((id.clone(), *cost));
            }
        }
        for subnet in &lsa.subnets {
            graph.entry(id.clone()).or_default().push((subnet.clone(), 0.0));
            graph.entry(subnet.clone()).or_default().push((id.clone(), 0.0));
        }
    }

    Ok(graph)
}

/// Dijkstra from `origin`. Ties are broken by first-popped-wins: a relaxation
/// only updates a node's distance on a strictly smaller cost, so whichever
/// equal-cost path is discovered first keeps its predecessor.
fn dijkstra(graph: &Graph, origin: &str) -> (HashMap<String, f64>, HashMap<String, String>) {
    let mut dist: HashMap<String, f64> = HashMap::new();
    let mut prev: HashMap<String, String> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();

    dist.insert(origin.to_string(), 0.0);
    heap.push(HeapEntry(0.0, origin.to_string()));

    while let Some(HeapEntry(d, u)) = heap.pop() {
        if !visited.insert(u.clone()) {
            continue;
        }
        let Some(edges) = graph.get(&u) else { continue };
        for (v, cost) in edges {
            let candidate = d + cost;
            let improves = match dist.get(v) {
                None => true,
                Some(existing) => candidate < *existing,
            };
            if improves {
                dist.insert(v.clone(), candidate);
                prev.insert(v.clone(), u.clone());
                heap.push(HeapEntry(candidate, v.clone()));
            }
        }
    }

    (dist, prev)
}

/// Walk predecessors from `dest` back toward `origin`; returns the node
/// whose predecessor is `origin` (the first hop), or None if `dest` is
/// unreachable from `origin`.
fn first_hop_toward(dest: &str, origin: &str, prev: &HashMap<String, String>) -> Option<String> {
    let mut current = dest.to_string();
    loop {
        match prev.get(&current) {
            Some(p) if p != origin => current = p.clone(),
            _ => break,
        }
    }
    match prev.get(&current) {
        Some(p) if p == origin => Some(current),
        _ => None,
    }
}

/// Compute destination_cidr -> next_hop_ip for all subnets reachable from
/// `origin` other than those directly connected to it.
pub fn compute_routes(lsdb: &HashMap<String, Lsa>, origin: &str) -> Result<HashMap<String, String>> {
    let graph = build_graph(lsdb)?;

    if !graph.contains_key(origin) {
        warn!("SPF: origin {} has no LSA in the LSDB yet, skipping", origin);
        return Ok(HashMap::new());
    }

    let (dist, prev) = dijkstra(&graph, origin);

    let mut routes = HashMap::new();
    for dest in graph.keys() {
        if dest == origin || !dest.contains('/') || !dist.contains_key(dest) {
            continue;
        }
        let Some(first_hop) = first_hop_toward(dest, origin, &prev) else {
            continue;
        };
        if first_hop.contains('/') || dest == &first_hop {
            continue;
        }
        routes.insert(dest.clone(), first_hop);
    }

    Ok(routes)
}
