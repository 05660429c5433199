// Route reconciler: diffs SPF output against the kernel forwarding table
// and issues the minimal add/replace/delete set. The kernel is an
// injectable collaborator so the diff logic is testable without touching
// the host network stack.

use std::collections::{HashMap, HashSet};
use std::process::Command;

use log::{debug, warn};

use crate::error::{Result, RoutingError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOp {
    Add { cidr: String, via: String },
    Replace { cidr: String, via: String },
    Delete { cidr: String },
}

pub trait KernelRouteTable: Send + Sync {
    /// Non-default routes of the form `<cidr> via <ip>`, link-local next
    /// hops excluded.
    fn show(&self) -> Result<HashMap<String, String>>;
    fn add(&self, cidr: &str, via: &str) -> Result<()>;
    fn replace(&self, cidr: &str, via: &str) -> Result<()>;
    fn delete(&self, cidr: &str) -> Result<()>;
}

/// Drop computed routes whose next hop is not in the currently active
/// neighbor set (a router must never install a route through a neighbor it
/// cannot currently reach).
pub fn filter_by_active_neighbors(
    routes: HashMap<String, String>,
    active_neighbors: &HashSet<String>,
) -> HashMap<String, String> {
    routes
        .into_iter()
        .filter(|(_, via)| active_neighbors.contains(via))
        .collect()
}

/// Classify each computed route against the kernel snapshot and connected
/// subnets, then order the result as deletes, adds, replaces.
pub fn diff_routes(
    computed: &HashMap<String, String>,
    kernel: &HashMap<String, String>,
    connected: &HashSet<String>,
) -> Vec<RouteOp> {
    let mut adds = Vec::new();
    let mut replaces = Vec::new();
    let mut deletes = Vec::new();

    for (dest, next_hop) in computed {
        if connected.contains(dest) {
            continue;
        }
        match kernel.get(dest) {
            None => adds.push(RouteOp::Add {
                cidr: dest.clone(),
                via: next_hop.clone(),
            }),
            Some(existing) if existing == next_hop => {}
            Some(_) => replaces.push(RouteOp::Replace {
                cidr: dest.clone(),
                via: next_hop.clone(),
            }),
        }
    }

    for dest in kernel.keys() {
        if !computed.contains_key(dest) && !connected.contains(dest) {
            deletes.push(RouteOp::Delete { cidr: dest.clone() });
        }
    }

    deletes.extend(adds);
    deletes.extend(replaces);
    deletes
}

/// Apply operations in order, blocking. Meant to be run via
/// `tokio::task::spawn_blocking` by the caller so the async runtime isn't
/// stalled by subprocess invocations.
pub fn apply(kernel: &dyn KernelRouteTable, ops: &[RouteOp]) {
    for op in ops {
        let outcome = match op {
            RouteOp::Delete { cidr } => kernel.delete(cidr),
            RouteOp::Add { cidr, via } => kernel.add(cidr, via),
            RouteOp::Replace { cidr, via } => kernel.replace(cidr, via),
        };
        if let Err(e) = outcome {
            warn!("kernel route operation {:?} failed, will retry next recompute: {}", op, e);
        } else {
            debug!("kernel route operation {:?} applied", op);
        }
    }
}

fn is_link_local(ip: &str) -> bool {
    ip.split('.')
        .next()
        .zip(ip.split('.').nth(1))
        .map(|(a, b)| a == "169" && b == "254")
        .unwrap_or(false)
}

/// Shells out to the host's `ip` route manipulation tool.
pub struct RealKernel;

impl RealKernel {
    fn run(args: &[&str]) -> Result<std::process::Output> {
        Command::new("ip")
            .args(args)
            .output()
            .map_err(|e| RoutingError::KernelRoute(format!("failed to invoke `ip {}`: {}", args.join(" "), e)))
    }

    fn interpret_mutation(output: std::process::Output, verb: &str, cidr: &str) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }
        Err(RoutingError::KernelRoute(format!(
            "ip route {} {} failed: {}",
            verb,
            cidr,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

impl KernelRouteTable for RealKernel {
    fn show(&self) -> Result<HashMap<String, String>> {
        let output = Self::run(&["route", "show"])?;
        let text = String::from_utf8_lossy(&output.stdout);
        let mut table = HashMap::new();

        for line in text.lines() {
            let mut tokens = line.split_whitespace();
            let Some(cidr) = tokens.next() else { continue };
            if cidr == "default" || !cidr.contains('/') {
                continue;
            }
            let mut via = None;
            let mut prev = "";
            for tok in tokens {
                if prev == "via" {
                    via = Some(tok.to_string());
                    break;
                }
                prev = tok;
            }
            if let Some(via_ip) = via {
                if !is_link_local(&via_ip) {
                    table.insert(cidr.to_string(), via_ip);
                }
            }
        }

        Ok(table)
    }

    fn add(&self, cidr: &str, via: &str) -> Result<()> {
        let output = Self::run(&["route", "add", cidr, "via", via])?;
        Self::interpret_mutation(output, "add", cidr)
    }

    fn replace(&self, cidr: &str, via: &str) -> Result<()> {
        let output = Self::run(&["route", "replace", cidr, "via", via])?;
        Self::interpret_mutation(output, "replace", cidr)
    }

    fn delete(&self, cidr: &str) -> Result<()> {
        let output = Self::run(&["route", "del", cidr])?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
        let already_absent = stderr.contains("no such process")
            || stderr.contains("network is unreachable")
            || stderr.contains("cannot find device");
        if already_absent {
            debug!("ip route del {} reported already absent, treating as success", cidr);
            return Ok(());
        }
        Err(RoutingError::KernelRoute(format!(
            "ip route del {} failed: {}",
            cidr,
            stderr.trim()
        )))
    }
}
