// Link prober: measures neighbor reachability and RTT via ICMP echo. The
// probe mechanism is an injectable collaborator so the recompute/origination
// logic can be tested without shelling out to `ping`.

use std::collections::HashMap;
use std::process::Command;
use std::time::{Duration, Instant};

use crate::config::NeighborConfig;

/// Outcome of probing one neighbor: whether it answered, and the cost to
/// carry in the next originated LSA (measured RTT seconds when active, the
/// configured cost otherwise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeResult {
    pub active: bool,
    pub cost: f64,
}

pub trait Pinger: Send + Sync {
    /// Probes one IP, returning whether it answered and the elapsed wall
    /// time of the attempt.
    fn ping(&self, ip: &str) -> (bool, Duration);
}

/// Shells out to the host `ping` binary: five echoes, one second apiece.
pub struct RealPinger;

impl Pinger for RealPinger {
    fn ping(&self, ip: &str) -> (bool, Duration) {
        let start = Instant::now();
        let status = Command::new("ping")
            .args(["-c", "5", "-W", "1", ip])
            .output();
        let elapsed = start.elapsed();
        let success = matches!(status, Ok(output) if output.status.success());
        (success, elapsed)
    }
}

/// Probes every configured neighbor and returns name -> ProbeResult. Probe
/// failures are not fatal: an unreachable neighbor is simply reported
/// inactive, carrying its configured cost forward.
pub fn probe_all(pinger: &dyn Pinger, neighbors: &[NeighborConfig]) -> HashMap<String, ProbeResult> {
    let mut results = HashMap::with_capacity(neighbors.len());
    for neighbor in neighbors {
        let (active, rtt) = pinger.ping(&neighbor.ip);
        let cost = if active {
            rtt.as_secs_f64()
        } else {
            neighbor.cost as f64
        };
        if !active {
            log::debug!("probe of neighbor {} ({}) failed, marking inactive", neighbor.name, neighbor.ip);
        }
        results.insert(neighbor.name.clone(), ProbeResult { active, cost });
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakePinger {
        scripted: HashMap<String, (bool, Duration)>,
    }

    impl Pinger for FakePinger {
        fn ping(&self, ip: &str) -> (bool, Duration) {
            self.scripted
                .get(ip)
                .copied()
                .unwrap_or((false, Duration::from_secs(0)))
        }
    }

    fn neighbor(name: &str, ip: &str, cost: u32) -> NeighborConfig {
        NeighborConfig {
            name: name.to_string(),
            ip: ip.to_string(),
            cost,
        }
    }

    #[test]
    fn active_neighbor_carries_measured_rtt() {
        let mut scripted = HashMap::new();
        scripted.insert("172.20.2.3".to_string(), (true, Duration::from_millis(5)));
        let pinger = FakePinger { scripted };
        let neighbors = vec![neighbor("router2", "172.20.2.3", 1)];

        let results = probe_all(&pinger, &neighbors);
        let result = results["router2"];
        assert!(result.active);
        assert!((result.cost - 0.005).abs() < 0.001);
    }

    #[test]
    fn unreachable_neighbor_falls_back_to_configured_cost() {
        let pinger = FakePinger { scripted: HashMap::new() };
        let neighbors = vec![neighbor("router5", "172.20.5.3", 10)];

        let results = probe_all(&pinger, &neighbors);
        let result = results["router5"];
        assert!(!result.active);
        assert_eq!(result.cost, 10.0);
    }
}
