// Router-state object: owns the LSDB, the sequence counter, and the
// neighbor table behind explicit mutexes, passed to every task as an
// `Arc<AppState>` rather than through process globals.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::Mutex;

use crate::config::{NeighborConfig, RouterConfig};
use crate::lsdb::Lsdb;

pub struct AppState {
    pub config: RouterConfig,
    pub socket: Arc<UdpSocket>,
    pub lsdb: Mutex<Lsdb>,
    /// name -> (ip, last-known active/cost), updated once per probe cycle.
    pub neighbors: Mutex<HashMap<String, NeighborConfig>>,
    /// ip of every neighbor whose last probe succeeded.
    pub active_neighbor_ips: Mutex<HashSet<String>>,
    sequence: AtomicU32,
    /// serializes recompute so concurrent triggers collapse into one run.
    pub recompute_lock: Mutex<()>,
    recompute_pending: AtomicBool,
    last_fingerprint: AtomicU64,
}

impl AppState {
    pub fn new(config: RouterConfig, socket: Arc<UdpSocket>) -> Arc<Self> {
        let neighbors = crate::config::neighbor_map(&config.neighbors);
        Arc::new(AppState {
            config,
            socket,
            lsdb: Mutex::new(Lsdb::new()),
            neighbors: Mutex::new(neighbors),
            active_neighbor_ips: Mutex::new(HashSet::new()),
            sequence: AtomicU32::new(0),
            recompute_lock: Mutex::new(()),
            recompute_pending: AtomicBool::new(false),
            last_fingerprint: AtomicU64::new(0),
        })
    }

    /// Returns the next sequence number to originate with; strictly
    /// increasing within the process lifetime, starting at 1.
    pub fn next_sequence(&self) -> u32 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Marks a recompute as requested. Returns true if the caller should
    /// actually run one (no run currently pending); otherwise an in-flight
    /// or about-to-start run will pick up the request.
    pub fn request_recompute(&self) -> bool {
        !self.recompute_pending.swap(true, Ordering::SeqCst)
    }

    pub fn clear_recompute_pending(&self) {
        self.recompute_pending.store(false, Ordering::SeqCst);
    }

    /// True if `fingerprint` differs from the last recompute's fingerprint;
    /// updates the stored fingerprint as a side effect.
    pub fn fingerprint_changed(&self, fingerprint: u64) -> bool {
        self.last_fingerprint.swap(fingerprint, Ordering::SeqCst) != fingerprint
    }
}
