// Scheduler: the two long-lived tasks (periodic originator, listener) plus
// the serialized recompute-and-reconcile path they both trigger.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::artifacts;
use crate::flooder;
use crate::lsa::MAX_DATAGRAM_BYTES;
use crate::reconcile::{self, KernelRouteTable, RealKernel};
use crate::spf;
use crate::state::AppState;

/// Period between periodic originations.
const ORIGINATION_INTERVAL_SECS: u64 = 10;

pub fn spawn_originator_task(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(ORIGINATION_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let changed = flooder::originate_once(&state).await;
            if changed {
                trigger_recompute(&state);
            }
        }
    });
}

pub fn spawn_listener_task(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];
        loop {
            let (len, sender) = match state.socket.recv_from(&mut buf).await {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("UDP receive failed, retrying after a short backoff: {}", e);
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    continue;
                }
            };
            let datagram = buf[..len].to_vec();
            let state = Arc::clone(&state);
            // A short-lived worker per datagram so the socket is never
            // blocked by a slow recompute.
            tokio::spawn(async move {
                let should_recompute = flooder::handle_datagram(&state, &datagram, sender).await;
                if should_recompute {
                    trigger_recompute(&state);
                }
            });
        }
    });
}

/// Requests a recompute. If one is already pending (queued or running) this
/// is a no-op: the in-flight run will observe the latest LSDB state when it
/// actually executes.
pub fn trigger_recompute(state: &Arc<AppState>) {
    if !state.request_recompute() {
        return;
    }
    let state = Arc::clone(state);
    tokio::spawn(async move {
        run_recompute(&state).await;
    });
}

async fn run_recompute(state: &Arc<AppState>) {
    let _guard = state.recompute_lock.lock().await;
    state.clear_recompute_pending();

    let (snapshot, fingerprint) = {
        let lsdb = state.lsdb.lock().await;
        (lsdb.snapshot(), lsdb.fingerprint())
    };

    if !state.fingerprint_changed(fingerprint) {
        debug!("LSDB unchanged since last recompute, skipping SPF");
        return;
    }

    let origin = state.config.my_ip.clone();
    let computed = match spf::compute_routes(&snapshot, &origin) {
        Ok(routes) => routes,
        Err(e) => {
            error!("SPF aborted this recompute: {}", e);
            return;
        }
    };

    let active_ips = state.active_neighbor_ips.lock().await.clone();
    let computed = reconcile::filter_by_active_neighbors(computed, &active_ips);
    let connected = crate::interfaces::local_subnets();

    artifacts::write_lsdb_snapshot(&snapshot);
    artifacts::write_routes_snapshot(&computed);

    let result = tokio::task::spawn_blocking(move || {
        let kernel = RealKernel;
        let existing = kernel.show().unwrap_or_default();
        let ops = reconcile::diff_routes(&computed, &existing, &connected);
        reconcile::apply(&kernel, &ops);
        ops.len()
    })
    .await;

    match result {
        Ok(count) => info!("recompute applied {} kernel route operation(s)", count),
        Err(e) => error!("recompute's kernel reconciliation task panicked: {}", e),
    }
}
