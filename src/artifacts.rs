// Advisory debugging artifacts: the current LSDB and computed route set,
// dumped as JSON for operators to inspect. Not part of the wire protocol;
// failures here are logged and otherwise ignored.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::lsa::Lsa;

const DEFAULT_LOG_DIR: &str = "/var/log/routingd";

fn log_dir() -> PathBuf {
    std::env::var("ROUTINGD_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR))
}

fn write_json(file_name: &str, value: &impl serde::Serialize) {
    let dir = log_dir();
    if let Err(e) = fs::create_dir_all(&dir) {
        warn!("could not create log directory {}: {}", dir.display(), e);
        return;
    }
    let path = dir.join(file_name);
    match serde_json::to_vec_pretty(value) {
        Ok(bytes) => {
            if let Err(e) = fs::write(&path, bytes) {
                warn!("could not write artifact {}: {}", path.display(), e);
            }
        }
        Err(e) => warn!("could not serialize artifact {}: {}", file_name, e),
    }
}

pub fn write_lsdb_snapshot(lsdb: &HashMap<String, Lsa>) {
    let serializable: HashMap<&String, LsaView> = lsdb
        .iter()
        .map(|(id, lsa)| (id, LsaView::from(lsa)))
        .collect();
    write_json("lsdb_latest.json", &serializable);
}

pub fn write_routes_snapshot(routes: &HashMap<String, String>) {
    write_json("rotas_latest.json", routes);
}

#[derive(serde::Serialize)]
struct LsaView<'a> {
    sequence: u32,
    neighbors: &'a HashMap<String, (String, f64)>,
    subnets: &'a std::collections::HashSet<String>,
}

impl<'a> From<&'a Lsa> for LsaView<'a> {
    fn from(lsa: &'a Lsa) -> Self {
        LsaView {
            sequence: lsa.sequence,
            neighbors: &lsa.neighbors,
            subnets: &lsa.subnets,
        }
    }
}
