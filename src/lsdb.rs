// Link-State Database: per-originator latest LSA, kept consistent by a
// single merge rule. The LSDB is the sole input to the SPF engine.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use log::debug;

use crate::lsa::Lsa;

#[derive(Debug, Default)]
pub struct Lsdb {
    entries: HashMap<String, Lsa>,
}

impl Lsdb {
    pub fn new() -> Self {
        Lsdb {
            entries: HashMap::new(),
        }
    }

    /// Insert `lsa` iff its originator is new or its sequence is strictly
    /// greater than the stored one. Equal-sequence LSAs are discarded
    /// silently. Returns whether the LSDB actually changed.
    pub fn merge(&mut self, lsa: Lsa) -> bool {
        match self.entries.get(&lsa.originator) {
            None => {
                debug!("LSDB: new originator {} at seq {}", lsa.originator, lsa.sequence);
                self.entries.insert(lsa.originator.clone(), lsa);
                true
            }
            Some(existing) if lsa.sequence > existing.sequence => {
                debug!(
                    "LSDB: {} advanced from seq {} to seq {}",
                    lsa.originator, existing.sequence, lsa.sequence
                );
                self.entries.insert(lsa.originator.clone(), lsa);
                true
            }
            Some(existing) => {
                debug!(
                    "LSDB: discarding LSA from {} at seq {} (stored seq {})",
                    lsa.originator, lsa.sequence, existing.sequence
                );
                false
            }
        }
    }

    pub fn get(&self, originator: &str) -> Option<&Lsa> {
        self.entries.get(originator)
    }

    pub fn snapshot(&self) -> HashMap<String, Lsa> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cheap fingerprint of the current contents, used to short-circuit a
    /// recompute when nothing has changed since the last run.
    pub fn fingerprint(&self) -> u64 {
        let mut originators: Vec<&String> = self.entries.keys().collect();
        originators.sort();
        let mut hasher = DefaultHasher::new();
        for id in originators {
            id.hash(&mut hasher);
            self.entries[id].sequence.hash(&mut hasher);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn lsa(originator: &str, seq: u32) -> Lsa {
        Lsa::new(originator.to_string(), seq, HashMap::new(), HashSet::new())
    }

    #[test]
    fn fresh_originator_always_merges() {
        let mut db = Lsdb::new();
        assert!(db.merge(lsa("172.20.1.3", 1)));
        assert_eq!(db.get("172.20.1.3").unwrap().sequence, 1);
    }

    #[test]
    fn higher_sequence_replaces() {
        let mut db = Lsdb::new();
        db.merge(lsa("172.20.1.3", 5));
        assert!(db.merge(lsa("172.20.1.3", 6)));
        assert_eq!(db.get("172.20.1.3").unwrap().sequence, 6);
    }

    #[test]
    fn equal_sequence_is_discarded() {
        let mut db = Lsdb::new();
        db.merge(lsa("172.20.1.3", 7));
        assert!(!db.merge(lsa("172.20.1.3", 7)));
        assert_eq!(db.get("172.20.1.3").unwrap().sequence, 7);
    }

    #[test]
    fn lower_sequence_is_discarded_and_stored_seq_unchanged() {
        // S4: a regression after a higher sequence must not roll back the LSDB.
        let mut db = Lsdb::new();
        db.merge(lsa("172.20.3.3", 7));
        assert!(!db.merge(lsa("172.20.3.3", 5)));
        assert_eq!(db.get("172.20.3.3").unwrap().sequence, 7);
    }

    #[test]
    fn fingerprint_stable_across_equivalent_merge_orders() {
        // S6: any delivery order producing the same final LSDB yields the same fingerprint.
        let mut a = Lsdb::new();
        a.merge(lsa("r1", 3));
        a.merge(lsa("r2", 9));

        let mut b = Lsdb::new();
        b.merge(lsa("r2", 9));
        b.merge(lsa("r1", 3));

        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_changes_when_sequence_advances() {
        let mut db = Lsdb::new();
        db.merge(lsa("r1", 1));
        let before = db.fingerprint();
        db.merge(lsa("r1", 2));
        assert_ne!(before, db.fingerprint());
    }
}
