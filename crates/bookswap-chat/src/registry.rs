//! Connection registry: the live set of sessions in connect order.

use std::collections::{BTreeMap, HashMap};

use bookswap_common::SessionId;

struct Entry<C> {
    seq: u64,
    conn: C,
}

/// Live sessions keyed by id, iterated in insertion order.
pub struct Registry<C> {
    next_seq: u64,
    order: BTreeMap<u64, SessionId>,
    entries: HashMap<SessionId, Entry<C>>,
}

impl<C> Registry<C> {
    pub fn new() -> Self {
        Self {
            next_seq: 0,
            order: BTreeMap::new(),
            entries: HashMap::new(),
        }
    }

    /// Register `conn` under `id`. An existing entry with the same id is
    /// replaced and returned; the new entry moves to the end of the order.
    pub fn add(&mut self, id: SessionId, conn: C) -> Option<C> {
        let previous = self.remove(&id);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, id.clone());
        self.entries.insert(id, Entry { seq, conn });
        previous
    }

    /// Remove a session. Absent ids are a no-op.
    pub fn remove(&mut self, id: &SessionId) -> Option<C> {
        let entry = self.entries.remove(id)?;
        self.order.remove(&entry.seq);
        Some(entry.conn)
    }

    pub fn get(&self, id: &SessionId) -> Option<&C> {
        self.entries.get(id).map(|e| &e.conn)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.entries.contains_key(id)
    }

    /// Visit every session in insertion order, skipping `exclude`.
    pub fn for_each<F>(&self, mut f: F, exclude: Option<&SessionId>)
    where
        F: FnMut(&SessionId, &C),
    {
        for id in self.order.values() {
            if Some(id) == exclude {
                continue;
            }
            if let Some(entry) = self.entries.get(id) {
                f(id, &entry.conn);
            }
        }
    }

    /// Session ids in insertion order.
    pub fn ids(&self) -> Vec<SessionId> {
        self.order.values().cloned().collect()
    }

    /// Remove every session, returning them in insertion order.
    pub fn drain(&mut self) -> Vec<(SessionId, C)> {
        let order = std::mem::take(&mut self.order);
        let mut entries = std::mem::take(&mut self.entries);
        order
            .into_values()
            .filter_map(|id| entries.remove(&id).map(|e| (id, e.conn)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::from(s)
    }

    #[test]
    fn add_and_get() {
        let mut reg = Registry::new();
        reg.add(sid("a"), 1);
        assert_eq!(reg.get(&sid("a")), Some(&1));
        assert!(reg.contains(&sid("a")));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut reg = Registry::new();
        reg.add(sid("a"), 1);
        assert_eq!(reg.remove(&sid("a")), Some(1));
        assert_eq!(reg.remove(&sid("a")), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut reg: Registry<u32> = Registry::new();
        assert_eq!(reg.remove(&sid("ghost")), None);
    }

    #[test]
    fn for_each_follows_insertion_order() {
        let mut reg = Registry::new();
        for name in ["c", "a", "b"] {
            reg.add(sid(name), name.to_string());
        }
        let mut seen = Vec::new();
        reg.for_each(|id, _| seen.push(id.to_string()), None);
        assert_eq!(seen, vec!["c", "a", "b"]);
    }

    #[test]
    fn for_each_skips_excluded() {
        let mut reg = Registry::new();
        for name in ["a", "b", "c"] {
            reg.add(sid(name), ());
        }
        let mut seen = Vec::new();
        reg.for_each(|id, _| seen.push(id.to_string()), Some(&sid("b")));
        assert_eq!(seen, vec!["a", "c"]);
    }

    #[test]
    fn order_survives_removal() {
        let mut reg = Registry::new();
        for name in ["a", "b", "c", "d"] {
            reg.add(sid(name), ());
        }
        reg.remove(&sid("b"));
        reg.add(sid("e"), ());
        let ids: Vec<String> = reg.ids().iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["a", "c", "d", "e"]);
    }

    #[test]
    fn re_adding_replaces_and_moves_to_end() {
        let mut reg = Registry::new();
        reg.add(sid("a"), 1);
        reg.add(sid("b"), 2);
        assert_eq!(reg.add(sid("a"), 3), Some(1));
        assert_eq!(reg.len(), 2);
        let ids: Vec<String> = reg.ids().iter().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(reg.get(&sid("a")), Some(&3));
    }

    #[test]
    fn drain_empties_in_order() {
        let mut reg = Registry::new();
        reg.add(sid("x"), 1);
        reg.add(sid("y"), 2);
        let drained: Vec<u32> = reg.drain().into_iter().map(|(_, c)| c).collect();
        assert_eq!(drained, vec![1, 2]);
        assert!(reg.is_empty());
        assert!(reg.ids().is_empty());
    }
}
