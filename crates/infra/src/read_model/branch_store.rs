use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::RwLock;

use tracker_core::BranchId;
use std::sync::Arc;

/// Branch-isolated key/value store for disposable read models and plain records.
pub trait BranchStore<K, V>: Send + Sync {
    fn get(&self, branch_id: BranchId, key: &K) -> Option<V>;
    fn upsert(&self, branch_id: BranchId, key: K, value: V);
    fn list(&self, branch_id: BranchId) -> Vec<V>;
    /// Drops every record of a branch (rebuild support).
    fn clear_branch(&self, branch_id: BranchId);
    /// Branches that currently hold at least one record.
    fn branches(&self) -> Vec<BranchId>;
}

impl<K, V, S> BranchStore<K, V> for Arc<S>
where
    S: BranchStore<K, V> + ?Sized,
{
    fn get(&self, branch_id: BranchId, key: &K) -> Option<V> {
        (**self).get(branch_id, key)
    }

    fn upsert(&self, branch_id: BranchId, key: K, value: V) {
        (**self).upsert(branch_id, key, value)
    }

    fn list(&self, branch_id: BranchId) -> Vec<V> {
        (**self).list(branch_id)
    }

    fn clear_branch(&self, branch_id: BranchId) {
        (**self).clear_branch(branch_id)
    }

    fn branches(&self) -> Vec<BranchId> {
        (**self).branches()
    }
}

#[derive(Debug)]
pub struct InMemoryBranchStore<K, V> {
    inner: RwLock<HashMap<(BranchId, K), V>>,
}

impl<K, V> InMemoryBranchStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryBranchStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> BranchStore<K, V> for InMemoryBranchStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, branch_id: BranchId, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(&(branch_id, key.clone())).cloned()
    }

    fn upsert(&self, branch_id: BranchId, key: K, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((branch_id, key), value);
        }
    }

    fn list(&self, branch_id: BranchId) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        map.iter()
            .filter_map(|((b, _k), v)| if *b == branch_id { Some(v.clone()) } else { None })
            .collect()
    }

    fn clear_branch(&self, branch_id: BranchId) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|(b, _k), _v| *b != branch_id);
        }
    }

    fn branches(&self) -> Vec<BranchId> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let unique: HashSet<BranchId> = map.keys().map(|(b, _)| *b).collect();
        unique.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_partitioned_by_branch() {
        let store: InMemoryBranchStore<u32, &'static str> = InMemoryBranchStore::new();
        let (b1, b2) = (BranchId::new(), BranchId::new());

        store.upsert(b1, 1, "one");
        store.upsert(b2, 1, "other");

        assert_eq!(store.get(b1, &1), Some("one"));
        assert_eq!(store.get(b2, &1), Some("other"));
        assert_eq!(store.list(b1), vec!["one"]);
        assert_eq!(store.branches().len(), 2);

        store.clear_branch(b1);
        assert!(store.get(b1, &1).is_none());
        assert_eq!(store.branches(), vec![b2]);
    }
}
