//! In-memory store of per-layer query results

use mapquery_core::models::{LayerId, LayerQueryResult};

/// Latest query result per layer.
///
/// Holds at most one entry per layer and replaces entries whole. Entries keep
/// the order in which their layers were first inserted, which is the order
/// result tabs are shown in.
#[derive(Debug, Clone, Default)]
pub struct QueryResultStore {
    entries: Vec<LayerQueryResult>,
}

impl QueryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap the whole store for a new result set; later duplicates win
    pub fn replace_all(&mut self, results: impl IntoIterator<Item = LayerQueryResult>) {
        self.entries.clear();
        for result in results {
            let layer_id = result.layer_id.clone();
            self.upsert(&layer_id, result);
        }
    }

    /// Insert or replace the entry for `layer_id`
    pub fn upsert(&mut self, layer_id: &LayerId, mut result: LayerQueryResult) {
        result.layer_id = layer_id.clone();
        match self.entries.iter_mut().find(|entry| &entry.layer_id == layer_id) {
            Some(entry) => *entry = result,
            None => self.entries.push(result),
        }
    }

    pub fn get(&self, layer_id: &LayerId) -> Option<&LayerQueryResult> {
        self.entries.iter().find(|entry| &entry.layer_id == layer_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Layer ids in tab order
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.entries.iter().map(|entry| entry.layer_id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayerQueryResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(layer: &str, count: u64) -> LayerQueryResult {
        LayerQueryResult::success(layer.into(), layer.to_uppercase(), Vec::new(), count)
    }

    #[test]
    fn test_replace_all_drops_previous_entries() {
        let mut store = QueryResultStore::new();
        store.replace_all(vec![result("a", 1), result("b", 2)]);
        store.replace_all(vec![result("c", 3)]);

        assert_eq!(store.layer_ids(), vec![LayerId::from("c")]);
        assert!(store.get(&"a".into()).is_none());
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut store = QueryResultStore::new();
        store.replace_all(vec![result("a", 1), result("b", 2)]);
        store.upsert(&"a".into(), result("a", 10));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&"a".into()).unwrap().count, 10);
        assert_eq!(store.layer_ids(), vec![LayerId::from("a"), LayerId::from("b")]);
    }

    #[test]
    fn test_duplicate_layers_keep_one_entry() {
        let mut store = QueryResultStore::new();
        store.replace_all(vec![result("a", 1), result("a", 5)]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&"a".into()).unwrap().count, 5);
    }

    #[test]
    fn test_upsert_keys_by_argument() {
        let mut store = QueryResultStore::new();
        store.upsert(&"x".into(), result("y", 1));

        assert!(store.get(&"y".into()).is_none());
        assert_eq!(store.get(&"x".into()).unwrap().layer_id, LayerId::from("x"));
    }

    #[test]
    fn test_clear() {
        let mut store = QueryResultStore::new();
        store.replace_all(vec![result("a", 1)]);
        store.clear();
        assert!(store.is_empty());
    }
}
