use std::collections::BTreeMap;

/// Arena table keyed by integer id. Ids are assigned on insert, start at 1
/// and are never reused.
#[derive(Debug)]
pub(crate) struct Table<K, V> {
    rows: BTreeMap<K, V>,
    next_id: i64,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<K, V> Table<K, V>
where
    K: Copy + Ord + From<i64>,
    V: Clone,
{
    /// Allocate an id, build the row with it and store it.
    pub(crate) fn insert_with(&mut self, build: impl FnOnce(K) -> V) -> V {
        let id = K::from(self.next_id);
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    pub(crate) fn get(&self, id: K) -> Option<&V> {
        self.rows.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: K) -> Option<&mut V> {
        self.rows.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: K) -> Option<V> {
        self.rows.remove(&id)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &V> {
        self.rows.values()
    }

    pub(crate) fn find(&self, mut pred: impl FnMut(&V) -> bool) -> Option<&V> {
        self.rows.values().find(|v| pred(v))
    }

    pub(crate) fn filtered(&self, mut pred: impl FnMut(&V) -> bool) -> Vec<V> {
        self.rows.values().filter(|v| pred(v)).cloned().collect()
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&V) -> bool) {
        self.rows.retain(|_, v| keep(v));
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}
