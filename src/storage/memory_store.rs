//! In-memory `KeyStore` implementation.
// 中文: `KeyStore` 的内存实现。

use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex};

use super::tables::Tables;
use super::traits::{KeyStore, Table, WriteBatch};
use crate::error::Error;

/// A key store whose contents live in an atomically swapped snapshot.
///
/// Readers load the current snapshot without locking. Writers are
/// serialized, clone the snapshot, modify the clone and swap it in, so a
/// batch either lands completely or not at all.
///
/// 中文: 内容保存在原子替换快照中的密钥存储。
///
/// 读操作无锁加载当前快照。写操作串行执行：克隆快照、修改副本并原子替换，
/// 因此一个批次要么完整生效，要么完全不生效。
#[derive(Default)]
pub struct MemoryKeyStore {
    tables: ArcSwap<Tables>,
    write_lock: Mutex<()>,
}

impl MemoryKeyStore {
    /// Creates an empty store.
    /// 中文: 创建一个空存储。
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_tables(tables: Tables) -> Self {
        Self {
            tables: ArcSwap::new(Arc::new(tables)),
            write_lock: Mutex::new(()),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Tables> {
        self.tables.load_full()
    }

    /// Runs `modify` on a copy of the current snapshot, hands the result to
    /// `persist` and swaps it in when both succeed.
    pub(crate) fn commit_with<R>(
        &self,
        modify: impl FnOnce(&mut Tables) -> Result<R, Error>,
        persist: impl FnOnce(&Tables) -> Result<(), Error>,
    ) -> Result<R, Error> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::Store("write lock poisoned".to_string()))?;
        let current = self.tables.load_full();
        let mut next = (*current).clone();
        let out = modify(&mut next)?;
        persist(&next)?;
        self.tables.store(Arc::new(next));
        Ok(out)
    }

    fn commit<R>(&self, modify: impl FnOnce(&mut Tables) -> Result<R, Error>) -> Result<R, Error> {
        self.commit_with(modify, |_| Ok(()))
    }
}

impl KeyStore for MemoryKeyStore {
    fn get(&self, table: Table, key: &str) -> Result<Option<String>, Error> {
        Ok(self.tables.load().table(table).get(key).cloned())
    }

    fn put(&self, table: Table, key: &str, value: &str) -> Result<bool, Error> {
        self.commit(|tables| Ok(tables.put(table, key, value)))
    }

    fn pin(&self, table: Table, key: &str, value: &str) -> Result<bool, Error> {
        self.commit(|tables| {
            tables.pin(table, key, value);
            Ok(true)
        })
    }

    fn rem(&self, table: Table, key: &str) -> Result<bool, Error> {
        self.commit(|tables| Ok(tables.rem(table, key)))
    }

    fn items(&self, table: Table) -> Result<Vec<(String, String)>, Error> {
        Ok(self
            .tables
            .load()
            .table(table)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), Error> {
        self.commit(|tables| tables.apply(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_key_operations() {
        let store = MemoryKeyStore::new();
        assert_eq!(store.get(Table::Globals, "pidx").unwrap(), None);
        assert!(store.put(Table::Globals, "pidx", "0").unwrap());
        assert!(!store.put(Table::Globals, "pidx", "1").unwrap());
        assert!(store.pin(Table::Globals, "pidx", "2").unwrap());
        assert_eq!(store.get(Table::Globals, "pidx").unwrap().as_deref(), Some("2"));
        assert!(store.rem(Table::Globals, "pidx").unwrap());
        assert!(!store.rem(Table::Globals, "pidx").unwrap());
    }

    #[test]
    fn failed_batch_leaves_store_untouched() {
        let store = MemoryKeyStore::new();
        store.put(Table::Prefixes, "Dpre", "Dpre").unwrap();

        let mut batch = WriteBatch::new();
        batch.pin(Table::Situations, "Dpre", "{}");
        batch.put(Table::Prefixes, "Dpre", "Dpre");
        assert!(store.apply(batch).is_err());
        assert_eq!(store.get(Table::Situations, "Dpre").unwrap(), None);

        let mut batch = WriteBatch::new();
        batch.pin(Table::Situations, "Dpre", "{}");
        batch.rem(Table::Prefixes, "Dpre");
        store.apply(batch).unwrap();
        assert!(store.get(Table::Situations, "Dpre").unwrap().is_some());
        assert!(store.items(Table::Prefixes).unwrap().is_empty());
    }
}
