use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use super::records::{PrePrm, PreSit, PubSet, ri_key};
use super::traits::{KeyStore, Table, WriteBatch};
use crate::error::Error;

/// A staging overlay over a [`KeyStore`].
///
/// Reads see the staged writes first, then the store. Writes are recorded
/// in a [`WriteBatch`] that [`commit`](Self::commit) hands to the store in
/// one `apply`. Dropping an uncommitted transaction discards its writes.
///
/// 中文: 覆盖在 [`KeyStore`] 之上的暂存层。提交前丢弃即回滚。
pub struct Transaction<'a> {
    store: &'a dyn KeyStore,
    staged: BTreeMap<(Table, String), Option<String>>,
    batch: WriteBatch,
}

impl<'a> Transaction<'a> {
    pub fn new(store: &'a dyn KeyStore) -> Self {
        Self {
            store,
            staged: BTreeMap::new(),
            batch: WriteBatch::new(),
        }
    }

    pub fn get(&self, table: Table, key: &str) -> Result<Option<String>, Error> {
        match self.staged.get(&(table, key.to_string())) {
            Some(value) => Ok(value.clone()),
            None => self.store.get(table, key),
        }
    }

    pub fn put(&mut self, table: Table, key: &str, value: &str) -> Result<bool, Error> {
        if self.get(table, key)?.is_some() {
            return Ok(false);
        }
        self.staged
            .insert((table, key.to_string()), Some(value.to_string()));
        self.batch.put(table, key, value);
        Ok(true)
    }

    pub fn pin(&mut self, table: Table, key: &str, value: &str) {
        self.staged
            .insert((table, key.to_string()), Some(value.to_string()));
        self.batch.pin(table, key, value);
    }

    pub fn rem(&mut self, table: Table, key: &str) -> Result<bool, Error> {
        let existed = self.get(table, key)?.is_some();
        self.staged.insert((table, key.to_string()), None);
        self.batch.rem(table, key);
        Ok(existed)
    }

    /// Entries of `table` in key order, staged writes included.
    pub fn items(&self, table: Table) -> Result<Vec<(String, String)>, Error> {
        let mut merged: BTreeMap<String, String> = self.store.items(table)?.into_iter().collect();
        for ((t, key), value) in &self.staged {
            if *t != table {
                continue;
            }
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    /// Number of staged writes.
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub fn commit(self) -> Result<(), Error> {
        if self.batch.is_empty() {
            return Ok(());
        }
        self.store.apply(self.batch)
    }

    // --- typed record helpers ---

    fn get_json<T: DeserializeOwned>(&self, table: Table, key: &str) -> Result<Option<T>, Error> {
        self.get(table, key)?
            .map(|json| serde_json::from_str(&json).map_err(Error::from))
            .transpose()
    }

    fn put_json<T: Serialize>(&mut self, table: Table, key: &str, value: &T) -> Result<bool, Error> {
        let json = serde_json::to_string(value)?;
        self.put(table, key, &json)
    }

    fn pin_json<T: Serialize>(&mut self, table: Table, key: &str, value: &T) -> Result<(), Error> {
        let json = serde_json::to_string(value)?;
        self.pin(table, key, &json);
        Ok(())
    }

    pub fn prm(&self, pre: &str) -> Result<Option<PrePrm>, Error> {
        self.get_json(Table::Params, pre)
    }

    pub fn put_prm(&mut self, pre: &str, prm: &PrePrm) -> Result<bool, Error> {
        self.put_json(Table::Params, pre, prm)
    }

    pub fn pin_prm(&mut self, pre: &str, prm: &PrePrm) -> Result<(), Error> {
        self.pin_json(Table::Params, pre, prm)
    }

    pub fn sit(&self, pre: &str) -> Result<Option<PreSit>, Error> {
        self.get_json(Table::Situations, pre)
    }

    pub fn put_sit(&mut self, pre: &str, sit: &PreSit) -> Result<bool, Error> {
        self.put_json(Table::Situations, pre, sit)
    }

    pub fn pin_sit(&mut self, pre: &str, sit: &PreSit) -> Result<(), Error> {
        self.pin_json(Table::Situations, pre, sit)
    }

    pub fn pub_set(&self, pre: &str, ridx: u64) -> Result<Option<PubSet>, Error> {
        self.get_json(Table::PubSets, &ri_key(pre, ridx))
    }

    pub fn put_pub_set(&mut self, pre: &str, ridx: u64, pubs: &[String]) -> Result<bool, Error> {
        let set = PubSet {
            pubs: pubs.to_vec(),
        };
        self.put_json(Table::PubSets, &ri_key(pre, ridx), &set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyStore;

    #[test]
    fn reads_see_staged_writes() {
        let store = MemoryKeyStore::new();
        store.put(Table::Secrets, "DOne", "AOne").unwrap();

        let mut tx = Transaction::new(&store);
        assert!(!tx.put(Table::Secrets, "DOne", "AOther").unwrap());
        assert!(tx.put(Table::Secrets, "DTwo", "ATwo").unwrap());
        assert!(tx.rem(Table::Secrets, "DOne").unwrap());
        assert_eq!(tx.get(Table::Secrets, "DOne").unwrap(), None);
        assert_eq!(
            tx.items(Table::Secrets).unwrap(),
            vec![("DTwo".to_string(), "ATwo".to_string())]
        );

        // 未提交前存储不变
        assert!(store.get(Table::Secrets, "DOne").unwrap().is_some());
        tx.commit().unwrap();
        assert_eq!(store.get(Table::Secrets, "DOne").unwrap(), None);
        assert!(store.get(Table::Secrets, "DTwo").unwrap().is_some());
    }

    #[test]
    fn drop_discards_writes() {
        let store = MemoryKeyStore::new();
        {
            let mut tx = Transaction::new(&store);
            tx.put_pub_set("Dpre", 0, &["DKey".to_string()]).unwrap();
            assert!(tx.pub_set("Dpre", 0).unwrap().is_some());
        }
        assert!(store.items(Table::PubSets).unwrap().is_empty());
    }

    #[test]
    fn typed_records() {
        let store = MemoryKeyStore::new();
        let mut tx = Transaction::new(&store);
        let sit = PreSit::default();
        assert!(tx.put_sit("Dpre", &sit).unwrap());
        assert!(!tx.put_sit("Dpre", &sit).unwrap());
        tx.commit().unwrap();

        let tx = Transaction::new(&store);
        assert_eq!(tx.sit("Dpre").unwrap(), Some(sit));
        assert_eq!(tx.prm("Dpre").unwrap(), None);
    }
}
