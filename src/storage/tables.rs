use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::traits::{Table, WriteBatch, WriteOp};
use crate::error::Error;

/// In-memory contents of every table, the unit a snapshot store swaps and
/// persists.
///
/// 中文: 所有表的内存内容，快照存储整体替换和持久化的单位。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    globals: BTreeMap<String, String>,
    prefixes: BTreeMap<String, String>,
    params: BTreeMap<String, String>,
    situations: BTreeMap<String, String>,
    pubsets: BTreeMap<String, String>,
    secrets: BTreeMap<String, String>,
}

impl Tables {
    pub fn table(&self, table: Table) -> &BTreeMap<String, String> {
        match table {
            Table::Globals => &self.globals,
            Table::Prefixes => &self.prefixes,
            Table::Params => &self.params,
            Table::Situations => &self.situations,
            Table::PubSets => &self.pubsets,
            Table::Secrets => &self.secrets,
        }
    }

    fn table_mut(&mut self, table: Table) -> &mut BTreeMap<String, String> {
        match table {
            Table::Globals => &mut self.globals,
            Table::Prefixes => &mut self.prefixes,
            Table::Params => &mut self.params,
            Table::Situations => &mut self.situations,
            Table::PubSets => &mut self.pubsets,
            Table::Secrets => &mut self.secrets,
        }
    }

    pub fn put(&mut self, table: Table, key: &str, value: &str) -> bool {
        let map = self.table_mut(table);
        if map.contains_key(key) {
            return false;
        }
        map.insert(key.to_string(), value.to_string());
        true
    }

    pub fn pin(&mut self, table: Table, key: &str, value: &str) {
        self.table_mut(table)
            .insert(key.to_string(), value.to_string());
    }

    pub fn rem(&mut self, table: Table, key: &str) -> bool {
        self.table_mut(table).remove(key).is_some()
    }

    /// Applies every write of `batch`; the first conflicting `Put` aborts
    /// with an error and leaves `self` partially updated, so callers apply
    /// batches to a copy.
    pub fn apply(&mut self, batch: WriteBatch) -> Result<(), Error> {
        for op in batch.into_ops() {
            match op {
                WriteOp::Put { table, key, value } => {
                    if !self.put(table, &key, &value) {
                        return Err(Error::Store(format!("{}.{} already exists", table, key)));
                    }
                }
                WriteOp::Pin { table, key, value } => self.pin(table, &key, &value),
                WriteOp::Rem { table, key } => {
                    self.rem(table, &key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_does_not_overwrite() {
        let mut tables = Tables::default();
        assert!(tables.put(Table::Secrets, "DKey", "ASeed"));
        assert!(!tables.put(Table::Secrets, "DKey", "AOther"));
        assert_eq!(tables.table(Table::Secrets)["DKey"], "ASeed");
        tables.pin(Table::Secrets, "DKey", "AOther");
        assert_eq!(tables.table(Table::Secrets)["DKey"], "AOther");
        assert!(tables.rem(Table::Secrets, "DKey"));
        assert!(!tables.rem(Table::Secrets, "DKey"));
    }

    #[test]
    fn batch_conflict_is_an_error() {
        let mut tables = Tables::default();
        tables.pin(Table::Prefixes, "Epre", "Epre");

        let mut batch = WriteBatch::new();
        batch.pin(Table::Params, "Epre", "{}");
        batch.put(Table::Prefixes, "Epre", "Epre");
        assert!(matches!(tables.apply(batch), Err(Error::Store(_))));
    }
}
