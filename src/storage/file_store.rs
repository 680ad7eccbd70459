//! JSON snapshot file storage implementation for `KeyStore`.
// 中文: `KeyStore` 的 JSON 快照文件存储实现。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::memory_store::MemoryKeyStore;
use super::tables::Tables;
use super::traits::{KeyStore, Table, WriteBatch};
use crate::error::Error;

/// A key store persisted as one JSON snapshot file.
///
/// Every committed write rewrites the whole snapshot through a temporary
/// file that is renamed over the target, so the file on disk always holds a
/// complete committed state. On unix the file is created with mode `0o600`
/// because the secrets table may hold unencrypted seeds.
///
/// 中文: 以单个 JSON 快照文件持久化的密钥存储。
///
/// 每次提交都通过临时文件重写整个快照并重命名覆盖目标文件，
/// 因此磁盘上的文件始终是一个完整的已提交状态。
pub struct FileKeyStore {
    path: PathBuf,
    file_permissions: u32,
    memory: MemoryKeyStore,
}

impl FileKeyStore {
    /// Opens the snapshot at `path`, starting empty when it does not exist.
    ///
    /// 中文: 打开 `path` 处的快照，文件不存在时以空存储启动。
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let tables = if path.exists() {
            let json = fs::read_to_string(&path)?;
            serde_json::from_str::<Tables>(&json)?
        } else {
            Tables::default()
        };
        debug!(path = %path.display(), "opened key store snapshot");
        Ok(Self {
            path,
            file_permissions: 0o600, // 等同于 -rw-------
            memory: MemoryKeyStore::from_tables(tables),
        })
    }

    /// Overrides the unix mode of the snapshot file.
    pub fn with_file_permissions(mut self, mode: u32) -> Self {
        self.file_permissions = mode;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Tables> {
        self.memory.snapshot()
    }

    fn save(&self, tables: &Tables) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(tables)?;

        // Atomic write to prevent data corruption if the write is interrupted.
        // 中文: 原子写入，防止在写入中断时数据损坏。
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(self.file_permissions))?;
        }
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn commit<R>(&self, modify: impl FnOnce(&mut Tables) -> Result<R, Error>) -> Result<R, Error> {
        self.memory.commit_with(modify, |tables| self.save(tables))
    }
}

impl KeyStore for FileKeyStore {
    fn get(&self, table: Table, key: &str) -> Result<Option<String>, Error> {
        self.memory.get(table, key)
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
        self.memory.items(table)
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), Error> {
        self.commit(|tables| tables.apply(batch))
    }
}
