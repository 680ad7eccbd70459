//! Traits for abstracting key store operations.
// 中文: 用于抽象密钥存储操作的 Trait。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// Logical tables of a key store.
///
/// 中文: 密钥存储中的逻辑表。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    /// Root parameters: `aeid`, `pidx`, `algo`, `salt`, `tier`.
    Globals,
    /// Reserved prefixes and `move` aliases.
    Prefixes,
    /// [`PrePrm`](super::PrePrm) per prefix.
    Params,
    /// [`PreSit`](super::PreSit) per prefix.
    Situations,
    /// [`PubSet`](super::PubSet) per prefix and rotation index.
    PubSets,
    /// Private key seed (plain or cipher qb64) per public key.
    Secrets,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Globals,
        Table::Prefixes,
        Table::Params,
        Table::Situations,
        Table::PubSets,
        Table::Secrets,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Globals => "globals",
            Table::Prefixes => "prefixes",
            Table::Params => "params",
            Table::Situations => "situations",
            Table::PubSets => "pubsets",
            Table::Secrets => "secrets",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single staged write.
#[derive(Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert, failing when the key exists.
    Put {
        table: Table,
        key: String,
        value: String,
    },
    /// Insert or overwrite.
    Pin {
        table: Table,
        key: String,
        value: String,
    },
    Rem { table: Table, key: String },
}

impl fmt::Debug for WriteOp {
    // 值可能是私钥，不输出
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::Put { table, key, .. } => write!(f, "Put({}, {})", table, key),
            WriteOp::Pin { table, key, .. } => write!(f, "Pin({}, {})", table, key),
            WriteOp::Rem { table, key } => write!(f, "Rem({}, {})", table, key),
        }
    }
}

/// Ordered list of writes applied as one unit.
///
/// 中文: 作为一个整体应用的有序写操作列表。
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, table: Table, key: impl Into<String>, value: impl Into<String>) {
        self.ops.push(WriteOp::Put {
            table,
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn pin(&mut self, table: Table, key: impl Into<String>, value: impl Into<String>) {
        self.ops.push(WriteOp::Pin {
            table,
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn rem(&mut self, table: Table, key: impl Into<String>) {
        self.ops.push(WriteOp::Rem {
            table,
            key: key.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Defines the universal interface of a keyed store with logical tables.
///
/// All methods take `&self`; implementations use interior mutability so a
/// store can be shared behind an `Arc`. Keys are UTF-8 strings and values
/// are text (JSON records or qb64 primitives).
///
/// 中文: 定义了带逻辑表的键值存储的通用接口。
///
/// 所有方法都接收 `&self`，实现使用内部可变性，以便通过 `Arc` 共享存储。
pub trait KeyStore: Send + Sync {
    fn get(&self, table: Table, key: &str) -> Result<Option<String>, Error>;

    /// Inserts `value` unless `key` exists. Returns `false` on an existing key.
    ///
    /// 中文: 仅在键不存在时插入，键已存在时返回 `false`。
    fn put(&self, table: Table, key: &str, value: &str) -> Result<bool, Error>;

    /// Inserts or overwrites `value`.
    fn pin(&self, table: Table, key: &str, value: &str) -> Result<bool, Error>;

    /// Removes `key`. Returns `false` when it was absent.
    fn rem(&self, table: Table, key: &str) -> Result<bool, Error>;

    /// All entries of `table` in key order.
    fn items(&self, table: Table) -> Result<Vec<(String, String)>, Error>;

    /// Applies `batch` in order.
    ///
    /// The default applies each write through the single-key methods and is
    /// not atomic; stores that can commit a batch all-or-nothing override it.
    /// A `Put` on an existing key fails the batch with [`Error::Store`].
    ///
    /// 中文: 按顺序应用写批次。默认实现逐条执行，不具备原子性。
    fn apply(&self, batch: WriteBatch) -> Result<(), Error> {
        for op in batch.into_ops() {
            match op {
                WriteOp::Put { table, key, value } => {
                    if !self.put(table, &key, &value)? {
                        return Err(Error::Store(format!("{}.{} already exists", table, key)));
                    }
                }
                WriteOp::Pin { table, key, value } => {
                    self.pin(table, &key, &value)?;
                }
                WriteOp::Rem { table, key } => {
                    self.rem(table, &key)?;
                }
            }
        }
        Ok(())
    }
}
