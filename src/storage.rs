//! The storage module, defining how key sequences are persisted.
// 中文: 存储模块，定义了密钥序列如何持久化。

pub mod records;
pub mod tables;
pub mod traits;
pub mod transaction;

pub mod memory_store;

#[cfg(feature = "file-store")]
pub mod file_store;

#[cfg(feature = "file-store")]
pub use file_store::FileKeyStore;
pub use memory_store::MemoryKeyStore;
pub use records::{PrePrm, PreSit, PubLot, PubSet, ri_key};
pub use tables::Tables;
pub use traits::{KeyStore, Table, WriteBatch, WriteOp};
pub use transaction::Transaction;
