//! 基础原语模块：qb64 编码、签名、摘要与盐值拉伸
//!
//! Fixed-size primitives in their qb64 text form, Ed25519 signers and
//! verifiers, indexed and plain signatures, Blake3 digests and the Argon2id
//! salt stretcher used for deterministic key derivation.
mod diger;
mod indexer;
mod matter;
mod salter;
mod signing;

pub use diger::Diger;
pub use indexer::{BIG_INDEX_MAX, Indexer, IndexerCode, SMALL_INDEX_MAX};
pub use matter::{Matter, MatterCode};
pub use salter::Salter;
pub use signing::{Cigar, Siger, Signer, Verfer};
