//! # Keri-Keeper: Pre-Rotation Key Management
//!
//! `keri-keeper` creates, commits, rotates and uses the signing keys of
//! self-certifying identifiers. Every key sequence follows a pre-rotation
//! discipline: the digests of the next keys are published before those keys
//! are ever used, and a rotation reveals exactly the keys committed to.
//!
//! ## Core Concepts
//!
//! - **`Manager`**: incepts, rotates, replays, ingests, signs and re-keys key
//!   sequences, persisting everything through a `KeyStore`.
//! - **`Creator`**: key pair strategy, deterministic from a salt (`Salty`) or
//!   random (`Randy`).
//! - **`KeyStore`**: the storage seam. `MemoryKeyStore` and `FileKeyStore`
//!   are provided.
//! - **AEID**: an optional Ed25519 key pair whose X25519 form encrypts every
//!   salt and private key at rest.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keri_keeper::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Error> {
//!     let manager = Manager::builder(Arc::new(MemoryKeyStore::new())).build()?;
//!
//!     // Incept a sequence with one current and one next key
//!     let (verfers, digers) = manager.incept(&InceptConfig::default())?;
//!     let pre = verfers[0].qb64();
//!
//!     // Sign with the current key
//!     let sigers = manager.sign_indexed(b"event", Keys::Verfers(&verfers), None, None)?;
//!     assert!(sigers[0].verify(b"event"));
//!
//!     // Reveal the committed key and commit to a fresh one
//!     let (verfers, _) = manager.rotate(&pre, &RotateConfig::default())?;
//!     assert!(digers[0].verify(&verfers[0].qb64b()));
//!     Ok(())
//! }
//! ```

pub mod cipher;
pub mod common;
pub mod creator;
pub mod error;
pub mod primitives;
pub mod rotation;
pub mod storage;

pub use error::Error;

// --- Prelude ---
// A collection of the most commonly used traits, structs, and enums.
pub mod prelude {
    pub use crate::common::{
        Algo, IngestConfig, InceptConfig, ManagerConfig, ReplayConfig, RotateConfig, Tier,
    };
    pub use crate::creator::{Creator, Creatory, RandyCreator, SaltyCreator};
    pub use crate::error::Error;
    pub use crate::primitives::{Cigar, Diger, Siger, Signer, Verfer};
    pub use crate::rotation::{Keys, Manager, ManagerBuilder, Signature};
    #[cfg(feature = "file-store")]
    pub use crate::storage::FileKeyStore;
    pub use crate::storage::{KeyStore, MemoryKeyStore};
}

/// The version of the `keri-keeper` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
