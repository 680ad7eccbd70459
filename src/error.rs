//! Defines the custom error type for the `keri-keeper` crate.

use thiserror::Error;

/// The main error type for the `keri-keeper` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed creation parameters, e.g. a zero key count or an ingest
    /// start index beyond the supplied generations.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The founding key of a sequence is already reserved or already has a
    /// private-key record.
    #[error("already incepted: {0}")]
    DuplicateInception(String),

    /// `rotate` on a sequence whose next key set is empty.
    #[error("attempt to rotate terminal sequence pre={0}")]
    TerminalSequence(String),

    /// `replay` advanced past the last ingested or derived generation.
    #[error("replay out of range: {0}")]
    IndexRange(String),

    #[error("invalid signing index: {0}")]
    SignatureIndex(String),

    #[error("decoding failed: {0}")]
    Decode(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("nonexistent prefix: {0}")]
    UnknownPrefix(String),

    #[error("missing private key for pubkey={0}")]
    MissingKey(String),

    #[error("key store error: {0}")]
    Store(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("serialization error (JSON)")]
    Json(#[from] serde_json::Error),

    #[error("decoding from Base64 failed: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl From<argon2::Error> for Error {
    fn from(err: argon2::Error) -> Self {
        Error::Crypto(format!("argon2: {}", err))
    }
}
