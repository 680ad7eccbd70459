//! Indexed signature encoding.
//!
//! An indexed signature carries the signer's position in the current
//! signing key list (`index`) and, optionally, its position in the prior
//! next key list (`ondex`). Small codes hold one index character; big codes
//! hold two index and two ondex characters.

use std::fmt;

use super::matter::{b64_to_int, decode_padded, encode_padded, int_to_b64, pad_size};
use crate::error::Error;

/// Largest index a small code can carry.
pub const SMALL_INDEX_MAX: u32 = 63;
/// Largest index or ondex a big code can carry.
pub const BIG_INDEX_MAX: u32 = 4095;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexerCode {
    /// `A` Ed25519 signature, index and ondex equal.
    Ed25519Sig,
    /// `B` Ed25519 signature, current list only.
    Ed25519CrtSig,
    /// `2A` Ed25519 signature, independent index and ondex.
    Ed25519BigSig,
    /// `2B` Ed25519 signature, current list only, big index.
    Ed25519BigCrtSig,
}

impl IndexerCode {
    pub const fn code(&self) -> &'static str {
        match self {
            IndexerCode::Ed25519Sig => "A",
            IndexerCode::Ed25519CrtSig => "B",
            IndexerCode::Ed25519BigSig => "2A",
            IndexerCode::Ed25519BigCrtSig => "2B",
        }
    }

    /// Size of the index field (main index plus ondex) in characters.
    const fn index_size(&self) -> usize {
        match self {
            IndexerCode::Ed25519Sig | IndexerCode::Ed25519CrtSig => 1,
            IndexerCode::Ed25519BigSig | IndexerCode::Ed25519BigCrtSig => 4,
        }
    }

    /// Size of the ondex part of the index field.
    const fn ondex_size(&self) -> usize {
        match self {
            IndexerCode::Ed25519Sig | IndexerCode::Ed25519CrtSig => 0,
            IndexerCode::Ed25519BigSig | IndexerCode::Ed25519BigCrtSig => 2,
        }
    }

    pub const fn raw_size(&self) -> usize {
        64
    }

    pub const fn full_size(&self) -> usize {
        match self {
            IndexerCode::Ed25519Sig | IndexerCode::Ed25519CrtSig => 88,
            IndexerCode::Ed25519BigSig | IndexerCode::Ed25519BigCrtSig => 92,
        }
    }

    /// True when the signature only satisfies the current key list.
    pub const fn is_current_only(&self) -> bool {
        matches!(self, IndexerCode::Ed25519CrtSig | IndexerCode::Ed25519BigCrtSig)
    }

    pub const fn max_index(&self) -> u32 {
        match self {
            IndexerCode::Ed25519Sig | IndexerCode::Ed25519CrtSig => SMALL_INDEX_MAX,
            IndexerCode::Ed25519BigSig | IndexerCode::Ed25519BigCrtSig => BIG_INDEX_MAX,
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(IndexerCode::Ed25519Sig),
            "B" => Some(IndexerCode::Ed25519CrtSig),
            "2A" => Some(IndexerCode::Ed25519BigSig),
            "2B" => Some(IndexerCode::Ed25519BigCrtSig),
            _ => None,
        }
    }

    /// Picks the code for a signature at `index` with an optional `ondex`.
    ///
    /// `None` means current-list only. An ondex equal to a small index uses
    /// the shared-position code, anything else the dual-index code.
    pub fn select(index: u32, ondex: Option<u32>) -> Self {
        match ondex {
            None if index <= SMALL_INDEX_MAX => IndexerCode::Ed25519CrtSig,
            None => IndexerCode::Ed25519BigCrtSig,
            Some(o) if o == index && index <= SMALL_INDEX_MAX => IndexerCode::Ed25519Sig,
            Some(_) => IndexerCode::Ed25519BigSig,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Indexer {
    code: IndexerCode,
    index: u32,
    ondex: Option<u32>,
    raw: Vec<u8>,
}

impl Indexer {
    pub fn new(
        code: IndexerCode,
        raw: impl Into<Vec<u8>>,
        index: u32,
        ondex: Option<u32>,
    ) -> Result<Self, Error> {
        let raw = raw.into();
        if raw.len() != code.raw_size() {
            return Err(Error::Decode(format!(
                "raw size {} does not match indexed code {}",
                raw.len(),
                code.code()
            )));
        }
        if index > code.max_index() {
            return Err(Error::SignatureIndex(format!(
                "index={} exceeds {} for code {}",
                index,
                code.max_index(),
                code.code()
            )));
        }
        let ondex = match code {
            IndexerCode::Ed25519CrtSig | IndexerCode::Ed25519BigCrtSig => {
                if ondex.is_some() {
                    return Err(Error::SignatureIndex(format!(
                        "current-only code {} cannot carry an ondex",
                        code.code()
                    )));
                }
                None
            }
            IndexerCode::Ed25519Sig => match ondex {
                None => Some(index),
                Some(o) if o == index => Some(o),
                Some(o) => {
                    return Err(Error::SignatureIndex(format!(
                        "ondex={} differs from index={} for code {}",
                        o,
                        index,
                        code.code()
                    )));
                }
            },
            IndexerCode::Ed25519BigSig => {
                let o = ondex.unwrap_or(index);
                if o > code.max_index() {
                    return Err(Error::SignatureIndex(format!(
                        "ondex={} exceeds {}",
                        o,
                        code.max_index()
                    )));
                }
                Some(o)
            }
        };
        Ok(Self {
            code,
            index,
            ondex,
            raw,
        })
    }

    pub fn from_qb64(qb64: &str) -> Result<Self, Error> {
        if !qb64.is_ascii() {
            return Err(Error::Decode("qb64 must be ASCII".to_string()));
        }
        let hs = match qb64.chars().next() {
            Some('A'..='Z' | 'a'..='z') => 1,
            Some('2') => 2,
            other => {
                return Err(Error::Decode(format!(
                    "unsupported indexed code selector {:?}",
                    other
                )));
            }
        };
        let code = qb64
            .get(..hs)
            .and_then(IndexerCode::from_code)
            .ok_or_else(|| Error::Decode(format!("unknown indexed code in {:?}", qb64)))?;
        if qb64.len() != code.full_size() {
            return Err(Error::Decode(format!(
                "indexed qb64 length {} does not match code {}",
                qb64.len(),
                code.code()
            )));
        }
        let ms = code.index_size() - code.ondex_size();
        let index = b64_to_int(&qb64[hs..hs + ms])?;
        let ondex_text = &qb64[hs + ms..hs + code.index_size()];
        let ondex = if code.is_current_only() {
            None
        } else if ondex_text.is_empty() {
            Some(index)
        } else {
            Some(b64_to_int(ondex_text)?)
        };
        let raw = decode_padded(&qb64[hs + code.index_size()..], pad_size(code.raw_size()))?;
        Self::new(code, raw, index, ondex)
    }

    pub fn code(&self) -> IndexerCode {
        self.code
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn ondex(&self) -> Option<u32> {
        self.ondex
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn qb64(&self) -> String {
        let ms = self.code.index_size() - self.code.ondex_size();
        let os = self.code.ondex_size();
        let mut text = String::with_capacity(self.code.full_size());
        text.push_str(self.code.code());
        text.push_str(&int_to_b64(self.index, ms));
        if os > 0 {
            // 仅当前列表的签名在 ondex 位置写入 0
            text.push_str(&int_to_b64(self.ondex.unwrap_or(0), os));
        }
        text.push_str(&encode_padded(&self.raw, pad_size(self.raw.len())));
        text
    }
}

impl fmt::Debug for Indexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indexer")
            .field("code", &self.code)
            .field("index", &self.index)
            .field("ondex", &self.ondex)
            .finish()
    }
}
