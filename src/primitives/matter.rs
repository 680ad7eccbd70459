//! qb64 text encoding of fixed-size cryptographic primitives.
//!
//! A primitive is a derivation code followed by the URL-safe base64 of its
//! raw bytes. The raw bytes are left-padded with zero bytes to a multiple of
//! three before encoding and the same number of leading characters is then
//! dropped, which keeps the code plus payload on a 24-bit boundary.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Error;

const B64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Derivation codes of the primitives this crate produces or consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatterCode {
    /// `A` Ed25519 private key seed.
    Ed25519Seed,
    /// `B` Ed25519 verification key, non-transferable.
    Ed25519N,
    /// `D` Ed25519 verification key, transferable.
    Ed25519,
    /// `E` Blake3-256 digest.
    Blake3_256,
    /// `P` X25519 sealed cipher of an Ed25519 seed.
    X25519CipherSeed,
    /// `0A` 128-bit random salt.
    Salt128,
    /// `0B` Ed25519 signature.
    Ed25519Sig,
    /// `1AAH` X25519 sealed cipher of a salt.
    X25519CipherSalt,
}

impl MatterCode {
    pub const fn code(&self) -> &'static str {
        match self {
            MatterCode::Ed25519Seed => "A",
            MatterCode::Ed25519N => "B",
            MatterCode::Ed25519 => "D",
            MatterCode::Blake3_256 => "E",
            MatterCode::X25519CipherSeed => "P",
            MatterCode::Salt128 => "0A",
            MatterCode::Ed25519Sig => "0B",
            MatterCode::X25519CipherSalt => "1AAH",
        }
    }

    pub const fn raw_size(&self) -> usize {
        match self {
            MatterCode::Ed25519Seed
            | MatterCode::Ed25519N
            | MatterCode::Ed25519
            | MatterCode::Blake3_256 => 32,
            MatterCode::X25519CipherSeed => 92,
            MatterCode::Salt128 => 16,
            MatterCode::Ed25519Sig => 64,
            MatterCode::X25519CipherSalt => 72,
        }
    }

    /// Total length of the qb64 text form.
    pub const fn full_size(&self) -> usize {
        let raw = self.raw_size();
        let ps = pad_size(raw);
        self.code().len() + (raw + ps) / 3 * 4 - ps
    }

    /// True for codes whose raw bytes are secret material.
    pub const fn is_secret(&self) -> bool {
        matches!(
            self,
            MatterCode::Ed25519Seed | MatterCode::Salt128
        )
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = match code {
            "A" => MatterCode::Ed25519Seed,
            "B" => MatterCode::Ed25519N,
            "D" => MatterCode::Ed25519,
            "E" => MatterCode::Blake3_256,
            "P" => MatterCode::X25519CipherSeed,
            "0A" => MatterCode::Salt128,
            "0B" => MatterCode::Ed25519Sig,
            "1AAH" => MatterCode::X25519CipherSalt,
            _ => return None,
        };
        Some(code)
    }

    /// Reads the derivation code at the front of a qb64 string.
    pub fn sniff(qb64: &str) -> Result<Self, Error> {
        let first = qb64
            .chars()
            .next()
            .ok_or_else(|| Error::Decode("empty qb64".to_string()))?;
        let hs = match first {
            'A'..='Z' | 'a'..='z' => 1,
            '0' => 2,
            '1' => 4,
            _ => return Err(Error::Decode(format!("unsupported code selector {:?}", first))),
        };
        let code = qb64
            .get(..hs)
            .ok_or_else(|| Error::Decode(format!("qb64 too short for code: {:?}", qb64)))?;
        Self::from_code(code).ok_or_else(|| Error::Decode(format!("unknown derivation code {}", code)))
    }
}

pub(crate) const fn pad_size(raw_len: usize) -> usize {
    (3 - raw_len % 3) % 3
}

/// Encodes `raw` behind `ps` zero pad bytes and strips the pad characters.
pub(crate) fn encode_padded(raw: &[u8], ps: usize) -> String {
    let mut padded = Vec::with_capacity(ps + raw.len());
    padded.resize(ps, 0u8);
    padded.extend_from_slice(raw);
    let text = URL_SAFE_NO_PAD.encode(&padded);
    padded.zeroize();
    text[ps..].to_string()
}

/// Inverse of [`encode_padded`]. The pad bytes must decode as zero.
pub(crate) fn decode_padded(text: &str, ps: usize) -> Result<Vec<u8>, Error> {
    let mut padded_text = String::with_capacity(ps + text.len());
    padded_text.extend(std::iter::repeat_n('A', ps));
    padded_text.push_str(text);
    let mut bytes = URL_SAFE_NO_PAD.decode(padded_text.as_bytes())?;
    padded_text.zeroize();
    if bytes.len() < ps || bytes[..ps].iter().any(|b| *b != 0) {
        bytes.zeroize();
        return Err(Error::Decode("nonzero pad bits".to_string()));
    }
    Ok(bytes.split_off(ps))
}

/// Base64 digits of `value` left-filled with `A` to `width` characters.
pub(crate) fn int_to_b64(mut value: u32, width: usize) -> String {
    let mut digits = vec![b'A'; width];
    for slot in digits.iter_mut().rev() {
        *slot = B64_ALPHABET[(value % 64) as usize];
        value /= 64;
    }
    String::from_utf8(digits).unwrap_or_default()
}

pub(crate) fn b64_to_int(text: &str) -> Result<u32, Error> {
    text.bytes().try_fold(0u32, |acc, c| {
        let digit = B64_ALPHABET
            .iter()
            .position(|b| *b == c)
            .ok_or_else(|| Error::Decode(format!("invalid base64 digit {:?}", c as char)))?;
        Ok(acc * 64 + digit as u32)
    })
}

/// A fixed-size primitive: derivation code plus raw bytes.
#[derive(Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct Matter {
    #[zeroize(skip)]
    code: MatterCode,
    raw: Vec<u8>,
}

impl Matter {
    pub fn new(code: MatterCode, raw: impl Into<Vec<u8>>) -> Result<Self, Error> {
        let raw = raw.into();
        if raw.len() != code.raw_size() {
            return Err(Error::Decode(format!(
                "raw size {} does not match code {} (expected {})",
                raw.len(),
                code.code(),
                code.raw_size()
            )));
        }
        Ok(Self { code, raw })
    }

    pub fn from_qb64(qb64: &str) -> Result<Self, Error> {
        if !qb64.is_ascii() {
            return Err(Error::Decode("qb64 must be ASCII".to_string()));
        }
        let code = MatterCode::sniff(qb64)?;
        if qb64.len() != code.full_size() {
            return Err(Error::Decode(format!(
                "qb64 length {} does not match code {} (expected {})",
                qb64.len(),
                code.code(),
                code.full_size()
            )));
        }
        let raw = decode_padded(&qb64[code.code().len()..], pad_size(code.raw_size()))?;
        Self::new(code, raw)
    }

    pub fn code(&self) -> MatterCode {
        self.code
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn qb64(&self) -> String {
        let mut text = String::with_capacity(self.code.full_size());
        text.push_str(self.code.code());
        text.push_str(&encode_padded(&self.raw, pad_size(self.raw.len())));
        text
    }

    pub fn qb64b(&self) -> Vec<u8> {
        self.qb64().into_bytes()
    }
}

impl fmt::Debug for Matter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code.is_secret() {
            f.debug_struct("Matter")
                .field("code", &self.code)
                .field("raw", &"<redacted>")
                .finish()
        } else {
            f.debug_struct("Matter")
                .field("code", &self.code)
                .field("qb64", &self.qb64())
                .finish()
        }
    }
}
