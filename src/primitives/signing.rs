//! Ed25519 signing keys, verification keys and signature value objects.

use ed25519_dalek::{Signature as DalekSignature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use std::fmt;
use zeroize::Zeroizing;

use super::indexer::{Indexer, IndexerCode};
use super::matter::{Matter, MatterCode};
use crate::common::utils::random_bytes;
use crate::error::Error;

/// Ed25519 verification key in qb64 form.
///
/// The derivation code records transferability: `D` keys may rotate, `B`
/// keys are the identifier themselves and never rotate.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Verfer {
    matter: Matter,
}

impl Verfer {
    pub fn new(raw: [u8; 32], transferable: bool) -> Result<Self, Error> {
        let code = if transferable {
            MatterCode::Ed25519
        } else {
            MatterCode::Ed25519N
        };
        Ok(Self {
            matter: Matter::new(code, raw.to_vec())?,
        })
    }

    pub fn from_qb64(qb64: &str) -> Result<Self, Error> {
        let matter = Matter::from_qb64(qb64)?;
        match matter.code() {
            MatterCode::Ed25519 | MatterCode::Ed25519N => Ok(Self { matter }),
            other => Err(Error::Decode(format!(
                "code {} is not an Ed25519 verification key",
                other.code()
            ))),
        }
    }

    pub fn code(&self) -> MatterCode {
        self.matter.code()
    }

    pub fn raw(&self) -> &[u8] {
        self.matter.raw()
    }

    pub fn qb64(&self) -> String {
        self.matter.qb64()
    }

    pub fn qb64b(&self) -> Vec<u8> {
        self.matter.qb64b()
    }

    pub fn is_transferable(&self) -> bool {
        self.matter.code() == MatterCode::Ed25519
    }

    /// Verifies `sig` over `ser`. Malformed keys or signatures verify false.
    pub fn verify(&self, sig: &[u8], ser: &[u8]) -> bool {
        let Ok(key_bytes) = <[u8; 32]>::try_from(self.raw()) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(sig) else {
            return false;
        };
        let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
            return false;
        };
        key.verify(ser, &DalekSignature::from_bytes(&sig_bytes))
            .is_ok()
    }
}

impl fmt::Debug for Verfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Verfer").field(&self.qb64()).finish()
    }
}

/// Ed25519 private signing key bundled with its [`Verfer`].
#[derive(Clone)]
pub struct Signer {
    key: SigningKey,
    verfer: Verfer,
}

impl Signer {
    /// 从 32 字节种子构造签名者
    pub fn from_seed(seed: &[u8; 32], transferable: bool) -> Result<Self, Error> {
        let key = SigningKey::from_bytes(seed);
        let verfer = Verfer::new(key.verifying_key().to_bytes(), transferable)?;
        Ok(Self { key, verfer })
    }

    /// Fresh signer from operating system randomness.
    pub fn random(transferable: bool) -> Result<Self, Error> {
        let seed = Zeroizing::new(random_bytes::<32>()?);
        Self::from_seed(&seed, transferable)
    }

    /// Parses a qb64 `A` seed.
    pub fn from_qb64(qb64: &str, transferable: bool) -> Result<Self, Error> {
        let matter = Matter::from_qb64(qb64)?;
        if matter.code() != MatterCode::Ed25519Seed {
            return Err(Error::Decode(format!(
                "code {} is not an Ed25519 seed",
                matter.code().code()
            )));
        }
        let seed = Zeroizing::new(
            <[u8; 32]>::try_from(matter.raw())
                .map_err(|_| Error::Decode("seed must be 32 bytes".to_string()))?,
        );
        Self::from_seed(&seed, transferable)
    }

    pub fn verfer(&self) -> &Verfer {
        &self.verfer
    }

    /// qb64 of the private seed.
    pub fn qb64(&self) -> Result<Zeroizing<String>, Error> {
        let matter = Matter::new(MatterCode::Ed25519Seed, self.key.to_bytes().to_vec())?;
        Ok(Zeroizing::new(matter.qb64()))
    }

    /// Non-indexed signature over `ser`.
    pub fn sign_plain(&self, ser: &[u8]) -> Result<Cigar, Error> {
        let sig = self.key.sign(ser);
        Ok(Cigar {
            matter: Matter::new(MatterCode::Ed25519Sig, sig.to_bytes().to_vec())?,
            verfer: self.verfer.clone(),
        })
    }

    /// Indexed signature over `ser`.
    ///
    /// With `only` set the signature satisfies the current key list alone
    /// and `ondex` is ignored. Otherwise a missing `ondex` defaults to
    /// `index`.
    pub fn sign_indexed(
        &self,
        ser: &[u8],
        index: u32,
        only: bool,
        ondex: Option<u32>,
    ) -> Result<Siger, Error> {
        let ondex = if only { None } else { Some(ondex.unwrap_or(index)) };
        let code = IndexerCode::select(index, ondex);
        let sig = self.key.sign(ser);
        Ok(Siger {
            indexer: Indexer::new(code, sig.to_bytes().to_vec(), index, ondex)?,
            verfer: self.verfer.clone(),
        })
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("verfer", &self.verfer)
            .field("seed", &"<redacted>")
            .finish()
    }
}

/// Non-indexed signature with the key that made it.
#[derive(Clone, PartialEq, Eq)]
pub struct Cigar {
    matter: Matter,
    verfer: Verfer,
}

impl Cigar {
    pub fn from_qb64(qb64: &str, verfer: Verfer) -> Result<Self, Error> {
        let matter = Matter::from_qb64(qb64)?;
        if matter.code() != MatterCode::Ed25519Sig {
            return Err(Error::Decode(format!(
                "code {} is not an Ed25519 signature",
                matter.code().code()
            )));
        }
        Ok(Self { matter, verfer })
    }

    pub fn raw(&self) -> &[u8] {
        self.matter.raw()
    }

    pub fn qb64(&self) -> String {
        self.matter.qb64()
    }

    pub fn verfer(&self) -> &Verfer {
        &self.verfer
    }

    pub fn verify(&self, ser: &[u8]) -> bool {
        self.verfer.verify(self.raw(), ser)
    }
}

impl fmt::Debug for Cigar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cigar")
            .field("qb64", &self.qb64())
            .field("verfer", &self.verfer)
            .finish()
    }
}

/// Indexed signature with the key that made it.
#[derive(Clone, PartialEq, Eq)]
pub struct Siger {
    indexer: Indexer,
    verfer: Verfer,
}

impl Siger {
    pub fn from_qb64(qb64: &str, verfer: Verfer) -> Result<Self, Error> {
        Ok(Self {
            indexer: Indexer::from_qb64(qb64)?,
            verfer,
        })
    }

    pub fn code(&self) -> IndexerCode {
        self.indexer.code()
    }

    pub fn index(&self) -> u32 {
        self.indexer.index()
    }

    pub fn ondex(&self) -> Option<u32> {
        self.indexer.ondex()
    }

    pub fn raw(&self) -> &[u8] {
        self.indexer.raw()
    }

    pub fn qb64(&self) -> String {
        self.indexer.qb64()
    }

    pub fn verfer(&self) -> &Verfer {
        &self.verfer
    }

    pub fn verify(&self, ser: &[u8]) -> bool {
        self.verfer.verify(self.raw(), ser)
    }
}

impl fmt::Debug for Siger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Siger")
            .field("indexer", &self.indexer)
            .field("verfer", &self.verfer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_qb64_restores_same_key() {
        let signer = Signer::random(true).unwrap();
        let seed = signer.qb64().unwrap();
        assert_eq!(seed.len(), 44);
        assert!(seed.starts_with('A'));

        let again = Signer::from_qb64(&seed, true).unwrap();
        assert_eq!(again.verfer(), signer.verfer());
        assert!(again.verfer().is_transferable());

        let basic = Signer::from_qb64(&seed, false).unwrap();
        assert!(basic.verfer().qb64().starts_with('B'));
        assert_eq!(basic.verfer().raw(), signer.verfer().raw());
    }

    #[test]
    fn signatures_verify() {
        let signer = Signer::random(true).unwrap();
        let ser = b"abcdefghijklmnopqrstuvwxyz0123456789";

        let cigar = signer.sign_plain(ser).unwrap();
        assert!(cigar.qb64().starts_with("0B"));
        assert!(cigar.verify(ser));
        assert!(!cigar.verify(b"tampered"));

        let siger = signer.sign_indexed(ser, 2, false, None).unwrap();
        assert_eq!(siger.code(), IndexerCode::Ed25519Sig);
        assert_eq!(siger.ondex(), Some(2));
        assert!(siger.verify(ser));

        let crt = signer.sign_indexed(ser, 2, true, Some(5)).unwrap();
        assert_eq!(crt.code(), IndexerCode::Ed25519CrtSig);
        assert_eq!(crt.ondex(), None);

        let big = signer.sign_indexed(ser, 2, false, Some(5)).unwrap();
        assert_eq!(big.code(), IndexerCode::Ed25519BigSig);
        let parsed = Siger::from_qb64(&big.qb64(), signer.verfer().clone()).unwrap();
        assert_eq!((parsed.index(), parsed.ondex()), (2, Some(5)));
        assert!(parsed.verify(ser));
    }

    #[test]
    fn verfer_rejects_other_codes() {
        assert!(Verfer::from_qb64("0AAwMTIzNDU2Nzg5YWJjZGVm").is_err());
        assert!(Signer::from_qb64("DFRtyHAjSuJaRX6TDPva35GN11VHAruaOXMc79ZYDKsT", true).is_err());
        let verfer = Verfer::from_qb64("DFRtyHAjSuJaRX6TDPva35GN11VHAruaOXMc79ZYDKsT").unwrap();
        assert!(verfer.is_transferable());
        assert!(!verfer.verify(&[0u8; 12], b"short signature"));
    }
}
