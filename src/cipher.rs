//! # 信封加密模块
//!
//! Encryption at rest of salts and private-key seeds under an AEID.
//!
//! The AEID is an Ed25519 verification key; its X25519 form is the
//! recipient key of a sealed envelope. Each envelope uses a fresh ephemeral
//! X25519 key. HKDF-SHA256 over the shared secret, salted with both public
//! keys, yields the ChaCha20-Poly1305 key and nonce. The envelope is
//! `epk || aead(plaintext)` where the plaintext is the qb64 text of the
//! secret, so the matching seed is all that is needed to open it.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use ed25519_dalek::{SigningKey, VerifyingKey};
use hkdf::Hkdf;
use sha2::Sha256;
use std::fmt;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::common::utils::{constant_time_eq, random_bytes};
use crate::error::Error;
use crate::primitives::{Matter, MatterCode, Verfer};

const ENVELOPE_INFO: &[u8] = b"keri-keeper/envelope/v1";
const EPK_LEN: usize = 32;

/// qb64 codes that mark a stored value as an envelope.
pub fn is_cipher(qb64: &str) -> bool {
    matches!(
        MatterCode::sniff(qb64),
        Ok(MatterCode::X25519CipherSeed | MatterCode::X25519CipherSalt)
    )
}

/// A sealed salt or seed.
#[derive(Clone, PartialEq, Eq)]
pub struct Cipher {
    matter: Matter,
}

impl Cipher {
    pub fn from_qb64(qb64: &str) -> Result<Self, Error> {
        let matter = Matter::from_qb64(qb64)?;
        match matter.code() {
            MatterCode::X25519CipherSeed | MatterCode::X25519CipherSalt => Ok(Self { matter }),
            other => Err(Error::Decode(format!("code {} is not a cipher", other.code()))),
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

    /// Code of the plaintext this cipher opens to.
    fn plain_code(&self) -> MatterCode {
        match self.matter.code() {
            MatterCode::X25519CipherSalt => MatterCode::Salt128,
            _ => MatterCode::Ed25519Seed,
        }
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher").field("code", &self.code()).finish()
    }
}

/// 派生信封的对称密钥与 nonce
fn envelope_key(
    shared: &[u8; 32],
    epk: &[u8; 32],
    rpk: &[u8; 32],
) -> Result<Zeroizing<[u8; 44]>, Error> {
    let mut salt = [0u8; 64];
    salt[..32].copy_from_slice(epk);
    salt[32..].copy_from_slice(rpk);
    let hk = Hkdf::<Sha256>::new(Some(&salt), shared);
    let mut okm = Zeroizing::new([0u8; 44]);
    hk.expand(ENVELOPE_INFO, okm.as_mut_slice())
        .map_err(|e| Error::Crypto(format!("Failed to derive envelope key using HKDF: {}", e)))?;
    Ok(okm)
}

/// Seals secrets to an AEID.
#[derive(Clone)]
pub struct Encrypter {
    public: PublicKey,
}

impl Encrypter {
    /// Encrypter for the X25519 form of an Ed25519 `aeid` verkey.
    pub fn from_aeid(aeid: &str) -> Result<Self, Error> {
        let verfer = Verfer::from_qb64(aeid)?;
        let bytes = <[u8; 32]>::try_from(verfer.raw())
            .map_err(|_| Error::Decode("aeid must be 32 bytes".to_string()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| Error::Decode(format!("aeid is not a valid Ed25519 key: {}", e)))?;
        Ok(Self {
            public: PublicKey::from(key.to_montgomery().to_bytes()),
        })
    }

    /// True when `seed` is the private counterpart of this AEID.
    pub fn verify_seed(&self, seed: &str) -> Result<bool, Error> {
        let decrypter = Decrypter::from_seed(seed)?;
        Ok(constant_time_eq(
            decrypter.public.as_bytes(),
            self.public.as_bytes(),
        ))
    }

    /// Seals the qb64 text of a salt or seed.
    pub fn encrypt(&self, plain: &str) -> Result<Cipher, Error> {
        let code = match MatterCode::sniff(plain)? {
            MatterCode::Salt128 => MatterCode::X25519CipherSalt,
            MatterCode::Ed25519Seed => MatterCode::X25519CipherSeed,
            other => {
                return Err(Error::Crypto(format!(
                    "unsupported plaintext code {} for envelope",
                    other.code()
                )));
            }
        };

        let ephemeral = StaticSecret::from(*Zeroizing::new(random_bytes::<32>()?));
        let epk = PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&self.public);
        if !shared.was_contributory() {
            return Err(Error::Crypto("non-contributory key exchange".to_string()));
        }

        let okm = envelope_key(shared.as_bytes(), epk.as_bytes(), self.public.as_bytes())?;
        let aead = ChaCha20Poly1305::new(Key::from_slice(&okm[..32]));
        let sealed = aead
            .encrypt(Nonce::from_slice(&okm[32..]), plain.as_bytes())
            .map_err(|e| Error::Crypto(format!("AEAD 加密失败: {}", e)))?;

        let mut raw = Vec::with_capacity(EPK_LEN + sealed.len());
        raw.extend_from_slice(epk.as_bytes());
        raw.extend_from_slice(&sealed);
        Ok(Cipher {
            matter: Matter::new(code, raw)?,
        })
    }
}

impl fmt::Debug for Encrypter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encrypter")
            .field("public", &self.public.as_bytes())
            .finish()
    }
}

/// Opens envelopes with the seed of an AEID.
#[derive(Clone)]
pub struct Decrypter {
    secret: StaticSecret,
    public: PublicKey,
}

impl Decrypter {
    /// Decrypter from the qb64 Ed25519 seed matching an AEID.
    pub fn from_seed(seed: &str) -> Result<Self, Error> {
        let matter = Matter::from_qb64(seed)?;
        if matter.code() != MatterCode::Ed25519Seed {
            return Err(Error::Decode(format!(
                "code {} is not an Ed25519 seed",
                matter.code().code()
            )));
        }
        let bytes = Zeroizing::new(
            <[u8; 32]>::try_from(matter.raw())
                .map_err(|_| Error::Decode("seed must be 32 bytes".to_string()))?,
        );
        let signing = SigningKey::from_bytes(&bytes);
        let secret = StaticSecret::from(*Zeroizing::new(signing.to_scalar_bytes()));
        let public = PublicKey::from(&secret);
        Ok(Self { secret, public })
    }

    /// Opens `cipher` and returns the qb64 text of the sealed secret.
    pub fn decrypt(&self, cipher: &Cipher) -> Result<Zeroizing<String>, Error> {
        let raw = cipher.raw();
        let epk = <[u8; 32]>::try_from(&raw[..EPK_LEN])
            .map_err(|_| Error::Decryption("truncated envelope".to_string()))?;
        let shared = self.secret.diffie_hellman(&PublicKey::from(epk));
        let okm = envelope_key(shared.as_bytes(), &epk, self.public.as_bytes())?;
        let aead = ChaCha20Poly1305::new(Key::from_slice(&okm[..32]));
        let opened = Zeroizing::new(
            aead.decrypt(Nonce::from_slice(&okm[32..]), &raw[EPK_LEN..])
                .map_err(|_| Error::Decryption("envelope failed to open".to_string()))?,
        );
        let plain = Zeroizing::new(
            std::str::from_utf8(&opened)
                .map_err(|_| Error::Decryption("envelope plaintext is not text".to_string()))?
                .to_string(),
        );
        if MatterCode::sniff(&plain)? != cipher.plain_code() {
            return Err(Error::Decryption(format!(
                "envelope plaintext does not match cipher code {}",
                cipher.code().code()
            )));
        }
        Ok(plain)
    }
}

impl fmt::Debug for Decrypter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decrypter").field("secret", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::Signer;

    fn keypair() -> (String, String) {
        let signer = Signer::random(true).unwrap();
        (signer.verfer().qb64(), signer.qb64().unwrap().to_string())
    }

    #[test]
    fn salt_envelope_roundtrip() {
        let (aeid, seed) = keypair();
        let encrypter = Encrypter::from_aeid(&aeid).unwrap();
        let decrypter = Decrypter::from_seed(&seed).unwrap();

        let salt = "0AAwMTIzNDU2Nzg5YWJjZGVm";
        let cipher = encrypter.encrypt(salt).unwrap();
        assert_eq!(cipher.code(), MatterCode::X25519CipherSalt);
        assert_eq!(cipher.qb64().len(), 100);
        assert!(is_cipher(&cipher.qb64()));
        assert_eq!(decrypter.decrypt(&cipher).unwrap().as_str(), salt);

        // 每次加密使用新的临时密钥
        let again = encrypter.encrypt(salt).unwrap();
        assert_ne!(again.qb64(), cipher.qb64());
    }

    #[test]
    fn seed_envelope_roundtrip() {
        let (aeid, seed) = keypair();
        let encrypter = Encrypter::from_aeid(&aeid).unwrap();
        let decrypter = Decrypter::from_seed(&seed).unwrap();

        let secret = Signer::random(true).unwrap().qb64().unwrap();
        let cipher = encrypter.encrypt(&secret).unwrap();
        assert_eq!(cipher.qb64().len(), 124);
        let parsed = Cipher::from_qb64(&cipher.qb64()).unwrap();
        assert_eq!(decrypter.decrypt(&parsed).unwrap().as_str(), secret.as_str());
    }

    #[test]
    fn wrong_seed_fails() {
        let (aeid, seed) = keypair();
        let (_, other) = keypair();
        let encrypter = Encrypter::from_aeid(&aeid).unwrap();
        assert!(encrypter.verify_seed(&seed).unwrap());
        assert!(!encrypter.verify_seed(&other).unwrap());

        let cipher = encrypter.encrypt("0AAwMTIzNDU2Nzg5YWJjZGVm").unwrap();
        let wrong = Decrypter::from_seed(&other).unwrap();
        assert!(matches!(wrong.decrypt(&cipher), Err(Error::Decryption(_))));
    }
}
