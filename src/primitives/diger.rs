use std::fmt;

use super::matter::{Matter, MatterCode};
use crate::error::Error;

/// Blake3-256 digest in qb64 form.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Diger {
    matter: Matter,
}

impl Diger {
    /// Digest of `ser`.
    pub fn blake3(ser: &[u8]) -> Result<Self, Error> {
        let digest = blake3::hash(ser);
        Ok(Self {
            matter: Matter::new(MatterCode::Blake3_256, digest.as_bytes().to_vec())?,
        })
    }

    pub fn from_qb64(qb64: &str) -> Result<Self, Error> {
        let matter = Matter::from_qb64(qb64)?;
        if matter.code() != MatterCode::Blake3_256 {
            return Err(Error::Decode(format!(
                "code {} is not a Blake3-256 digest",
                matter.code().code()
            )));
        }
        Ok(Self { matter })
    }

    pub fn raw(&self) -> &[u8] {
        self.matter.raw()
    }

    pub fn qb64(&self) -> String {
        self.matter.qb64()
    }

    /// True when this digest commits to `ser`.
    pub fn verify(&self, ser: &[u8]) -> bool {
        blake3::hash(ser).as_bytes().as_slice() == self.raw()
    }
}

impl fmt::Debug for Diger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Diger").field(&self.qb64()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commits_to_input() {
        let diger = Diger::blake3(b"DFRtyHAjSuJaRX6TDPva35GN11VHAruaOXMc79ZYDKsT").unwrap();
        assert!(diger.qb64().starts_with('E'));
        assert_eq!(diger.qb64().len(), 44);
        assert!(diger.verify(b"DFRtyHAjSuJaRX6TDPva35GN11VHAruaOXMc79ZYDKsT"));
        assert!(!diger.verify(b"other"));
        assert_eq!(Diger::from_qb64(&diger.qb64()).unwrap(), diger);
    }
}
