use argon2::{Algorithm, Argon2, Params, Version};
use std::fmt;
use zeroize::Zeroizing;

use super::matter::{Matter, MatterCode};
use super::signing::Signer;
use crate::common::config::Tier;
use crate::common::utils::random_bytes;
use crate::error::Error;

/// Argon2id cost parameters `(t_cost, m_cost_kib)` per tier.
fn stretch_params(tier: Tier, temp: bool) -> (u32, u32) {
    if temp {
        return (1, 8);
    }
    match tier {
        Tier::Low => (2, 64 * 1024),
        Tier::Med => (3, 256 * 1024),
        Tier::High => (4, 1024 * 1024),
    }
}

/// 128-bit salt that stretches a derivation path into signing seeds.
#[derive(Clone)]
pub struct Salter {
    raw: Zeroizing<[u8; 16]>,
    tier: Tier,
}

impl Salter {
    /// Random salt.
    pub fn new(tier: Tier) -> Result<Self, Error> {
        Ok(Self {
            raw: Zeroizing::new(random_bytes::<16>()?),
            tier,
        })
    }

    pub fn from_raw(raw: [u8; 16], tier: Tier) -> Self {
        Self {
            raw: Zeroizing::new(raw),
            tier,
        }
    }

    pub fn from_qb64(qb64: &str, tier: Tier) -> Result<Self, Error> {
        let matter = Matter::from_qb64(qb64)?;
        if matter.code() != MatterCode::Salt128 {
            return Err(Error::Decode(format!(
                "code {} is not a 128-bit salt",
                matter.code().code()
            )));
        }
        let raw = <[u8; 16]>::try_from(matter.raw())
            .map_err(|_| Error::Decode("salt must be 16 bytes".to_string()))?;
        Ok(Self::from_raw(raw, tier))
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn qb64(&self) -> Result<Zeroizing<String>, Error> {
        let matter = Matter::new(MatterCode::Salt128, self.raw.to_vec())?;
        Ok(Zeroizing::new(matter.qb64()))
    }

    /// Stretches `path` into 32 bytes with Argon2id keyed by this salt.
    pub fn stretch(&self, path: &str, temp: bool) -> Result<Zeroizing<[u8; 32]>, Error> {
        let (t_cost, m_cost) = stretch_params(self.tier, temp);
        let params = Params::new(m_cost, t_cost, 1, Some(32))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut out = Zeroizing::new([0u8; 32]);
        argon2.hash_password_into(path.as_bytes(), self.raw.as_slice(), out.as_mut_slice())?;
        Ok(out)
    }

    /// Signer whose seed is the stretch of `path`.
    pub fn signer(&self, path: &str, transferable: bool, temp: bool) -> Result<Signer, Error> {
        let seed = self.stretch(path, temp)?;
        Signer::from_seed(&seed, transferable)
    }
}

impl fmt::Debug for Salter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Salter")
            .field("tier", &self.tier)
            .field("raw", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &str = "0AAwMTIzNDU2Nzg5YWJjZGVm";

    #[test]
    fn stretch_is_deterministic() {
        let salter = Salter::from_qb64(SALT, Tier::Low).unwrap();
        let a = salter.stretch("000", true).unwrap();
        let b = salter.stretch("000", true).unwrap();
        let c = salter.stretch("001", true).unwrap();
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn fixture_path_zero() {
        let salter = Salter::from_qb64(SALT, Tier::Low).unwrap();
        let signer = salter.signer("000", true, true).unwrap();
        assert_eq!(
            signer.verfer().qb64(),
            "DFRtyHAjSuJaRX6TDPva35GN11VHAruaOXMc79ZYDKsT"
        );
    }

    #[test]
    fn qb64_preserves_salt() {
        let salter = Salter::new(Tier::Med).unwrap();
        let text = salter.qb64().unwrap();
        assert!(text.starts_with("0A"));
        let back = Salter::from_qb64(&text, Tier::Med).unwrap();
        assert_eq!(*back.raw, *salter.raw);
        assert!(Salter::from_qb64("DFRtyHAjSuJaRX6TDPva35GN11VHAruaOXMc79ZYDKsT", Tier::Low).is_err());
    }
}
