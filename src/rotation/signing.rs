//! Signing with stored private keys.

use tracing::debug;

use super::manager::Manager;
use crate::error::Error;
use crate::primitives::{BIG_INDEX_MAX, Cigar, Siger, Signer, Verfer};
use crate::storage::Transaction;

/// Selects the keys to sign with.
#[derive(Clone, Copy, Debug)]
pub enum Keys<'k> {
    /// qb64 public keys.
    Pubs(&'k [String]),
    Verfers(&'k [Verfer]),
}

impl Keys<'_> {
    fn pubs(&self) -> Vec<String> {
        match self {
            Keys::Pubs(pubs) => pubs.to_vec(),
            Keys::Verfers(verfers) => verfers.iter().map(Verfer::qb64).collect(),
        }
    }
}

/// A signature from [`Manager::sign`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signature {
    Indexed(Siger),
    Plain(Cigar),
}

impl Signature {
    pub fn qb64(&self) -> String {
        match self {
            Signature::Indexed(siger) => siger.qb64(),
            Signature::Plain(cigar) => cigar.qb64(),
        }
    }

    pub fn verfer(&self) -> &Verfer {
        match self {
            Signature::Indexed(siger) => siger.verfer(),
            Signature::Plain(cigar) => cigar.verfer(),
        }
    }

    pub fn verify(&self, ser: &[u8]) -> bool {
        match self {
            Signature::Indexed(siger) => siger.verify(ser),
            Signature::Plain(cigar) => cigar.verify(ser),
        }
    }
}

fn check_len<T>(name: &str, list: Option<&[T]>, expected: usize) -> Result<(), Error> {
    match list {
        Some(list) if list.len() != expected => Err(Error::SignatureIndex(format!(
            "{} has {} entries for {} signers",
            name,
            list.len(),
            expected
        ))),
        _ => Ok(()),
    }
}

impl Manager {
    fn signers(&self, keys: Keys<'_>) -> Result<Vec<Signer>, Error> {
        let tx = Transaction::new(self.store().as_ref());
        keys.pubs()
            .iter()
            .map(|public| self.load_signer(&tx, public))
            .collect()
    }

    /// Indexed signatures over `ser`, one per key.
    ///
    /// The index of the `i`th signature is `indices[i]`, or `i` without
    /// `indices`. Without `ondices` every signature also carries its index
    /// as ondex; a `None` entry in `ondices` makes that signature satisfy
    /// the current key list only.
    pub fn sign_indexed(
        &self,
        ser: &[u8],
        keys: Keys<'_>,
        indices: Option<&[u32]>,
        ondices: Option<&[Option<u32>]>,
    ) -> Result<Vec<Siger>, Error> {
        let signers = self.signers(keys)?;
        check_len("indices", indices, signers.len())?;
        check_len("ondices", ondices, signers.len())?;

        let mut sigers = Vec::with_capacity(signers.len());
        for (i, signer) in signers.iter().enumerate() {
            let index = match indices {
                Some(indices) => indices[i],
                None => u32::try_from(i)
                    .map_err(|_| Error::SignatureIndex(format!("position {} too large", i)))?,
            };
            if index > BIG_INDEX_MAX {
                return Err(Error::SignatureIndex(format!(
                    "index={} exceeds {}",
                    index, BIG_INDEX_MAX
                )));
            }
            let (only, ondex) = match ondices {
                Some(ondices) => (ondices[i].is_none(), ondices[i]),
                None => (false, None),
            };
            if let Some(ondex) = ondex.filter(|o| *o > BIG_INDEX_MAX) {
                return Err(Error::SignatureIndex(format!(
                    "ondex={} exceeds {}",
                    ondex, BIG_INDEX_MAX
                )));
            }
            sigers.push(signer.sign_indexed(ser, index, only, ondex)?);
        }
        debug!(count = sigers.len(), "signed indexed");
        Ok(sigers)
    }

    /// Plain signatures over `ser`, one per key.
    pub fn sign_plain(&self, ser: &[u8], keys: Keys<'_>) -> Result<Vec<Cigar>, Error> {
        let signers = self.signers(keys)?;
        let cigars = signers
            .iter()
            .map(|signer| signer.sign_plain(ser))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = cigars.len(), "signed plain");
        Ok(cigars)
    }

    /// Indexed or plain signatures over `ser`. `indices` and `ondices` only
    /// apply when `indexed`.
    pub fn sign(
        &self,
        ser: &[u8],
        keys: Keys<'_>,
        indexed: bool,
        indices: Option<&[u32]>,
        ondices: Option<&[Option<u32>]>,
    ) -> Result<Vec<Signature>, Error> {
        if indexed {
            Ok(self
                .sign_indexed(ser, keys, indices, ondices)?
                .into_iter()
                .map(Signature::Indexed)
                .collect())
        } else {
            Ok(self
                .sign_plain(ser, keys)?
                .into_iter()
                .map(Signature::Plain)
                .collect())
        }
    }
}
