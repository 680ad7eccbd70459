//! Key pair creation strategies.
//!
//! A [`Creator`] turns a count and a position in the key stream of a
//! sequence into signers. [`SaltyCreator`] derives them deterministically
//! from a salt, [`RandyCreator`] draws them from the operating system and
//! [`NullCreator`] yields nothing. [`Creatory`] picks one by [`Algo`].

use std::fmt;
use zeroize::Zeroizing;

use crate::common::config::{Algo, Tier};
use crate::error::Error;
use crate::primitives::{Salter, Signer};

/// Generates key pairs for one key sequence.
pub trait Creator: Send + Sync + fmt::Debug {
    /// Creates `count` signers.
    ///
    /// `pidx`, `ridx` and `kidx` locate the first key in the sequence's key
    /// stream; only deterministic creators use them.
    fn create(
        &self,
        count: usize,
        pidx: u64,
        ridx: u64,
        kidx: u64,
        transferable: bool,
        temp: bool,
    ) -> Result<Vec<Signer>, Error>;

    /// qb64 salt, empty when the creator has none.
    fn salt(&self) -> Result<Zeroizing<String>, Error> {
        Ok(Zeroizing::new(String::new()))
    }

    fn stem(&self) -> &str {
        ""
    }

    fn tier(&self) -> Option<Tier> {
        None
    }
}

/// Creates nothing.
#[derive(Debug, Default)]
pub struct NullCreator;

impl Creator for NullCreator {
    fn create(
        &self,
        _count: usize,
        _pidx: u64,
        _ridx: u64,
        _kidx: u64,
        _transferable: bool,
        _temp: bool,
    ) -> Result<Vec<Signer>, Error> {
        Ok(Vec::new())
    }
}

/// Independent random key pairs.
#[derive(Debug, Default)]
pub struct RandyCreator;

impl Creator for RandyCreator {
    fn create(
        &self,
        count: usize,
        _pidx: u64,
        _ridx: u64,
        _kidx: u64,
        transferable: bool,
        _temp: bool,
    ) -> Result<Vec<Signer>, Error> {
        (0..count).map(|_| Signer::random(transferable)).collect()
    }
}

/// Deterministic key pairs stretched from a salt.
///
/// The key at offset `i` of a call is derived from the path
/// `{stem}{ridx:x}{kidx + i:x}`, where an empty stem stands for `{pidx:x}`.
#[derive(Debug)]
pub struct SaltyCreator {
    salter: Salter,
    stem: String,
}

impl SaltyCreator {
    /// A random salt is drawn when `salt` is `None`.
    pub fn new(salt: Option<&str>, stem: Option<&str>, tier: Tier) -> Result<Self, Error> {
        let salter = match salt {
            Some(qb64) => Salter::from_qb64(qb64, tier)?,
            None => Salter::new(tier)?,
        };
        Ok(Self {
            salter,
            stem: stem.unwrap_or_default().to_string(),
        })
    }

    pub(crate) fn path(&self, pidx: u64, ridx: u64, kidx: u64) -> String {
        let stem = if self.stem.is_empty() {
            format!("{:x}", pidx)
        } else {
            self.stem.clone()
        };
        format!("{}{:x}{:x}", stem, ridx, kidx)
    }
}

impl Creator for SaltyCreator {
    fn create(
        &self,
        count: usize,
        pidx: u64,
        ridx: u64,
        kidx: u64,
        transferable: bool,
        temp: bool,
    ) -> Result<Vec<Signer>, Error> {
        (0..count as u64)
            .map(|i| {
                let path = self.path(pidx, ridx, kidx + i);
                self.salter.signer(&path, transferable, temp)
            })
            .collect()
    }

    fn salt(&self) -> Result<Zeroizing<String>, Error> {
        self.salter.qb64()
    }

    fn stem(&self) -> &str {
        &self.stem
    }

    fn tier(&self) -> Option<Tier> {
        Some(self.salter.tier())
    }
}

/// 根据算法选择创建器的工厂
pub struct Creatory;

impl Creatory {
    pub fn make(
        algo: Algo,
        salt: Option<&str>,
        stem: Option<&str>,
        tier: Tier,
    ) -> Result<Box<dyn Creator>, Error> {
        match algo {
            Algo::Salty => Ok(Box::new(SaltyCreator::new(salt, stem, tier)?)),
            Algo::Randy => Ok(Box::new(RandyCreator)),
        }
    }
}
