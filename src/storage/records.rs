//! Persisted records of a key sequence.

use serde::{Deserialize, Serialize};

use crate::common::config::{Algo, Tier};

/// Creation parameters of a key sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrePrm {
    /// 序列索引，创建时分配后不再改变
    pub pidx: u64,
    pub algo: Algo,
    /// qb64 salt or salt cipher; empty for random sequences.
    pub salt: String,
    pub stem: String,
    pub tier: Tier,
}

/// One generation of public keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubLot {
    pub pubs: Vec<String>,
    /// Rotation index, 0 at inception.
    pub ridx: u64,
    /// Offset of the first key in the key stream of the sequence.
    pub kidx: u64,
    /// ISO 8601 creation time, empty for the default lot.
    pub dt: String,
}

impl PubLot {
    pub fn new(pubs: Vec<String>, ridx: u64, kidx: u64, dt: String) -> Self {
        Self {
            pubs,
            ridx,
            kidx,
            dt,
        }
    }
}

/// Rotation window of a key sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreSit {
    /// Generation superseded by the last rotation.
    pub old: PubLot,
    /// Current signing keys.
    pub new: PubLot,
    /// Committed but unrevealed next keys.
    pub nxt: PubLot,
}

impl PreSit {
    /// Slides the window one generation and returns the generation that
    /// fell out of it.
    pub fn advance(&mut self, nxt: PubLot) -> PubLot {
        let prior = std::mem::take(&mut self.old);
        self.old = std::mem::replace(&mut self.new, std::mem::replace(&mut self.nxt, nxt));
        prior
    }
}

/// Public keys of one generation, addressed by prefix and rotation index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubSet {
    pub pubs: Vec<String>,
}

/// Key of a [`PubSet`] row.
pub fn ri_key(pre: &str, ridx: u64) -> String {
    format!("{}.{:032x}", pre, ridx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(name: &str, ridx: u64) -> PubLot {
        PubLot::new(vec![name.to_string()], ridx, ridx, String::new())
    }

    #[test]
    fn advance_slides_window() {
        let mut sit = PreSit {
            old: lot("a", 0),
            new: lot("b", 1),
            nxt: lot("c", 2),
        };
        let gone = sit.advance(lot("d", 3));
        assert_eq!(gone, lot("a", 0));
        assert_eq!(sit.old, lot("b", 1));
        assert_eq!(sit.new, lot("c", 2));
        assert_eq!(sit.nxt, lot("d", 3));
    }

    #[test]
    fn ri_key_is_sortable() {
        assert_eq!(
            ri_key("Dpre", 10),
            "Dpre.0000000000000000000000000000000a"
        );
        assert!(ri_key("Dpre", 2) < ri_key("Dpre", 10));
    }

    #[test]
    fn records_use_lowercase_enums() {
        let prm = PrePrm {
            pidx: 1,
            algo: Algo::Salty,
            salt: "0AAwMTIzNDU2Nzg5YWJjZGVm".to_string(),
            stem: String::new(),
            tier: Tier::Low,
        };
        let json = serde_json::to_string(&prm).unwrap();
        assert!(json.contains("\"algo\":\"salty\""));
        assert_eq!(serde_json::from_str::<PrePrm>(&json).unwrap(), prm);
    }
}
