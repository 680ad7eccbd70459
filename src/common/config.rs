//!
//! # 通用配置模块
//!
//! Configuration structures for the key manager and for each of its
//! operations. Every struct deserializes with defaults and rejects unknown
//! fields, so a misspelled option fails at construction instead of being
//! silently ignored.
//!
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Key pair creation algorithm of a key sequence.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Algo {
    /// Deterministic derivation from a salt, a stem and a per-key path.
    #[default]
    Salty,
    /// Independent random key pairs.
    Randy,
}

impl Algo {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algo::Salty => "salty",
            Algo::Randy => "randy",
        }
    }
}

impl fmt::Display for Algo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "salty" => Ok(Algo::Salty),
            "randy" => Ok(Algo::Randy),
            _ => Err(Error::Configuration(format!("unknown algo: {}", s))),
        }
    }
}

/// Security tier of the salt stretching function.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Low,
    Med,
    High,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Med => "med",
            Tier::High => "high",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Tier::Low),
            "med" => Ok(Tier::Med),
            "high" => Ok(Tier::High),
            _ => Err(Error::Configuration(format!("unknown tier: {}", s))),
        }
    }
}

/// Root defaults seeded into the key store the first time a manager opens it.
///
/// Values already present in the store win; these only fill gaps.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// 初始序列索引
    pub pidx: u64,
    pub algo: Algo,
    /// qb64 root salt; a random one is generated when absent.
    pub salt: Option<String>,
    pub tier: Tier,
    /// qb64 Ed25519 verkey whose X25519 form encrypts secrets at rest.
    pub aeid: Option<String>,
}

/// Options for [`Manager::incept`](crate::rotation::Manager::incept).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InceptConfig {
    /// Number of current signing keys, must be > 0.
    pub icount: usize,
    /// Number of next keys. Forced to 0 for non-transferable sequences.
    pub ncount: usize,
    pub stem: Option<String>,
    pub transferable: bool,
    pub algo: Option<Algo>,
    pub salt: Option<String>,
    pub tier: Option<Tier>,
    /// Fall back to the root algo/salt/tier for unset overrides.
    pub rooted: bool,
    /// Minimal stretch cost. Test use only.
    pub temp: bool,
}

impl Default for InceptConfig {
    fn default() -> Self {
        Self {
            icount: 1,
            ncount: 1,
            stem: None,
            transferable: true,
            algo: None,
            salt: None,
            tier: None,
            rooted: true,
            temp: false,
        }
    }
}

/// Options for [`Manager::rotate`](crate::rotation::Manager::rotate).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RotateConfig {
    /// Number of fresh next keys; 0 makes the sequence terminal.
    pub ncount: usize,
    pub transferable: bool,
    pub temp: bool,
    /// Remove private keys of the generation that leaves the window.
    pub erase: bool,
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            ncount: 1,
            transferable: true,
            temp: false,
            erase: true,
        }
    }
}

/// Options for [`Manager::replay`](crate::rotation::Manager::replay).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    /// Slide the window one generation forward before returning.
    pub advance: bool,
    pub erase: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            advance: true,
            erase: true,
        }
    }
}

/// Options for [`Manager::ingest`](crate::rotation::Manager::ingest).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Generation that becomes the current signing set.
    pub iridx: usize,
    /// Size of the generation derived after the last ingested one.
    pub ncount: usize,
    pub stem: Option<String>,
    pub transferable: bool,
    pub algo: Option<Algo>,
    pub salt: Option<String>,
    pub tier: Option<Tier>,
    pub rooted: bool,
    pub temp: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            iridx: 0,
            ncount: 1,
            stem: None,
            transferable: true,
            algo: None,
            salt: None,
            tier: None,
            rooted: true,
            temp: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<RotateConfig>(r#"{"ncount": 2, "toad": 1}"#);
        assert!(err.is_err());

        let cfg: RotateConfig = serde_json::from_str(r#"{"ncount": 0}"#).unwrap();
        assert_eq!(cfg.ncount, 0);
        assert!(cfg.erase);
        assert!(cfg.transferable);
    }

    #[test]
    fn algo_and_tier_text_forms() {
        assert_eq!("salty".parse::<Algo>().unwrap(), Algo::Salty);
        assert_eq!("randy".parse::<Algo>().unwrap(), Algo::Randy);
        assert!("group".parse::<Algo>().is_err());
        assert_eq!(Tier::High.to_string(), "high");
        assert_eq!(serde_json::to_string(&Tier::Med).unwrap(), "\"med\"");

        let cfg: ManagerConfig = serde_json::from_str(r#"{"algo": "randy"}"#).unwrap();
        assert_eq!(cfg.algo, Algo::Randy);
        assert_eq!(cfg.tier, Tier::Low);
        assert_eq!(cfg.pidx, 0);
    }
}
