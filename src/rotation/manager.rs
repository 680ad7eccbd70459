//! 预轮换密钥管理器
//!
//! [`Manager`] creates key sequences, keeps the three-generation rotation
//! window of each one, and persists parameters, windows, per-generation
//! public key sets and private keys through a [`KeyStore`]. Every public
//! operation stages its writes in one [`Transaction`] and commits them with a
//! single batch, so a failed call leaves the store as it found it.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use tracing::{Span, debug, info, info_span};
use zeroize::Zeroizing;

use crate::cipher::{Cipher, Decrypter, Encrypter, is_cipher};
use crate::common::config::{
    Algo, IngestConfig, InceptConfig, ManagerConfig, ReplayConfig, RotateConfig, Tier,
};
use crate::common::utils::now_iso8601;
use crate::creator::{Creator, Creatory};
use crate::error::Error;
use crate::primitives::{Diger, Salter, Signer, Verfer};
use crate::storage::{KeyStore, PrePrm, PreSit, PubLot, PubSet, Table, Transaction};

const AEID: &str = "aeid";
const PIDX: &str = "pidx";
const ALGO: &str = "algo";
const SALT: &str = "salt";
const TIER: &str = "tier";

/// Builder for [`Manager`].
pub struct ManagerBuilder {
    store: Arc<dyn KeyStore>,
    config: ManagerConfig,
    seed: Option<SecretString>,
    span: Option<Span>,
}

impl ManagerBuilder {
    /// Root defaults seeded into an empty store.
    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// qb64 Ed25519 seed matching the AEID. Held in memory only.
    pub fn with_seed(mut self, seed: SecretString) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Span every operation of the manager runs in.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Opens the store.
    ///
    /// Absent root parameters are seeded from the config, a random salt
    /// standing in for an absent configured one. When the store already has
    /// an AEID the seed must match it, otherwise the configured AEID (if
    /// any) is installed and every secret is sealed to it.
    pub fn build(self) -> Result<Manager, Error> {
        let span = self
            .span
            .unwrap_or_else(|| info_span!("keri_keeper::manager"));
        let mut manager = Manager {
            store: self.store,
            seed: None,
            encrypter: None,
            decrypter: None,
            span,
        };
        manager.setup(&self.config, self.seed)?;
        Ok(manager)
    }
}

/// Pre-rotation key manager.
///
/// The manager is `Sync` but performs no locking of its own: concurrent
/// rotation of one sequence needs external mutual exclusion.
pub struct Manager {
    store: Arc<dyn KeyStore>,
    seed: Option<SecretString>,
    encrypter: Option<Encrypter>,
    decrypter: Option<Decrypter>,
    span: Span,
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("encrypted", &self.encrypter.is_some())
            .finish()
    }
}

impl Manager {
    pub fn builder(store: Arc<dyn KeyStore>) -> ManagerBuilder {
        ManagerBuilder {
            store,
            config: ManagerConfig::default(),
            seed: None,
            span: None,
        }
    }

    fn setup(&mut self, config: &ManagerConfig, seed: Option<SecretString>) -> Result<(), Error> {
        let span = self.span.clone();
        let _enter = span.enter();

        let persisted = self.store.get(Table::Globals, AEID)?.filter(|a| !a.is_empty());
        let (encrypter, decrypter) = match &persisted {
            Some(aeid) => {
                let encrypter = Encrypter::from_aeid(aeid)?;
                let decrypter = Self::authenticate(&encrypter, seed.as_ref())?;
                (Some(encrypter), Some(decrypter))
            }
            None => match config.aeid.as_deref() {
                Some(aeid) => {
                    let encrypter = Encrypter::from_aeid(aeid)?;
                    let decrypter = Self::authenticate(&encrypter, seed.as_ref())?;
                    (Some(encrypter), Some(decrypter))
                }
                None => (None, None),
            },
        };

        let mut tx = Transaction::new(self.store.as_ref());
        if tx.get(Table::Globals, PIDX)?.is_none() {
            tx.pin(Table::Globals, PIDX, &format!("{:x}", config.pidx));
        }
        if tx.get(Table::Globals, ALGO)?.is_none() {
            tx.pin(Table::Globals, ALGO, config.algo.as_str());
        }
        if tx.get(Table::Globals, TIER)?.is_none() {
            tx.pin(Table::Globals, TIER, config.tier.as_str());
        }
        if tx.get(Table::Globals, SALT)?.is_none() {
            let salter = match config.salt.as_deref() {
                Some(salt) => Salter::from_qb64(salt, config.tier)?,
                None => Salter::new(config.tier)?,
            };
            tx.pin(Table::Globals, SALT, &salter.qb64()?);
        }

        if persisted.is_none() {
            // 首次设置：用配置的 AEID 密封全部秘密
            Self::reseal(&mut tx, None, encrypter.as_ref())?;
            if let Some(aeid) = config.aeid.as_deref() {
                tx.pin(Table::Globals, AEID, aeid);
            }
        }
        tx.commit()?;

        if encrypter.is_some() {
            self.seed = seed;
        }
        self.encrypter = encrypter;
        self.decrypter = decrypter;
        debug!(encrypted = self.encrypter.is_some(), "key manager ready");
        Ok(())
    }

    /// Checks `seed` against `encrypter` and returns its decrypter.
    fn authenticate(encrypter: &Encrypter, seed: Option<&SecretString>) -> Result<Decrypter, Error> {
        let seed = seed.ok_or_else(|| Error::Authentication("seed required for aeid".to_string()))?;
        if !encrypter.verify_seed(seed.expose_secret())? {
            return Err(Error::Authentication("seed does not match aeid".to_string()));
        }
        Decrypter::from_seed(seed.expose_secret())
    }

    /// Re-encrypts every salt and private key from `old` to `new`.
    ///
    /// Plain values need no decrypter. A `None` encrypter stores plain text.
    fn reseal(
        tx: &mut Transaction<'_>,
        old: Option<&Decrypter>,
        new: Option<&Encrypter>,
    ) -> Result<(), Error> {
        let reseal_value = |value: &str| -> Result<String, Error> {
            let plain = open_with(old, value)?;
            seal_with(new, &plain)
        };

        if let Some(salt) = tx.get(Table::Globals, SALT)?.filter(|s| !s.is_empty()) {
            let sealed = reseal_value(&salt)?;
            tx.pin(Table::Globals, SALT, &sealed);
        }
        for (pre, _) in tx.items(Table::Params)? {
            if let Some(mut prm) = tx.prm(&pre)?.filter(|p| !p.salt.is_empty()) {
                prm.salt = reseal_value(&prm.salt)?;
                tx.pin_prm(&pre, &prm)?;
            }
        }
        for (key, secret) in tx.items(Table::Secrets)? {
            let sealed = reseal_value(&secret)?;
            tx.pin(Table::Secrets, &key, &sealed);
        }
        Ok(())
    }

    /// Replaces the AEID, re-encrypting every stored secret under it.
    ///
    /// The seed currently held must still match the persisted AEID. With
    /// `aeid = None` secrets are stored in plain text from then on.
    pub fn update_aeid(&mut self, aeid: Option<&str>, seed: Option<SecretString>) -> Result<(), Error> {
        let span = self.span.clone();
        let _enter = span.enter();

        if let Some(current) = &self.encrypter {
            let held = self
                .seed
                .as_ref()
                .map(|s| current.verify_seed(s.expose_secret()))
                .transpose()?
                .unwrap_or(false);
            if !held {
                return Err(Error::Authentication(
                    "current seed does not match persisted aeid".to_string(),
                ));
            }
        }

        let (encrypter, decrypter) = match aeid {
            Some(aeid) => {
                let encrypter = Encrypter::from_aeid(aeid)?;
                let decrypter = Self::authenticate(&encrypter, seed.as_ref())?;
                (Some(encrypter), Some(decrypter))
            }
            None => (None, None),
        };

        let mut tx = Transaction::new(self.store.as_ref());
        Self::reseal(&mut tx, self.decrypter.as_ref(), encrypter.as_ref())?;
        match aeid {
            Some(aeid) => tx.pin(Table::Globals, AEID, aeid),
            None => {
                tx.rem(Table::Globals, AEID)?;
            }
        }
        let writes = tx.len();
        tx.commit()?;

        self.seed = if encrypter.is_some() { seed } else { None };
        self.encrypter = encrypter;
        self.decrypter = decrypter;
        info!(encrypted = self.encrypter.is_some(), writes, "updated aeid");
        Ok(())
    }

    // --- read accessors ---

    /// The store this manager persists to.
    pub fn store(&self) -> &Arc<dyn KeyStore> {
        &self.store
    }

    pub fn aeid(&self) -> Result<Option<String>, Error> {
        Ok(self.store.get(Table::Globals, AEID)?.filter(|a| !a.is_empty()))
    }

    /// Index the next incepted or ingested sequence receives.
    pub fn pidx(&self) -> Result<u64, Error> {
        read_pidx(self.store.get(Table::Globals, PIDX)?)
    }

    pub fn algo(&self) -> Result<Algo, Error> {
        self.store
            .get(Table::Globals, ALGO)?
            .map(|a| a.parse::<Algo>())
            .transpose()
            .map(Option::unwrap_or_default)
    }

    pub fn tier(&self) -> Result<Tier, Error> {
        self.store
            .get(Table::Globals, TIER)?
            .map(|t| t.parse::<Tier>())
            .transpose()
            .map(Option::unwrap_or_default)
    }

    /// Decrypted root salt.
    pub fn salt(&self) -> Result<Option<Zeroizing<String>>, Error> {
        self.store
            .get(Table::Globals, SALT)?
            .filter(|s| !s.is_empty())
            .map(|s| self.open(&s))
            .transpose()
    }

    pub fn prm(&self, pre: &str) -> Result<Option<PrePrm>, Error> {
        Transaction::new(self.store.as_ref()).prm(pre)
    }

    pub fn sit(&self, pre: &str) -> Result<Option<PreSit>, Error> {
        Transaction::new(self.store.as_ref()).sit(pre)
    }

    pub fn pub_set(&self, pre: &str, ridx: u64) -> Result<Option<PubSet>, Error> {
        Transaction::new(self.store.as_ref()).pub_set(pre, ridx)
    }

    /// True when a private key is stored for `public`.
    pub fn has_secret(&self, public: &str) -> Result<bool, Error> {
        Ok(self.store.get(Table::Secrets, public)?.is_some())
    }

    // --- secret handling ---

    fn open(&self, value: &str) -> Result<Zeroizing<String>, Error> {
        open_with(self.decrypter.as_ref(), value)
    }

    fn seal(&self, plain: &str) -> Result<String, Error> {
        seal_with(self.encrypter.as_ref(), plain)
    }

    fn stash_signers(&self, tx: &mut Transaction<'_>, signers: &[Signer]) -> Result<(), Error> {
        for signer in signers {
            let seed = signer.qb64()?;
            // 已存在的私钥记录保持不变
            tx.put(Table::Secrets, &signer.verfer().qb64(), &self.seal(&seed)?)?;
        }
        Ok(())
    }

    pub(crate) fn load_signer(&self, tx: &Transaction<'_>, public: &str) -> Result<Signer, Error> {
        let verfer = Verfer::from_qb64(public)?;
        let stored = tx
            .get(Table::Secrets, public)?
            .ok_or_else(|| Error::MissingKey(public.to_string()))?;
        let seed = self.open(&stored)?;
        let signer = Signer::from_qb64(&seed, verfer.is_transferable())?;
        if signer.verfer() != &verfer {
            return Err(Error::Store(format!("private key stored for {} does not match it", public)));
        }
        Ok(signer)
    }

    fn load_signers(&self, tx: &Transaction<'_>, pubs: &[String]) -> Result<Vec<Signer>, Error> {
        pubs.iter().map(|p| self.load_signer(tx, p)).collect()
    }

    /// Algo, salt and tier for a new sequence, root values filling gaps when
    /// `rooted` is set.
    fn resolve_roots(
        &self,
        tx: &Transaction<'_>,
        rooted: bool,
        algo: Option<Algo>,
        salt: Option<&str>,
        tier: Option<Tier>,
    ) -> Result<(Algo, Option<Zeroizing<String>>, Tier), Error> {
        let algo = match algo {
            Some(algo) => algo,
            None if rooted => tx
                .get(Table::Globals, ALGO)?
                .map(|a| a.parse::<Algo>())
                .transpose()?
                .unwrap_or_default(),
            None => Algo::default(),
        };
        let salt = match salt {
            Some(salt) => Some(Zeroizing::new(salt.to_string())),
            None if rooted => tx
                .get(Table::Globals, SALT)?
                .filter(|s| !s.is_empty())
                .map(|s| self.open(&s))
                .transpose()?,
            None => None,
        };
        let tier = match tier {
            Some(tier) => tier,
            None if rooted => tx
                .get(Table::Globals, TIER)?
                .map(|t| t.parse::<Tier>())
                .transpose()?
                .unwrap_or_default(),
            None => Tier::default(),
        };
        Ok((algo, salt, tier))
    }

    /// Sequence parameters persisted for `creator`.
    fn make_prm(&self, creator: &dyn Creator, pidx: u64, algo: Algo, tier: Tier) -> Result<PrePrm, Error> {
        let salt = creator.salt()?;
        let salt = if salt.is_empty() {
            String::new()
        } else {
            self.seal(&salt)?
        };
        Ok(PrePrm {
            pidx,
            algo,
            salt,
            stem: creator.stem().to_string(),
            tier: creator.tier().unwrap_or(tier),
        })
    }

    fn creator_for(&self, prm: &PrePrm) -> Result<Box<dyn Creator>, Error> {
        let salt = if prm.salt.is_empty() {
            None
        } else {
            Some(self.open(&prm.salt)?)
        };
        Creatory::make(
            prm.algo,
            salt.as_deref().map(String::as_str),
            Some(prm.stem.as_str()),
            prm.tier,
        )
    }

    // --- key sequence operations ---

    /// Creates a new key sequence.
    ///
    /// Returns the verifiers of the `icount` current keys and one digest per
    /// next key. Non-transferable sequences get no next keys. The first
    /// current public key is the provisional prefix of the sequence until
    /// [`move_prefix`](Self::move_prefix) re-keys it.
    pub fn incept(&self, config: &InceptConfig) -> Result<(Vec<Verfer>, Vec<Diger>), Error> {
        let span = self.span.clone();
        let _enter = span.enter();

        if config.icount == 0 {
            return Err(Error::Configuration("icount must be > 0".to_string()));
        }
        let ncount = if config.transferable { config.ncount } else { 0 };

        let mut tx = Transaction::new(self.store.as_ref());
        let (algo, salt, tier) = self.resolve_roots(
            &tx,
            config.rooted,
            config.algo,
            config.salt.as_deref(),
            config.tier,
        )?;
        let pidx = read_pidx(tx.get(Table::Globals, PIDX)?)?;
        let creator = Creatory::make(
            algo,
            salt.as_deref().map(String::as_str),
            config.stem.as_deref(),
            tier,
        )?;

        let icount = config.icount as u64;
        let isigners = creator.create(config.icount, pidx, 0, 0, config.transferable, config.temp)?;
        let nsigners = creator.create(ncount, pidx, 1, icount, config.transferable, config.temp)?;
        let ipubs = pubs_of(&isigners);
        let npubs = pubs_of(&nsigners);
        let pre = ipubs
            .first()
            .cloned()
            .ok_or_else(|| Error::Configuration("creator returned no keys".to_string()))?;

        if tx.get(Table::Secrets, &pre)?.is_some() || !tx.put(Table::Prefixes, &pre, &pre)? {
            return Err(Error::DuplicateInception(pre));
        }
        let prm = self.make_prm(creator.as_ref(), pidx, algo, tier)?;
        if !tx.put_prm(&pre, &prm)? {
            return Err(Error::DuplicateInception(pre));
        }
        tx.pin(Table::Globals, PIDX, &format!("{:x}", pidx + 1));

        let dt = now_iso8601();
        let sit = PreSit {
            old: PubLot::default(),
            new: PubLot::new(ipubs.clone(), 0, 0, dt.clone()),
            nxt: PubLot::new(npubs.clone(), 1, icount, dt),
        };
        if !tx.put_sit(&pre, &sit)? {
            return Err(Error::DuplicateInception(pre));
        }
        self.stash_signers(&mut tx, &isigners)?;
        self.stash_signers(&mut tx, &nsigners)?;
        if !tx.put_pub_set(&pre, 0, &ipubs)? || !tx.put_pub_set(&pre, 1, &npubs)? {
            return Err(Error::DuplicateInception(pre));
        }
        tx.commit()?;

        info!(pre = %pre, pidx, algo = %algo, icount, ncount, "incepted key sequence");
        let verfers = isigners.iter().map(|s| s.verfer().clone()).collect();
        Ok((verfers, digers_of(&nsigners)?))
    }

    /// Rotates `pre`: the committed next keys become current and a fresh
    /// next generation of `ncount` keys is derived.
    ///
    /// `ncount = 0` makes the sequence terminal; rotating a terminal
    /// sequence fails with [`Error::TerminalSequence`]. With `erase` set the
    /// private keys of the generation that leaves the window are removed.
    /// A sequence whose next generation was ingested must be advanced with
    /// [`replay`](Self::replay); rotating it fails with
    /// [`Error::Configuration`].
    pub fn rotate(&self, pre: &str, config: &RotateConfig) -> Result<(Vec<Verfer>, Vec<Diger>), Error> {
        let span = self.span.clone();
        let _enter = span.enter();

        let mut tx = Transaction::new(self.store.as_ref());
        let prm = tx.prm(pre)?.ok_or_else(|| Error::UnknownPrefix(pre.to_string()))?;
        let mut sit = tx.sit(pre)?.ok_or_else(|| Error::UnknownPrefix(pre.to_string()))?;
        if sit.nxt.pubs.is_empty() {
            return Err(Error::TerminalSequence(pre.to_string()));
        }

        // 即将成为当前密钥的下一代必须有私钥
        let signers = self.load_signers(&tx, &sit.nxt.pubs)?;
        let ridx = sit.nxt.ridx + 1;
        let kidx = sit.nxt.kidx + sit.nxt.pubs.len() as u64;
        // 已导入的代只能通过 replay 进入窗口
        if tx.pub_set(pre, ridx)?.is_some() {
            return Err(Error::Configuration(format!(
                "keys already stored at ridx={} for pre={}, replay them instead",
                ridx, pre
            )));
        }
        let ncount = if config.transferable { config.ncount } else { 0 };

        let creator = self.creator_for(&prm)?;
        let nsigners = creator.create(ncount, prm.pidx, ridx, kidx, config.transferable, config.temp)?;
        let npubs = pubs_of(&nsigners);
        let gone = sit.advance(PubLot::new(npubs.clone(), ridx, kidx, now_iso8601()));

        tx.pin_sit(pre, &sit)?;
        self.stash_signers(&mut tx, &nsigners)?;
        if !tx.put_pub_set(pre, ridx, &npubs)? {
            return Err(Error::Store(format!(
                "pub set ridx={} for pre={} already exists",
                ridx, pre
            )));
        }
        if config.erase {
            for public in &gone.pubs {
                tx.rem(Table::Secrets, public)?;
            }
        }
        tx.commit()?;

        info!(pre = %pre, ridx = sit.new.ridx, kidx = sit.new.kidx, ncount, "rotated key sequence");
        let verfers = signers.iter().map(|s| s.verfer().clone()).collect();
        Ok((verfers, digers_of(&nsigners)?))
    }

    /// Replays stored generations of `pre` without creating key material.
    ///
    /// Without `advance` the current generation is returned as is. With it
    /// the window slides onto the [`PubSet`] row after the committed next
    /// generation; a missing row is [`Error::IndexRange`].
    pub fn replay(&self, pre: &str, config: &ReplayConfig) -> Result<(Vec<Verfer>, Vec<Diger>), Error> {
        let span = self.span.clone();
        let _enter = span.enter();

        let mut tx = Transaction::new(self.store.as_ref());
        if tx.prm(pre)?.is_none() {
            return Err(Error::UnknownPrefix(pre.to_string()));
        }
        let mut sit = tx.sit(pre)?.ok_or_else(|| Error::UnknownPrefix(pre.to_string()))?;

        let mut gone = None;
        if config.advance {
            let ridx = sit.nxt.ridx + 1;
            let kidx = sit.nxt.kidx + sit.nxt.pubs.len() as u64;
            let set = tx
                .pub_set(pre, ridx)?
                .ok_or_else(|| Error::IndexRange(format!("no keys at ridx={} for pre={}", ridx, pre)))?;
            gone = Some(sit.advance(PubLot::new(set.pubs, ridx, kidx, now_iso8601())));
        }

        let signers = self.load_signers(&tx, &sit.new.pubs)?;
        let nsigners = self.load_signers(&tx, &sit.nxt.pubs)?;

        if let Some(gone) = gone {
            tx.pin_sit(pre, &sit)?;
            if config.erase {
                for public in &gone.pubs {
                    tx.rem(Table::Secrets, public)?;
                }
            }
            tx.commit()?;
        }

        debug!(pre = %pre, ridx = sit.new.ridx, kidx = sit.new.kidx, advance = config.advance, "replayed key sequence");
        let verfers = signers.iter().map(|s| s.verfer().clone()).collect();
        Ok((verfers, digers_of(&nsigners)?))
    }

    /// Ingests a precomputed history of private keys as a new sequence.
    ///
    /// Each entry of `secrecies` is one generation of qb64 seeds. Every
    /// generation is stored up front, followed by one derived generation of
    /// `ncount` keys. The window starts at generation `iridx` with an empty
    /// `old` lot. Returns the
    /// prefix and the verifiers of every ingested generation.
    pub fn ingest(
        &self,
        secrecies: &[Vec<String>],
        config: &IngestConfig,
    ) -> Result<(String, Vec<Vec<Verfer>>), Error> {
        let span = self.span.clone();
        let _enter = span.enter();

        if secrecies.is_empty() {
            return Err(Error::Configuration("no secrets to ingest".to_string()));
        }
        if let Some(i) = secrecies.iter().position(Vec::is_empty) {
            return Err(Error::Configuration(format!("generation {} has no secrets", i)));
        }
        if config.iridx >= secrecies.len() {
            return Err(Error::Configuration(format!(
                "iridx={} beyond {} generations",
                config.iridx,
                secrecies.len()
            )));
        }
        let ncount = if config.transferable { config.ncount } else { 0 };

        let mut tx = Transaction::new(self.store.as_ref());
        let (algo, salt, tier) = self.resolve_roots(
            &tx,
            config.rooted,
            config.algo,
            config.salt.as_deref(),
            config.tier,
        )?;
        let pidx = read_pidx(tx.get(Table::Globals, PIDX)?)?;
        let creator = Creatory::make(
            algo,
            salt.as_deref().map(String::as_str),
            config.stem.as_deref(),
            tier,
        )?;

        let dt = now_iso8601();
        let mut pre = String::new();
        let mut ridx = 0u64;
        let mut kidx = 0u64;
        let mut lots = Vec::with_capacity(secrecies.len() + 1);
        let mut verferies = Vec::with_capacity(secrecies.len());

        for secrets in secrecies {
            let signers = secrets
                .iter()
                .map(|s| Signer::from_qb64(s, config.transferable))
                .collect::<Result<Vec<_>, _>>()?;
            let pubs = pubs_of(&signers);
            if ridx == 0 {
                pre = pubs[0].clone();
                if !tx.put(Table::Prefixes, &pre, &pre)? {
                    return Err(Error::DuplicateInception(pre));
                }
                let prm = self.make_prm(creator.as_ref(), pidx, algo, tier)?;
                if !tx.put_prm(&pre, &prm)? {
                    return Err(Error::DuplicateInception(pre));
                }
                tx.pin(Table::Globals, PIDX, &format!("{:x}", pidx + 1));
            }
            self.stash_signers(&mut tx, &signers)?;
            if !tx.put_pub_set(&pre, ridx, &pubs)? {
                return Err(Error::DuplicateInception(pre));
            }
            lots.push(PubLot::new(pubs, ridx, kidx, dt.clone()));
            verferies.push(signers.iter().map(|s| s.verfer().clone()).collect());
            ridx += 1;
            kidx += signers.len() as u64;
        }

        let nsigners = creator.create(ncount, pidx, ridx, kidx, config.transferable, config.temp)?;
        let npubs = pubs_of(&nsigners);
        self.stash_signers(&mut tx, &nsigners)?;
        if !tx.put_pub_set(&pre, ridx, &npubs)? {
            return Err(Error::DuplicateInception(pre));
        }
        lots.push(PubLot::new(npubs, ridx, kidx, dt));

        // 窗口从 iridx 开始，之前的代不进入 old
        let iridx = config.iridx;
        let sit = PreSit {
            old: PubLot::default(),
            new: lots[iridx].clone(),
            nxt: lots[iridx + 1].clone(),
        };
        if !tx.put_sit(&pre, &sit)? {
            return Err(Error::DuplicateInception(pre));
        }
        tx.commit()?;

        info!(pre = %pre, pidx, generations = secrecies.len(), iridx, "ingested key sequence");
        Ok((pre, verferies))
    }

    /// Re-keys the records of sequence `old` under prefix `new`.
    ///
    /// Parameters and window move; public key sets are copied and stay
    /// readable under `old`. `old` is left as an alias of `new`.
    pub fn move_prefix(&self, old: &str, new: &str) -> Result<(), Error> {
        let span = self.span.clone();
        let _enter = span.enter();

        if old == new {
            return Ok(());
        }
        let mut tx = Transaction::new(self.store.as_ref());
        if tx.get(Table::Prefixes, old)?.is_none() {
            return Err(Error::UnknownPrefix(old.to_string()));
        }
        if tx.get(Table::Prefixes, new)?.is_some() {
            return Err(Error::DuplicateInception(new.to_string()));
        }

        let prm = tx.prm(old)?.ok_or_else(|| Error::UnknownPrefix(old.to_string()))?;
        if !tx.put_prm(new, &prm)? {
            return Err(Error::DuplicateInception(new.to_string()));
        }
        tx.rem(Table::Params, old)?;

        let sit = tx.sit(old)?.ok_or_else(|| Error::UnknownPrefix(old.to_string()))?;
        if !tx.put_sit(new, &sit)? {
            return Err(Error::DuplicateInception(new.to_string()));
        }
        tx.rem(Table::Situations, old)?;

        let mut ridx = 0u64;
        while let Some(set) = tx.pub_set(old, ridx)? {
            if !tx.put_pub_set(new, ridx, &set.pubs)? {
                return Err(Error::DuplicateInception(new.to_string()));
            }
            ridx += 1;
        }

        tx.pin(Table::Prefixes, old, new);
        tx.put(Table::Prefixes, new, new)?;
        tx.commit()?;

        info!(old = %old, new = %new, generations = ridx, "moved key sequence");
        Ok(())
    }
}

fn read_pidx(value: Option<String>) -> Result<u64, Error> {
    match value {
        Some(hex) => u64::from_str_radix(&hex, 16)
            .map_err(|e| Error::Store(format!("invalid pidx {:?}: {}", hex, e))),
        None => Ok(0),
    }
}

fn open_with(decrypter: Option<&Decrypter>, value: &str) -> Result<Zeroizing<String>, Error> {
    if !is_cipher(value) {
        return Ok(Zeroizing::new(value.to_string()));
    }
    let decrypter = decrypter
        .ok_or_else(|| Error::Decryption("encrypted value but no decrypter".to_string()))?;
    decrypter.decrypt(&Cipher::from_qb64(value)?)
}

fn seal_with(encrypter: Option<&Encrypter>, plain: &str) -> Result<String, Error> {
    match encrypter {
        Some(encrypter) => Ok(encrypter.encrypt(plain)?.qb64()),
        None => Ok(plain.to_string()),
    }
}

fn pubs_of(signers: &[Signer]) -> Vec<String> {
    signers.iter().map(|s| s.verfer().qb64()).collect()
}

/// One Blake3 digest per next key, over the key's qb64 text.
fn digers_of(signers: &[Signer]) -> Result<Vec<Diger>, Error> {
    signers
        .iter()
        .map(|s| Diger::blake3(&s.verfer().qb64b()))
        .collect()
}
