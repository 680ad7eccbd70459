//!
//! 导入密钥历史并重放
//!
mod common;

use common::{memory_manager, qb64s, temp_rotate};
use keri_keeper::prelude::*;

/// `count` generations of `size` random seeds each.
fn secrecies(count: usize, size: usize) -> Vec<Vec<String>> {
    (0..count)
        .map(|_| {
            (0..size)
                .map(|_| Signer::random(true).unwrap().qb64().unwrap().to_string())
                .collect()
        })
        .collect()
}

fn temp_ingest() -> IngestConfig {
    IngestConfig {
        temp: true,
        ..Default::default()
    }
}

#[test]
fn test_ingest_then_replay_all_generations() {
    let manager = memory_manager();
    let secrecies = secrecies(8, 1);
    let (pre, verferies) = manager.ingest(&secrecies, &temp_ingest()).unwrap();
    assert_eq!(verferies.len(), 8);
    assert_eq!(pre, verferies[0][0].qb64());
    for (secrets, verfers) in secrecies.iter().zip(&verferies) {
        let signer = Signer::from_qb64(&secrets[0], true).unwrap();
        assert_eq!(signer.verfer(), &verfers[0]);
    }

    let sit = manager.sit(&pre).unwrap().unwrap();
    assert_eq!((sit.new.ridx, sit.new.kidx), (0, 0));
    assert_eq!((sit.nxt.ridx, sit.nxt.kidx), (1, 1));
    assert!(sit.old.pubs.is_empty());

    let stay = ReplayConfig {
        advance: false,
        ..Default::default()
    };
    let (verfers, digers) = manager.replay(&pre, &stay).unwrap();
    assert_eq!(verfers, verferies[0]);
    assert!(digers[0].verify(&verferies[1][0].qb64b()));

    for i in 1..8 {
        let (verfers, digers) = manager.replay(&pre, &ReplayConfig::default()).unwrap();
        assert_eq!(verfers, verferies[i]);
        assert_eq!(digers.len(), 1);
        if i < 7 {
            assert!(digers[0].verify(&verferies[i + 1][0].qb64b()));
        }

        let sit = manager.sit(&pre).unwrap().unwrap();
        assert_eq!(sit.new.ridx, i as u64);
        assert_eq!(sit.new.kidx, i as u64);
        assert_eq!(sit.old.pubs, qb64s(&verferies[i - 1]));
        if i >= 2 {
            // 移出窗口的一代被擦除
            assert!(!manager.has_secret(&verferies[i - 2][0].qb64()).unwrap());
        }
    }

    let err = manager.replay(&pre, &ReplayConfig::default()).unwrap_err();
    assert!(matches!(err, Error::IndexRange(_)));
    // 越界不改变窗口
    assert_eq!(manager.sit(&pre).unwrap().unwrap().new.ridx, 7);
}

#[test]
fn test_ingest_from_last_generation_then_rotate() {
    let manager = memory_manager();
    let secrecies = secrecies(3, 2);
    let cfg = IngestConfig {
        iridx: 2,
        ncount: 3,
        ..temp_ingest()
    };
    let (pre, verferies) = manager.ingest(&secrecies, &cfg).unwrap();

    let sit = manager.sit(&pre).unwrap().unwrap();
    assert!(sit.old.pubs.is_empty());
    assert_eq!(sit.new.pubs, qb64s(&verferies[2]));
    assert_eq!((sit.new.ridx, sit.new.kidx), (2, 4));
    assert_eq!((sit.nxt.ridx, sit.nxt.kidx), (3, 6));
    assert_eq!(sit.nxt.pubs.len(), 3);
    assert_eq!(manager.pub_set(&pre, 3).unwrap().unwrap().pubs, sit.nxt.pubs);

    let (verfers, digers) = manager.rotate(&pre, &temp_rotate(1)).unwrap();
    assert_eq!(qb64s(&verfers), sit.nxt.pubs);
    assert_eq!(digers.len(), 1);
    let sit = manager.sit(&pre).unwrap().unwrap();
    assert_eq!((sit.nxt.ridx, sit.nxt.kidx), (4, 9));
}

#[test]
fn test_ingest_validation() {
    let manager = memory_manager();
    let cfg = temp_ingest();

    assert!(matches!(
        manager.ingest(&[], &cfg),
        Err(Error::Configuration(_))
    ));
    let mut gaps = secrecies(2, 1);
    gaps.push(Vec::new());
    assert!(matches!(
        manager.ingest(&gaps, &cfg),
        Err(Error::Configuration(_))
    ));
    let beyond = IngestConfig {
        iridx: 2,
        ..temp_ingest()
    };
    assert!(matches!(
        manager.ingest(&secrecies(2, 1), &beyond),
        Err(Error::Configuration(_))
    ));
    assert!(matches!(
        manager.ingest(&[vec!["not a seed".to_string()]], &cfg),
        Err(Error::Decode(_))
    ));
    assert_eq!(manager.pidx().unwrap(), 0);
}

#[test]
fn test_ingest_twice_is_duplicate() {
    let manager = memory_manager();
    let secrecies = secrecies(2, 1);
    manager.ingest(&secrecies, &temp_ingest()).unwrap();
    assert_eq!(manager.pidx().unwrap(), 1);
    let err = manager.ingest(&secrecies, &temp_ingest()).unwrap_err();
    assert!(matches!(err, Error::DuplicateInception(_)));
    assert_eq!(manager.pidx().unwrap(), 1);
}

#[test]
fn test_ingested_keys_sign() {
    let manager = memory_manager();
    let (_, verferies) = manager.ingest(&secrecies(2, 3), &temp_ingest()).unwrap();
    let ser = b"ingested";
    let sigers = manager
        .sign_indexed(ser, Keys::Verfers(&verferies[1]), None, None)
        .unwrap();
    assert_eq!(sigers.len(), 3);
    assert!(sigers.iter().all(|s| s.verify(ser)));
}

#[test]
fn test_rotate_onto_ingested_generation_is_refused() {
    let manager = memory_manager();
    let (pre, verferies) = manager.ingest(&secrecies(4, 1), &temp_ingest()).unwrap();
    let before = manager.sit(&pre).unwrap();

    // 第 2 代已导入，只能通过 replay 进入窗口
    let err = manager.rotate(&pre, &temp_rotate(1)).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert_eq!(manager.sit(&pre).unwrap(), before);
    assert_eq!(
        manager.pub_set(&pre, 2).unwrap().unwrap().pubs,
        qb64s(&verferies[2])
    );
    assert!(manager.has_secret(&verferies[2][0].qb64()).unwrap());

    // 重放到最后一代后可以继续轮换，窗口与公钥集合保持一致
    for _ in 1..4 {
        manager.replay(&pre, &ReplayConfig::default()).unwrap();
    }
    let (verfers, _) = manager.rotate(&pre, &temp_rotate(1)).unwrap();
    let sit = manager.sit(&pre).unwrap().unwrap();
    assert_eq!(sit.new.pubs, qb64s(&verfers));
    assert_eq!((sit.nxt.ridx, sit.nxt.kidx), (5, 5));
    for lot in [&sit.old, &sit.new, &sit.nxt] {
        assert_eq!(manager.pub_set(&pre, lot.ridx).unwrap().unwrap().pubs, lot.pubs);
    }
}
