//!
//! 文件快照存储上的管理器：持久化、重新打开与静态加密
//!
mod common;

use common::{SALT, aeid_pair, init_tracing, salted_manager, temp_incept, temp_rotate};
use keri_keeper::cipher::is_cipher;
use keri_keeper::prelude::*;
use keri_keeper::storage::Table;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_sequence_survives_reopen() -> Result<(), Error> {
    let dir = tempdir()?;
    let path = dir.path().join("keeper.json");

    let pre = {
        let manager = salted_manager(Arc::new(FileKeyStore::open(&path)?));
        let (verfers, _) = manager.incept(&temp_incept(1, 1))?;
        verfers[0].qb64()
    };
    assert!(path.exists());

    // 重新打开后继续同一序列
    let manager = Manager::builder(Arc::new(FileKeyStore::open(&path)?)).build()?;
    assert_eq!(manager.salt()?.as_deref().map(String::as_str), Some(SALT));
    assert_eq!(manager.pidx()?, 1);
    // 下一代在 rotate 时以正式的 low 强度派生
    let rot = RotateConfig {
        ncount: 1,
        temp: false,
        ..Default::default()
    };
    let (verfers, digers) = manager.rotate(&pre, &rot)?;
    assert_eq!(
        verfers[0].qb64(),
        "DHByVjuBrM1D9K71TuE5dq1HVDNS5-aLD-wcIlHiVoXX"
    );
    assert_eq!(
        digers[0].qb64(),
        "EJczV8HmnEWZiEHw2lVuSatrvzCmJOZ3zpa7JFfrnjau"
    );

    let sigers = manager.sign_indexed(b"on disk", Keys::Verfers(&verfers), None, None)?;
    assert!(sigers[0].verify(b"on disk"));
    Ok(())
}

#[test]
fn test_snapshot_holds_only_ciphers_with_aeid() -> Result<(), Error> {
    init_tracing();
    let dir = tempdir()?;
    let path = dir.path().join("keeper.json");
    let (aeid, seed) = aeid_pair();

    let store = Arc::new(FileKeyStore::open(&path)?);
    let manager = Manager::builder(store.clone())
        .with_config(ManagerConfig {
            salt: Some(SALT.to_string()),
            aeid: Some(aeid.clone()),
            ..Default::default()
        })
        .with_seed(seed.clone())
        .build()?;
    let (verfers, _) = manager.incept(&temp_incept(2, 2))?;
    manager.rotate(&verfers[0].qb64(), &temp_rotate(2))?;

    let snapshot = store.snapshot();
    assert!(!snapshot.table(Table::Secrets).is_empty());
    assert!(snapshot.table(Table::Secrets).values().all(|v| is_cipher(v)));
    assert!(is_cipher(&snapshot.table(Table::Globals)["salt"]));
    assert!(snapshot.table(Table::Params).values().all(|v| !v.contains(SALT)));

    // 磁盘上的 JSON 不含明文种子或盐
    let json = std::fs::read_to_string(&path)?;
    assert!(!json.contains(SALT));
    drop(manager);

    let reopened = Manager::builder(Arc::new(FileKeyStore::open(&path)?))
        .with_seed(seed)
        .build()?;
    assert_eq!(reopened.aeid()?, Some(aeid));
    assert_eq!(reopened.salt()?.as_deref().map(String::as_str), Some(SALT));
    Ok(())
}

#[test]
fn test_failed_operation_does_not_touch_file() -> Result<(), Error> {
    let dir = tempdir()?;
    let path = dir.path().join("keeper.json");
    let manager = salted_manager(Arc::new(FileKeyStore::open(&path)?));
    let cfg = InceptConfig {
        stem: Some("fixed".to_string()),
        ..temp_incept(1, 1)
    };
    manager.incept(&cfg)?;
    let before = std::fs::read_to_string(&path)?;

    let err = manager.incept(&cfg).unwrap_err();
    assert!(matches!(err, Error::DuplicateInception(_)));
    assert_eq!(std::fs::read_to_string(&path)?, before);
    Ok(())
}
