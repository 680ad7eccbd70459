//! Walks one key sequence through inception, signing, rotation and an AEID
//! change on a file-backed store.
//!
//! Run with `cargo run --example rotation_walkthrough`.

use keri_keeper::prelude::*;
use secrecy::SecretString;
use std::sync::Arc;

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("keeper.json");
    println!("key store: {}", path.display());

    // AEID 密钥对，种子只保存在内存中
    let aeid = Signer::random(true)?;
    let seed = SecretString::new(aeid.qb64()?.as_str().into());

    let mut manager = Manager::builder(Arc::new(FileKeyStore::open(&path)?))
        .with_config(ManagerConfig {
            aeid: Some(aeid.verfer().qb64()),
            ..Default::default()
        })
        .with_seed(seed)
        .build()?;

    let incept = InceptConfig {
        icount: 2,
        ncount: 2,
        temp: true,
        ..Default::default()
    };
    let (verfers, digers) = manager.incept(&incept)?;
    let pre = verfers[0].qb64();
    println!("incepted {}", pre);
    for diger in &digers {
        println!("  next key digest {}", diger.qb64());
    }

    let ser = b"inception event";
    let sigers = manager.sign_indexed(ser, Keys::Verfers(&verfers), None, None)?;
    for siger in &sigers {
        println!("  signature {} valid={}", siger.qb64(), siger.verify(ser));
    }

    let rotate = RotateConfig {
        temp: true,
        ..Default::default()
    };
    let (verfers, _) = manager.rotate(&pre, &rotate)?;
    for (verfer, diger) in verfers.iter().zip(&digers) {
        println!(
            "rotated to {} (matches commitment: {})",
            verfer.qb64(),
            diger.verify(&verfer.qb64b())
        );
    }

    // 更换 AEID，所有秘密重新加密
    let next = Signer::random(true)?;
    let next_seed = SecretString::new(next.qb64()?.as_str().into());
    manager.update_aeid(Some(&next.verfer().qb64()), Some(next_seed))?;
    println!("re-sealed secrets under {}", next.verfer().qb64());

    let cigars = manager.sign_plain(b"after re-key", Keys::Verfers(&verfers))?;
    println!("still signing: {}", cigars.iter().all(|c| c.verify(b"after re-key")));
    Ok(())
}
