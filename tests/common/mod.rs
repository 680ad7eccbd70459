//!
//! 集成测试的通用辅助函数
//!
#![allow(dead_code)]

use keri_keeper::prelude::*;
use secrecy::SecretString;
use std::sync::Arc;

/// Salt of the reference fixtures, raw bytes `0123456789abcdef`.
pub const SALT: &str = "0AAwMTIzNDU2Nzg5YWJjZGVm";

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Manager over `store` rooted at the fixture salt.
pub fn salted_manager(store: Arc<dyn KeyStore>) -> Manager {
    init_tracing();
    Manager::builder(store)
        .with_config(ManagerConfig {
            salt: Some(SALT.to_string()),
            ..Default::default()
        })
        .build()
        .unwrap()
}

pub fn memory_manager() -> Manager {
    salted_manager(Arc::new(MemoryKeyStore::new()))
}

/// Incept options with the cheap stretch.
pub fn temp_incept(icount: usize, ncount: usize) -> InceptConfig {
    InceptConfig {
        icount,
        ncount,
        temp: true,
        ..Default::default()
    }
}

pub fn temp_rotate(ncount: usize) -> RotateConfig {
    RotateConfig {
        ncount,
        temp: true,
        ..Default::default()
    }
}

/// Fresh AEID and its seed.
pub fn aeid_pair() -> (String, SecretString) {
    let signer = Signer::random(true).unwrap();
    let seed = signer.qb64().unwrap();
    (
        signer.verfer().qb64(),
        SecretString::new(seed.as_str().into()),
    )
}

pub fn qb64s(verfers: &[Verfer]) -> Vec<String> {
    verfers.iter().map(Verfer::qb64).collect()
}
