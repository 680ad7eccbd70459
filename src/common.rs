//! 通用模块，包含配置结构和工具函数

pub mod config;
pub mod utils;

pub use self::config::{
    Algo, IngestConfig, InceptConfig, ManagerConfig, ReplayConfig, RotateConfig, Tier,
};
pub use self::utils::constant_time_eq;
