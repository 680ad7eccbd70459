//! 密钥序列的创建、轮换与签名
pub mod manager;
pub mod signing;

pub use manager::{Manager, ManagerBuilder};
pub use signing::{Keys, Signature};
