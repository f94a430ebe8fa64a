//! 核心模块 - 配置与策略常量

pub mod config;

pub use config::{DerivePolicy, FloorConfig};
