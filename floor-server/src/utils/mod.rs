//! 工具模块

pub mod error;
pub mod logger;
pub mod time;

pub use error::{FloorError, FloorResult};
