//! 统一错误处理
//!
//! 引擎没有 HTTP 暴露面，错误只在两处出现：
//! - 数据源批量查询失败（调用方收到 [`FloorError::DataSource`]，
//!   本地集合保持 last-known-good）
//! - 入口参数解析失败（scope 日期等）
//!
//! 坏的推送事件、空时间轴输入、容量不足等都不是错误：
//! 前者丢弃并记日志，后两者降级为默认窗口/软警告。

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum FloorError {
    /// 数据源查询/网络错误（非致命，保留旧状态）
    #[error("Data source error: {0}")]
    DataSource(String),

    /// 验证失败
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl FloorError {
    pub fn data_source(msg: impl Into<String>) -> Self {
        Self::DataSource(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// 统一结果类型
pub type FloorResult<T> = Result<T, FloorError>;
