use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== Notice Level ====================

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// 普通信息
    Info,
    /// 警告
    Warning,
    /// 错误
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ==================== Floor Notice ====================

/// 楼面通知载荷 (引擎 -> 消费端)
///
/// 用于向员工展示可忽略的瞬态提示，如 resync 失败、数据降级。
/// 引擎所有降级路径都只产生通知，不产生致命错误。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorNotice {
    /// 标题
    pub title: String,
    /// 消息内容
    pub message: String,
    /// 通知级别
    pub level: NoticeLevel,
}

impl FloorNotice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level: NoticeLevel::Info,
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level: NoticeLevel::Warning,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level: NoticeLevel::Error,
        }
    }
}
