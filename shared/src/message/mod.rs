//! 变更推送 (change feed) 消息类型定义
//!
//! 这些类型在数据服务契约与 floor-server 之间共享。
//! 推送通道是 at-most-once、无序的；引擎侧依靠周期性全量
//! resync 自愈丢失的消息，因此事件本身不携带序列号。

use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// 实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// 桌台
    Table,
    /// 订单
    Order,
    /// 预订
    Reservation,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Table => write!(f, "table"),
            EntityKind::Order => write!(f, "order"),
            EntityKind::Reservation => write!(f, "reservation"),
        }
    }
}

/// 变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedAction {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for FeedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedAction::Insert => write!(f, "insert"),
            FeedAction::Update => write!(f, "update"),
            FeedAction::Delete => write!(f, "delete"),
        }
    }
}

/// 推送事件 - 数据服务下发的一条实体变更
///
/// `row` 是 JSON 对象，至少包含 `id`；update 事件允许只携带
/// 变更字段（部分行），由引擎按字段浅合并。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEvent {
    /// 事件标识，仅用于日志追踪
    pub event_id: Uuid,
    pub entity: EntityKind,
    pub action: FeedAction,
    pub row: serde_json::Value,
}

impl FeedEvent {
    /// 创建新事件
    pub fn new(entity: EntityKind, action: FeedAction, row: serde_json::Value) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            entity,
            action,
            row,
        }
    }

    /// 提取行 id
    ///
    /// 缺失、非字符串或空串返回 None（调用方按坏事件丢弃）。
    pub fn row_id(&self) -> Option<&str> {
        self.row
            .get("id")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}
