//! Order Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Served,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// 活跃状态集合（桌台被此类订单占用）
    pub const ACTIVE: &'static [OrderStatus] = &[
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
    ];

    /// 是否属于活跃状态（未结账且未取消）
    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

/// Order entity
///
/// 引擎只消费占用判断所需的子集；明细行、支付等由点餐域持有。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub table_id: Option<String>,
    pub status: OrderStatus,
    /// Total amount in currency unit
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}
