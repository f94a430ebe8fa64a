//! Dining Table Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 桌台原始状态
///
/// 只通过显式指令变更（如结账后置为 Cleaning）。
/// 展示给员工的占用状态由引擎从订单/预订派生，不回写此字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
    Cleaning,
    Maintenance,
}

/// 并桌组 - 多张桌子物理合并服务一个大桌 party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeGroup {
    /// 参与合并的桌台 ID 列表
    pub table_ids: Vec<String>,
    /// 合并后的总容量
    pub merged_capacity: i32,
}

/// Dining table entity (桌台)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    pub number: i32,
    pub name: Option<String>,
    pub capacity: i32,
    pub status: TableStatus,
    pub merge_group: Option<MergeGroup>,
    pub last_occupied_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl DiningTable {
    /// 有效容量：并桌时取合并容量，否则取单桌容量
    pub fn effective_capacity(&self) -> i32 {
        self.merge_group
            .as_ref()
            .map(|g| g.merged_capacity)
            .unwrap_or(self.capacity)
    }
}
