//! 容量/分配校验
//!
//! 手动排桌时判定候选桌台：可否分配、容量是否足够。
//! 永不报错 — 只返回分类结果，block/warn 策略归调用方。

use serde::{Deserialize, Serialize};
use shared::models::{DiningTable, Reservation, TableStatus};

/// 分配校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentCheck {
    /// 可分配：复合状态 available，或该桌本就分配给这条预订
    /// （允许幂等重选，不强迫换桌）
    pub assignable: bool,
    /// 容量不足（软警告，不阻塞选择）
    pub capacity_short: bool,
    /// 有效容量：并桌组容量优先于单桌容量
    pub effective_capacity: i32,
}

/// 校验一条预订对一张候选桌台
///
/// `status_display` 是该桌当前的复合展示状态（由 Deriver 计算），
/// 不是原始状态。
pub fn check_assignment(
    table: &DiningTable,
    status_display: TableStatus,
    reservation: &Reservation,
) -> AssignmentCheck {
    let already_assigned = reservation.table_id.as_deref() == Some(table.id.as_str());
    let effective_capacity = table.effective_capacity();

    AssignmentCheck {
        assignable: status_display == TableStatus::Available || already_assigned,
        capacity_short: reservation.party_size > effective_capacity,
        effective_capacity,
    }
}
