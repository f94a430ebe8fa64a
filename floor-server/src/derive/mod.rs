//! 复合状态派生
//!
//! 一张桌子的占用状态有三个相互独立、偶尔矛盾的来源：
//! 活跃订单、预订、桌台原始状态。本模块把三者压成一个展示
//! 状态 + 警报列表，按固定优先级取第一个命中：
//!
//! 1. 有活跃订单 → occupied
//! 2. 有 seated 预订 → occupied
//! 3. confirmed 预订落在前瞻窗口内 → reserved
//! 4. 原始状态 cleaning / maintenance → 透传
//! 5. 其余 → available
//!
//! 纯投影：每次刷新按需重算，绝不回写存储。
//! 相同输入 + 相同 now 必得相同输出（确定性）。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{DiningTable, Order, Reservation, ReservationStatus, TableStatus};
use std::fmt;

mod tags;
pub use tags::{ReservationTag, TaggedReservation, classify_reservation};

use crate::core::DerivePolicy;

/// 桌台警报
///
/// 与展示状态相互独立，全部基于 now 评估。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableAlert {
    /// seated 预订的有效结束时刻已过
    Overtime,
    /// reserved 桌台的预订即将开始
    Imminent,
    /// 桌台处于 cleaning 超过阈值
    CleaningTimeout,
}

impl fmt::Display for TableAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableAlert::Overtime => write!(f, "overtime"),
            TableAlert::Imminent => write!(f, "imminent"),
            TableAlert::CleaningTimeout => write!(f, "cleaning_timeout"),
        }
    }
}

/// 桌台复合状态（派生视图，不持久化）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeTableState {
    pub table: DiningTable,
    /// 展示给员工的占用状态
    pub status_display: TableStatus,
    /// 关联的活跃订单，按创建时间排序
    pub active_orders: Vec<Order>,
    /// 前瞻窗口内最早的 confirmed 预订
    pub upcoming_reservation: Option<Reservation>,
    /// 当前 seated 的预订
    pub seated_reservation: Option<Reservation>,
    /// 占用开始时刻（仅展示状态为 occupied 时）
    pub occupied_since: Option<DateTime<Utc>>,
    /// 预计释放时刻（来自 seated 预订的有效结束）
    pub will_be_free_at: Option<DateTime<Utc>>,
    pub alerts: Vec<TableAlert>,
}

/// 派生单桌复合状态
///
/// `orders` / `reservations` 为已关联到该桌的记录；函数内部
/// 再按活跃/终止状态过滤一次，保持纯函数自洽。
///
/// 数据质量容忍：同桌出现多条 seated 预订时取开始最早的一条，
/// 不视为错误。
pub fn derive_composite(
    table: &DiningTable,
    orders: &[Order],
    reservations: &[Reservation],
    now: DateTime<Utc>,
    policy: &DerivePolicy,
) -> CompositeTableState {
    let mut active_orders: Vec<Order> = orders
        .iter()
        .filter(|o| o.status.is_active())
        .cloned()
        .collect();
    active_orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let seated_reservation = reservations
        .iter()
        .filter(|r| r.status == ReservationStatus::Seated)
        .min_by(|a, b| {
            a.reservation_time
                .cmp(&b.reservation_time)
                .then_with(|| a.id.cmp(&b.id))
        })
        .cloned();

    // 前瞻窗口：start − now <= lookahead，不设下界
    // （迟到但仍 confirmed 的预订继续占住 reserved 展示）
    let lookahead = Duration::minutes(policy.reserved_lookahead_min);
    let upcoming_reservation = reservations
        .iter()
        .filter(|r| {
            r.status == ReservationStatus::Confirmed && r.reservation_time - now <= lookahead
        })
        .min_by(|a, b| {
            a.reservation_time
                .cmp(&b.reservation_time)
                .then_with(|| a.id.cmp(&b.id))
        })
        .cloned();

    let status_display = if !active_orders.is_empty() {
        TableStatus::Occupied
    } else if seated_reservation.is_some() {
        TableStatus::Occupied
    } else if upcoming_reservation.is_some() {
        TableStatus::Reserved
    } else if matches!(table.status, TableStatus::Cleaning | TableStatus::Maintenance) {
        table.status
    } else {
        TableStatus::Available
    };

    let occupied_since = if status_display == TableStatus::Occupied {
        active_orders
            .first()
            .map(|o| o.created_at)
            .or_else(|| seated_reservation.as_ref().map(|r| r.reservation_time))
    } else {
        None
    };

    let will_be_free_at = seated_reservation.as_ref().map(|r| r.effective_end_time());

    // 警报固定顺序评估，保证输出确定
    let mut alerts = Vec::new();
    if let Some(seated) = &seated_reservation
        && seated.effective_end_time() < now
    {
        alerts.push(TableAlert::Overtime);
    }
    if status_display == TableStatus::Reserved
        && let Some(upcoming) = &upcoming_reservation
        && upcoming.reservation_time - now <= Duration::minutes(policy.imminent_threshold_min)
    {
        alerts.push(TableAlert::Imminent);
    }
    if table.status == TableStatus::Cleaning
        && now - table.updated_at > Duration::minutes(policy.cleaning_timeout_min)
    {
        alerts.push(TableAlert::CleaningTimeout);
    }

    CompositeTableState {
        table: table.clone(),
        status_display,
        active_orders,
        upcoming_reservation,
        seated_reservation,
        occupied_since,
        will_be_free_at,
        alerts,
    }
}
