//! Reservation Model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Seated,
    Completed,
    Cancelled,
    NoShow,
}

impl ReservationStatus {
    /// 终止状态（不再出现在看板/时间轴上）
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Cancelled | ReservationStatus::NoShow
        )
    }
}

/// Reservation entity (预订)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub table_id: Option<String>,
    pub customer_name: String,
    pub party_size: i32,
    /// 预订开始时刻
    pub reservation_time: DateTime<Utc>,
    pub duration_minutes: i64,
    /// 预计结束时刻；缺省时按 start + duration 派生
    pub estimated_end_time: Option<DateTime<Utc>>,
    pub status: ReservationStatus,
    pub special_requests: Option<String>,
}

impl Reservation {
    /// 有效结束时刻
    ///
    /// 存储值优先，缺省派生为 start + duration。
    /// 不变量：有效结束时刻 >= 开始时刻（异常数据向上截断）。
    pub fn effective_end_time(&self) -> DateTime<Utc> {
        let derived = self.reservation_time + Duration::minutes(self.duration_minutes.max(0));
        self.estimated_end_time
            .unwrap_or(derived)
            .max(self.reservation_time)
    }

    /// 占用区间 [start, effective_end)
    pub fn interval(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.reservation_time, self.effective_end_time())
    }
}
