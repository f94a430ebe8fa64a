//! 预订时间标签分类
//!
//! 每个标签独立评估（一条预订可同时携带多个标签），
//! 只有 confirmed / seated 两种状态会产生标签。
//! 注入 now，保证可单测的确定性。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{Reservation, ReservationStatus};
use std::fmt;

use crate::core::DerivePolicy;

/// 预订紧迫度标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationTag {
    /// confirmed 且 0 < start − now ≤ 60 分钟
    Upcoming,
    /// confirmed 且 |start − now| ≤ 5 分钟
    ArrivingNow,
    /// confirmed 且 now − start > 5 分钟（过宽限期未入座）
    Late,
    /// seated 且 0 ≤ end − now ≤ 15 分钟
    EndingSoon,
    /// seated 且 end < now（严格）
    Overtime,
}

impl fmt::Display for ReservationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationTag::Upcoming => write!(f, "upcoming"),
            ReservationTag::ArrivingNow => write!(f, "arriving_now"),
            ReservationTag::Late => write!(f, "late"),
            ReservationTag::EndingSoon => write!(f, "ending_soon"),
            ReservationTag::Overtime => write!(f, "overtime"),
        }
    }
}

/// 预订 + 标签（列表/时间轴视图的行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedReservation {
    pub reservation: Reservation,
    pub tags: Vec<ReservationTag>,
}

/// 分类一条预订
///
/// 输出顺序固定：upcoming, arriving_now, late, ending_soon, overtime。
pub fn classify_reservation(
    reservation: &Reservation,
    now: DateTime<Utc>,
    policy: &DerivePolicy,
) -> Vec<ReservationTag> {
    let mut tags = Vec::new();

    match reservation.status {
        ReservationStatus::Confirmed => {
            let until_start = reservation.reservation_time - now;
            let grace = Duration::minutes(policy.arrival_grace_min);

            if until_start > Duration::zero()
                && until_start <= Duration::minutes(policy.upcoming_window_min)
            {
                tags.push(ReservationTag::Upcoming);
            }
            if until_start.abs() <= grace {
                tags.push(ReservationTag::ArrivingNow);
            }
            if -until_start > grace {
                tags.push(ReservationTag::Late);
            }
        }
        ReservationStatus::Seated => {
            let until_end = reservation.effective_end_time() - now;

            if until_end >= Duration::zero()
                && until_end <= Duration::minutes(policy.ending_soon_min)
            {
                tags.push(ReservationTag::EndingSoon);
            }
            if until_end < Duration::zero() {
                tags.push(ReservationTag::Overtime);
            }
        }
        // 其余状态不产生标签
        _ => {}
    }

    tags
}
