//! 时间轴布局引擎 - 贪心区间排布
//!
//! 把一天的预订排到单条时间轴上，纵向堆叠互不重叠的泳道
//! （日历 day-view 的结构）。
//!
//! # 算法
//!
//! 按开始时间升序扫描；每条预订落入第一条
//! `lane.end ≤ start + buffer` 的泳道，否则开新泳道。
//! 这是区间图着色的贪心 earliest-finish 复用：按开始序填充时
//! 泳道数即最小值，实现必须保持这一最优性，而不仅是"不重叠"。
//!
//! buffer 容差（默认 60 秒）容忍 back-to-back 预订共用泳道。

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::models::Reservation;

use crate::core::FloorConfig;
use crate::utils::time;

/// 带泳道号的预订
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub reservation: Reservation,
    /// 泳道号，0 起
    pub lane: usize,
}

/// 时间轴布局结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineLayout {
    /// 按开始时间排序的预订 + 泳道号
    pub items: Vec<TimelineItem>,
    /// 泳道总数
    pub lane_count: usize,
    /// 可见窗口开始
    pub window_start: DateTime<Utc>,
    /// 可见窗口结束
    pub window_end: DateTime<Utc>,
    /// 30 分钟刻度，从窗口开始向下取整的边界起
    pub ticks: Vec<DateTime<Utc>>,
}

/// 排布一天的预订
///
/// 终止状态（cancelled / no_show）不进入布局。
/// 预订集为空时回退到 `date` 当天的默认营业窗口
/// （config.day_open – day_close，业务时区）。
pub fn layout_timeline(
    reservations: &[Reservation],
    date: NaiveDate,
    config: &FloorConfig,
) -> TimelineLayout {
    let mut visible: Vec<Reservation> = reservations
        .iter()
        .filter(|r| !r.status.is_terminal())
        .cloned()
        .collect();
    // 开始时间为主序，id 决出平局，保证布局确定
    visible.sort_by(|a, b| {
        a.reservation_time
            .cmp(&b.reservation_time)
            .then_with(|| a.id.cmp(&b.id))
    });

    let buffer = Duration::seconds(config.policy.lane_buffer_secs);
    let mut lane_ends: Vec<DateTime<Utc>> = Vec::new();
    let mut items = Vec::with_capacity(visible.len());

    for reservation in visible {
        let (start, end) = reservation.interval();
        let lane = match lane_ends.iter().position(|lane_end| *lane_end <= start + buffer) {
            Some(i) => {
                lane_ends[i] = lane_ends[i].max(end);
                i
            }
            None => {
                lane_ends.push(end);
                lane_ends.len() - 1
            }
        };
        items.push(TimelineItem { reservation, lane });
    }

    let min_start = items.iter().map(|i| i.reservation.reservation_time).min();
    let max_end = items.iter().map(|i| i.reservation.effective_end_time()).max();
    let (window_start, window_end) = match (min_start, max_end) {
        (Some(start), Some(end)) => (start - time::half_hour(), end + time::half_hour()),
        // 空输入：回退到当天的默认营业窗口
        _ => (
            time::local_datetime(date, config.day_open, config.timezone),
            time::local_datetime(date, config.day_close, config.timezone),
        ),
    };

    let ticks = generate_ticks(window_start, window_end);

    TimelineLayout {
        items,
        lane_count: lane_ends.len(),
        window_start,
        window_end,
        ticks,
    }
}

/// 30 分钟刻度，首个刻度为窗口开始向下取整的边界
fn generate_ticks(window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut ticks = Vec::new();
    let mut tick = time::floor_to_half_hour(window_start);
    while tick <= window_end {
        ticks.push(tick);
        tick += time::half_hour();
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::models::ReservationStatus;

    fn config() -> FloorConfig {
        FloorConfig::default()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, m, 0).unwrap()
    }

    fn reservation(id: &str, start: DateTime<Utc>, duration_min: i64) -> Reservation {
        Reservation {
            id: id.to_string(),
            table_id: None,
            customer_name: id.to_string(),
            party_size: 2,
            reservation_time: start,
            duration_minutes: duration_min,
            estimated_end_time: None,
            status: ReservationStatus::Confirmed,
            special_requests: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn lane_of(layout: &TimelineLayout, id: &str) -> usize {
        layout
            .items
            .iter()
            .find(|i| i.reservation.id == id)
            .map(|i| i.lane)
            .unwrap()
    }

    #[test]
    fn test_pairwise_overlapping_needs_three_lanes() {
        // 三条两两重叠 → 恰好 3 条泳道（最小着色数）
        let rs = vec![
            reservation("a", at(18, 0), 120),
            reservation("b", at(18, 30), 120),
            reservation("c", at(19, 0), 120),
        ];
        let layout = layout_timeline(&rs, date(), &config());
        assert_eq!(layout.lane_count, 3);
        assert_eq!(lane_of(&layout, "a"), 0);
        assert_eq!(lane_of(&layout, "b"), 1);
        assert_eq!(lane_of(&layout, "c"), 2);
    }

    #[test]
    fn test_back_to_back_reuses_one_lane() {
        // 首尾相接（间隔 0，在 60s buffer 内）→ 1 条泳道
        let rs = vec![
            reservation("a", at(12, 0), 60),
            reservation("b", at(13, 0), 60),
            reservation("c", at(14, 0), 60),
        ];
        let layout = layout_timeline(&rs, date(), &config());
        assert_eq!(layout.lane_count, 1);
    }

    #[test]
    fn test_lane_frees_after_interval_ends() {
        // a 与 b 重叠；c 在 a 结束后开始 → c 复用 a 的泳道
        let rs = vec![
            reservation("a", at(12, 0), 60),
            reservation("b", at(12, 30), 120),
            reservation("c", at(13, 30), 60),
        ];
        let layout = layout_timeline(&rs, date(), &config());
        assert_eq!(layout.lane_count, 2);
        assert_eq!(lane_of(&layout, "c"), 0);
    }

    #[test]
    fn test_no_overlap_within_lane() {
        // 随意混排的输入：同泳道区间不得重叠（buffer 之外）
        let rs = vec![
            reservation("a", at(11, 0), 90),
            reservation("b", at(11, 15), 45),
            reservation("c", at(12, 0), 60),
            reservation("d", at(12, 45), 30),
            reservation("e", at(11, 45), 120),
        ];
        let layout = layout_timeline(&rs, date(), &config());

        for x in &layout.items {
            for y in &layout.items {
                if x.reservation.id >= y.reservation.id || x.lane != y.lane {
                    continue;
                }
                let (xs, xe) = x.reservation.interval();
                let (ys, ye) = y.reservation.interval();
                let overlap = xs < ye - Duration::seconds(60) && ys < xe - Duration::seconds(60);
                assert!(
                    !overlap,
                    "lane {} overlaps: {} {}",
                    x.lane, x.reservation.id, y.reservation.id
                );
            }
        }
    }

    #[test]
    fn test_window_pads_half_hour() {
        let rs = vec![reservation("a", at(18, 0), 90)];
        let layout = layout_timeline(&rs, date(), &config());
        assert_eq!(layout.window_start, at(17, 30));
        assert_eq!(layout.window_end, at(20, 0)); // 19:30 结束 + 30min
    }

    #[test]
    fn test_empty_input_falls_back_to_default_window() {
        let layout = layout_timeline(&[], date(), &config());
        assert!(layout.items.is_empty());
        assert_eq!(layout.lane_count, 0);
        // Madrid 冬令时 +1：本地 11:00/22:00 = UTC 10:00/21:00
        assert_eq!(layout.window_start, at(10, 0));
        assert_eq!(layout.window_end, at(21, 0));
        assert!(!layout.ticks.is_empty());
    }

    #[test]
    fn test_cancelled_and_no_show_excluded() {
        let mut cancelled = reservation("a", at(18, 0), 60);
        cancelled.status = ReservationStatus::Cancelled;
        let mut no_show = reservation("b", at(18, 0), 60);
        no_show.status = ReservationStatus::NoShow;
        let kept = reservation("c", at(18, 0), 60);

        let layout = layout_timeline(&[cancelled, no_show, kept], date(), &config());
        assert_eq!(layout.items.len(), 1);
        assert_eq!(layout.items[0].reservation.id, "c");
        assert_eq!(layout.lane_count, 1);
    }

    #[test]
    fn test_ticks_every_half_hour_from_floored_start() {
        let rs = vec![reservation("a", at(18, 10), 50)];
        let layout = layout_timeline(&rs, date(), &config());
        // 窗口 17:40 – 19:30；首刻度 17:30（向下取整）
        assert_eq!(layout.ticks.first().copied(), Some(at(17, 30)));
        assert_eq!(layout.ticks.last().copied(), Some(at(19, 30)));
        for pair in layout.ticks.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::minutes(30));
        }
    }

    #[test]
    fn test_ticks_when_window_starts_on_boundary() {
        let rs = vec![reservation("a", at(18, 0), 60)];
        let layout = layout_timeline(&rs, date(), &config());
        // 窗口 17:30 开始，已在边界上 → 首刻度就是窗口开始
        assert_eq!(layout.ticks.first().copied(), Some(at(17, 30)));
    }

    #[test]
    fn test_deterministic_tiebreak_on_equal_start() {
        let rs = vec![
            reservation("b", at(18, 0), 60),
            reservation("a", at(18, 0), 60),
        ];
        let layout = layout_timeline(&rs, date(), &config());
        // 同开始时间按 id 排序：a 先拿 0 号泳道
        assert_eq!(lane_of(&layout, "a"), 0);
        assert_eq!(lane_of(&layout, "b"), 1);
        assert_eq!(layout.items[0].reservation.id, "a");
    }

    #[test]
    fn test_stored_end_time_drives_packing() {
        // 显式 estimated_end_time 覆盖 duration；a 实际 30 分钟就结束
        let mut a = reservation("a", at(18, 0), 120);
        a.estimated_end_time = Some(at(18, 30));
        let b = reservation("b", at(18, 30), 60);
        let layout = layout_timeline(&[a, b], date(), &config());
        assert_eq!(layout.lane_count, 1);
    }
}
