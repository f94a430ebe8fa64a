//! 每日预订汇总导出
//!
//! 纯文本 CSV：表头 + 每个营业时区日历日一行，行尾换行。
//! 列：`date,count,people,seated,completed`。

use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;
use shared::models::{Reservation, ReservationStatus};

use crate::utils::time;

#[derive(Debug, Default)]
struct DayRow {
    count: usize,
    people: i64,
    seated: usize,
    completed: usize,
}

/// 生成每日汇总 CSV
///
/// - count/people 统计当日预订（cancelled / no_show 除外）
/// - seated/completed 为其中对应状态的条数
/// - 日期按业务时区分组，升序输出
pub fn daily_summary_csv(reservations: &[Reservation], tz: Tz) -> String {
    let mut days: BTreeMap<NaiveDate, DayRow> = BTreeMap::new();

    for reservation in reservations {
        if reservation.status.is_terminal() {
            continue;
        }
        let date = time::local_date(reservation.reservation_time, tz);
        let row = days.entry(date).or_default();
        row.count += 1;
        row.people += reservation.party_size as i64;
        match reservation.status {
            ReservationStatus::Seated => row.seated += 1,
            ReservationStatus::Completed => row.completed += 1,
            _ => {}
        }
    }

    let mut csv = String::from("date,count,people,seated,completed\n");
    for (date, row) in days {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            date.format("%Y-%m-%d"),
            row.count,
            row.people,
            row.seated,
            row.completed
        ));
    }
    csv
}
