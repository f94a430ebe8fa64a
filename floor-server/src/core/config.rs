//! 引擎配置
//!
//! 观察到的策略常量（lookahead、宽限期、超时阈值）全部视为配置，
//! 不硬编码进派生逻辑。

use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::utils::time::parse_hhmm;

/// 派生策略常量 - 传入各纯函数的时间阈值
///
/// 单独拆出以保持 Deriver/Classifier/Layout 可注入、可单测。
#[derive(Debug, Clone, Copy)]
pub struct DerivePolicy {
    /// Reserved 展示的前瞻窗口（分钟）
    pub reserved_lookahead_min: i64,
    /// imminent 警报阈值（分钟）
    pub imminent_threshold_min: i64,
    /// cleaning_timeout 警报阈值（分钟）
    pub cleaning_timeout_min: i64,
    /// upcoming 标签窗口（分钟）
    pub upcoming_window_min: i64,
    /// arriving_now / late 的到店宽限期（分钟）
    pub arrival_grace_min: i64,
    /// ending_soon 标签窗口（分钟）
    pub ending_soon_min: i64,
    /// 泳道复用的衔接容差（秒），容忍 back-to-back 预订
    pub lane_buffer_secs: i64,
}

impl Default for DerivePolicy {
    fn default() -> Self {
        Self {
            reserved_lookahead_min: 120,
            imminent_threshold_min: 15,
            cleaning_timeout_min: 10,
            upcoming_window_min: 60,
            arrival_grace_min: 5,
            ending_soon_min: 15,
            lane_buffer_secs: 60,
        }
    }
}

/// 引擎配置 - 楼面引擎的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | FLOOR_TIMEZONE | Europe/Madrid | 业务时区 |
/// | FLOOR_RESERVED_LOOKAHEAD_MIN | 120 | Reserved 展示前瞻窗口(分钟) |
/// | FLOOR_IMMINENT_MIN | 15 | imminent 警报阈值(分钟) |
/// | FLOOR_CLEANING_TIMEOUT_MIN | 10 | 清洁超时警报阈值(分钟) |
/// | FLOOR_UPCOMING_MIN | 60 | upcoming 标签窗口(分钟) |
/// | FLOOR_ARRIVAL_GRACE_MIN | 5 | 到店宽限期(分钟) |
/// | FLOOR_ENDING_SOON_MIN | 15 | ending_soon 窗口(分钟) |
/// | FLOOR_LANE_BUFFER_SECS | 60 | 泳道衔接容差(秒) |
/// | FLOOR_RESYNC_INTERVAL_MS | 60000 | resync 定时器周期(毫秒) |
/// | FLOOR_RESYNC_THRESHOLD_MS | 30000 | 两次全量加载的最小间隔(毫秒) |
/// | FLOOR_DAY_OPEN | 11:00 | 空时间轴默认窗口开始 |
/// | FLOOR_DAY_CLOSE | 22:00 | 空时间轴默认窗口结束 |
/// | FLOOR_FEED_CAPACITY | 1024 | 推送通道容量 |
#[derive(Debug, Clone)]
pub struct FloorConfig {
    /// 业务时区
    pub timezone: Tz,
    /// 派生策略常量
    pub policy: DerivePolicy,
    /// resync 定时器周期 (毫秒)
    pub resync_interval_ms: u64,
    /// 两次全量加载之间的最小间隔 (毫秒)
    pub resync_threshold_ms: u64,
    /// 空时间轴默认窗口开始 (本地时刻)
    pub day_open: NaiveTime,
    /// 空时间轴默认窗口结束 (本地时刻)
    pub day_close: NaiveTime,
    /// 推送通道容量
    pub feed_capacity: usize,
}

impl FloorConfig {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或解析失败，使用默认值
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timezone: std::env::var("FLOOR_TIMEZONE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timezone),
            policy: DerivePolicy {
                reserved_lookahead_min: env_i64(
                    "FLOOR_RESERVED_LOOKAHEAD_MIN",
                    defaults.policy.reserved_lookahead_min,
                ),
                imminent_threshold_min: env_i64(
                    "FLOOR_IMMINENT_MIN",
                    defaults.policy.imminent_threshold_min,
                ),
                cleaning_timeout_min: env_i64(
                    "FLOOR_CLEANING_TIMEOUT_MIN",
                    defaults.policy.cleaning_timeout_min,
                ),
                upcoming_window_min: env_i64(
                    "FLOOR_UPCOMING_MIN",
                    defaults.policy.upcoming_window_min,
                ),
                arrival_grace_min: env_i64(
                    "FLOOR_ARRIVAL_GRACE_MIN",
                    defaults.policy.arrival_grace_min,
                ),
                ending_soon_min: env_i64("FLOOR_ENDING_SOON_MIN", defaults.policy.ending_soon_min),
                lane_buffer_secs: env_i64(
                    "FLOOR_LANE_BUFFER_SECS",
                    defaults.policy.lane_buffer_secs,
                ),
            },
            resync_interval_ms: env_u64("FLOOR_RESYNC_INTERVAL_MS", defaults.resync_interval_ms),
            resync_threshold_ms: env_u64("FLOOR_RESYNC_THRESHOLD_MS", defaults.resync_threshold_ms),
            day_open: std::env::var("FLOOR_DAY_OPEN")
                .map(|v| parse_hhmm(&v, defaults.day_open))
                .unwrap_or(defaults.day_open),
            day_close: std::env::var("FLOOR_DAY_CLOSE")
                .map(|v| parse_hhmm(&v, defaults.day_close))
                .unwrap_or(defaults.day_close),
            feed_capacity: env_u64("FLOOR_FEED_CAPACITY", defaults.feed_capacity as u64) as usize,
        }
    }
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Madrid,
            policy: DerivePolicy::default(),
            resync_interval_ms: 60_000,
            resync_threshold_ms: 30_000,
            day_open: NaiveTime::from_hms_opt(11, 0, 0).unwrap_or(NaiveTime::MIN),
            day_close: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            feed_capacity: 1024,
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
