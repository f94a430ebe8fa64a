//! 数据源契约 - 批量查询与推送订阅
//!
//! 远端数据服务通过固定的 query/mutation 契约访问；引擎只依赖
//! 这里的 trait，实现可插拔（远端服务 / 内存测试替身）。
//!
//! ```text
//! FloorService ──▶ FloorDataSource ──┬──▶ RemoteDataSource (生产)
//!                                    └──▶ MemoryDataSource (测试/进程内)
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::message::FeedEvent;
use shared::models::{DiningTable, Order, Reservation};
use tokio::sync::broadcast;

use crate::utils::{FloorResult, time};

mod memory;
pub use memory::MemoryDataSource;

/// 查询范围 - 一家餐厅的一个营业日
///
/// 推送订阅与批量查询都以 scope 为键；切换 scope 必须先关闭
/// 旧的订阅句柄，防止过期订阅污染当前集合。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorScope {
    /// 餐厅 ID
    pub restaurant_id: String,
    /// 营业日 (业务时区日历日)
    pub date: NaiveDate,
}

impl FloorScope {
    pub fn new(restaurant_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            restaurant_id: restaurant_id.into(),
            date,
        }
    }

    /// 从外部传入的日期字符串 (YYYY-MM-DD) 构造 scope
    ///
    /// 调用方（UI 路由、CLI 参数）拿到的日期通常是字符串；
    /// 解析失败返回 [`crate::utils::FloorError::Validation`]。
    pub fn for_date(restaurant_id: impl Into<String>, date: &str) -> FloorResult<Self> {
        Ok(Self::new(restaurant_id, time::parse_date(date)?))
    }
}

/// 数据源契约
///
/// - 批量查询：桌台（按餐厅）、活跃订单（按餐厅 + 状态集）、
///   预订（按餐厅 + 日期范围，取消的在源头过滤）
/// - 推送订阅：按 scope 订阅 `FeedEvent` 流，at-most-once、无序
#[async_trait]
pub trait FloorDataSource: Send + Sync {
    /// 拉取 scope 内的全部桌台
    async fn fetch_tables(&self, scope: &FloorScope) -> FloorResult<Vec<DiningTable>>;

    /// 拉取 scope 内所有活跃状态的订单
    async fn fetch_active_orders(&self, scope: &FloorScope) -> FloorResult<Vec<Order>>;

    /// 拉取 scope 营业日范围内的预订
    async fn fetch_reservations(&self, scope: &FloorScope) -> FloorResult<Vec<Reservation>>;

    /// 订阅 scope 的变更推送
    fn subscribe_feed(&self, scope: &FloorScope) -> broadcast::Receiver<FeedEvent>;
}
