//! 内存数据源 - 测试与进程内演示用
//!
//! 持有三个实体集合的内存副本，推送走 broadcast 通道。
//! 可注入查询失败，用于验证 last-known-good 降级路径。

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use shared::message::FeedEvent;
use shared::models::{DiningTable, Order, Reservation};
use tokio::sync::broadcast;

use super::{FloorDataSource, FloorScope};
use crate::utils::{FloorError, FloorResult};

/// 内存数据源
pub struct MemoryDataSource {
    tables: Mutex<Vec<DiningTable>>,
    orders: Mutex<Vec<Order>>,
    reservations: Mutex<Vec<Reservation>>,
    feed_tx: broadcast::Sender<FeedEvent>,
    /// 置位后所有批量查询返回错误（模拟网络故障）
    failing: AtomicBool,
    /// 完整批量加载（三个集合各拉一次）计数
    load_count: AtomicUsize,
}

impl MemoryDataSource {
    pub fn new(capacity: usize) -> Self {
        let (feed_tx, _) = broadcast::channel(capacity);
        Self {
            tables: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
            reservations: Mutex::new(Vec::new()),
            feed_tx,
            failing: AtomicBool::new(false),
            load_count: AtomicUsize::new(0),
        }
    }

    pub fn set_tables(&self, tables: Vec<DiningTable>) {
        *self.tables.lock().unwrap() = tables;
    }

    pub fn set_orders(&self, orders: Vec<Order>) {
        *self.orders.lock().unwrap() = orders;
    }

    pub fn set_reservations(&self, reservations: Vec<Reservation>) {
        *self.reservations.lock().unwrap() = reservations;
    }

    /// 下发一条推送事件
    ///
    /// 没有订阅者时静默丢弃（与真实推送通道一致）。
    pub fn push(&self, event: FeedEvent) {
        let _ = self.feed_tx.send(event);
    }

    /// 模拟批量查询故障开关
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// fetch_tables 被调用的次数（近似一次完整加载一次）
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    fn check_failing(&self) -> FloorResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(FloorError::data_source("simulated query failure"))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryDataSource {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl FloorDataSource for MemoryDataSource {
    async fn fetch_tables(&self, _scope: &FloorScope) -> FloorResult<Vec<DiningTable>> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        Ok(self.tables.lock().unwrap().clone())
    }

    async fn fetch_active_orders(&self, _scope: &FloorScope) -> FloorResult<Vec<Order>> {
        self.check_failing()?;
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.status.is_active())
            .cloned()
            .collect())
    }

    async fn fetch_reservations(&self, _scope: &FloorScope) -> FloorResult<Vec<Reservation>> {
        self.check_failing()?;
        Ok(self.reservations.lock().unwrap().clone())
    }

    fn subscribe_feed(&self, _scope: &FloorScope) -> broadcast::Receiver<FeedEvent> {
        self.feed_tx.subscribe()
    }
}
