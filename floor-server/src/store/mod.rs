//! 实体存储 - 桌台/订单/预订三个权威集合的本地视图
//!
//! # 一致性
//!
//! 集合通过三种途径变更，全部汇入同一个 worker 串行应用：
//!
//! - 批量加载：整集合替换（resync 幂等）
//! - 推送事件：按 id 幂等 upsert / delete，字段级浅合并
//! - 周期 resync：等价于一次批量加载，覆盖此前任何状态
//!
//! 推送无序、at-most-once，浅合并保证乱序到达收敛；丢失的事件
//! 由下一次 resync 自愈。
//!
//! 派生视图（复合状态、标签、时间轴）一律按需计算，
//! 不在存储内缓存。

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::message::{EntityKind, FeedAction, FeedEvent};
use shared::models::{DiningTable, Order, Reservation};

mod service;
pub use service::{FloorService, ScopeHandle};

/// 实体存储
///
/// 纯同步容器，锁与任务调度由 [`FloorService`] 负责。
#[derive(Debug, Default)]
pub struct FloorStore {
    tables: HashMap<String, DiningTable>,
    orders: HashMap<String, Order>,
    reservations: HashMap<String, Reservation>,
}

impl FloorStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Bulk replacement (load / resync)
    // ========================================================================

    /// 整体替换三个集合（批量加载 / resync 提交点）
    ///
    /// 三个集合一次性替换，调用方保证三路查询都已成功，
    /// 避免破坏性的部分覆盖。
    pub fn replace_all(
        &mut self,
        tables: Vec<DiningTable>,
        orders: Vec<Order>,
        reservations: Vec<Reservation>,
    ) {
        self.tables = tables.into_iter().map(|t| (t.id.clone(), t)).collect();
        self.orders = orders.into_iter().map(|o| (o.id.clone(), o)).collect();
        self.reservations = reservations
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
    }

    // ========================================================================
    // Incremental events
    // ========================================================================

    /// 应用一条推送事件，返回是否实际变更了集合
    ///
    /// - insert/update: 按 id upsert；已存在时字段级浅合并
    ///   （事件行覆盖同名字段，未携带字段保持原值）
    /// - delete: 按 id 移除
    /// - 缺 id / 合并后无法反序列化：丢弃并记 warn，集合不变
    pub fn apply_event(&mut self, event: &FeedEvent) -> bool {
        let Some(id) = event.row_id() else {
            tracing::warn!(
                event_id = %event.event_id,
                entity = %event.entity,
                action = %event.action,
                "Feed event dropped: row has no id"
            );
            return false;
        };
        let id = id.to_string();

        match event.entity {
            EntityKind::Table => upsert_or_delete(&mut self.tables, event, &id),
            EntityKind::Order => upsert_or_delete(&mut self.orders, event, &id),
            EntityKind::Reservation => upsert_or_delete(&mut self.reservations, event, &id),
        }
    }

    // ========================================================================
    // Read accessors (snapshot clones)
    // ========================================================================

    pub fn table(&self, id: &str) -> Option<&DiningTable> {
        self.tables.get(id)
    }

    /// 桌台列表，按桌号稳定排序
    pub fn tables_sorted(&self) -> Vec<DiningTable> {
        let mut tables: Vec<_> = self.tables.values().cloned().collect();
        tables.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.id.cmp(&b.id)));
        tables
    }

    /// 指定桌台的活跃订单
    pub fn active_orders_for_table(&self, table_id: &str) -> Vec<Order> {
        self.orders
            .values()
            .filter(|o| o.status.is_active() && o.table_id.as_deref() == Some(table_id))
            .cloned()
            .collect()
    }

    /// 指定桌台的预订（不含终止状态）
    pub fn reservations_for_table(&self, table_id: &str) -> Vec<Reservation> {
        self.reservations
            .values()
            .filter(|r| !r.status.is_terminal() && r.table_id.as_deref() == Some(table_id))
            .cloned()
            .collect()
    }

    pub fn reservation(&self, id: &str) -> Option<&Reservation> {
        self.reservations.get(id)
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.reservations.values().cloned().collect()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }
}

/// 按事件类型对单个集合做幂等 upsert / delete
fn upsert_or_delete<T>(map: &mut HashMap<String, T>, event: &FeedEvent, id: &str) -> bool
where
    T: Serialize + DeserializeOwned,
{
    match event.action {
        FeedAction::Delete => map.remove(id).is_some(),
        FeedAction::Insert | FeedAction::Update => {
            let merged = match map.get(id) {
                Some(existing) => match shallow_merge(existing, &event.row) {
                    Some(v) => v,
                    None => {
                        tracing::warn!(
                            event_id = %event.event_id,
                            entity = %event.entity,
                            id = %id,
                            "Feed event dropped: existing record not serializable"
                        );
                        return false;
                    }
                },
                None => event.row.clone(),
            };

            match serde_json::from_value::<T>(merged) {
                Ok(record) => {
                    map.insert(id.to_string(), record);
                    true
                }
                Err(e) => {
                    tracing::warn!(
                        event_id = %event.event_id,
                        entity = %event.entity,
                        id = %id,
                        error = %e,
                        "Feed event dropped: merged row does not deserialize"
                    );
                    false
                }
            }
        }
    }
}

/// 字段级浅合并：事件行的顶层字段覆盖现有记录的同名字段
///
/// last-write-wins 以字段为粒度，避免部分行整体覆盖掉
/// 未携带的无关字段。
fn shallow_merge<T: Serialize>(existing: &T, row: &Value) -> Option<Value> {
    let mut base = serde_json::to_value(existing).ok()?;
    if let (Value::Object(base_map), Value::Object(row_map)) = (&mut base, row) {
        for (k, v) in row_map {
            base_map.insert(k.clone(), v.clone());
        }
    } else {
        // 事件行不是对象：整体替换，交给反序列化把关
        return Some(row.clone());
    }
    Some(base)
}
