//! Scope 生命周期集成测试
//!
//! 用内存数据源驱动完整链路：初始加载 → 推送事件 → resync →
//! 关闭订阅。时间相关断言均留了宽裕的等待窗口。

use std::sync::{Arc, Once};
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use floor_server::{FloorConfig, FloorScope, FloorService, MemoryDataSource};
use serde_json::json;
use shared::message::{EntityKind, FeedAction, FeedEvent, NoticeLevel};
use shared::models::{DiningTable, Order, OrderStatus, Reservation, ReservationStatus, TableStatus};

fn table(id: &str, number: i32) -> DiningTable {
    DiningTable {
        id: id.to_string(),
        number,
        name: None,
        capacity: 4,
        status: TableStatus::Available,
        merge_group: None,
        last_occupied_at: None,
        updated_at: Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap(),
    }
}

fn order(id: &str, table_id: &str) -> Order {
    Order {
        id: id.to_string(),
        table_id: Some(table_id.to_string()),
        status: OrderStatus::Preparing,
        total_amount: 18.0,
        created_at: Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap(),
    }
}

fn reservation(id: &str, table_id: &str) -> Reservation {
    Reservation {
        id: id.to_string(),
        table_id: Some(table_id.to_string()),
        customer_name: "Iris".to_string(),
        party_size: 2,
        reservation_time: Utc.with_ymd_and_hms(2026, 3, 14, 20, 0, 0).unwrap(),
        duration_minutes: 90,
        estimated_end_time: None,
        status: ReservationStatus::Confirmed,
        special_requests: None,
    }
}

static INIT: Once = Once::new();

/// 日志只能全局初始化一次；RUST_LOG 可在跑测试时打开输出
fn init() {
    INIT.call_once(floor_server::init_logger);
}

fn scope() -> FloorScope {
    FloorScope::for_date("rest1", "2026-03-14").unwrap()
}

fn slow_resync_config() -> FloorConfig {
    // resync 基本不触发，隔离推送路径
    FloorConfig {
        resync_interval_ms: 3_600_000,
        resync_threshold_ms: 3_600_000,
        ..FloorConfig::default()
    }
}

#[tokio::test]
async fn test_open_scope_loads_and_applies_feed_events() {
    init();
    let source = Arc::new(MemoryDataSource::default());
    source.set_tables(vec![table("t1", 1)]);
    let service = FloorService::new(slow_resync_config(), source.clone());

    let handle = service.open_scope(scope()).await;
    let now = Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap();

    let state = service.composite_state_at("t1", now).await.unwrap();
    assert_eq!(state.status_display, TableStatus::Available);

    // 推送一条新订单 → 桌台变 occupied
    let row = serde_json::to_value(order("o1", "t1")).unwrap();
    source.push(FeedEvent::new(EntityKind::Order, FeedAction::Insert, row));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let state = service.composite_state_at("t1", now).await.unwrap();
    assert_eq!(state.status_display, TableStatus::Occupied);
    assert_eq!(state.active_orders.len(), 1);

    handle.close().await;
}

#[tokio::test]
async fn test_closed_scope_never_mutates_again() {
    init();
    let source = Arc::new(MemoryDataSource::default());
    source.set_tables(vec![table("t1", 1)]);
    let service = FloorService::new(slow_resync_config(), source.clone());

    let handle = service.open_scope(scope()).await;
    handle.close().await;

    // 关闭后的推送绝不能再改写集合
    let row = serde_json::to_value(order("o1", "t1")).unwrap();
    source.push(FeedEvent::new(EntityKind::Order, FeedAction::Insert, row));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let now = Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap();
    let state = service.composite_state_at("t1", now).await.unwrap();
    assert_eq!(state.status_display, TableStatus::Available);
    assert!(state.active_orders.is_empty());
}

#[tokio::test]
async fn test_load_failure_keeps_last_known_good_and_notifies() {
    init();
    let source = Arc::new(MemoryDataSource::default());
    source.set_tables(vec![table("t1", 1), table("t2", 2)]);
    let service = FloorService::new(slow_resync_config(), source.clone());
    let mut notices = service.subscribe_notices();

    let handle = service.open_scope(scope()).await;
    assert_eq!(service.composite_states().await.len(), 2);

    // 数据源故障 + 源端数据变化：失败的 load 不得做部分覆盖
    source.set_failing(true);
    source.set_tables(vec![table("t3", 3)]);
    assert!(service.load_all(handle.scope()).await.is_err());

    let states = service.composite_states().await;
    assert_eq!(states.len(), 2);
    assert_eq!(states[0].table.id, "t1");

    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Warning);

    handle.close().await;
}

#[tokio::test]
async fn test_periodic_resync_heals_missed_events() {
    init();
    let source = Arc::new(MemoryDataSource::default());
    source.set_tables(vec![table("t1", 1)]);
    let config = FloorConfig {
        resync_interval_ms: 50,
        resync_threshold_ms: 10,
        ..FloorConfig::default()
    };
    let service = FloorService::new(config, source.clone());

    let handle = service.open_scope(scope()).await;

    // 模拟"事件在传输中丢失"：直接改源端，不发推送
    source.set_reservations(vec![reservation("r1", "t1")]);
    tokio::time::sleep(Duration::from_millis(300)).await;

    let layout = service
        .timeline_layout(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap())
        .await;
    assert_eq!(layout.items.len(), 1, "resync should have healed the miss");
    assert!(source.load_count() > 1);

    handle.close().await;
}

#[tokio::test]
async fn test_resync_threshold_bounds_frequency() {
    init();
    let source = Arc::new(MemoryDataSource::default());
    source.set_tables(vec![table("t1", 1)]);
    // tick 很密，但门限很宽 → 只有打开时的一次加载
    let config = FloorConfig {
        resync_interval_ms: 20,
        resync_threshold_ms: 3_600_000,
        ..FloorConfig::default()
    };
    let service = FloorService::new(config, source.clone());

    let handle = service.open_scope(scope()).await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(source.load_count(), 1);
    handle.close().await;
}

#[tokio::test]
async fn test_check_assignment_through_service() {
    init();
    let source = Arc::new(MemoryDataSource::default());
    let mut merged = table("t1", 1);
    merged.merge_group = Some(shared::models::MergeGroup {
        table_ids: vec!["t1".to_string(), "t2".to_string()],
        merged_capacity: 8,
    });
    source.set_tables(vec![merged]);
    let mut big_party = reservation("r1", "t9");
    big_party.table_id = None;
    big_party.party_size = 6;
    source.set_reservations(vec![big_party]);

    let service = FloorService::new(slow_resync_config(), source.clone());
    let handle = service.open_scope(scope()).await;

    let now = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();
    let check = service.check_assignment_at("r1", "t1", now).await.unwrap();
    assert!(check.assignable);
    assert!(!check.capacity_short); // 并桌组容量 8 >= 6
    assert_eq!(check.effective_capacity, 8);

    // 不存在的实体 → None，不报错
    assert!(service.check_assignment_at("rX", "t1", now).await.is_none());

    handle.close().await;
}

#[tokio::test]
async fn test_daily_summary_csv_through_service() {
    init();
    let source = Arc::new(MemoryDataSource::default());
    source.set_tables(vec![table("t1", 1)]);
    let mut seated = reservation("r1", "t1");
    seated.status = ReservationStatus::Seated;
    seated.party_size = 4;
    source.set_reservations(vec![seated, reservation("r2", "t1")]);

    let service = FloorService::new(slow_resync_config(), source.clone());
    let handle = service.open_scope(scope()).await;

    let csv = service.daily_summary_csv().await;
    // UTC 20:00 = Madrid 21:00，同日
    assert_eq!(
        csv,
        "date,count,people,seated,completed\n2026-03-14,2,6,1,0\n"
    );

    handle.close().await;
}

#[tokio::test]
async fn test_malformed_feed_event_is_dropped_not_fatal() {
    init();
    let source = Arc::new(MemoryDataSource::default());
    source.set_tables(vec![table("t1", 1)]);
    let service = FloorService::new(slow_resync_config(), source.clone());
    let handle = service.open_scope(scope()).await;

    source.push(FeedEvent::new(
        EntityKind::Table,
        FeedAction::Update,
        json!({ "status": "occupied" }),
    ));
    tokio::time::sleep(Duration::from_millis(100)).await;

    // worker 仍然活着，后续合法事件照常应用
    source.push(FeedEvent::new(
        EntityKind::Table,
        FeedAction::Update,
        json!({ "id": "t1", "status": "cleaning" }),
    ));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let now = Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap();
    let state = service.composite_state_at("t1", now).await.unwrap();
    assert_eq!(state.table.status, TableStatus::Cleaning);

    handle.close().await;
}

#[tokio::test]
async fn test_tagged_reservations_sorted_and_dated() {
    init();
    let source = Arc::new(MemoryDataSource::default());
    source.set_tables(vec![table("t1", 1)]);
    let mut early = reservation("r2", "t1");
    early.reservation_time = Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap();
    let late = reservation("r1", "t1");
    let mut other_day = reservation("r3", "t1");
    other_day.reservation_time = Utc.with_ymd_and_hms(2026, 3, 16, 20, 0, 0).unwrap();
    source.set_reservations(vec![late, early, other_day]);

    let service = FloorService::new(slow_resync_config(), source.clone());
    let handle = service.open_scope(scope()).await;

    let now = Utc.with_ymd_and_hms(2026, 3, 14, 17, 30, 0).unwrap();
    let tagged = service
        .tagged_reservations_at(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(), now)
        .await;
    assert_eq!(tagged.len(), 2);
    assert_eq!(tagged[0].reservation.id, "r2");
    assert_eq!(
        tagged[0].tags,
        vec![floor_server::ReservationTag::Upcoming]
    );

    handle.close().await;
}
