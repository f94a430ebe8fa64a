//! FloorService - 存储的异步外壳
//!
//! # 事件流
//!
//! ```text
//! open_scope(scope)
//!     │  初始 load_all
//!     ▼
//! ┌─────────────── scope worker (单任务串行) ───────────────┐
//! │  select! {                                              │
//! │      feed event   ──▶ store.apply_event                 │
//! │      resync tick  ──▶ 距上次全量加载 > threshold 才重拉 │
//! │      cancelled    ──▶ 退出，不再触碰集合                │
//! │  }                                                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! 三路变更都在同一个任务里应用，集合上没有跨任务交错；
//! 读侧拿快照，容忍短暂陈旧。

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use shared::message::{FeedEvent, FloorNotice};
use shared::models::Reservation;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::FloorStore;
use crate::assign::{self, AssignmentCheck};
use crate::core::FloorConfig;
use crate::datasource::{FloorDataSource, FloorScope};
use crate::derive::{self, CompositeTableState, TaggedReservation};
use crate::export;
use crate::timeline::{self, TimelineLayout};
use crate::utils::{FloorResult, time};

/// 楼面状态服务
///
/// 浅拷贝共享（Arc 字段），可安全跨任务克隆。
#[derive(Clone)]
pub struct FloorService {
    config: FloorConfig,
    source: Arc<dyn FloorDataSource>,
    store: Arc<RwLock<FloorStore>>,
    notices: broadcast::Sender<FloorNotice>,
    /// 上一次成功全量加载的时刻（resync 频率门限）
    last_loaded: Arc<Mutex<Option<Instant>>>,
}

/// scope 订阅句柄
///
/// 显式资源句柄：进入 scope 时获取，退出/切换 scope 时释放。
/// Drop 兜底取消，保证任何退出路径都不会留下活订阅。
pub struct ScopeHandle {
    scope: FloorScope,
    token: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl ScopeHandle {
    pub fn scope(&self) -> &FloorScope {
        &self.scope
    }

    /// 关闭订阅并等待 worker 退出
    pub async fn close(mut self) {
        self.token.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}

impl Drop for ScopeHandle {
    fn drop(&mut self) {
        // 未显式 close 时兜底取消；过期 scope 的订阅
        // 绝不允许继续改写当前集合
        self.token.cancel();
    }
}

impl FloorService {
    pub fn new(config: FloorConfig, source: Arc<dyn FloorDataSource>) -> Self {
        let (notices, _) = broadcast::channel(config.feed_capacity);
        Self {
            config,
            source,
            store: Arc::new(RwLock::new(FloorStore::new())),
            notices,
            last_loaded: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &FloorConfig {
        &self.config
    }

    /// 订阅降级通知（resync 失败等瞬态提示）
    pub fn subscribe_notices(&self) -> broadcast::Receiver<FloorNotice> {
        self.notices.subscribe()
    }

    // ========================================================================
    // Load / resync
    // ========================================================================

    /// 全量加载 scope 内的三个集合
    ///
    /// 三路查询全部成功才提交替换；任一失败保留 last-known-good
    /// 状态，发一条可忽略的警告通知。
    pub async fn load_all(&self, scope: &FloorScope) -> FloorResult<()> {
        let loaded = async {
            let tables = self.source.fetch_tables(scope).await?;
            let orders = self.source.fetch_active_orders(scope).await?;
            let reservations = self.source.fetch_reservations(scope).await?;
            Ok::<_, crate::utils::FloorError>((tables, orders, reservations))
        }
        .await;

        match loaded {
            Ok((tables, orders, reservations)) => {
                tracing::debug!(
                    restaurant = %scope.restaurant_id,
                    date = %scope.date,
                    tables = tables.len(),
                    orders = orders.len(),
                    reservations = reservations.len(),
                    "Full load committed"
                );
                self.store
                    .write()
                    .await
                    .replace_all(tables, orders, reservations);
                *self.last_loaded.lock().await = Some(Instant::now());
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    restaurant = %scope.restaurant_id,
                    error = %e,
                    "Full load failed, keeping last-known-good state"
                );
                let _ = self.notices.send(FloorNotice::warning(
                    "Sync failed",
                    format!("Could not refresh floor data: {}", e),
                ));
                Err(e)
            }
        }
    }

    // ========================================================================
    // Scope lifecycle
    // ========================================================================

    /// 进入 scope：初始加载 + 推送订阅 + resync 定时器
    ///
    /// 初始加载失败不阻止打开（通知已发出，resync 会自愈），
    /// 引擎以空集合起步。切换 scope 前必须 close 旧句柄。
    pub async fn open_scope(&self, scope: FloorScope) -> ScopeHandle {
        if self.load_all(&scope).await.is_err() {
            tracing::warn!(
                restaurant = %scope.restaurant_id,
                "Initial load failed, starting empty until resync heals"
            );
        }

        let feed_rx = self.source.subscribe_feed(&scope);
        let token = CancellationToken::new();
        let worker = tokio::spawn(Self::run_scope_worker(
            self.clone(),
            scope.clone(),
            feed_rx,
            token.clone(),
        ));

        tracing::info!(
            restaurant = %scope.restaurant_id,
            date = %scope.date,
            "Scope opened"
        );

        ScopeHandle {
            scope,
            token,
            worker: Some(worker),
        }
    }

    /// scope worker 主循环：唯一的集合变更入口
    async fn run_scope_worker(
        service: FloorService,
        scope: FloorScope,
        feed_rx: broadcast::Receiver<FeedEvent>,
        token: CancellationToken,
    ) {
        let mut feed_rx = Some(feed_rx);
        let mut ticker =
            tokio::time::interval(Duration::from_millis(service.config.resync_interval_ms));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // 首个 tick 立即返回，跳过（打开时已做过初始加载）
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(restaurant = %scope.restaurant_id, "Scope worker stopping");
                    break;
                }
                event = recv_or_pending(&mut feed_rx) => {
                    match event {
                        Ok(event) => {
                            let applied = service.store.write().await.apply_event(&event);
                            tracing::debug!(
                                event_id = %event.event_id,
                                entity = %event.entity,
                                action = %event.action,
                                applied,
                                "Feed event processed"
                            );
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            // 丢了 n 条；无序 at-most-once 本就可能丢，
                            // 下一次 resync 自愈
                            tracing::warn!(skipped = n, "Feed lagged, resync will heal");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::warn!(
                                restaurant = %scope.restaurant_id,
                                "Feed closed, continuing on resync only"
                            );
                            feed_rx = None;
                        }
                    }
                }
                _ = ticker.tick() => {
                    service.resync_if_stale(&scope).await;
                }
            }
        }
    }

    /// 距上次成功全量加载超过门限才重拉，避免与在途事件互搏
    async fn resync_if_stale(&self, scope: &FloorScope) {
        let threshold = Duration::from_millis(self.config.resync_threshold_ms);
        let stale = {
            let last = self.last_loaded.lock().await;
            match *last {
                Some(at) => at.elapsed() > threshold,
                None => true,
            }
        };

        if !stale {
            tracing::trace!("Resync tick skipped, last load within threshold");
            return;
        }

        // 失败已在 load_all 内记日志并发通知
        let _ = self.load_all(scope).await;
    }

    // ========================================================================
    // Derived read API
    // ========================================================================

    /// 单桌复合状态
    pub async fn composite_state(&self, table_id: &str) -> Option<CompositeTableState> {
        self.composite_state_at(table_id, Utc::now()).await
    }

    /// 单桌复合状态（注入 now，测试用）
    pub async fn composite_state_at(
        &self,
        table_id: &str,
        now: DateTime<Utc>,
    ) -> Option<CompositeTableState> {
        let store = self.store.read().await;
        let table = store.table(table_id)?.clone();
        let orders = store.active_orders_for_table(table_id);
        let reservations = store.reservations_for_table(table_id);
        Some(derive::derive_composite(
            &table,
            &orders,
            &reservations,
            now,
            &self.config.policy,
        ))
    }

    /// 全部桌台的复合状态，按桌号排序（楼面看板）
    pub async fn composite_states(&self) -> Vec<CompositeTableState> {
        self.composite_states_at(Utc::now()).await
    }

    pub async fn composite_states_at(&self, now: DateTime<Utc>) -> Vec<CompositeTableState> {
        let store = self.store.read().await;
        store
            .tables_sorted()
            .into_iter()
            .map(|table| {
                let orders = store.active_orders_for_table(&table.id);
                let reservations = store.reservations_for_table(&table.id);
                derive::derive_composite(&table, &orders, &reservations, now, &self.config.policy)
            })
            .collect()
    }

    /// 某日预订 + 时间标签（列表视图）
    pub async fn tagged_reservations(&self, date: NaiveDate) -> Vec<TaggedReservation> {
        self.tagged_reservations_at(date, Utc::now()).await
    }

    pub async fn tagged_reservations_at(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Vec<TaggedReservation> {
        let mut reservations = self.reservations_on(date).await;
        reservations.sort_by(|a, b| {
            a.reservation_time
                .cmp(&b.reservation_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        reservations
            .into_iter()
            .map(|r| {
                let tags = derive::classify_reservation(&r, now, &self.config.policy);
                TaggedReservation {
                    reservation: r,
                    tags,
                }
            })
            .collect()
    }

    /// 某日时间轴布局
    pub async fn timeline_layout(&self, date: NaiveDate) -> TimelineLayout {
        let reservations = self.reservations_on(date).await;
        timeline::layout_timeline(&reservations, date, &self.config)
    }

    /// 分配校验：预订能否落到候选桌台
    ///
    /// 任一实体不存在返回 None；校验本身永不报错，
    /// block/warn 策略归调用方。
    pub async fn check_assignment(
        &self,
        reservation_id: &str,
        table_id: &str,
    ) -> Option<AssignmentCheck> {
        self.check_assignment_at(reservation_id, table_id, Utc::now())
            .await
    }

    pub async fn check_assignment_at(
        &self,
        reservation_id: &str,
        table_id: &str,
        now: DateTime<Utc>,
    ) -> Option<AssignmentCheck> {
        let reservation = {
            let store = self.store.read().await;
            store.reservation(reservation_id)?.clone()
        };
        let composite = self.composite_state_at(table_id, now).await?;
        Some(assign::check_assignment(
            &composite.table,
            composite.status_display,
            &reservation,
        ))
    }

    /// 每日预订 CSV 汇总（全部已加载预订，按业务时区分日）
    pub async fn daily_summary_csv(&self) -> String {
        let store = self.store.read().await;
        export::daily_summary_csv(&store.reservations(), self.config.timezone)
    }

    /// 某日（业务时区）的预订，取消的不进视图
    async fn reservations_on(&self, date: NaiveDate) -> Vec<Reservation> {
        let store = self.store.read().await;
        store
            .reservations()
            .into_iter()
            .filter(|r| {
                r.status != shared::models::ReservationStatus::Cancelled
                    && time::local_date(r.reservation_time, self.config.timezone) == date
            })
            .collect()
    }
}

/// 通道已关闭时挂起，避免 select 忙转
async fn recv_or_pending(
    rx: &mut Option<broadcast::Receiver<FeedEvent>>,
) -> Result<FeedEvent, broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
