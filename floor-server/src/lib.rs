//! Floor Server - 实时桌台与预订状态引擎
//!
//! # 架构概述
//!
//! 本模块维护楼面看板所需的本地实体视图，并在其上提供纯函数派生：
//!
//! - **实体存储** (`store`): 桌台/订单/预订三个权威集合的本地对账
//! - **状态派生** (`derive`): 桌台复合占用状态 + 预订时间标签
//! - **时间轴** (`timeline`): 贪心区间排布（泳道布局）
//! - **分配校验** (`assign`): 桌台可分配性与容量判定
//! - **汇总导出** (`export`): 每日预订 CSV 汇总
//!
//! # 模块结构
//!
//! ```text
//! floor-server/src/
//! ├── core/          # 配置、策略常量
//! ├── datasource/    # 批量查询 + 推送订阅契约
//! ├── store/         # 实体存储与对账 worker
//! ├── derive/        # 复合状态派生、时间标签
//! ├── timeline/      # 泳道布局引擎
//! ├── assign/        # 容量/分配校验
//! ├── export/        # CSV 汇总
//! └── utils/         # 错误、时间、日志工具
//! ```
//!
//! # 一致性模型
//!
//! 推送通道 at-most-once 且无序；所有变更（批量加载、推送事件、
//! 周期 resync）汇入单个 worker 任务串行应用，幂等 upsert/delete
//! 保证乱序到达收敛到相同状态。

pub mod assign;
pub mod core;
pub mod datasource;
pub mod derive;
pub mod export;
pub mod store;
pub mod timeline;
pub mod utils;

// Re-export 公共类型
pub use assign::AssignmentCheck;
pub use crate::core::{DerivePolicy, FloorConfig};
pub use datasource::{FloorDataSource, FloorScope, MemoryDataSource};
pub use derive::{CompositeTableState, ReservationTag, TableAlert, TaggedReservation};
pub use store::{FloorService, FloorStore, ScopeHandle};
pub use timeline::{TimelineItem, TimelineLayout};
pub use utils::{FloorError, FloorResult};

// Re-export logger functions
pub use utils::logger::init_logger;
