// ==========================================
// 公寓出租率统计 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 出租率/营收统计工具（供工具调度层调用）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 租约、房型、统计窗口与结果
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 出租率计算
pub mod engine;

// 导入层 - 合同 CSV
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 对外接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AggregationWindow, CalcMethod, OccupancyAnalysis, RoomTypeCatalog, RoomTypeMeta,
    TenancyInterval,
};

// 引擎
pub use engine::{OccupancyAggregator, PeriodAggregator, PointInTimeAggregator, RoomTypeBreakdownEngine};

// API
pub use api::{ApiError, ApiResult, OccupancyApi, ToolResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "公寓出租率统计";
