// ==========================================
// 公寓出租率统计 - 领域模型层
// ==========================================
// 职责: 定义租约区间、房型目录、统计窗口与统计结果
// 红线: 不含数据访问逻辑，不含引擎逻辑
// ==========================================

pub mod import_report;
pub mod report;
pub mod room_type;
pub mod tenancy;
pub mod types;
pub mod window;

// 重导出核心类型
pub use import_report::{DqViolation, ImportReport};
pub use report::{
    DataQualityKind, DataQualityWarning, EndPointMetrics, ExtremeRecord, OccupancyAnalysis,
    OccupancyRateReport, OverallSummary, PeriodMetrics, PeriodOccupancy, PointOccupancy,
    RentExtrema, RoomTypeBreakdown,
};
pub use room_type::{RoomTypeCatalog, RoomTypeMeta, UNKNOWN_ROOM_TYPE_CODE, UNKNOWN_ROOM_TYPE_LABEL};
pub use tenancy::{TenancyInterval, RENT_MONTH_DAYS};
pub use types::{CalcMethod, DqLevel};
pub use window::AggregationWindow;
