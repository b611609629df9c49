// ==========================================
// 公寓出租率统计 - 引擎层
// ==========================================
// 职责: 出租率、营收与极值的纯计算
// 红线: Engine 不拼 SQL，只处理显式传入的租约快照
// ==========================================

pub mod breakdown;
pub mod end_point;
pub mod extrema;
pub mod occupancy;
pub mod period;

// 重导出核心引擎
pub use breakdown::{BreakdownResult, RoomTypeBreakdownEngine};
pub use end_point::{PointInTimeAggregator, PointRoomSets};
pub use extrema::{ExtremaCandidate, ExtremaFinder};
pub use occupancy::{AggregationOptions, OccupancyAggregator, DEFAULT_FALLBACK_TOTAL_ROOMS};
pub use period::{PeriodAggregator, RoomNights};
