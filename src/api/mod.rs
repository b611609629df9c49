// ==========================================
// 公寓出租率统计 - API 层
// ==========================================
// 职责: 对外接口（参数校验、错误转换、工具响应）
// 红线: API 层不写 SQL，不做统计计算
// ==========================================

pub mod error;
pub mod occupancy_api;
pub mod validator;

pub use error::{ApiError, ApiResult};
pub use occupancy_api::{OccupancyApi, ToolResponse};
pub use validator::{parse_calc_method, parse_date_arg, validate_window};
