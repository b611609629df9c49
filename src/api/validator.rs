// ==========================================
// 公寓出租率统计 - 请求参数校验
// ==========================================
// 职责: 日期/口径校验，全部在取数之前完成（fail fast）
// 日期格式: 严格 YYYY-MM-DD
// ==========================================

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::CalcMethod;
use crate::domain::window::AggregationWindow;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// 解析日期参数
pub fn parse_date_arg(field: &str, raw: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| ApiError::InvalidDateFormat {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

/// 解析统计口径；未传或为空时使用默认口径
pub fn parse_calc_method(raw: Option<&str>, default: CalcMethod) -> ApiResult<CalcMethod> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => CalcMethod::parse(s).ok_or_else(|| ApiError::InvalidMode(s.to_string())),
    }
}

/// 校验并构造统计窗口
///
/// # 校验顺序
/// 1. 开始日期格式
/// 2. 结束日期格式
/// 3. 开始日期不晚于结束日期
/// 4. 统计口径
pub fn validate_window(
    start: &str,
    end: &str,
    calc_method: Option<&str>,
    default_method: CalcMethod,
) -> ApiResult<AggregationWindow> {
    let start_date = parse_date_arg("start_date", start)?;
    let end_date = parse_date_arg("end_date", end)?;
    if start_date > end_date {
        return Err(ApiError::InvalidDateRange {
            start: start_date.to_string(),
            end: end_date.to_string(),
        });
    }
    let mode = parse_calc_method(calc_method, default_method)?;

    AggregationWindow::new(start_date, end_date, mode).ok_or_else(|| ApiError::InvalidDateRange {
        start: start_date.to_string(),
        end: end_date.to_string(),
    })
}
