// ==========================================
// 公寓出租率统计 - 统计结果模型
// ==========================================
// 职责: 聚合引擎的结构化输出（总体出租率 + 分房型经营表现 + 极值）
// 说明: 文本报表渲染不在本层，这里只保证报表所需字段齐全
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::types::CalcMethod;
use crate::domain::window::AggregationWindow;

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 百分比（分母为 0 时返回 0）
pub fn percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

// ==========================================
// DataQualityWarning - 数据质量告警（非致命）
// ==========================================
// OVER_CAPACITY    : 去重后的占用数超过房间数 -> 截断到 100%
// UNKNOWN_ROOM_TYPE: 租约房型不在目录中 -> 归入未知房型桶
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataQualityKind {
    OverCapacity,
    UnknownRoomType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityWarning {
    pub kind: DataQualityKind,
    pub scope: String, // "ALL" 或房型代码
    pub observed: u64, // 实际统计到的数量
    pub capacity: u64, // 可用上限（未知房型时为 0）
    pub message: String,
}

// ==========================================
// PeriodOccupancy - 期间加权平均计数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodOccupancy {
    pub day_count: i64,
    pub total_room_count: u32,
    pub total_available_room_nights: u64, // 总可用房晚 = 房间数 × 天数
    pub occupied_room_nights: u64,        // 实际入住房晚（按房间逐日去重，已截断）
    pub applied_room_nights: u64,         // 广义占用房晚（含预定，已截断）
    pub observed_occupied_room_nights: u64, // 截断前的去重房晚（ADR/坪效分母）
    pub warning: Option<DataQualityWarning>,
}

impl PeriodOccupancy {
    pub fn occupancy_rate(&self) -> f64 {
        percent(self.occupied_room_nights, self.total_available_room_nights)
    }

    pub fn application_rate(&self) -> f64 {
        percent(self.applied_room_nights, self.total_available_room_nights)
    }
}

// ==========================================
// PointOccupancy - 期末时点计数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOccupancy {
    pub target_date: NaiveDate,
    pub total_room_count: u32, // 分母是房间数，不是房晚数
    pub occupied_rooms: u64,   // 当日在住房间数（已截断）
    pub applied_rooms: u64,    // 在住 ∪ 预定（已截断）
    pub observed_occupied_rooms: u64, // 截断前的在住房间数
    pub warning: Option<DataQualityWarning>,
}

impl PointOccupancy {
    pub fn occupancy_rate(&self) -> f64 {
        percent(self.occupied_rooms, self.total_room_count as u64)
    }

    pub fn application_rate(&self) -> f64 {
        percent(self.applied_rooms, self.total_room_count as u64)
    }
}

// ==========================================
// OccupancyRateReport - 总体出租率报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyRateReport {
    pub mode: CalcMethod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub day_count: i64,
    pub total_room_count: u32,
    pub total_available: u64, // period: 房晚; end_point: 房间
    pub occupied: u64,
    pub applied: u64,
    pub occupancy_rate: f64,   // %，两位小数
    pub application_rate: f64, // %，两位小数
    pub vacancy_rate: f64,     // %，两位小数
}

impl OccupancyRateReport {
    pub fn from_period(window: &AggregationWindow, period: &PeriodOccupancy) -> Self {
        let occupancy_rate = period.occupancy_rate();
        Self {
            mode: CalcMethod::PeriodAvg,
            start_date: window.start_date,
            end_date: window.end_date,
            day_count: period.day_count,
            total_room_count: period.total_room_count,
            total_available: period.total_available_room_nights,
            occupied: period.occupied_room_nights,
            applied: period.applied_room_nights,
            occupancy_rate: round2(occupancy_rate),
            application_rate: round2(period.application_rate()),
            vacancy_rate: round2(100.0 - occupancy_rate),
        }
    }

    pub fn from_point(window: &AggregationWindow, point: &PointOccupancy) -> Self {
        let occupancy_rate = point.occupancy_rate();
        Self {
            mode: CalcMethod::EndPoint,
            start_date: window.start_date,
            end_date: window.end_date,
            day_count: 1,
            total_room_count: point.total_room_count,
            total_available: point.total_room_count as u64,
            occupied: point.occupied_rooms,
            applied: point.applied_rooms,
            occupancy_rate: round2(occupancy_rate),
            application_rate: round2(point.application_rate()),
            vacancy_rate: round2(100.0 - occupancy_rate),
        }
    }
}

// ==========================================
// 分房型指标
// ==========================================

/// 期间指标（period_avg）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    pub occupied_room_nights: u64,
    pub applied_room_nights: u64,
    pub total_available_room_nights: u64,
    pub occupancy_rate: f64,
    pub application_rate: f64,
    pub vacancy_rate: f64,
    pub revenue: f64,       // 期间营收（按合同叠加，不去重）
    pub adr: f64,           // 平均日租金 = 营收 / 去重房晚
    pub avg_yield: f64,     // 平均坪效 (元/m²/日)
}

/// 期末指标（end_point）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndPointMetrics {
    pub target_date: NaiveDate,
    pub occupied_rooms: u64,
    pub applied_rooms: u64,
    pub paid_rooms: u64,       // 期末付费房间数
    pub occupancy_rate: f64,
    pub application_rate: f64,
    pub vacancy_rate: f64,
    pub run_rate_revenue: f64, // 期末在住合同月租合计 (Run Rate)
    pub avg_monthly_rent: f64, // 平均签约月租 = Run Rate / 付费房间数
    pub avg_yield: f64,        // 平均坪效 = 坪效和 / 在住房间数
    pub occupied_area_m2: f64, // 期末在住房间面积合计
}

/// 极值记录（携带房号与合同号）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeRecord {
    pub value: f64,
    pub contract_no: String,
    pub room_number: String,
    pub room_type_code: String,
    pub area_m2: f64,
    pub monthly_rent: f64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
}

/// 月租 / 日租 / 坪效 极值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RentExtrema {
    pub max_monthly_rent: Option<ExtremeRecord>,
    pub min_monthly_rent: Option<ExtremeRecord>,
    pub max_daily_rent: Option<ExtremeRecord>,
    pub min_daily_rent: Option<ExtremeRecord>,
    pub max_rent_per_area: Option<ExtremeRecord>,
    pub min_rent_per_area: Option<ExtremeRecord>,
}

impl RentExtrema {
    pub fn is_empty(&self) -> bool {
        self.max_monthly_rent.is_none()
            && self.max_daily_rent.is_none()
            && self.max_rent_per_area.is_none()
    }
}

/// 单个房型的经营表现
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTypeBreakdown {
    pub code: String,
    pub display_name: String,
    pub area_m2: f64,
    pub room_count: u32,
    pub in_catalog: bool, // false = 未知房型桶
    pub occupancy_rate: f64,   // 当前口径
    pub application_rate: f64, // 当前口径
    pub vacancy_rate: f64,     // 当前口径
    pub period: PeriodMetrics,
    pub end_point: EndPointMetrics,
    pub extrema: RentExtrema,
}

/// 全公寓汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallSummary {
    pub total_revenue: f64,        // 期间总营收
    pub avg_daily_rate: f64,       // 全公寓 ADR
    pub period_avg_yield: f64,     // 期间平均坪效 = 坪效加权和 / 入住房晚
    pub run_rate_revenue: f64,     // 期末月租流水
    pub avg_monthly_rent: f64,     // 全公寓平均签约月租
    pub end_point_avg_yield: f64,  // 期末平均坪效 = 坪效和 / 在住房间数
    pub occupied_area_m2: f64,     // 期末总出租面积
    pub extrema: RentExtrema,      // 全局极值
}

// ==========================================
// OccupancyAnalysis - 一次统计的完整结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyAnalysis {
    pub window: AggregationWindow,
    pub overall: OccupancyRateReport,
    pub room_types: Vec<RoomTypeBreakdown>,
    pub summary: OverallSummary,
    pub warnings: Vec<DataQualityWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn test_percent_zero_denominator() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}
