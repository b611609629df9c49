// ==========================================
// 公寓出租率统计 - 分房型经营表现引擎
// ==========================================
// 职责: 按房型同时计算期间/期末两种口径，并计算营收、ADR、坪效与极值
// 输入: 统计窗口 + 租约区间 + 房型目录
// 输出: 每个房型一条 RoomTypeBreakdown + 全公寓汇总
// ==========================================
// 红线:
// - 入住按房间逐日去重；营收按合同叠加（两人合住就付两份钱）
// - ADR / 坪效的分母是去重后的入住房晚，不是合同天数之和
// - 目录中不存在的房型不丢弃，归入未知房型桶
// ==========================================

use crate::domain::report::{
    round2, DataQualityKind, DataQualityWarning, EndPointMetrics, OverallSummary, PeriodMetrics,
    PeriodOccupancy, PointOccupancy, RoomTypeBreakdown,
};
use crate::domain::room_type::{RoomTypeCatalog, UNKNOWN_ROOM_TYPE_CODE, UNKNOWN_ROOM_TYPE_LABEL};
use crate::domain::tenancy::TenancyInterval;
use crate::domain::types::CalcMethod;
use crate::domain::window::AggregationWindow;
use crate::engine::end_point::PointInTimeAggregator;
use crate::engine::extrema::{ExtremaCandidate, ExtremaFinder};
use crate::engine::period::PeriodAggregator;
use std::collections::{BTreeMap, BTreeSet};
use tracing::instrument;

/// 分房型计算结果
#[derive(Debug, Clone)]
pub struct BreakdownResult {
    pub room_types: Vec<RoomTypeBreakdown>,
    pub summary: OverallSummary,
    pub warnings: Vec<DataQualityWarning>,
    /// 未知房型桶中实际出现的房间数（无未知房型时为 0）
    pub unknown_room_count: u32,
}

/// 单房型的未取整累加值（用于汇总，避免先取整再相加的误差）
#[derive(Debug, Clone, Copy, Default)]
struct RawTotals {
    revenue: f64,
    occupied_room_nights: u64, // 截断后的入住房晚（ADR 分母）
    observed_room_nights: u64, // 未截断的入住房晚（坪效分母）
    weighted_yield_sum: f64,
    run_rate_revenue: f64,
    paid_rooms: u64,
    occupied_rooms: u64,
    end_yield_sum: f64,
    occupied_area_m2: f64,
}

/// 单房型的计算上下文
struct TypeScope<'a> {
    code: &'a str,
    display_name: &'a str,
    area_m2: f64,
    room_count: u32,
    in_catalog: bool,
}

// ==========================================
// RoomTypeBreakdownEngine - 分房型经营表现引擎
// ==========================================
pub struct RoomTypeBreakdownEngine {
    period: PeriodAggregator,
    point: PointInTimeAggregator,
    extrema: ExtremaFinder,
    unknown_label: String,
}

impl RoomTypeBreakdownEngine {
    pub fn new() -> Self {
        Self::with_unknown_label(UNKNOWN_ROOM_TYPE_LABEL)
    }

    /// 指定未知房型桶的展示名
    pub fn with_unknown_label(label: &str) -> Self {
        Self {
            period: PeriodAggregator::new(),
            point: PointInTimeAggregator::new(),
            extrema: ExtremaFinder::new(),
            unknown_label: label.to_string(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 按房型拆分并计算
    ///
    /// 输出顺序: 目录内房型按代码升序，未知房型桶（如有）排在最后。
    /// 目录内没有任何租约的房型同样输出（入住为 0）。
    #[instrument(skip(self, intervals, catalog), fields(
        start = %window.start_date,
        end = %window.end_date,
        mode = %window.mode,
        intervals = intervals.len(),
        room_types = catalog.len()
    ))]
    pub fn breakdown(
        &self,
        window: &AggregationWindow,
        intervals: &[TenancyInterval],
        catalog: &RoomTypeCatalog,
    ) -> BreakdownResult {
        let mut grouped: BTreeMap<&str, Vec<TenancyInterval>> = BTreeMap::new();
        let mut unknown: Vec<TenancyInterval> = Vec::new();
        for interval in intervals.iter().filter(|i| window.admits(i)) {
            if catalog.contains(&interval.room_type_code) {
                grouped
                    .entry(interval.room_type_code.as_str())
                    .or_default()
                    .push(interval.clone());
            } else {
                unknown.push(interval.clone());
            }
        }

        let mut room_types = Vec::with_capacity(catalog.len() + 1);
        let mut warnings = Vec::new();
        let mut totals = RawTotals::default();
        let mut all_candidates: Vec<ExtremaCandidate> = Vec::new();
        let mut unknown_room_count = 0;

        for meta in catalog.iter() {
            let type_intervals = grouped.remove(meta.code.as_str()).unwrap_or_default();
            let scope = TypeScope {
                code: &meta.code,
                display_name: &meta.display_name,
                area_m2: meta.area_m2,
                room_count: meta.room_count,
                in_catalog: true,
            };
            let (breakdown, raw) =
                self.compute_type(window, &scope, &type_intervals, &mut warnings);
            accumulate(&mut totals, &raw);
            room_types.push(breakdown);
        }

        if !unknown.is_empty() {
            let distinct_rooms: BTreeSet<&str> =
                unknown.iter().map(|i| i.room_number.as_str()).collect();
            let codes: BTreeSet<&str> = unknown.iter().map(|i| i.room_type_code.as_str()).collect();
            tracing::warn!(
                contracts = unknown.len(),
                rooms = distinct_rooms.len(),
                codes = ?codes,
                "租约房型不在房型目录中，归入未知房型"
            );
            warnings.push(DataQualityWarning {
                kind: DataQualityKind::UnknownRoomType,
                scope: UNKNOWN_ROOM_TYPE_CODE.to_string(),
                observed: unknown.len() as u64,
                capacity: 0,
                message: format!(
                    "{} 条租约（{} 间房）的房型 {:?} 不在目录中，已归入{}",
                    unknown.len(),
                    distinct_rooms.len(),
                    codes,
                    self.unknown_label
                ),
            });

            // 未知房型没有目录口径，房间数取实际出现的房间数
            unknown_room_count = distinct_rooms.len() as u32;
            let scope = TypeScope {
                code: UNKNOWN_ROOM_TYPE_CODE,
                display_name: &self.unknown_label,
                area_m2: 0.0,
                room_count: unknown_room_count,
                in_catalog: false,
            };
            let (breakdown, raw) = self.compute_type(window, &scope, &unknown, &mut warnings);
            accumulate(&mut totals, &raw);
            room_types.push(breakdown);
        }

        // 全局极值: 与分房型使用同一套候选规则
        for interval in intervals.iter().filter(|i| window.admits(i)) {
            if interval.overlap_days(window) > 0 {
                all_candidates.push(ExtremaCandidate::new(
                    interval,
                    catalog.area_of(&interval.room_type_code),
                ));
            }
        }

        let summary = OverallSummary {
            total_revenue: round2(totals.revenue),
            avg_daily_rate: round2(ratio(totals.revenue, totals.occupied_room_nights)),
            period_avg_yield: round2(ratio(totals.weighted_yield_sum, totals.observed_room_nights)),
            run_rate_revenue: round2(totals.run_rate_revenue),
            avg_monthly_rent: round2(ratio(totals.run_rate_revenue, totals.paid_rooms)),
            end_point_avg_yield: round2(ratio(totals.end_yield_sum, totals.occupied_rooms)),
            occupied_area_m2: round2(totals.occupied_area_m2),
            extrema: self.extrema.find(all_candidates),
        };

        BreakdownResult {
            room_types,
            summary,
            warnings,
            unknown_room_count,
        }
    }

    /// 计算单个房型
    fn compute_type(
        &self,
        window: &AggregationWindow,
        scope: &TypeScope,
        intervals: &[TenancyInterval],
        warnings: &mut Vec<DataQualityWarning>,
    ) -> (RoomTypeBreakdown, RawTotals) {
        let period_occ =
            self.period
                .aggregate_scoped(window, intervals, scope.room_count, scope.code);
        let point_occ = self.point.aggregate_scoped(
            window.target_date(),
            intervals,
            scope.room_count,
            scope.code,
        );
        warnings.extend(period_occ.warning.clone());
        warnings.extend(point_occ.warning.clone());

        // ----- 期间: 营收与坪效（按合同叠加） -----
        let mut revenue = 0.0;
        let mut weighted_yield_sum = 0.0;
        let mut candidates = Vec::new();
        for interval in intervals.iter().filter(|i| window.admits(i)) {
            let overlap_days = interval.overlap_days(window);
            if overlap_days <= 0 {
                continue;
            }
            revenue += interval.daily_rent() * overlap_days as f64;
            if let Some(per_area) = interval.rent_per_area(scope.area_m2) {
                weighted_yield_sum += per_area * overlap_days as f64;
            }
            candidates.push(ExtremaCandidate::new(interval, scope.area_m2));
        }

        // ----- 期末: 在住合同的月租流水与坪效 -----
        let target = window.target_date();
        let mut paid_rooms: BTreeSet<&str> = BTreeSet::new();
        let mut run_rate_revenue = 0.0;
        let mut end_yield_sum = 0.0;
        for interval in intervals.iter().filter(|i| i.overlaps(target)) {
            if interval.is_paid() {
                paid_rooms.insert(interval.room_number.as_str());
                run_rate_revenue += interval.monthly_rent;
                end_yield_sum += interval.rent_per_area(scope.area_m2).unwrap_or(0.0);
            }
        }

        let occupied_area_m2 = scope.area_m2 * point_occ.observed_occupied_rooms as f64;
        let period = period_metrics(&period_occ, revenue, weighted_yield_sum);
        let end_point = end_point_metrics(
            &point_occ,
            occupied_area_m2,
            paid_rooms.len() as u64,
            run_rate_revenue,
            end_yield_sum,
        );

        let (occupancy_rate, application_rate, vacancy_rate) = match window.mode {
            CalcMethod::PeriodAvg => (period.occupancy_rate, period.application_rate, period.vacancy_rate),
            CalcMethod::EndPoint => (
                end_point.occupancy_rate,
                end_point.application_rate,
                end_point.vacancy_rate,
            ),
        };

        let breakdown = RoomTypeBreakdown {
            code: scope.code.to_string(),
            display_name: scope.display_name.to_string(),
            area_m2: scope.area_m2,
            room_count: scope.room_count,
            in_catalog: scope.in_catalog,
            occupancy_rate,
            application_rate,
            vacancy_rate,
            period,
            end_point,
            extrema: self.extrema.find(candidates),
        };

        // 汇总 ADR 的分母用截断后的房晚
        let raw = RawTotals {
            revenue,
            occupied_room_nights: period_occ.occupied_room_nights,
            observed_room_nights: period_occ.observed_occupied_room_nights,
            weighted_yield_sum,
            run_rate_revenue,
            paid_rooms: paid_rooms.len() as u64,
            occupied_rooms: point_occ.observed_occupied_rooms,
            end_yield_sum,
            occupied_area_m2,
        };

        (breakdown, raw)
    }
}

impl Default for RoomTypeBreakdownEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn accumulate(totals: &mut RawTotals, raw: &RawTotals) {
    totals.revenue += raw.revenue;
    totals.occupied_room_nights += raw.occupied_room_nights;
    totals.observed_room_nights += raw.observed_room_nights;
    totals.weighted_yield_sum += raw.weighted_yield_sum;
    totals.run_rate_revenue += raw.run_rate_revenue;
    totals.paid_rooms += raw.paid_rooms;
    totals.occupied_rooms += raw.occupied_rooms;
    totals.end_yield_sum += raw.end_yield_sum;
    totals.occupied_area_m2 += raw.occupied_area_m2;
}

fn ratio(numerator: f64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

fn period_metrics(occ: &PeriodOccupancy, revenue: f64, weighted_yield_sum: f64) -> PeriodMetrics {
    let occupancy_rate = occ.occupancy_rate();
    let nights = occ.observed_occupied_room_nights;
    PeriodMetrics {
        occupied_room_nights: occ.occupied_room_nights,
        applied_room_nights: occ.applied_room_nights,
        total_available_room_nights: occ.total_available_room_nights,
        occupancy_rate: round2(occupancy_rate),
        application_rate: round2(occ.application_rate()),
        vacancy_rate: round2(100.0 - occupancy_rate),
        revenue: round2(revenue),
        adr: round2(ratio(revenue, nights)),
        avg_yield: round2(ratio(weighted_yield_sum, nights)),
    }
}

fn end_point_metrics(
    occ: &PointOccupancy,
    occupied_area_m2: f64,
    paid_rooms: u64,
    run_rate_revenue: f64,
    yield_sum: f64,
) -> EndPointMetrics {
    let occupancy_rate = occ.occupancy_rate();
    EndPointMetrics {
        target_date: occ.target_date,
        occupied_rooms: occ.occupied_rooms,
        applied_rooms: occ.applied_rooms,
        paid_rooms,
        occupancy_rate: round2(occupancy_rate),
        application_rate: round2(occ.application_rate()),
        vacancy_rate: round2(100.0 - occupancy_rate),
        run_rate_revenue: round2(run_rate_revenue),
        avg_monthly_rent: round2(ratio(run_rate_revenue, paid_rooms)),
        // 坪效按在住房间平均，空房不进分母
        avg_yield: round2(ratio(yield_sum, occ.observed_occupied_rooms)),
        occupied_area_m2: round2(occupied_area_m2),
    }
}
