// ==========================================
// 公寓出租率统计 - 出租率总控
// ==========================================
// 职责: 一次统计调用的入口，串联总体出租率与分房型拆分
// 流程: 窗口过滤 -> 分房型计算 -> 确定总房间数 -> 总体口径计算 -> 合并告警
// ==========================================
// 红线: 只接受显式传入的租约快照，不读取任何全局状态
// ==========================================

use crate::domain::report::{OccupancyAnalysis, OccupancyRateReport};
use crate::domain::room_type::{RoomTypeCatalog, UNKNOWN_ROOM_TYPE_LABEL};
use crate::domain::tenancy::TenancyInterval;
use crate::domain::types::CalcMethod;
use crate::domain::window::AggregationWindow;
use crate::engine::breakdown::RoomTypeBreakdownEngine;
use crate::engine::end_point::PointInTimeAggregator;
use crate::engine::period::PeriodAggregator;
use tracing::instrument;

/// 房型目录为空时使用的默认房间总数
pub const DEFAULT_FALLBACK_TOTAL_ROOMS: u32 = 579;

/// 统计选项
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationOptions {
    /// 目录为空时的房间总数
    pub fallback_total_rooms: u32,
    /// 未知房型桶展示名
    pub unknown_room_type_label: String,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            fallback_total_rooms: DEFAULT_FALLBACK_TOTAL_ROOMS,
            unknown_room_type_label: UNKNOWN_ROOM_TYPE_LABEL.to_string(),
        }
    }
}

// ==========================================
// OccupancyAggregator - 出租率总控
// ==========================================
pub struct OccupancyAggregator {
    period: PeriodAggregator,
    point: PointInTimeAggregator,
    breakdown: RoomTypeBreakdownEngine,
    options: AggregationOptions,
}

impl OccupancyAggregator {
    pub fn new() -> Self {
        Self::with_options(AggregationOptions::default())
    }

    pub fn with_options(options: AggregationOptions) -> Self {
        Self {
            period: PeriodAggregator::new(),
            point: PointInTimeAggregator::new(),
            breakdown: RoomTypeBreakdownEngine::with_unknown_label(
                &options.unknown_room_type_label,
            ),
            options,
        }
    }

    /// 总体口径使用的房间总数
    ///
    /// 目录非空时取目录合计加未知房型桶的房间数，否则取配置的兜底值
    pub fn total_room_count(&self, catalog: &RoomTypeCatalog, unknown_rooms: u32) -> u32 {
        if catalog.is_empty() {
            tracing::warn!(
                fallback_total_rooms = self.options.fallback_total_rooms,
                "房型目录为空，使用默认房间总数"
            );
            self.options.fallback_total_rooms
        } else {
            catalog.total_room_count() + unknown_rooms
        }
    }

    /// 执行一次完整统计
    ///
    /// # 参数
    /// - `window`: 统计窗口（mode 决定总体口径与分房型“当前口径”）
    /// - `intervals`: 租约快照（可包含窗口外的租约，此处按窗口过滤）
    /// - `catalog`: 房型目录
    ///
    /// # 返回
    /// OccupancyAnalysis（总体报告 + 分房型 + 汇总 + 数据质量告警）
    #[instrument(skip(self, intervals, catalog), fields(
        start = %window.start_date,
        end = %window.end_date,
        mode = %window.mode,
        intervals = intervals.len()
    ))]
    pub fn analyze(
        &self,
        window: &AggregationWindow,
        intervals: &[TenancyInterval],
        catalog: &RoomTypeCatalog,
    ) -> OccupancyAnalysis {
        let admitted: Vec<TenancyInterval> = intervals
            .iter()
            .filter(|i| window.admits(i))
            .cloned()
            .collect();
        if admitted.len() < intervals.len() {
            tracing::debug!(
                dropped = intervals.len() - admitted.len(),
                "窗口外租约已过滤"
            );
        }

        let breakdown = self.breakdown.breakdown(window, &admitted, catalog);
        let total_rooms = self.total_room_count(catalog, breakdown.unknown_room_count);

        let mut warnings = Vec::new();
        let overall = match window.mode {
            CalcMethod::PeriodAvg => {
                let occ = self.period.aggregate(window, &admitted, total_rooms);
                warnings.extend(occ.warning.clone());
                OccupancyRateReport::from_period(window, &occ)
            }
            CalcMethod::EndPoint => {
                let occ = self
                    .point
                    .aggregate(window.target_date(), &admitted, total_rooms);
                warnings.extend(occ.warning.clone());
                OccupancyRateReport::from_point(window, &occ)
            }
        };

        warnings.extend(breakdown.warnings);

        tracing::info!(
            occupancy_rate = overall.occupancy_rate,
            application_rate = overall.application_rate,
            room_types = breakdown.room_types.len(),
            warnings = warnings.len(),
            "出租率统计完成"
        );

        OccupancyAnalysis {
            window: *window,
            overall,
            room_types: breakdown.room_types,
            summary: breakdown.summary,
            warnings,
        }
    }
}

impl Default for OccupancyAggregator {
    fn default() -> Self {
        Self::new()
    }
}
