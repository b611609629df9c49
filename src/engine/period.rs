// ==========================================
// 公寓出租率统计 - 期间加权平均引擎
// ==========================================
// 口径: ∑(每天的占用房间数) / (总房间数 × 天数)
// 适用: 财务报表、经营分析
// ==========================================
// 红线: 按物理房间逐日去重，同一房间同一天无论几条租约只计 1 房晚
// ==========================================

use crate::domain::report::{DataQualityKind, DataQualityWarning, PeriodOccupancy};
use crate::domain::tenancy::TenancyInterval;
use crate::domain::window::AggregationWindow;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use tracing::instrument;

/// 单个房间在窗口内的房晚计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoomNights {
    pub occupied: u64,
    pub applied: u64,
}

// ==========================================
// PeriodAggregator - 期间加权平均引擎
// ==========================================
pub struct PeriodAggregator {
    // 无状态引擎
}

impl PeriodAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算期间入住/广义占用房晚
    ///
    /// # 参数
    /// - `window`: 统计窗口（end_date 含当天）
    /// - `intervals`: 租约区间（会按窗口过滤条件再筛一次）
    /// - `total_room_count`: 房间总数（可用房晚分母）
    ///
    /// # 返回
    /// PeriodOccupancy；占用房晚超过可用房晚时截断并附带告警
    #[instrument(skip(self, intervals), fields(
        start = %window.start_date,
        end = %window.end_date,
        intervals = intervals.len()
    ))]
    pub fn aggregate(
        &self,
        window: &AggregationWindow,
        intervals: &[TenancyInterval],
        total_room_count: u32,
    ) -> PeriodOccupancy {
        self.aggregate_scoped(window, intervals, total_room_count, "ALL")
    }

    /// 同 `aggregate`，`scope` 用于告警定位（"ALL" 或房型代码）
    pub fn aggregate_scoped(
        &self,
        window: &AggregationWindow,
        intervals: &[TenancyInterval],
        total_room_count: u32,
        scope: &str,
    ) -> PeriodOccupancy {
        let day_count = window.day_count();
        let total_available = total_room_count as u64 * day_count as u64;

        let mut occupied: u64 = 0;
        let mut applied: u64 = 0;
        for (_room, nights) in self.room_nights(window, intervals) {
            occupied += nights.occupied;
            applied += nights.applied;
        }

        // 告警只看实际入住；广义占用超限时静默截断
        let warning = if occupied > total_available {
            tracing::warn!(
                scope,
                occupied_room_nights = occupied,
                applied_room_nights = applied,
                total_available_room_nights = total_available,
                "去重后的房晚数超过可用房晚，已截断至 100%"
            );
            Some(DataQualityWarning {
                kind: DataQualityKind::OverCapacity,
                scope: scope.to_string(),
                observed: occupied,
                capacity: total_available,
                message: format!(
                    "统计到 {} 入住房晚，超过可用房晚 {}（房间数 {} × {} 天），已按 100% 截断",
                    occupied, total_available, total_room_count, day_count
                ),
            })
        } else {
            None
        };

        PeriodOccupancy {
            day_count,
            total_room_count,
            total_available_room_nights: total_available,
            occupied_room_nights: occupied.min(total_available),
            applied_room_nights: applied.min(total_available),
            observed_occupied_room_nights: occupied,
            warning,
        }
    }

    /// 按房间计算去重后的房晚
    ///
    /// - occupied: 该房间被任一租约覆盖的不同日期数
    /// - applied : occupied ∪ 该房间尚有未来入住租约（check_in > day）的日期
    pub fn room_nights<'a>(
        &self,
        window: &AggregationWindow,
        intervals: &'a [TenancyInterval],
    ) -> BTreeMap<&'a str, RoomNights> {
        let mut by_room: BTreeMap<&'a str, Vec<&'a TenancyInterval>> = BTreeMap::new();
        for interval in intervals.iter().filter(|i| window.admits(i)) {
            by_room
                .entry(interval.room_number.as_str())
                .or_default()
                .push(interval);
        }

        let mut result = BTreeMap::new();
        for (room, room_intervals) in by_room {
            let occupied_dates: HashSet<NaiveDate> = room_intervals
                .iter()
                .flat_map(|i| i.overlap_dates(window))
                .collect();

            // 最晚的入住日之前的每一天，该房间都至少有一条预定
            let latest_check_in = room_intervals.iter().map(|i| i.check_in_date).max();
            let reserved_only = match latest_check_in {
                Some(latest) => window
                    .days()
                    .filter(|day| *day < latest && !occupied_dates.contains(day))
                    .count() as u64,
                None => 0,
            };

            let occupied = occupied_dates.len() as u64;
            result.insert(
                room,
                RoomNights {
                    occupied,
                    applied: occupied + reserved_only,
                },
            );
        }
        result
    }
}

impl Default for PeriodAggregator {
    fn default() -> Self {
        Self::new()
    }
}
