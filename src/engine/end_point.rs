// ==========================================
// 公寓出租率统计 - 期末时点引擎
// ==========================================
// 口径: 结束日当天的占用房间数 / 总房间数
// 适用: 运营查房、销售看库存
// ==========================================
// 与期间口径的区别: 分母是房间数而不是房晚数，只评估一天
// ==========================================

use crate::domain::report::{DataQualityKind, DataQualityWarning, PointOccupancy};
use crate::domain::tenancy::TenancyInterval;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::instrument;

/// 时点房间划分
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointRoomSets<'a> {
    pub occupied: BTreeSet<&'a str>, // 当日在住
    pub reserved: BTreeSet<&'a str>, // 当日尚未入住的预定
}

impl<'a> PointRoomSets<'a> {
    /// 广义占用 = 在住 ∪ 预定
    pub fn applied_count(&self) -> usize {
        self.occupied.union(&self.reserved).count()
    }
}

// ==========================================
// PointInTimeAggregator - 期末时点引擎
// ==========================================
pub struct PointInTimeAggregator {
    // 无状态引擎
}

impl PointInTimeAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算时点在住/广义占用房间数
    ///
    /// # 参数
    /// - `target_date`: 时点（通常为窗口结束日）
    /// - `intervals`: 租约区间（调用方已按窗口过滤；已离店的租约自然不会命中）
    /// - `total_room_count`: 房间总数
    #[instrument(skip(self, intervals), fields(intervals = intervals.len()))]
    pub fn aggregate(
        &self,
        target_date: NaiveDate,
        intervals: &[TenancyInterval],
        total_room_count: u32,
    ) -> PointOccupancy {
        self.aggregate_scoped(target_date, intervals, total_room_count, "ALL")
    }

    /// 同 `aggregate`，`scope` 用于告警定位
    pub fn aggregate_scoped(
        &self,
        target_date: NaiveDate,
        intervals: &[TenancyInterval],
        total_room_count: u32,
        scope: &str,
    ) -> PointOccupancy {
        let sets = self.partition(target_date, intervals);
        let occupied = sets.occupied.len() as u64;
        let applied = sets.applied_count() as u64;
        let capacity = total_room_count as u64;

        let warning = if occupied > capacity {
            tracing::warn!(
                scope,
                occupied_rooms = occupied,
                applied_rooms = applied,
                total_room_count,
                "时点在住房间数超过房间总数，已截断至 100%"
            );
            Some(DataQualityWarning {
                kind: DataQualityKind::OverCapacity,
                scope: scope.to_string(),
                observed: occupied,
                capacity,
                message: format!(
                    "{} 当日统计到 {} 间在住，超过房间总数 {}，已按 100% 截断",
                    target_date, occupied, total_room_count
                ),
            })
        } else {
            None
        };

        PointOccupancy {
            target_date,
            total_room_count,
            occupied_rooms: occupied.min(capacity),
            applied_rooms: applied.min(capacity),
            observed_occupied_rooms: occupied,
            warning,
        }
    }

    /// 按房间划分在住 / 预定（集合去重）
    pub fn partition<'a>(
        &self,
        target_date: NaiveDate,
        intervals: &'a [TenancyInterval],
    ) -> PointRoomSets<'a> {
        let mut sets = PointRoomSets::default();
        for interval in intervals {
            if interval.overlaps(target_date) {
                sets.occupied.insert(interval.room_number.as_str());
            } else if interval.is_reserved_on(target_date) {
                sets.reserved.insert(interval.room_number.as_str());
            }
        }
        sets
    }
}

impl Default for PointInTimeAggregator {
    fn default() -> Self {
        Self::new()
    }
}
