// ==========================================
// 公寓出租率统计 - 租约区间领域模型
// ==========================================
// 职责: 一条租约 = 房间 + 房型 + 半开区间 [check_in, check_out)
// 约定: 日租金 = 月租金 / 30（固定 30 天口径，与历史报表一致，不按自然月天数）
// 红线: 离店日不算住
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::window::AggregationWindow;

/// 月租折算日租的固定天数
pub const RENT_MONTH_DAYS: f64 = 30.0;

// ==========================================
// TenancyInterval - 租约区间
// ==========================================
// 同一房间允许多条重叠租约（家庭合住 / 重复合同记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenancyInterval {
    pub contract_no: String,      // 合同号
    pub room_number: String,      // 物理房号
    pub room_type_code: String,   // 房型代码
    pub check_in_date: NaiveDate, // 入住日（含）
    pub check_out_date: NaiveDate, // 离店日（不含）
    pub monthly_rent: f64,        // 签约月租金（无计费时为 0）
}

impl TenancyInterval {
    /// 区间是否有效（check_in < check_out）
    pub fn is_valid(&self) -> bool {
        self.check_in_date < self.check_out_date
    }

    /// 日租金（月租 / 30）
    pub fn daily_rent(&self) -> f64 {
        self.monthly_rent / RENT_MONTH_DAYS
    }

    /// 坪效（日租金 / 面积）
    ///
    /// 面积缺失或为 0 时返回 None
    pub fn rent_per_area(&self, area_m2: f64) -> Option<f64> {
        if area_m2 > 0.0 {
            Some(self.daily_rent() / area_m2)
        } else {
            None
        }
    }

    /// 是否计费
    pub fn is_paid(&self) -> bool {
        self.monthly_rent > 0.0
    }

    /// 指定日期是否在住: check_in <= day < check_out
    pub fn overlaps(&self, day: NaiveDate) -> bool {
        self.check_in_date <= day && day < self.check_out_date
    }

    /// 指定日期是否为预定（尚未入住）
    pub fn is_reserved_on(&self, day: NaiveDate) -> bool {
        day < self.check_in_date
    }

    /// 与统计窗口的重叠天数
    ///
    /// max(0, min(end + 1, check_out) - max(start, check_in))
    pub fn overlap_days(&self, window: &AggregationWindow) -> i64 {
        let (start, end) = self.overlap_bounds(window);
        (end - start).num_days().max(0)
    }

    /// 与统计窗口重叠的每一天
    pub fn overlap_dates(&self, window: &AggregationWindow) -> impl Iterator<Item = NaiveDate> {
        let (start, end) = self.overlap_bounds(window);
        start.iter_days().take_while(move |d| *d < end)
    }

    fn overlap_bounds(&self, window: &AggregationWindow) -> (NaiveDate, NaiveDate) {
        let start = self.check_in_date.max(window.start_date);
        let end = self.check_out_date.min(window.exclusive_end());
        (start, end)
    }
}
