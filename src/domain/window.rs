// ==========================================
// 公寓出租率统计 - 统计窗口
// ==========================================
// 职责: 描述一次统计请求的日期范围与口径
// 约定: end_date 含当天，内部按 end_date + 1 的开区间处理
// 生命周期: 每次请求构造，计算完成即丢弃
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::tenancy::TenancyInterval;
use crate::domain::types::CalcMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub mode: CalcMethod,
}

impl AggregationWindow {
    /// 构造统计窗口
    ///
    /// # 返回
    /// - Some: start_date <= end_date
    /// - None: 起止日期倒置
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, mode: CalcMethod) -> Option<Self> {
        if start_date > end_date {
            return None;
        }
        Some(Self {
            start_date,
            end_date,
            mode,
        })
    }

    /// 单日窗口 [day, day]
    pub fn single_day(day: NaiveDate, mode: CalcMethod) -> Self {
        Self {
            start_date: day,
            end_date: day,
            mode,
        }
    }

    /// 开区间上界（end_date 的次日）
    pub fn exclusive_end(&self) -> NaiveDate {
        self.end_date.succ_opt().unwrap_or(NaiveDate::MAX)
    }

    /// 窗口天数（含首尾）
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// 期末时点（即 end_date）
    pub fn target_date(&self) -> NaiveDate {
        self.end_date
    }

    /// 逐日遍历窗口内的日期
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date;
        self.start_date.iter_days().take_while(move |d| *d <= end)
    }

    /// 上游查询过滤条件: check_in < end + 1 AND check_out > start
    pub fn admits(&self, interval: &TenancyInterval) -> bool {
        interval.check_in_date < self.exclusive_end() && interval.check_out_date > self.start_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn interval(check_in: NaiveDate, check_out: NaiveDate) -> TenancyInterval {
        TenancyInterval {
            contract_no: "C1".to_string(),
            room_number: "A101".to_string(),
            room_type_code: "STD".to_string(),
            check_in_date: check_in,
            check_out_date: check_out,
            monthly_rent: 3000.0,
        }
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        assert!(AggregationWindow::new(d(2025, 1, 2), d(2025, 1, 1), CalcMethod::PeriodAvg).is_none());
        assert!(AggregationWindow::new(d(2025, 1, 1), d(2025, 1, 1), CalcMethod::PeriodAvg).is_some());
    }

    #[test]
    fn test_day_count_and_iteration() {
        let window = AggregationWindow::new(d(2025, 2, 26), d(2025, 3, 2), CalcMethod::PeriodAvg).unwrap();
        assert_eq!(window.day_count(), 5);
        let days: Vec<NaiveDate> = window.days().collect();
        assert_eq!(days.len(), 5);
        assert_eq!(days[0], d(2025, 2, 26));
        assert_eq!(days[4], d(2025, 3, 2));
        assert_eq!(window.exclusive_end(), d(2025, 3, 3));
    }

    #[test]
    fn test_admits_boundaries() {
        let window = AggregationWindow::new(d(2025, 1, 10), d(2025, 1, 20), CalcMethod::PeriodAvg).unwrap();

        // 离店日等于窗口起始日: 不纳入
        assert!(!window.admits(&interval(d(2025, 1, 1), d(2025, 1, 10))));
        // 入住日等于窗口结束日: 纳入
        assert!(window.admits(&interval(d(2025, 1, 20), d(2025, 1, 25))));
        // 入住日晚于窗口结束日: 不纳入
        assert!(!window.admits(&interval(d(2025, 1, 21), d(2025, 1, 25))));
        // 覆盖整个窗口
        assert!(window.admits(&interval(d(2024, 12, 1), d(2025, 2, 1))));
    }
}
