// ==========================================
// 公寓出租率统计 - 租金极值挖掘
// ==========================================
// 维度: 月租金 / 日租金 / 坪效 的最高与最低
// 范围: 窗口内有重叠且月租 > 0 的租约
// ==========================================
// 红线: 结果必须可复现 -> 先按 (合同号, 房号, 入住日) 排序，
//       并列时取排序后第一个出现的候选
// ==========================================

use crate::domain::report::{round2, ExtremeRecord, RentExtrema};
use crate::domain::tenancy::TenancyInterval;
use std::cmp::Ordering;

/// 极值候选: 租约 + 所属房型面积
#[derive(Debug, Clone, Copy)]
pub struct ExtremaCandidate<'a> {
    pub interval: &'a TenancyInterval,
    pub area_m2: f64,
}

impl<'a> ExtremaCandidate<'a> {
    pub fn new(interval: &'a TenancyInterval, area_m2: f64) -> Self {
        Self { interval, area_m2 }
    }

    fn to_record(self, value: f64) -> ExtremeRecord {
        ExtremeRecord {
            value: round2(value),
            contract_no: self.interval.contract_no.clone(),
            room_number: self.interval.room_number.clone(),
            room_type_code: self.interval.room_type_code.clone(),
            area_m2: self.area_m2,
            monthly_rent: self.interval.monthly_rent,
            check_in_date: self.interval.check_in_date,
            check_out_date: self.interval.check_out_date,
        }
    }
}

// ==========================================
// ExtremaFinder - 极值挖掘器
// ==========================================
pub struct ExtremaFinder {
    // 无状态
}

impl ExtremaFinder {
    pub fn new() -> Self {
        Self {}
    }

    /// 从候选中挑出六个极值
    ///
    /// 月租 <= 0 的候选被忽略；坪效只在面积 > 0 时参与比较
    pub fn find<'a, I>(&self, candidates: I) -> RentExtrema
    where
        I: IntoIterator<Item = ExtremaCandidate<'a>>,
    {
        let mut list: Vec<ExtremaCandidate<'a>> = candidates
            .into_iter()
            .filter(|c| c.interval.is_paid())
            .collect();
        list.sort_by(|a, b| {
            a.interval
                .contract_no
                .cmp(&b.interval.contract_no)
                .then_with(|| a.interval.room_number.cmp(&b.interval.room_number))
                .then_with(|| a.interval.check_in_date.cmp(&b.interval.check_in_date))
        });

        let monthly = |c: &ExtremaCandidate<'a>| Some(c.interval.monthly_rent);
        let daily = |c: &ExtremaCandidate<'a>| Some(c.interval.daily_rent());
        let per_area = |c: &ExtremaCandidate<'a>| c.interval.rent_per_area(c.area_m2);

        RentExtrema {
            max_monthly_rent: pick(&list, monthly, Ordering::Greater),
            min_monthly_rent: pick(&list, monthly, Ordering::Less),
            max_daily_rent: pick(&list, daily, Ordering::Greater),
            min_daily_rent: pick(&list, daily, Ordering::Less),
            max_rent_per_area: pick(&list, per_area, Ordering::Greater),
            min_rent_per_area: pick(&list, per_area, Ordering::Less),
        }
    }
}

impl Default for ExtremaFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// 严格优于才替换，保证并列时保留先出现者
fn pick<'a, F>(list: &[ExtremaCandidate<'a>], key: F, prefer: Ordering) -> Option<ExtremeRecord>
where
    F: Fn(&ExtremaCandidate<'a>) -> Option<f64>,
{
    let mut best: Option<(f64, ExtremaCandidate<'a>)> = None;
    for candidate in list {
        let Some(value) = key(candidate) else {
            continue;
        };
        match best {
            Some((best_value, _)) if value.partial_cmp(&best_value) != Some(prefer) => {}
            _ => best = Some((value, *candidate)),
        }
    }
    best.map(|(value, candidate)| candidate.to_record(value))
}
