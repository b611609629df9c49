// ==========================================
// 公寓出租率统计 - 领域类型定义
// ==========================================
// 职责: 统计口径、数据质量等级等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 统计口径 (Calc Method)
// ==========================================
// period_avg: 期间加权平均 (总入住房晚 / 总可用房晚) -> 财务/管理视角
// end_point : 期末时点 (结束日当天的出租率)       -> 运营/销售库存视角
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcMethod {
    PeriodAvg,
    EndPoint,
}

impl fmt::Display for CalcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl CalcMethod {
    /// 所有合法口径（用于错误提示）
    pub const ALL: [CalcMethod; 2] = [CalcMethod::PeriodAvg, CalcMethod::EndPoint];

    /// 从字符串解析统计口径
    ///
    /// 只接受 `period_avg` / `end_point`（忽略首尾空白与大小写）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "period_avg" => Some(CalcMethod::PeriodAvg),
            "end_point" => Some(CalcMethod::EndPoint),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CalcMethod::PeriodAvg => "period_avg",
            CalcMethod::EndPoint => "end_point",
        }
    }

    /// 中文口径名称
    pub fn label(&self) -> &'static str {
        match self {
            CalcMethod::PeriodAvg => "期间加权平均",
            CalcMethod::EndPoint => "期末时点",
        }
    }
}

// ==========================================
// 数据质量等级 (DQ Level)
// ==========================================
// ERROR: 该行不入库; WARNING: 入库但需关注; INFO: 提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DqLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for DqLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DqLevel::Info => write!(f, "INFO"),
            DqLevel::Warning => write!(f, "WARNING"),
            DqLevel::Error => write!(f, "ERROR"),
        }
    }
}
