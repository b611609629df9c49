// ==========================================
// 公寓出租率统计 - 合同导入报告
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::DqLevel;

// ==========================================
// DqViolation - 数据质量违规记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqViolation {
    pub row_number: usize,           // 原始文件行号（表头为第 1 行）
    pub contract_no: Option<String>, // 合同号（如果可解析）
    pub level: DqLevel,              // 违规级别
    pub field: String,               // 违规字段
    pub message: String,             // 违规描述
}

// ==========================================
// ImportReport - 导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub total_rows: usize, // 非空数据行
    pub imported: usize,   // 写入（含覆盖）
    pub blocked: usize,    // 因 ERROR 未写入的行
    pub warnings: usize,   // WARNING 条数
    pub violations: Vec<DqViolation>,
}

impl ImportReport {
    /// 指定级别的违规条数
    pub fn count_level(&self, level: DqLevel) -> usize {
        self.violations.iter().filter(|v| v.level == level).count()
    }
}
